//! Daily trigger for the publish pipeline.
//!
//! The scheduler runs the pipeline once at boot and then every day at a fixed
//! local time. Runs are spawned onto the current `LocalSet`, so the timer keeps
//! ticking while a run waits on the network or the disk.
//!
//! Run state is tracked explicitly ([`RunState`]). A trigger that arrives while
//! a run is still in progress is dropped and logged. This only protects runs
//! inside one process: two processes writing the same site directories can
//! still interleave their writes.

use crate::pipeline::PublishPipeline;
use crate::site::SiteGenerator;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Shared Idle/Running flag for pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct RunGate {
    state: Rc<Cell<RunState>>,
}

impl RunGate {
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Move to `Running` if currently `Idle`. The state returns to `Idle`
    /// when the guard is dropped.
    pub fn try_begin(&self) -> Option<RunGuard> {
        match self.state.get() {
            RunState::Running => None,
            RunState::Idle => {
                self.state.set(RunState::Running);
                Some(RunGuard {
                    state: Rc::clone(&self.state),
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct RunGuard {
    state: Rc<Cell<RunState>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.state.set(RunState::Idle);
    }
}

pub struct Scheduler<G> {
    pipeline: Rc<PublishPipeline<G>>,
    at: NaiveTime,
    gate: RunGate,
}

impl<G: SiteGenerator + 'static> Scheduler<G> {
    pub fn new(pipeline: PublishPipeline<G>, at: NaiveTime) -> Self {
        Self {
            pipeline: Rc::new(pipeline),
            at,
            gate: RunGate::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.gate.state()
    }

    /// Fire once now, then daily at `at`. Never returns.
    ///
    /// Must be polled inside a [`tokio::task::LocalSet`].
    pub async fn run_forever(&self) {
        self.trigger("startup");

        let mut after = Local::now();
        loop {
            let next = next_trigger(&after, self.at)
                .unwrap_or_else(|| after + chrono::Duration::days(1));
            let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
            info!(
                next = %next.to_rfc3339(),
                wait_secs = wait.as_secs(),
                state = ?self.state(),
                "Waiting for next scheduled run"
            );
            tokio::time::sleep(wait).await;

            info!("Daily task starting");
            self.trigger("schedule");
            after = Local::now().max(next);
        }
    }

    /// Start a run unless one is in progress. Returns whether a run was started.
    pub fn trigger(&self, reason: &'static str) -> bool {
        let Some(guard) = self.gate.try_begin() else {
            warn!(reason, "Previous run still in progress; skipping this trigger");
            return false;
        };

        let pipeline = Rc::clone(&self.pipeline);
        tokio::task::spawn_local(async move {
            let _guard = guard;
            match pipeline.run().await {
                Ok(report) => {
                    info!(reason, post = %report.post_path.display(), "Daily post published")
                }
                Err(e) => error!(reason, error = %e, "Publish run failed"),
            }
        });
        true
    }
}

/// First occurrence of local time `at` strictly after `now`.
///
/// Days on which `at` does not exist (DST gap) are skipped.
pub fn next_trigger<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    now.date_naive()
        .iter_days()
        .take(3)
        .filter_map(|day| tz.from_local_datetime(&day.and_time(at)).earliest())
        .find(|candidate| candidate > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::pipeline::PipelineConfig;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;
    use tokio::task::LocalSet;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoopGenerator;

    impl SiteGenerator for NoopGenerator {
        async fn init(&self) -> Result<(), GeneratorError> {
            Ok(())
        }

        async fn generate(&self) -> Result<(), GeneratorError> {
            Ok(())
        }

        async fn deploy(&self) -> Result<(), GeneratorError> {
            Ok(())
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_next_trigger_later_today() {
        let next = next_trigger(&utc(2024, 5, 1, 7, 0), at(8, 0)).unwrap();
        assert_eq!(next, utc(2024, 5, 1, 8, 0));
    }

    #[test]
    fn test_next_trigger_tomorrow_when_passed_or_equal() {
        let next = next_trigger(&utc(2024, 5, 1, 9, 30), at(8, 0)).unwrap();
        assert_eq!(next, utc(2024, 5, 2, 8, 0));

        let next = next_trigger(&utc(2024, 5, 1, 8, 0), at(8, 0)).unwrap();
        assert_eq!(next, utc(2024, 5, 2, 8, 0));
    }

    #[test]
    fn test_next_trigger_crosses_month_end() {
        let next = next_trigger(&utc(2024, 12, 31, 23, 0), at(8, 0)).unwrap();
        assert_eq!(next, utc(2025, 1, 1, 8, 0));
    }

    #[test]
    fn test_run_gate_transitions() {
        let gate = RunGate::default();
        assert_eq!(gate.state(), RunState::Idle);

        let guard = gate.try_begin().unwrap();
        assert_eq!(gate.state(), RunState::Running);
        assert!(gate.try_begin().is_none());

        drop(guard);
        assert_eq!(gate.state(), RunState::Idle);
        assert!(gate.try_begin().is_some());
    }

    #[tokio::test]
    async fn test_trigger_is_dropped_while_running() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": []}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let pipeline = PublishPipeline::new(
            reqwest::Client::new(),
            &format!("{}/feed", server.uri()),
            PipelineConfig {
                posts_dir: dir.path().join("posts"),
                images_dir: dir.path().join("images"),
                should_deploy: false,
            },
            NoopGenerator,
        );
        let scheduler = Scheduler::new(pipeline, at(8, 0));

        LocalSet::new()
            .run_until(async {
                assert!(scheduler.trigger("startup"));
                assert_eq!(scheduler.state(), RunState::Running);
                assert!(!scheduler.trigger("schedule"));

                for _ in 0..100 {
                    if scheduler.state() == RunState::Idle {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                assert_eq!(scheduler.state(), RunState::Idle);
                assert_eq!(dir.path().join("posts").read_dir().unwrap().count(), 1);
            })
            .await;
    }
}
