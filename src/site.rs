//! Static-site generator hooks.
//!
//! The pipeline only needs three calls from the generator: [`SiteGenerator::init`]
//! once per process, [`SiteGenerator::generate`] after every written post and
//! [`SiteGenerator::deploy`] when deployment is enabled. The generator handle is
//! created in `main` and passed explicitly to the pipeline.
//!
//! [`CommandGenerator`] drives a generator CLI such as `npx hexo`, running
//! `<command> generate` / `<command> deploy` inside the site directory.

use crate::error::GeneratorError;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// The three lifecycle hooks of a static-site generator.
pub trait SiteGenerator {
    /// Prepare the generator. Called once before the first run.
    async fn init(&self) -> Result<(), GeneratorError>;

    /// Rebuild the site from its sources.
    async fn generate(&self) -> Result<(), GeneratorError>;

    /// Publish the generated site.
    async fn deploy(&self) -> Result<(), GeneratorError>;
}

/// Runs generator subcommands as child processes.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    /// Program and leading arguments, e.g. `["npx", "hexo"]`.
    command: Vec<String>,
    /// Working directory of the generator (the site root).
    site_dir: PathBuf,
}

impl CommandGenerator {
    /// `command` must contain at least the program name.
    pub fn new(command: Vec<String>, site_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            site_dir: site_dir.into(),
        }
    }

    fn display(&self, subcommand: &str) -> String {
        let mut parts = self.command.clone();
        parts.push(subcommand.to_string());
        parts.join(" ")
    }

    #[instrument(level = "info", skip(self), fields(site_dir = %self.site_dir.display()))]
    async fn call(&self, subcommand: &str) -> Result<(), GeneratorError> {
        let command = self.display(subcommand);
        let Some((program, args)) = self.command.split_first() else {
            return Err(GeneratorError::Spawn {
                command,
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        let t0 = Instant::now();
        let status = Command::new(program)
            .args(args)
            .arg(subcommand)
            .current_dir(&self.site_dir)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| GeneratorError::Spawn {
                command: command.clone(),
                source,
            })?;
        let elapsed_ms = t0.elapsed().as_millis();

        if status.success() {
            info!(%command, elapsed_ms, "Generator command finished");
            Ok(())
        } else {
            warn!(%command, %status, elapsed_ms, "Generator command failed");
            Err(GeneratorError::Exit {
                command,
                status: status.to_string(),
            })
        }
    }
}

impl SiteGenerator for CommandGenerator {
    async fn init(&self) -> Result<(), GeneratorError> {
        match tokio::fs::metadata(&self.site_dir).await {
            Ok(meta) if meta.is_dir() => {
                info!(site_dir = %self.site_dir.display(), command = %self.command.join(" "), "Site generator ready");
                Ok(())
            }
            _ => Err(GeneratorError::MissingSite(self.site_dir.clone())),
        }
    }

    async fn generate(&self) -> Result<(), GeneratorError> {
        self.call("generate").await
    }

    async fn deploy(&self) -> Result<(), GeneratorError> {
        self.call("deploy").await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_requires_site_dir() {
        let dir = TempDir::new().unwrap();
        let ok = CommandGenerator::new(vec!["true".into()], dir.path());
        assert!(ok.init().await.is_ok());

        let missing = CommandGenerator::new(vec!["true".into()], dir.path().join("nope"));
        assert!(matches!(
            missing.init().await,
            Err(GeneratorError::MissingSite(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_runs_subcommand_in_site_dir() {
        let dir = TempDir::new().unwrap();
        // `sh -c 'touch "$0"' generate` creates a file named after the subcommand.
        let generator = CommandGenerator::new(
            vec!["sh".into(), "-c".into(), "touch \"$0\"".into()],
            dir.path(),
        );

        generator.generate().await.unwrap();
        generator.deploy().await.unwrap();

        assert!(dir.path().join("generate").exists());
        assert!(dir.path().join("deploy").exists());
    }

    #[tokio::test]
    async fn test_generate_reports_exit_status() {
        let dir = TempDir::new().unwrap();
        let generator = CommandGenerator::new(vec!["false".into()], dir.path());

        let err = generator.generate().await.unwrap_err();
        match err {
            GeneratorError::Exit { command, .. } => assert_eq!(command, "false generate"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_reports_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let generator =
            CommandGenerator::new(vec!["definitely-not-a-generator-binary".into()], dir.path());

        assert!(matches!(
            generator.generate().await,
            Err(GeneratorError::Spawn { .. })
        ));
    }
}
