//! The fetch → transform → persist pipeline.
//!
//! One run:
//! 1. fixes the run date (local calendar day),
//! 2. fetches the feed,
//! 3. downloads each present cover, one after the other, under a filename
//!    derived from `(run_date, index, cover_url)`,
//! 4. composes the post,
//! 5. writes it to `{posts_dir}/{run_date}-daily-news.md`,
//! 6. calls the generator's `generate` (and `deploy`, when enabled) hook.
//!
//! The first failing stage aborts the run. A missing cover is not a failure,
//! a cover that cannot be downloaded is.

use crate::error::PublishError;
use crate::feed::FeedClient;
use crate::git::{GitPublisher, commit_message};
use crate::images::ImageFetcher;
use crate::models::Article;
use crate::outputs::{markdown, post};
use crate::site::SiteGenerator;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Where a run writes and whether it deploys.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub posts_dir: PathBuf,
    pub images_dir: PathBuf,
    pub should_deploy: bool,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_date: NaiveDate,
    pub post_path: PathBuf,
    pub articles: usize,
    pub images: usize,
}

pub struct PublishPipeline<G> {
    feed: FeedClient,
    images: ImageFetcher,
    generator: G,
    posts_dir: PathBuf,
    should_deploy: bool,
    git: Option<GitPublisher>,
}

impl<G: SiteGenerator> PublishPipeline<G> {
    /// `generator` must already be initialised.
    pub fn new(client: reqwest::Client, feed_url: &str, config: PipelineConfig, generator: G) -> Self {
        Self {
            feed: FeedClient::new(client.clone(), feed_url),
            images: ImageFetcher::new(client, config.images_dir),
            generator,
            posts_dir: config.posts_dir,
            should_deploy: config.should_deploy,
            git: None,
        }
    }

    /// Commit and push after every successful generate.
    pub fn with_git(mut self, git: GitPublisher) -> Self {
        self.git = Some(git);
        self
    }

    /// Run for today's local date.
    pub async fn run(&self) -> Result<RunReport, PublishError> {
        let now = Local::now();
        let run_date = now.date_naive();
        let published_at = local_midnight(run_date).unwrap_or_else(|| now.fixed_offset());
        self.run_on(run_date, published_at).await
    }

    /// Run as if the current day were `run_date`, stamping the post with `published_at`.
    #[instrument(level = "info", skip_all, fields(%run_date, feed = %self.feed.url()))]
    pub async fn run_on(
        &self,
        run_date: NaiveDate,
        published_at: DateTime<FixedOffset>,
    ) -> Result<RunReport, PublishError> {
        let t0 = Instant::now();
        info!("Publish run starting");

        let articles = self.feed.fetch().await?;
        let image_paths = self.download_covers(run_date, &articles).await?;

        let text = markdown::compose(run_date, &published_at, &articles, &image_paths);
        let date_key = run_date.format("%Y-%m-%d").to_string();
        let post_path = post::write_post(&self.posts_dir, &date_key, &text).await?;

        self.generator
            .generate()
            .await
            .map_err(|source| PublishError::GeneratorFailed {
                hook: "generate",
                source,
            })?;
        if self.should_deploy {
            self.generator
                .deploy()
                .await
                .map_err(|source| PublishError::GeneratorFailed {
                    hook: "deploy",
                    source,
                })?;
        }

        if let Some(git) = &self.git {
            let stamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
            if !git.publish(&commit_message(&stamp)).await {
                warn!(post = %post_path.display(), "Git publish failed; post is written and generated");
            }
        }

        let report = RunReport {
            run_date,
            post_path,
            articles: articles.len(),
            images: image_paths.iter().flatten().count(),
        };
        info!(
            post = %report.post_path.display(),
            articles = report.articles,
            images = report.images,
            elapsed_ms = t0.elapsed().as_millis(),
            "Publish run complete"
        );
        Ok(report)
    }

    /// Download covers sequentially so index → filename stays one writer per file.
    async fn download_covers(
        &self,
        run_date: NaiveDate,
        articles: &[Article],
    ) -> Result<Vec<Option<String>>, PublishError> {
        let mut paths = Vec::with_capacity(articles.len());
        for (index, article) in articles.iter().enumerate() {
            match &article.cover {
                Some(cover) => {
                    let filename = image_filename(run_date, index, cover);
                    let image = self.images.download(cover, &filename).await?;
                    paths.push(Some(image.relative_path));
                }
                None => {
                    debug!(index, title = %article.title, "Article has no cover");
                    paths.push(None);
                }
            }
        }
        Ok(paths)
    }
}

/// Local midnight of `date`, or `None` when it does not exist (DST gap).
fn local_midnight(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// `{run_date}-img{index}{ext}` for the cover at `index`.
///
/// Only the URL path's extension matters: query string and fragment are
/// ignored, and `.jpg` is used when the path has no usable extension. Two
/// articles sharing an index on the same day share a filename.
pub fn image_filename(run_date: NaiveDate, index: usize, cover_url: &str) -> String {
    format!(
        "{}-img{}{}",
        run_date.format("%Y-%m-%d"),
        index,
        cover_extension(cover_url)
    )
}

fn cover_extension(cover_url: &str) -> String {
    let last_segment = match url::Url::parse(cover_url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string)
            .unwrap_or_default(),
        Err(_) => {
            let path = cover_url
                .split(['?', '#'])
                .next()
                .unwrap_or_default();
            path.rsplit('/').next().unwrap_or_default().to_string()
        }
    };

    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{ext}")
        }
        _ => DEFAULT_IMAGE_EXTENSION.to_string(),
    }
}
