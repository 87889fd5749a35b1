//! # Daily Brief
//!
//! Publishes a daily news post for a static site. Each run pulls a ranked news
//! feed, caches every article's cover image under the site's images directory,
//! writes one Markdown post per day and asks the site generator to rebuild.
//!
//! ## Usage
//!
//! ```sh
//! # Stay resident: publish now, then every day at 08:00 local time
//! daily_brief --site-dir /srv/blog
//!
//! # Publish once and deploy, then exit
//! daily_brief --site-dir /srv/blog --once --deploy
//! ```
//!
//! ## Architecture
//!
//! 1. **Feed**: fetch today's ranked articles ([`feed`])
//! 2. **Images**: download covers one by one under deterministic names ([`images`])
//! 3. **Compose**: render front matter and one section per article ([`outputs`])
//! 4. **Persist**: overwrite the day's post, then run the generator hooks ([`pipeline`], [`site`])
//! 5. **Schedule**: repeat daily on a single-threaded runtime ([`scheduler`])

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod feed;
mod git;
mod images;
mod models;
mod outputs;
mod pipeline;
mod scheduler;
mod site;
mod utils;

use cli::Cli;
use config::Settings;
use git::{GitPublisher, relative_to};
use pipeline::{PipelineConfig, PublishPipeline};
use scheduler::Scheduler;
use site::{CommandGenerator, SiteGenerator};
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "daily_brief starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = match Settings::resolve(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Early check: both output directories must be writable
    for dir in [&settings.posts_dir, &settings.images_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(settings.request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let generator = CommandGenerator::new(settings.generator_command.clone(), &settings.site_dir);
    if let Err(e) = generator.init().await {
        error!(error = %e, "Site generator failed to initialise");
        return Err(e.into());
    }

    let config = PipelineConfig {
        posts_dir: settings.posts_dir.clone(),
        images_dir: settings.images_dir.clone(),
        should_deploy: settings.deploy,
    };
    let mut pipeline = PublishPipeline::new(client, &settings.feed_url, config, generator);
    if settings.git_push {
        let paths = vec![
            relative_to(&settings.posts_dir, &settings.site_dir),
            relative_to(&settings.images_dir, &settings.site_dir),
        ];
        pipeline = pipeline.with_git(GitPublisher::new(&settings.site_dir, paths));
    }
    info!(
        feed = %settings.feed_url,
        posts_dir = %settings.posts_dir.display(),
        images_dir = %settings.images_dir.display(),
        deploy = settings.deploy,
        git_push = settings.git_push,
        "Pipeline configured"
    );

    if settings.once {
        return match pipeline.run().await {
            Ok(report) => {
                info!(post = %report.post_path.display(), "Daily post published");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Publish run failed");
                Err(e.into())
            }
        };
    }

    info!(at = %settings.schedule.format("%H:%M"), "Scheduling daily runs");
    let scheduler = Scheduler::new(pipeline, settings.schedule);
    LocalSet::new().run_until(scheduler.run_forever()).await;
    Ok(())
}
