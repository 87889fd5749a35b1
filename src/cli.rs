//! Command-line interface definitions for Daily Brief.
//!
//! Every option can also be given through an environment variable or the
//! YAML file passed with `--config`; see [`crate::config`] for precedence.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Daily Brief publisher.
///
/// # Examples
///
/// ```sh
/// # Long-running: publish now, then every day at 08:00
/// daily_brief --site-dir /srv/blog
///
/// # One-shot run that also deploys the site
/// daily_brief --site-dir /srv/blog --once --deploy
///
/// # Everything from a config file
/// daily_brief -c /etc/daily_brief.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "DAILY_BRIEF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Feed endpoint returning `{ "data": [ {title, cover, link} ] }`
    #[arg(long, env = "DAILY_BRIEF_FEED_URL")]
    pub feed_url: Option<String>,

    /// Root of the static site (generator working directory)
    #[arg(short, long, env = "DAILY_BRIEF_SITE_DIR")]
    pub site_dir: Option<PathBuf>,

    /// Directory receiving the daily post [default: <site-dir>/source/_posts]
    #[arg(short, long, env = "DAILY_BRIEF_POSTS_DIR")]
    pub posts_dir: Option<PathBuf>,

    /// Directory receiving cover images [default: <site-dir>/source/images]
    #[arg(short, long, env = "DAILY_BRIEF_IMAGES_DIR")]
    pub images_dir: Option<PathBuf>,

    /// Local time of the daily run, HH:MM [default: 08:00]
    #[arg(long, env = "DAILY_BRIEF_SCHEDULE")]
    pub schedule: Option<String>,

    /// Generator command line, subcommands are appended [default: "npx hexo"]
    #[arg(long, env = "DAILY_BRIEF_GENERATOR")]
    pub generator_command: Option<String>,

    /// Call the generator's deploy hook after every generate
    #[arg(long)]
    pub deploy: bool,

    /// Commit and push posts and images after every run
    #[arg(long)]
    pub git_push: bool,

    /// Run the pipeline once and exit instead of staying on the daily schedule
    #[arg(long)]
    pub once: bool,
}
