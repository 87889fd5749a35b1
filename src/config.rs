//! Runtime configuration.
//!
//! Settings come from three layers, highest priority first:
//! 1. command-line flags / environment variables ([`Cli`])
//! 2. an optional YAML file passed with `--config`
//! 3. built-in defaults
//!
//! ```yaml
//! feed_url: https://60s-api.viki.moe/v2/toutiao
//! site_dir: /srv/blog
//! schedule: "08:00"
//! deploy: false
//! git_push: false
//! generator_command: npx hexo
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_FEED_URL: &str = "https://60s-api.viki.moe/v2/toutiao";
pub const DEFAULT_SCHEDULE: &str = "08:00";
pub const DEFAULT_GENERATOR_COMMAND: &str = "npx hexo";
const DEFAULT_POSTS_SUBDIR: &str = "source/_posts";
const DEFAULT_IMAGES_SUBDIR: &str = "source/images";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Contents of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub feed_url: Option<String>,
    pub site_dir: Option<PathBuf>,
    pub posts_dir: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub schedule: Option<String>,
    pub deploy: Option<bool>,
    pub git_push: Option<bool>,
    pub generator_command: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: shown,
            source,
        })?;
        info!("Loaded configuration file");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

/// Fully resolved settings used by `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub feed_url: String,
    pub site_dir: PathBuf,
    pub posts_dir: PathBuf,
    pub images_dir: PathBuf,
    /// Local time of day of the daily run.
    pub schedule: NaiveTime,
    pub deploy: bool,
    pub git_push: bool,
    /// Generator program followed by its leading arguments.
    pub generator_command: Vec<String>,
    pub request_timeout: Duration,
    pub once: bool,
}

impl Settings {
    /// Merge CLI arguments over the config file (if any) over defaults.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let feed_url = cli
            .feed_url
            .clone()
            .or(file.feed_url)
            .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
        url::Url::parse(&feed_url).map_err(|source| ConfigError::FeedUrl {
            url: feed_url.clone(),
            source,
        })?;

        let site_dir = cli
            .site_dir
            .clone()
            .or(file.site_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let posts_dir = cli
            .posts_dir
            .clone()
            .or(file.posts_dir)
            .unwrap_or_else(|| site_dir.join(DEFAULT_POSTS_SUBDIR));
        let images_dir = cli
            .images_dir
            .clone()
            .or(file.images_dir)
            .unwrap_or_else(|| site_dir.join(DEFAULT_IMAGES_SUBDIR));

        let schedule_text = cli
            .schedule
            .clone()
            .or(file.schedule)
            .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
        let schedule = parse_schedule(&schedule_text)?;

        let generator_command: Vec<String> = cli
            .generator_command
            .clone()
            .or(file.generator_command)
            .unwrap_or_else(|| DEFAULT_GENERATOR_COMMAND.to_string())
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if generator_command.is_empty() {
            return Err(ConfigError::EmptyGeneratorCommand);
        }

        let settings = Settings {
            feed_url,
            site_dir,
            posts_dir,
            images_dir,
            schedule,
            deploy: cli.deploy || file.deploy.unwrap_or(false),
            git_push: cli.git_push || file.git_push.unwrap_or(false),
            generator_command,
            request_timeout: Duration::from_secs(
                file.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            once: cli.once,
        };
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

/// Parse a daily trigger time written as `HH:MM` (or `HH:MM:SS`).
pub fn parse_schedule(s: &str) -> Result<NaiveTime, ConfigError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ConfigError::Schedule(s.to_string()))
}
