//! Error taxonomy for a publishing run.
//!
//! Every stage of the pipeline maps its failure into one [`PublishError`]
//! variant. A run stops at the first error; the scheduler logs it and waits
//! for the next trigger.

use std::path::PathBuf;
use thiserror::Error;

/// Which side of an image download failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    /// The source request errored, returned a non-success status, or the body stream broke.
    Fetch,
    /// The local file could not be created, written, flushed or persisted.
    Write,
}

impl std::fmt::Display for DownloadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadStage::Fetch => f.write_str("fetch"),
            DownloadStage::Write => f.write_str("write"),
        }
    }
}

/// Failure of one pipeline run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("feed unavailable at {url}: {reason}")]
    FeedUnavailable { url: String, reason: String },

    #[error("download of {url} failed during {stage}: {reason}")]
    DownloadFailed {
        url: String,
        stage: DownloadStage,
        reason: String,
    },

    #[error("could not write post {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("site generator `{hook}` hook failed: {source}")]
    GeneratorFailed {
        hook: &'static str,
        #[source]
        source: GeneratorError,
    },
}

impl PublishError {
    pub(crate) fn feed(url: &str, reason: impl ToString) -> Self {
        PublishError::FeedUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn download(url: &str, stage: DownloadStage, reason: impl ToString) -> Self {
        PublishError::DownloadFailed {
            url: url.to_string(),
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Failure reported by a site generator hook.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("site directory {} is missing or not a directory", .0.display())]
    MissingSite(PathBuf),

    #[error("could not spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Exit { command: String, status: String },
}

/// Invalid configuration detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid schedule `{0}`, expected HH:MM")]
    Schedule(String),

    #[error("invalid feed url `{url}`: {source}")]
    FeedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("generator command is empty")]
    EmptyGeneratorCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_names_stage() {
        let err = PublishError::download("http://x/y.png", DownloadStage::Write, "disk full");
        assert_eq!(
            err.to_string(),
            "download of http://x/y.png failed during write: disk full"
        );
    }

    #[test]
    fn test_generator_error_names_hook() {
        let err = PublishError::GeneratorFailed {
            hook: "generate",
            source: GeneratorError::Exit {
                command: "npx hexo generate".into(),
                status: "exit status: 2".into(),
            },
        };
        assert!(err.to_string().starts_with("site generator `generate` hook failed"));
    }
}
