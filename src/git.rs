//! Optional push of the generated content to the site's git remote.
//!
//! Only used when `git_push` is enabled. A push failure is logged and does not
//! fail the run: by the time it runs the post is written and the site is
//! generated.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl GitPublisher {
    /// Stage `paths` (posts and images directories) inside `repo_dir`.
    pub fn new(repo_dir: impl Into<PathBuf>, paths: Vec<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            paths,
        }
    }

    /// `git add` each path, commit and push. Returns whether every step succeeded.
    #[instrument(level = "info", skip_all, fields(repo_dir = %self.repo_dir.display()))]
    pub async fn publish(&self, message: &str) -> bool {
        for path in &self.paths {
            if !self.git(&[OsStr::new("add"), path.as_os_str()]).await {
                return false;
            }
        }
        if !self
            .git(&[OsStr::new("commit"), OsStr::new("-m"), OsStr::new(message)])
            .await
        {
            return false;
        }
        if !self.git(&[OsStr::new("push")]).await {
            return false;
        }
        info!("Committed and pushed daily news");
        true
    }

    async fn git(&self, args: &[&OsStr]) -> bool {
        let shown = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        match Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .status()
            .await
        {
            Ok(status) if status.success() => true,
            Ok(status) => {
                error!(command = %format!("git {shown}"), %status, "Git command failed");
                false
            }
            Err(e) => {
                error!(command = %format!("git {shown}"), error = %e, "Could not run git");
                false
            }
        }
    }
}

/// Commit message for a publish at `timestamp`.
pub fn commit_message(timestamp: &str) -> String {
    format!("update daily news: {timestamp}")
}

/// Path of `path` relative to `repo_dir` when it lies inside it.
pub fn relative_to(path: &Path, repo_dir: &Path) -> PathBuf {
    path.strip_prefix(repo_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
