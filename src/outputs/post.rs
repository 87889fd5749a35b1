//! Writing the rendered post to the posts directory.
//!
//! There is at most one post per calendar day: the file name only depends on
//! the date, and a later run on the same day replaces the earlier file.

use crate::error::PublishError;
use crate::models::post_filename;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

/// Write `text` to `{posts_dir}/{date_key}-daily-news.md`, replacing any
/// previous post for the same day.
///
/// The text goes to a temporary file in `posts_dir` that is then persisted
/// onto the target, so readers never observe a half-written post and
/// concurrent writers end with one complete body (last write wins).
#[instrument(level = "info", skip_all, fields(posts_dir = %posts_dir.display(), %date_key))]
pub async fn write_post(
    posts_dir: &Path,
    date_key: &str,
    text: &str,
) -> Result<PathBuf, PublishError> {
    let path = posts_dir.join(post_filename(date_key));

    let dir = posts_dir.to_path_buf();
    let target = path.clone();
    let content = text.to_string();
    let written = tokio::task::spawn_blocking(move || persist_atomically(&dir, &target, &content))
        .await
        .unwrap_or_else(|join_err| Err(io::Error::other(join_err)));

    if let Err(source) = written {
        return Err(PublishError::WriteFailed { path, source });
    }

    info!(path = %path.display(), bytes = text.len(), "Wrote post");
    Ok(path)
}

fn persist_atomically(dir: &Path, target: &Path, content: &str) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
