//! Cover image download into the site's images directory.
//!
//! The body is streamed chunk by chunk into a uniquely named temporary file in
//! the images directory and persisted onto `{filename}` once the stream has
//! completed and the file is flushed. A broken download never leaves a
//! truncated image under its final name, and the temporary file is removed.
//! Failures are tagged with the side that broke, see [`DownloadStage`].

use crate::error::{DownloadStage, PublishError};
use crate::models::LocalImageRef;
use futures::StreamExt;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

/// URL prefix under which the site serves the images directory.
pub const IMAGES_URL_PREFIX: &str = "/images";

#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    images_dir: PathBuf,
}

impl ImageFetcher {
    pub fn new(client: reqwest::Client, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            images_dir: images_dir.into(),
        }
    }

    /// Download `url` to `{images_dir}/{filename}`, overwriting any existing file.
    ///
    /// The caller is responsible for `filename` being collision-safe; no
    /// uniqueness check happens here.
    #[instrument(level = "info", skip_all, fields(%url, %filename))]
    pub async fn download(&self, url: &str, filename: &str) -> Result<LocalImageRef, PublishError> {
        let write_err = |e: std::io::Error| PublishError::download(url, DownloadStage::Write, e);
        let fetch_err = |e: reqwest::Error| PublishError::download(url, DownloadStage::Fetch, e);

        fs::create_dir_all(&self.images_dir).await.map_err(write_err)?;

        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Image source returned non-success status");
            return Err(PublishError::download(
                url,
                DownloadStage::Fetch,
                format!("HTTP {status}"),
            ));
        }

        let target = self.images_dir.join(filename);
        let tmp = NamedTempFile::new_in(&self.images_dir).map_err(write_err)?;
        let mut file = fs::File::from_std(tmp.reopen().map_err(write_err)?);

        // `tmp` removes itself on drop, so early returns leave nothing behind.
        let mut bytes = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(fetch_err)?;
            file.write_all(&chunk).await.map_err(write_err)?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        drop(file);

        tmp.persist(&target).map_err(|e| write_err(e.error))?;

        let relative_path = format!("{IMAGES_URL_PREFIX}/{filename}");
        info!(bytes, path = %target.display(), "Saved cover image");
        Ok(LocalImageRef {
            source_url: url.to_string(),
            relative_path,
        })
    }
}

/// A raw HTTP server whose single response promises more body than it sends.
#[cfg(test)]
pub(crate) mod truncated {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection announcing `Content-Length: 1000` and closing after
    /// a few bytes. Returns the server's base URL.
    pub(crate) async fn serve_truncated_body() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 1000\r\n\r\n\x89PNG",
                )
                .await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }
}
