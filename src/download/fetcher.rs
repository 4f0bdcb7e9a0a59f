use crate::download::outcome::DownloadOutcome;
use crate::download::task::DownloadTask;
use crate::error::FetchError;
use crate::utils::images::{normalize_image, CanonicalFormat};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, trace, warn};
use url::Url;

/// Turns one task into one outcome. Implementations never return errors;
/// every failure is reported through the outcome.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, task: DownloadTask) -> DownloadOutcome;
}

/// Staging file removed on drop unless it was persisted or discarded.
struct StagingFile {
    path: PathBuf,
    armed: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(mut self, destination: &Path) -> Result<(), FetchError> {
        tokio::fs::rename(&self.path, destination)
            .await
            .map_err(|e| FetchError::io(destination, e))?;
        self.armed = false;
        Ok(())
    }

    async fn discard(mut self) {
        self.armed = false;
        log_removal(&self.path, tokio::fs::remove_file(&self.path).await);
    }
}

impl Drop for StagingFile {
    // Only reached on panics, dropped futures and early I/O errors; the
    // regular paths go through `persist` or `discard`. A single unlink, so
    // blocking here is fine.
    fn drop(&mut self) {
        if self.armed {
            log_removal(&self.path, std::fs::remove_file(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => trace!(path = %path.display(), "Removed staging file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove staging file: {}", e),
    }
}

enum Fetched {
    AlreadyPresent,
    Downloaded,
}

/// Streams assets over HTTP and normalizes them to the task's format.
#[derive(Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn try_fetch(&self, task: &DownloadTask) -> Result<Fetched, FetchError> {
        // Reject tasks that can never produce a file before touching the network
        if task.source_url().is_empty() {
            return Err(FetchError::MissingUrl);
        }
        let url = Url::parse(task.source_url()).map_err(|source| FetchError::InvalidUrl {
            url: task.source_url().to_string(),
            source,
        })?;
        let (Some(final_path), Some(staging_path)) = (task.final_path(), task.staging_path())
        else {
            return Err(FetchError::NoFileName {
                url: task.source_url().to_string(),
            });
        };

        // Guard first so a staging file left by an earlier crash is cleared too.
        let staging = StagingFile::new(staging_path);

        // Skip assets that were already converted by a previous run
        let exists = tokio::fs::try_exists(&final_path)
            .await
            .map_err(|e| FetchError::io(&final_path, e))?;
        if exists {
            staging.discard().await;
            return Ok(Fetched::AlreadyPresent);
        }

        let transferred = self.transfer(url, &staging, task.format()).await;
        match transferred {
            Ok(()) => {
                staging.persist(&final_path).await?;
                Ok(Fetched::Downloaded)
            }
            Err(e) => {
                staging.discard().await;
                Err(e)
            }
        }
    }

    /// Download `url` into the staging file and convert it in place.
    async fn transfer(
        &self,
        url: Url,
        staging: &StagingFile,
        format: CanonicalFormat,
    ) -> Result<(), FetchError> {
        debug!(url = %url, "Downloading image");
        let mut response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        // Stream the body to disk chunk by chunk
        let file = tokio::fs::File::create(staging.path())
            .await
            .map_err(|e| FetchError::io(staging.path(), e))?;
        let mut writer = BufWriter::new(file);
        while let Some(chunk) = response.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(staging.path(), e))?;
        }
        writer
            .flush()
            .await
            .map_err(|e| FetchError::io(staging.path(), e))?;
        drop(writer);

        // Decoding is CPU bound, keep it off the async workers
        let staged = staging.path().to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<(), FetchError> {
            let encoded = normalize_image(&staged, format)?;
            std::fs::write(&staged, encoded).map_err(|e| FetchError::io(&staged, e))
        })
        .await
        .map_err(|e| FetchError::Worker(e.to_string()))?
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, task: DownloadTask) -> DownloadOutcome {
        let result = self.try_fetch(&task).await;
        match result {
            Ok(Fetched::AlreadyPresent) => {
                debug!(url = task.source_url(), "File already exists, skipping download");
                DownloadOutcome::skipped(task)
            }
            Ok(Fetched::Downloaded) => {
                debug!(
                    url = task.source_url(),
                    dir = %task.destination_dir().display(),
                    "Downloaded"
                );
                DownloadOutcome::downloaded(task)
            }
            Err(e) => DownloadOutcome::failed(task, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::outcome::OutcomeStatus;
    use crate::utils::images::sample_png;
    use std::fs;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpAssetFetcher {
        HttpAssetFetcher::new(reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_download_normalizes_to_canonical_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/card_007.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_png(5, 7)))
            .expect(1)
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("cards");
        fs::create_dir(&dest).unwrap();
        let url = format!("{}/img/card_007.webp?v=3", server.uri());

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, &dest, CanonicalFormat::Png))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Downloaded, "{:?}", outcome.error);
        let written = fs::read(dest.join("card_007.png")).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Png);
        assert!(!dest.join("card_007.png.part").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_png(2, 2)))
            .expect(0)
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Hulk.png"), b"existing").unwrap();
        fs::write(temp_dir.path().join("Hulk.png.part"), b"stale").unwrap();
        let url = format!("{}/cards/Hulk.webp", server.uri());

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, temp_dir.path(), CanonicalFormat::Png))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Skipped);
        assert_eq!(fs::read(temp_dir.path().join("Hulk.png")).unwrap(), b"existing");
        assert!(!temp_dir.path().join("Hulk.png.part").exists());
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_artifacts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Thor.png.part"), b"left by a crash").unwrap();
        let url = format!("{}/cards/Thor.webp", server.uri());

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, temp_dir.path(), CanonicalFormat::Png))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(matches!(
            outcome.error,
            Some(FetchError::Status { status, .. }) if status == 404
        ));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_payload_leaves_no_artifacts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let url = format!("{}/cards/Loki.webp", server.uri());

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, temp_dir.path(), CanonicalFormat::Png))
            .await;

        assert!(matches!(outcome.error, Some(FetchError::Decode(_))));
        assert!(!temp_dir.path().join("Loki.png").exists());
        assert!(!temp_dir.path().join("Loki.png.part").exists());
    }

    #[tokio::test]
    async fn test_jpeg_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_png(4, 4)))
            .mount(&server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        let url = format!("{}/locations/Asgard.webp", server.uri());

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, temp_dir.path(), CanonicalFormat::Jpeg))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Downloaded, "{:?}", outcome.error);
        let written = fs::read(temp_dir.path().join("Asgard.jpg")).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_invalid_inputs_fail_without_network() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = fetcher();

        let missing = fetcher
            .fetch(DownloadTask::new("", temp_dir.path(), CanonicalFormat::Png))
            .await;
        assert!(matches!(missing.error, Some(FetchError::MissingUrl)));

        let malformed = fetcher
            .fetch(DownloadTask::new("::not-a-url", temp_dir.path(), CanonicalFormat::Png))
            .await;
        assert!(matches!(malformed.error, Some(FetchError::InvalidUrl { .. })));

        let nameless = fetcher
            .fetch(DownloadTask::new(
                "https://cdn.example/",
                temp_dir.path(),
                CanonicalFormat::Png,
            ))
            .await;
        assert!(matches!(nameless.error, Some(FetchError::NoFileName { .. })));
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_artifacts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 100000\r\n\r\n")
                .await
                .unwrap();
            // Larger than the writer's buffer so part of it reaches the disk
            socket.write_all(&vec![0x89; 20_000]).await.unwrap();
            socket.flush().await.unwrap();
        });
        let temp_dir = TempDir::new().unwrap();
        let url = format!("http://{}/cards/Wolverine.webp", addr);

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, temp_dir.path(), CanonicalFormat::Png))
            .await;

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(
            matches!(outcome.error, Some(FetchError::Request(_))),
            "{:?}",
            outcome.error
        );
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_refused_connection_leaves_no_artifacts() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Storm.png.part"), b"left by a crash").unwrap();
        let url = format!("http://{}/cards/Storm.webp", addr);

        let outcome = fetcher()
            .fetch(DownloadTask::new(url, temp_dir.path(), CanonicalFormat::Png))
            .await;

        assert!(matches!(outcome.error, Some(FetchError::Request(_))));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_staging_file_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.png.part");
        fs::write(&path, b"partial").unwrap();

        drop(StagingFile::new(path.clone()));

        assert!(!path.exists());
    }
}
