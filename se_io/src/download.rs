//! Checksum-gated artifact download.
//!
//! The body is streamed into a `.part` file next to the destination and only
//! renamed into place once its SHA-256 matches. A destination that already exists
//! is never re-downloaded, only re-verified.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use se_core::{DownloadError, ResolvedAsset};

use crate::checksum::sha256_file;
use crate::traits::{HttpClient, ProgressCallback, ReqwestHttpClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub local_path: PathBuf,
    pub filename: String,
    pub verified: bool,
    /// False when an existing file was reused instead of downloaded.
    pub transferred: bool,
}

pub struct Downloader<C = ReqwestHttpClient> {
    http: C,
    progress: Option<ProgressCallback>,
}

impl<C: HttpClient> Downloader<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn download_verified(
        &self,
        asset: &ResolvedAsset,
        destination: &Path,
        expected_sha256: &str,
    ) -> Result<DownloadResult, DownloadError> {
        if destination.exists() {
            info!(path = %destination.display(), "file already exists, skipping download");
            verify(destination, expected_sha256, &asset.filename).await?;
            return Ok(DownloadResult {
                local_path: destination.to_path_buf(),
                filename: asset.filename.clone(),
                verified: true,
                transferred: false,
            });
        }

        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let partial = PartialDownload::new(destination);
        debug!(url = %asset.download_url, tmp = %partial.path().display(), "downloading artifact");

        let bytes = self
            .http
            .download(&asset.download_url, partial.path(), self.progress.clone())
            .await
            .map_err(|e| DownloadError::Transport {
                url: asset.download_url.clone(),
                status: e.status(),
                reason: e.reason(),
            })?;

        debug!(bytes, "download complete, verifying checksum");
        verify(partial.path(), expected_sha256, &asset.filename).await?;

        let local_path = partial.commit()?;
        Ok(DownloadResult {
            local_path,
            filename: asset.filename.clone(),
            verified: true,
            transferred: true,
        })
    }
}

/// Compare the file's digest with `expected`; on mismatch the file is deleted.
async fn verify(path: &Path, expected: &str, file_name: &str) -> Result<(), DownloadError> {
    let actual = sha256_file(path).await.map_err(|e| io_error(path, e))?;

    if actual != expected {
        if path.exists() {
            fs::remove_file(path).map_err(|e| io_error(path, e))?;
        }
        return Err(DownloadError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
            file_name: Some(file_name.to_string()),
        });
    }

    debug!(path = %path.display(), "checksum verification passed");
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// A download in progress. Removed on drop unless committed.
struct PartialDownload {
    tmp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl PartialDownload {
    fn new(final_path: &Path) -> Self {
        let name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        let tmp_name = format!(".{}.{}.part", name, std::process::id());

        Self {
            tmp_path: final_path.with_file_name(tmp_name),
            final_path: final_path.to_path_buf(),
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.tmp_path
    }

    fn commit(mut self) -> Result<PathBuf, DownloadError> {
        fs::rename(&self.tmp_path, &self.final_path).map_err(|e| io_error(&self.final_path, e))?;
        self.committed = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for PartialDownload {
    fn drop(&mut self) {
        if !self.committed && self.tmp_path.exists() {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::sha256_hex;
    use crate::traits::{HttpFailure, MockHttpClient};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asset(url: &str) -> ResolvedAsset {
        ResolvedAsset {
            filename: "tool_1.0_linux_amd64.tar.gz".to_string(),
            download_url: url.to_string(),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn downloads_and_verifies() {
        let mock_server = MockServer::start().await;
        let body = b"artifact bytes".to_vec();
        let sha = sha256_hex(&body);

        Mock::given(method("GET"))
            .and(path("/tool.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");
        let downloader = Downloader::new(ReqwestHttpClient::default());

        let result = downloader
            .download_verified(&asset(&format!("{}/tool.tar.gz", mock_server.uri())), &dest, &sha)
            .await
            .unwrap();

        assert!(result.verified);
        assert!(result.transferred);
        assert_eq!(result.local_path, dest);
        assert_eq!(result.filename, "tool_1.0_linux_amd64.tar.gz");
        assert_eq!(fs::read(&dest).unwrap(), body);
        assert_eq!(entries(tmp.path()), vec!["tool.tar.gz".to_string()]);
    }

    #[tokio::test]
    async fn checksum_mismatch_leaves_no_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&mock_server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");
        let downloader = Downloader::new(ReqwestHttpClient::default());

        let err = downloader
            .download_verified(&asset(&format!("{}/x", mock_server.uri())), &dest, "0000")
            .await
            .unwrap_err();

        match err {
            DownloadError::ChecksumMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "0000");
                assert_eq!(actual, sha256_hex(b"tampered"));
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
        assert!(!dest.exists());
        assert!(entries(tmp.path()).is_empty(), "no .part file may remain");
    }

    #[tokio::test]
    async fn existing_destination_skips_transfer() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");
        fs::write(&dest, b"cached").unwrap();

        let mut http = MockHttpClient::new();
        http.expect_download().times(0);
        let downloader = Downloader::new(http);

        let result = downloader
            .download_verified(&asset("https://example.com/tool"), &dest, &sha256_hex(b"cached"))
            .await
            .unwrap();

        assert!(result.verified);
        assert!(!result.transferred);
        assert_eq!(fs::read(&dest).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn repeated_invocation_transfers_once() {
        let mock_server = MockServer::start().await;
        let body = b"payload".to_vec();
        let sha = sha256_hex(&body);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");
        let downloader = Downloader::new(ReqwestHttpClient::default());
        let asset = asset(&format!("{}/tool", mock_server.uri()));

        let first = downloader.download_verified(&asset, &dest, &sha).await.unwrap();
        let second = downloader.download_verified(&asset, &dest, &sha).await.unwrap();

        assert!(first.transferred);
        assert!(!second.transferred);
        // MockServer verifies `expect(1)` on drop.
    }

    #[tokio::test]
    async fn existing_file_with_wrong_checksum_is_removed() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");
        fs::write(&dest, b"stale").unwrap();

        let mut http = MockHttpClient::new();
        http.expect_download().times(0);
        let downloader = Downloader::new(http);

        let err = downloader
            .download_verified(&asset("https://example.com/tool"), &dest, &sha256_hex(b"fresh"))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::ChecksumMismatch { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn checksum_comparison_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");
        fs::write(&dest, b"cached").unwrap();

        let downloader = Downloader::new(MockHttpClient::new());
        let err = downloader
            .download_verified(
                &asset("https://example.com/tool"),
                &dest,
                &sha256_hex(b"cached").to_uppercase(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn transport_failure_cleans_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("tool.tar.gz");

        let mut http = MockHttpClient::new();
        http.expect_download().times(1).returning(|_, dest, _| {
            fs::write(dest, b"half").unwrap();
            Err(HttpFailure::Network("connection reset".to_string()))
        });
        let downloader = Downloader::new(http);

        let err = downloader
            .download_verified(&asset("https://example.com/tool"), &dest, "abc")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DownloadError::Transport { status: None, ref reason, .. } if reason == "connection reset"
        ));
        assert!(entries(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let tmp = TempDir::new().unwrap();
        let downloader = Downloader::new(ReqwestHttpClient::default());
        let err = downloader
            .download_verified(
                &asset(&format!("{}/gone", mock_server.uri())),
                &tmp.path().join("gone"),
                "abc",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Transport { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let mock_server = MockServer::start().await;
        let body = b"nested".to_vec();
        let sha = sha256_hex(&body);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&mock_server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a/b/tool.tar.gz");
        let downloader = Downloader::new(ReqwestHttpClient::default());

        downloader
            .download_verified(&asset(&format!("{}/t", mock_server.uri())), &dest, &sha)
            .await
            .unwrap();

        assert!(dest.exists());
    }
}
