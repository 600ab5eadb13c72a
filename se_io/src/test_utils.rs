//! Test utilities for setup-everything
//!
//! - `TestContext` - Wraps TempDir, MockServer, and an `ArtifactPipeline` pointed at it
//! - Release fixtures - Mock release listings and asset downloads
//! - Archive fixtures - Build tar.gz and zip payloads in memory
//! - Network failure helpers - 500/404 responses, truncated bodies
//!
//! # Example
//!
//! ```ignore
//! use se_io::test_utils::{TestContext, mock_tar_gz};
//!
//! #[tokio::test]
//! async fn test_download() {
//!     let ctx = TestContext::new().await;
//!     let sha = ctx.mount_asset("tool.tar.gz", &mock_tar_gz(&[("tool", b"bin")])).await;
//!     ctx.mount_release("acme/tool", "v1.0", &["tool.tar.gz"]).await;
//!     // ...
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use crate::checksum::sha256_hex;
use crate::pipeline::{ArtifactPipeline, ClientConfig};

// ============================================================================
// Release fixtures
// ============================================================================

/// Release metadata JSON listing `assets`, each downloadable from `base_url/download/<name>`.
pub fn mock_release_json(tag: &str, assets: &[&str], base_url: &str) -> String {
    let entries: Vec<String> = assets
        .iter()
        .map(|name| {
            format!(
                r#"{{ "name": "{name}", "browser_download_url": "{base_url}/download/{name}" }}"#
            )
        })
        .collect();

    format!(
        r#"{{ "tag_name": "{tag}", "assets": [{}] }}"#,
        entries.join(", ")
    )
}

// ============================================================================
// Archive fixtures
// ============================================================================

/// Plain (uncompressed) tar with one regular file per entry.
pub fn mock_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for (rel_path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(rel_path).unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *content).unwrap();
    }

    builder.into_inner().unwrap()
}

/// Gzipped tar with one regular file per entry.
pub fn mock_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&mock_tar(files)).unwrap();
    encoder.finish().unwrap()
}

pub fn mock_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

// ============================================================================
// Network failure helpers
// ============================================================================

pub fn mock_500_error(message: Option<&str>) -> ResponseTemplate {
    let mut response = ResponseTemplate::new(500);
    if let Some(msg) = message {
        response = response.set_body_string(msg);
    }
    response
}

pub fn mock_404_error() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#)
}

/// Serve only the leading `fraction` of `full_data`, as if the connection dropped.
pub fn mock_partial_download(full_data: &[u8], fraction: f64) -> ResponseTemplate {
    let len = (full_data.len() as f64 * fraction.clamp(0.0, 1.0)) as usize;
    ResponseTemplate::new(200).set_body_bytes(full_data[..len].to_vec())
}

// ============================================================================
// TestContext - Main test infrastructure
// ============================================================================

/// Temporary directory plus a mock registry that serves both release metadata
/// (`/repos/{repo}/releases/tags/{tag}`) and asset bodies (`/download/{name}`).
pub struct TestContext {
    pub tmp: TempDir,
    pub mock_server: MockServer,
}

impl TestContext {
    pub async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let tmp = TempDir::new().expect("failed to create temp dir");

        Self { tmp, mock_server }
    }

    /// Client settings pointing the pipeline at the mock server.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.mock_server.uri(),
            token: None,
        }
    }

    pub fn pipeline(&self) -> ArtifactPipeline {
        ArtifactPipeline::new(self.client_config())
    }

    /// Directory downloads land in.
    pub fn downloads(&self) -> PathBuf {
        self.tmp.path().join("downloads")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.tmp.path().join("bin")
    }

    /// Write `json` to `manifest.json` in the temp dir and return its path.
    pub fn write_manifest(&self, json: &str) -> PathBuf {
        let path = self.tmp.path().join("manifest.json");
        fs::write(&path, json).expect("failed to write manifest");
        path
    }

    /// Mount the release listing for `repo`@`tag`, expecting it to be requested
    /// exactly `expected` times.
    pub async fn mount_release_expect(&self, repo: &str, tag: &str, assets: &[&str], expected: u64) {
        let json = mock_release_json(tag, assets, &self.mock_server.uri());

        Mock::given(method("GET"))
            .and(path(format!("/repos/{repo}/releases/tags/{tag}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(json))
            .expect(expected)
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mount_release(&self, repo: &str, tag: &str, assets: &[&str]) {
        let json = mock_release_json(tag, assets, &self.mock_server.uri());

        Mock::given(method("GET"))
            .and(path(format!("/repos/{repo}/releases/tags/{tag}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(json))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mount_release_error(&self, repo: &str, tag: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{repo}/releases/tags/{tag}")))
            .respond_with(response)
            .mount(&self.mock_server)
            .await;
    }

    /// Serve `body` at `/download/{name}` and return its SHA-256.
    pub async fn mount_asset(&self, name: &str, body: &[u8]) -> String {
        Mock::given(method("GET"))
            .and(path(format!("/download/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.mock_server)
            .await;

        sha256_hex(body)
    }

    pub async fn mount_asset_response(&self, name: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/download/{name}")))
            .respond_with(response)
            .mount(&self.mock_server)
            .await;
    }

    /// Like [`mount_asset`](Self::mount_asset), but asserts the number of transfers
    /// when the server is dropped.
    pub async fn mount_asset_expect(&self, name: &str, body: &[u8], expected: u64) -> String {
        Mock::given(method("GET"))
            .and(path(format!("/download/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .expect(expected)
            .mount(&self.mock_server)
            .await;

        sha256_hex(body)
    }
}

// ============================================================================
// Module tests
// ============================================================================
