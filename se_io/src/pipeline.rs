//! The acquisition pipeline: resolve -> fetch listing -> select -> verified download,
//! then optionally install.

use std::path::{Path, PathBuf};

use tracing::info;

use se_core::{Error, Manifest, ReleaseQuery, ResolvedAsset, prepare};

use crate::download::{DownloadResult, Downloader};
use crate::install::{InstallResult, Installer};
use crate::release::{DEFAULT_API_URL, ReleaseClient};
use crate::traits::{HttpClient, ProgressCallback, ReqwestHttpClient};

/// Connection settings for the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
        }
    }
}

/// One artifact to acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub query: ReleaseQuery,
    pub destination: PathBuf,
    pub expected_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub asset: ResolvedAsset,
    pub result: DownloadResult,
}

pub struct ArtifactPipeline<C = ReqwestHttpClient> {
    releases: ReleaseClient<C>,
    downloader: Downloader<C>,
}

impl ArtifactPipeline<ReqwestHttpClient> {
    pub fn new(config: ClientConfig) -> Self {
        let http = ReqwestHttpClient::new(config.token);
        Self::from_parts(
            ReleaseClient::with_base_url(config.api_url, http.clone()),
            Downloader::new(http),
        )
    }
}

impl<C: HttpClient> ArtifactPipeline<C> {
    pub fn from_parts(releases: ReleaseClient<C>, downloader: Downloader<C>) -> Self {
        Self {
            releases,
            downloader,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.downloader = self.downloader.with_progress(progress);
        self
    }

    /// Resolve the asset for `query`. Manifest-level problems are reported before
    /// the release listing is requested.
    pub async fn resolve(
        &self,
        manifest: &Manifest,
        query: &ReleaseQuery,
    ) -> Result<ResolvedAsset, Error> {
        let selector = prepare(manifest, query)?;

        if !selector.needs_listing() {
            return Ok(selector.select(&[])?);
        }

        let tag = query.release_tag();
        let release = self
            .releases
            .fetch_release(&manifest.repository, &tag)
            .await?;

        Ok(selector.select(&release.assets)?)
    }

    pub async fn download(
        &self,
        manifest: &Manifest,
        job: &DownloadJob,
    ) -> Result<DownloadOutcome, Error> {
        let asset = self.resolve(manifest, &job.query).await?;
        info!(
            repository = %manifest.repository,
            asset = %asset.filename,
            "resolved release asset"
        );

        let result = self
            .downloader
            .download_verified(&asset, &job.destination, &job.expected_sha256)
            .await?;

        Ok(DownloadOutcome { asset, result })
    }
}

/// Install a verified file using the manifest's extract filters.
pub fn install_artifact(
    manifest: &Manifest,
    file: &Path,
    install_dir: &Path,
) -> Result<InstallResult, Error> {
    let installer = Installer::new(manifest.extract_filters.clone());
    Ok(installer.install(file, install_dir)?)
}
