use tracing::debug;

use se_core::{FetchError, Release};

use crate::traits::{HttpClient, HttpFailure, ReqwestHttpClient};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const GITHUB_V3_JSON: &str = "application/vnd.github.v3+json";

/// Reads release metadata from a GitHub-compatible releases API.
pub struct ReleaseClient<C = ReqwestHttpClient> {
    base_url: String,
    http: C,
}

impl ReleaseClient<ReqwestHttpClient> {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_API_URL.to_string(), ReqwestHttpClient::new(token))
    }
}

impl<C: HttpClient> ReleaseClient<C> {
    pub fn with_base_url(base_url: String, http: C) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn release_url(&self, repository: &str, tag: &str) -> String {
        format!("{}/repos/{}/releases/tags/{}", self.base_url, repository, tag)
    }

    /// Fetch the release tagged `tag`. One attempt, no retries.
    pub async fn fetch_release(&self, repository: &str, tag: &str) -> Result<Release, FetchError> {
        let url = self.release_url(repository, tag);
        debug!(%url, "fetching release metadata");

        let body = self
            .http
            .get(&url, GITHUB_V3_JSON)
            .await
            .map_err(|e| match e {
                HttpFailure::Status { code: 404, .. } => FetchError::ReleaseNotFound {
                    repository: repository.to_string(),
                    release: tag.to_string(),
                },
                other => FetchError::Transport {
                    status: other.status(),
                    reason: other.reason(),
                },
            })?;

        let release: Release = serde_json::from_slice(&body).map_err(|e| FetchError::Transport {
            status: None,
            reason: format!("failed to parse release JSON: {e}"),
        })?;

        debug!(
            tag = %release.tag_name,
            assets = release.assets.len(),
            "fetched release metadata"
        );

        Ok(release)
    }
}
