use serde::{Deserialize, Serialize};

/// The target of one invocation: which build of the tool to acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    pub arch: String,
    pub os: String,
    pub version: String,
    pub release: Option<String>,
}

impl ReleaseQuery {
    pub fn new(
        arch: impl Into<String>,
        os: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
            version: version.into(),
            release: None,
        }
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    /// Release tag to look up, `v<version>` unless set explicitly.
    pub fn release_tag(&self) -> String {
        match &self.release {
            Some(tag) if !tag.is_empty() => tag.clone(),
            _ => format!("v{}", self.version),
        }
    }
}

/// Release metadata as returned by the releases-by-tag endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}
