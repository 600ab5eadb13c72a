use std::fmt;
use std::path::PathBuf;

/// Top-level error, one variant per pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Manifest(ManifestError),
    Fetch(FetchError),
    Resolution(ResolutionError),
    Download(DownloadError),
    Install(InstallError),
}

impl Error {
    /// Short name of the stage that failed, used as a diagnostic prefix.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Manifest(_) => "manifest",
            Error::Fetch(_) => "fetch",
            Error::Resolution(_) => "resolve",
            Error::Download(_) => "download",
            Error::Install(_) => "install",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManifestError {
    NotFound { path: PathBuf },
    Malformed { path: Option<PathBuf>, message: String },
    SchemaViolation { field: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    ReleaseNotFound {
        repository: String,
        release: String,
    },
    Transport {
        status: Option<u16>,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    NoRepo,
    NoStrategyConfig {
        field: &'static str,
    },
    NoOsEntry {
        os: String,
        available: Vec<String>,
    },
    NoArchEntry {
        os: String,
        arch: String,
        available: Vec<String>,
    },
    NoMatchingAsset {
        target: String,
        exact: bool,
        available: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadError {
    Transport {
        url: String,
        status: Option<u16>,
        reason: String,
    },
    ChecksumMismatch {
        expected: String,
        actual: String,
        file_name: Option<String>,
    },
    Io {
        path: PathBuf,
        message: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallError {
    Io { path: PathBuf, message: String },
    Archive { path: PathBuf, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Manifest(e) => e.fmt(f),
            Error::Fetch(e) => e.fmt(f),
            Error::Resolution(e) => e.fmt(f),
            Error::Download(e) => e.fmt(f),
            Error::Install(e) => e.fmt(f),
        }
    }
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::NotFound { path } => {
                write!(f, "manifest file not found: {}", path.display())
            }
            ManifestError::Malformed { path, message } => {
                write!(f, "invalid JSON in manifest")?;
                if let Some(path) = path {
                    write!(f, " '{}'", path.display())?;
                }
                write!(f, ": {}", message)
            }
            ManifestError::SchemaViolation { field, message } => {
                write!(f, "manifest field '{}' {}", field, message)
            }
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::ReleaseNotFound {
                repository,
                release,
            } => {
                write!(
                    f,
                    "release '{}' not found in repository '{}' (hint: check the version and the release tag format, default is v<version>)",
                    release, repository
                )
            }
            FetchError::Transport { status, reason } => {
                write!(f, "failed to fetch release information: ")?;
                if let Some(status) = status {
                    write!(f, "HTTP {} ", status)?;
                }
                write!(f, "{}", reason)
            }
        }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::NoRepo => write!(f, "repository not specified in manifest"),
            ResolutionError::NoStrategyConfig { field } => {
                write!(f, "'{}' not specified in manifest", field)
            }
            ResolutionError::NoOsEntry { os, available } => {
                write!(f, "no assets configured for OS '{}'", os)?;
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
            ResolutionError::NoArchEntry {
                os,
                arch,
                available,
            } => {
                write!(f, "no asset configured for architecture '{}' on '{}'", arch, os)?;
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
            ResolutionError::NoMatchingAsset {
                target,
                exact,
                available,
            } => {
                if *exact {
                    write!(f, "no asset named '{}' in release", target)?;
                } else {
                    write!(f, "no matching asset found for pattern: {}", target)?;
                }
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Transport {
                url,
                status,
                reason,
            } => {
                write!(f, "failed to download {}: ", url)?;
                if let Some(status) = status {
                    write!(f, "HTTP {} ", status)?;
                }
                write!(f, "{}", reason)
            }
            DownloadError::ChecksumMismatch {
                expected,
                actual,
                file_name,
            } => {
                write!(f, "checksum verification failed")?;
                if let Some(name) = file_name {
                    write!(f, " for '{}'", name)?;
                }
                write!(f, ": expected {}, got {}", expected, actual)?;
                write!(
                    f,
                    " (hint: update the expected sha256 if the release was republished)"
                )
            }
            DownloadError::Io { path, message } => {
                write!(f, "failed to write {}: {}", path.display(), message)
            }
        }
    }
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::Io { path, message } => {
                write!(f, "failed to install {}: {}", path.display(), message)
            }
            InstallError::Archive { path, message } => {
                write!(f, "failed to extract {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ManifestError {}
impl std::error::Error for FetchError {}
impl std::error::Error for ResolutionError {}
impl std::error::Error for DownloadError {}
impl std::error::Error for InstallError {}

impl From<ManifestError> for Error {
    fn from(e: ManifestError) -> Self {
        Error::Manifest(e)
    }
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        Error::Fetch(e)
    }
}

impl From<ResolutionError> for Error {
    fn from(e: ResolutionError) -> Self {
        Error::Resolution(e)
    }
}

impl From<DownloadError> for Error {
    fn from(e: DownloadError) -> Self {
        Error::Download(e)
    }
}

impl From<InstallError> for Error {
    fn from(e: InstallError) -> Self {
        Error::Install(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_not_found_names_release_and_repository() {
        let err = Error::from(FetchError::ReleaseNotFound {
            repository: "aquasecurity/trivy".to_string(),
            release: "v0.0.1".to_string(),
        });

        let msg = err.to_string();
        assert!(msg.contains("aquasecurity/trivy"));
        assert!(msg.contains("v0.0.1"));
        assert!(msg.contains("hint:"));
        assert_eq!(err.stage(), "fetch");
    }

    #[test]
    fn checksum_mismatch_display_includes_both_digests() {
        let err = Error::from(DownloadError::ChecksumMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
            file_name: Some("trivy.tar.gz".to_string()),
        });

        let msg = err.to_string();
        assert!(msg.contains("trivy.tar.gz"));
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
        assert_eq!(err.stage(), "download");
    }

    #[test]
    fn no_arch_entry_lists_available_architectures() {
        let err = ResolutionError::NoArchEntry {
            os: "Linux".to_string(),
            arch: "IA32".to_string(),
            available: vec!["ARM64".to_string(), "X64".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("IA32"));
        assert!(msg.contains("ARM64, X64"));
    }

    #[test]
    fn pattern_mismatch_reports_pattern() {
        let err = ResolutionError::NoMatchingAsset {
            target: "tool_1.0_linux".to_string(),
            exact: false,
            available: Vec::new(),
        };

        assert_eq!(
            err.to_string(),
            "no matching asset found for pattern: tool_1.0_linux"
        );
    }

    #[test]
    fn diagnostics_fit_on_one_line() {
        let errors = [
            Error::from(FetchError::ReleaseNotFound {
                repository: "acme/tool".to_string(),
                release: "v1.0".to_string(),
            }),
            Error::from(DownloadError::ChecksumMismatch {
                expected: "abc".to_string(),
                actual: "def".to_string(),
                file_name: Some("tool.tar.gz".to_string()),
            }),
            Error::from(ResolutionError::NoMatchingAsset {
                target: "tool".to_string(),
                exact: true,
                available: vec!["tool.sha256".to_string()],
            }),
        ];

        for err in errors {
            assert!(!err.to_string().contains('\n'), "{err}");
        }
    }

    #[test]
    fn transport_error_includes_status() {
        let err = FetchError::Transport {
            status: Some(503),
            reason: "Service Unavailable".to_string(),
        };

        assert!(err.to_string().contains("HTTP 503 Service Unavailable"));
    }
}
