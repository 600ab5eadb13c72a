pub mod checksum;
pub mod ci;
pub mod download;
pub mod install;
pub mod manifest;
pub mod pipeline;
pub mod release;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use checksum::{sha256_file, sha256_hex};
pub use ci::CiEnvironment;
pub use download::{DownloadResult, Downloader};
pub use install::{ArchiveKind, InstallResult, Installer, detect_archive};
pub use manifest::load_manifest;
pub use pipeline::{ArtifactPipeline, ClientConfig, DownloadJob, DownloadOutcome, install_artifact};
pub use release::{DEFAULT_API_URL, ReleaseClient};
pub use traits::{HttpClient, HttpFailure, ProgressCallback, ReqwestHttpClient};
