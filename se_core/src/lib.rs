pub mod errors;
pub mod manifest;
pub mod release;
pub mod resolve;

pub use errors::{DownloadError, Error, FetchError, InstallError, ManifestError, ResolutionError};
pub use manifest::{DirectStrategy, Manifest, PatternStrategy, Strategy};
pub use release::{Release, ReleaseAsset, ReleaseQuery};
pub use resolve::{AssetSelector, ResolvedAsset, prepare, resolve};
