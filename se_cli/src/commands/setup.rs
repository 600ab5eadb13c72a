//! Setup command: download, verify and install in one invocation.

use std::path::Path;

use se_core::Error;
use se_io::{CiEnvironment, ClientConfig, DownloadJob, load_manifest};

use super::{download, install};

pub async fn run(
    ci: &CiEnvironment,
    client: ClientConfig,
    manifest_path: &Path,
    job: DownloadJob,
    name: Option<&str>,
    install_dir: &Path,
) -> Result<(), Error> {
    let manifest = load_manifest(manifest_path)?;

    let outcome = download::fetch(ci, client, &manifest, &job).await?;
    install::install(ci, &manifest, name, &outcome.result.local_path, install_dir)?;

    Ok(())
}
