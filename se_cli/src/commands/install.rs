//! Install command implementation.

use console::style;
use std::path::Path;

use se_core::{Error, InstallError, Manifest};
use se_io::{CiEnvironment, InstallResult, install_artifact, load_manifest};

use crate::display::{print_diagnostic, print_step};

/// Run the install command.
pub fn run(
    ci: &CiEnvironment,
    manifest_path: &Path,
    name: Option<&str>,
    file: &Path,
    install_dir: &Path,
) -> Result<InstallResult, Error> {
    let manifest = load_manifest(manifest_path)?;
    install(ci, &manifest, name, file, install_dir)
}

/// Install a verified file and add the install directory to the CI path sink.
pub fn install(
    ci: &CiEnvironment,
    manifest: &Manifest,
    name: Option<&str>,
    file: &Path,
    install_dir: &Path,
) -> Result<InstallResult, Error> {
    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| manifest.display_name());
    print_step(format!(
        "Installing {} into {}",
        style(name).bold(),
        install_dir.display()
    ));

    let result = install_artifact(manifest, file, install_dir)?;

    if result.installed.is_empty() {
        print_diagnostic(
            ci,
            &ci.notice_line(&format!(
                "no files in {} matched the extract patterns",
                file.display()
            )),
        );
    }
    for path in &result.installed {
        println!("    {} {}", style("✓").green(), path.display());
    }

    ci.append_path(&result.install_dir)
        .map_err(|e| InstallError::Io {
            path: ci.path_file.clone().unwrap_or_default(),
            message: e.to_string(),
        })?;

    Ok(result)
}
