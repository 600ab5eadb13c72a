//! Download command implementation.

use console::style;
use std::path::Path;

use se_core::{DownloadError, Error, Manifest};
use se_io::{ArtifactPipeline, CiEnvironment, ClientConfig, DownloadJob, DownloadOutcome, load_manifest};

use crate::display::{
    ProgressStyles, create_progress_callback, format_bytes, print_diagnostic, print_step,
    should_show_progress,
};

/// Run the download command.
pub async fn run(
    ci: &CiEnvironment,
    client: ClientConfig,
    manifest_path: &Path,
    job: DownloadJob,
) -> Result<DownloadOutcome, Error> {
    let manifest = load_manifest(manifest_path)?;
    fetch(ci, client, &manifest, &job).await
}

/// Resolve and download `job` for an already loaded manifest, then publish the
/// `filename` output.
pub async fn fetch(
    ci: &CiEnvironment,
    client: ClientConfig,
    manifest: &Manifest,
    job: &DownloadJob,
) -> Result<DownloadOutcome, Error> {
    print_step(format!(
        "Resolving {} {} for {}/{}",
        style(manifest.display_name()).bold(),
        job.query.version,
        job.query.os,
        job.query.arch
    ));

    let pipeline = ArtifactPipeline::new(client);
    let (pipeline, bar) = if should_show_progress(ci) {
        let label = job
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (callback, bar) = create_progress_callback(&label, ProgressStyles::default());
        (pipeline.with_progress(callback), Some(bar))
    } else {
        (pipeline, None)
    };

    let outcome = pipeline.download(manifest, job).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let outcome = outcome?;

    if outcome.result.transferred {
        let size = std::fs::metadata(&outcome.result.local_path)
            .map(|m| m.len())
            .unwrap_or(0);
        print_step(format!(
            "Downloaded {} ({}), sha256 verified",
            style(&outcome.asset.filename).green(),
            format_bytes(size)
        ));
    } else {
        print_diagnostic(
            ci,
            &ci.notice_line(&format!(
                "{} already exists, verified without downloading",
                outcome.result.local_path.display()
            )),
        );
    }

    publish_filename(ci, &outcome.asset.filename)?;
    Ok(outcome)
}

fn publish_filename(ci: &CiEnvironment, filename: &str) -> Result<(), Error> {
    ci.append_output("filename", filename).map_err(|e| {
        DownloadError::Io {
            path: ci.output_file.clone().unwrap_or_default(),
            message: e.to_string(),
        }
        .into()
    })
}
