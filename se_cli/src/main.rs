//! setup-everything CLI - resolve, verify and install release artifacts in CI.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use se_core::ReleaseQuery;
use se_io::{CiEnvironment, ClientConfig, DEFAULT_API_URL, DownloadJob};

mod commands;
mod display;

use display::print_diagnostic;

/// Environment variable holding the log filter (e.g. `se_io=debug`).
const LOG_ENV: &str = "SETUP_EVERYTHING_LOG";

#[derive(Parser, Debug)]
#[command(name = "setup-everything")]
#[command(about = "Download, verify and install tool release artifacts")]
#[command(version)]
struct Cli {
    /// Token for authenticated release metadata and downloads
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    github_token: Option<String>,

    /// Base URL of the release registry API
    #[arg(long, env = "GITHUB_API_URL", global = true, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Emit CI workflow commands instead of plain diagnostics
    #[arg(long, env = "CI", global = true, hide = true)]
    ci: Option<String>,

    /// File receiving step outputs
    #[arg(long, env = "GITHUB_OUTPUT", global = true, hide = true)]
    github_output: Option<PathBuf>,

    /// File receiving directories to add to PATH
    #[arg(long, env = "GITHUB_PATH", global = true, hide = true)]
    github_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a release asset and download it with checksum verification
    Download(DownloadArgs),

    /// Install a verified file into a directory
    Install(InstallArgs),

    /// Download and install in one step
    Setup {
        #[command(flatten)]
        download: DownloadArgs,

        /// Display name (defaults to the manifest name)
        #[arg(long, env = "NAME")]
        name: Option<String>,

        /// Directory receiving the installed files
        #[arg(long, env = "INSTALL_DIR")]
        install_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Target architecture (e.g. X64, ARM64)
    #[arg(long, env = "ARCH")]
    arch: String,

    /// Target OS (Linux, Windows, macOS)
    #[arg(long, env = "OS")]
    os: String,

    /// Tool version
    #[arg(long, env = "VERSION")]
    version: String,

    /// Release tag (defaults to v<version>)
    #[arg(long, env = "RELEASE")]
    release: Option<String>,

    /// Destination path for the downloaded file
    #[arg(long, env = "FILE")]
    file: PathBuf,

    /// Expected SHA-256 of the artifact (lowercase hex)
    #[arg(long, env = "SHA256")]
    sha256: String,

    /// Path to the tool manifest
    #[arg(long, env = "MANIFEST")]
    manifest: PathBuf,
}

#[derive(Args, Debug)]
struct InstallArgs {
    /// Verified file to install
    #[arg(long, env = "FILE")]
    file: PathBuf,

    /// Display name (defaults to the manifest name)
    #[arg(long, env = "NAME")]
    name: Option<String>,

    /// Directory receiving the installed files
    #[arg(long, env = "INSTALL_DIR")]
    install_dir: PathBuf,

    /// Path to the tool manifest
    #[arg(long, env = "MANIFEST")]
    manifest: PathBuf,
}

impl Cli {
    fn ci_environment(&self) -> CiEnvironment {
        CiEnvironment {
            is_ci: self
                .ci
                .as_deref()
                .is_some_and(|v| !v.is_empty() && v != "false"),
            output_file: self.github_output.clone().filter(|p| !p.as_os_str().is_empty()),
            path_file: self.github_path.clone().filter(|p| !p.as_os_str().is_empty()),
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            token: self.github_token.clone(),
        }
    }
}

impl DownloadArgs {
    fn job(&self) -> DownloadJob {
        let mut query = ReleaseQuery::new(&self.arch, &self.os, &self.version);
        if let Some(release) = &self.release {
            query = query.with_release(release);
        }

        DownloadJob {
            query,
            destination: self.file.clone(),
            expected_sha256: self.sha256.clone(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    init_tracing();

    let ci = cli.ci_environment();
    if let Err(e) = run(cli, &ci).await {
        tracing::debug!(stage = e.stage(), "command failed");
        let message = format!("{}: {}", e.stage(), e);
        print_diagnostic(&ci, &ci.error_line(&message));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, ci: &CiEnvironment) -> Result<(), se_core::Error> {
    let client = cli.client_config();

    match cli.command {
        Commands::Download(args) => {
            commands::download::run(ci, client, &args.manifest, args.job()).await?;
        }
        Commands::Install(args) => {
            commands::install::run(
                ci,
                &args.manifest,
                args.name.as_deref(),
                &args.file,
                &args.install_dir,
            )?;
        }
        Commands::Setup {
            download,
            name,
            install_dir,
        } => {
            commands::setup::run(
                ci,
                client,
                &download.manifest,
                download.job(),
                name.as_deref(),
                &install_dir,
            )
            .await?;
        }
    }

    Ok(())
}
