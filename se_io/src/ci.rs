//! CI integration: workflow-command diagnostics and the outputs/path files.
//!
//! Nothing here reads the environment. The CLI builds a [`CiEnvironment`] from its
//! flags and environment variables once and passes it down.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    /// Emit `::error::`-style workflow commands instead of plain text.
    pub is_ci: bool,
    /// File receiving `name=value` step outputs (`$GITHUB_OUTPUT`).
    pub output_file: Option<PathBuf>,
    /// File receiving directories to prepend to `PATH` (`$GITHUB_PATH`).
    pub path_file: Option<PathBuf>,
}

impl CiEnvironment {
    pub fn error_line(&self, message: &str) -> String {
        self.format_line("error", "Error", message)
    }

    pub fn notice_line(&self, message: &str) -> String {
        self.format_line("notice", "Notice", message)
    }

    fn format_line(&self, command: &str, label: &str, message: &str) -> String {
        if self.is_ci {
            format!("::{}::{}", command, message.replace('\n', "%0A"))
        } else {
            format!("{}: {}", label, message)
        }
    }

    /// Append `name=value` to the outputs file. No-op when not configured.
    pub fn append_output(&self, name: &str, value: &str) -> io::Result<()> {
        match &self.output_file {
            Some(file) => append_line(file, &format!("{name}={value}")),
            None => Ok(()),
        }
    }

    /// Append a directory to the path file. No-op when not configured.
    pub fn append_path(&self, dir: &Path) -> io::Result<()> {
        match &self.path_file {
            Some(file) => append_line(file, &dir.display().to_string()),
            None => Ok(()),
        }
    }
}

fn append_line(file: &Path, line: &str) -> io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(file)?;
    writeln!(f, "{line}")
}
