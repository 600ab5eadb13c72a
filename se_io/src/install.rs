//! Placing a verified artifact on the install directory.
//!
//! Archives (zip, tar, tar.gz, tar.xz) are recognised by content rather than name.
//! Members whose path contains one of the manifest's extract filters are unpacked
//! into a scratch directory, then every regular file is copied flat into the install
//! directory and made executable. Anything else is treated as a bare executable.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;
use walkdir::WalkDir;
use xz2::read::XzDecoder;

use se_core::InstallError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const TAR_BLOCK: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    TarXz,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub install_dir: PathBuf,
    /// Files written into `install_dir`, in copy order.
    pub installed: Vec<PathBuf>,
    pub archive: Option<ArchiveKind>,
}

pub struct Installer {
    filters: Vec<String>,
}

impl Installer {
    pub fn new(filters: Vec<String>) -> Self {
        Self { filters }
    }

    /// Whether an archive member should be extracted under the configured filters.
    pub fn should_extract(&self, member: &str) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| member.contains(f.as_str()))
    }

    pub fn install(&self, file: &Path, install_dir: &Path) -> Result<InstallResult, InstallError> {
        fs::create_dir_all(install_dir).map_err(|e| io_error(install_dir, e))?;

        let kind = detect_archive(file).map_err(|e| io_error(file, e))?;
        let installed = match kind {
            Some(kind) => {
                debug!(file = %file.display(), ?kind, "extracting archive");
                let scratch = tempfile::tempdir().map_err(|e| io_error(install_dir, e))?;
                self.extract(file, kind, scratch.path())?;
                copy_tree_flat(scratch.path(), install_dir)?
            }
            None => {
                debug!(file = %file.display(), "installing bare executable");
                vec![install_file(file, install_dir)?]
            }
        };

        Ok(InstallResult {
            install_dir: install_dir.to_path_buf(),
            installed,
            archive: kind,
        })
    }

    fn extract(&self, file: &Path, kind: ArchiveKind, dest: &Path) -> Result<(), InstallError> {
        let reader = File::open(file).map_err(|e| io_error(file, e))?;
        let result = match kind {
            ArchiveKind::Zip => self.extract_zip(reader, dest),
            ArchiveKind::Tar => self.extract_tar(reader, dest),
            ArchiveKind::TarGz => self.extract_tar(GzDecoder::new(reader), dest),
            ArchiveKind::TarXz => self.extract_tar(XzDecoder::new(reader), dest),
        };

        result.map_err(|message| InstallError::Archive {
            path: file.to_path_buf(),
            message,
        })
    }

    fn extract_tar<R: Read>(&self, reader: R, dest: &Path) -> Result<(), String> {
        let mut archive = tar::Archive::new(reader);
        let entries = archive.entries().map_err(|e| format!("failed to read tar: {e}"))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| format!("failed to read tar entry: {e}"))?;
            let name = entry
                .path()
                .map_err(|e| format!("invalid path in tar: {e}"))?
                .to_string_lossy()
                .into_owned();

            if !self.should_extract(&name) {
                continue;
            }

            // unpack_in refuses paths that would escape `dest`.
            let unpacked = entry
                .unpack_in(dest)
                .map_err(|e| format!("failed to extract '{name}': {e}"))?;
            if !unpacked {
                debug!(member = %name, "skipped member outside extraction root");
            }
        }

        Ok(())
    }

    fn extract_zip(&self, reader: File, dest: &Path) -> Result<(), String> {
        let mut archive =
            zip::ZipArchive::new(reader).map_err(|e| format!("failed to open zip: {e}"))?;

        for i in 0..archive.len() {
            let mut member = archive
                .by_index(i)
                .map_err(|e| format!("failed to read zip entry: {e}"))?;

            if !self.should_extract(member.name()) {
                continue;
            }

            let Some(relative) = member.enclosed_name() else {
                debug!(member = %member.name(), "skipped member outside extraction root");
                continue;
            };
            let outpath = dest.join(relative);

            if member.is_dir() {
                fs::create_dir_all(&outpath).map_err(|e| e.to_string())?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            let mut out = File::create(&outpath).map_err(|e| e.to_string())?;
            io::copy(&mut member, &mut out).map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}

/// Sniff the archive format from the file's content. A gzip or xz stream only counts
/// as an archive when it decompresses to a tar; a single compressed file is `None`.
pub fn detect_archive(file: &Path) -> io::Result<Option<ArchiveKind>> {
    let mut magic = Vec::with_capacity(8);
    File::open(file)?.take(8).read_to_end(&mut magic)?;

    let kind = if magic.starts_with(ZIP_MAGIC) || magic.starts_with(ZIP_EMPTY_MAGIC) {
        Some(ArchiveKind::Zip)
    } else if magic.starts_with(GZIP_MAGIC) {
        starts_with_tar_header(GzDecoder::new(File::open(file)?)).then_some(ArchiveKind::TarGz)
    } else if magic.starts_with(XZ_MAGIC) {
        starts_with_tar_header(XzDecoder::new(File::open(file)?)).then_some(ArchiveKind::TarXz)
    } else {
        starts_with_tar_header(File::open(file)?).then_some(ArchiveKind::Tar)
    };

    Ok(kind)
}

/// Whether the first block of `reader` is a tar header with a valid checksum.
fn starts_with_tar_header<R: Read>(mut reader: R) -> bool {
    let mut block = [0u8; TAR_BLOCK];
    if reader.read_exact(&mut block).is_err() {
        return false;
    }

    let mut header = tar::Header::new_old();
    header.as_mut_bytes().copy_from_slice(&block);
    let Ok(stored) = header.cksum() else {
        return false;
    };
    header.set_cksum();
    header.cksum().is_ok_and(|computed| computed == stored)
}

fn copy_tree_flat(root: &Path, install_dir: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let mut installed = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| InstallError::Io {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            installed.push(install_file(entry.path(), install_dir)?);
        }
    }

    Ok(installed)
}

fn install_file(src: &Path, install_dir: &Path) -> Result<PathBuf, InstallError> {
    let name = src.file_name().ok_or_else(|| InstallError::Io {
        path: src.to_path_buf(),
        message: "path has no file name".to_string(),
    })?;
    let dest = install_dir.join(name);

    // Copying a file onto itself would truncate it.
    let same_file = match (fs::canonicalize(src), fs::canonicalize(&dest)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_file {
        fs::copy(src, &dest).map_err(|e| io_error(&dest, e))?;
    }
    make_executable(&dest)?;

    Ok(dest)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| io_error(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

fn io_error(path: &Path, e: io::Error) -> InstallError {
    InstallError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
