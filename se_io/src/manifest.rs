use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use se_core::{Manifest, ManifestError};

/// Read and validate a manifest file.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => ManifestError::Malformed {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        },
        _ => ManifestError::NotFound {
            path: path.to_path_buf(),
        },
    })?;

    Manifest::from_json(&text).map_err(|e| match e {
        ManifestError::Malformed { message, .. } => ManifestError::Malformed {
            path: Some(path.to_path_buf()),
            message,
        },
        other => other,
    })
}
