use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::lib::errors::PreflightError;

/// Outcome of writing a sample configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Planned,
    Written,
    SkippedExisting,
}

/// Write `content` to `destination` atomically.
///
/// In dry-run mode this function does not mutate filesystem state.
/// Without `force`, an existing file is preserved and no write happens.
pub fn write_config_file(
    destination: &Path,
    content: &str,
    force: bool,
    dry_run: bool,
) -> Result<WriteStatus, io::Error> {
    if destination.exists() && !force {
        return Ok(WriteStatus::SkippedExisting);
    }
    if dry_run {
        return Ok(WriteStatus::Planned);
    }

    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(content.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist(destination).map_err(|err| err.error)?;

    Ok(WriteStatus::Written)
}

/// Return the SHA256 of any file as a hex string.
pub fn compute_sha256(path: &Path) -> Result<String, PreflightError> {
    let mut file = File::open(path).map_err(|source| PreflightError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer).map_err(|source| PreflightError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Parse a file as JSON, returning the top-level value.
pub fn read_json(path: &Path) -> Result<serde_json::Value, PreflightError> {
    let file = File::open(path).map_err(|source| PreflightError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(io::BufReader::new(file)).map_err(|source| {
        PreflightError::InvalidJson {
            path: path.to_path_buf(),
            source,
        }
    })
}
