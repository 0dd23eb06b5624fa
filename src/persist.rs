//! Whole-document persistence helpers.
//!
//! Documents are always read in full and written in full. Writes go to a
//! sibling temp file first and are renamed over the target, so a crash never
//! leaves a half-written document behind.

use crate::error::{MementoError, Result};
use crate::info_log;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Read and parse a JSON document. A missing file yields `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return Err(corrupt(path, "document is not valid UTF-8"));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| corrupt(path, e.to_string()))
}

/// Serialize `value` as pretty JSON and write it atomically to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value)
        .map_err(|e| MementoError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    write_atomic(path, &content)
}

/// Write `content` to `path` through a temp file and rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let written = (|| -> io::Result<()> {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(content)?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = written {
        log::warn!("writing {} failed: {e}", path.display());
        if let Err(cleanup) = fs::remove_file(&tmp_path)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            log::warn!("removing temp file {} failed: {cleanup}", tmp_path.display());
        }
        return Err(e.into());
    }

    info_log!("saved {} ({} bytes)", path.display(), content.len());
    Ok(())
}

pub(crate) fn corrupt(path: &Path, reason: impl Into<String>) -> MementoError {
    MementoError::CorruptData {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
