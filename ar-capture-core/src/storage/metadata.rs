use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::RecordError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar location for a recording: `<recording>.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    let mut name = OsString::from(recording_path.as_os_str());
    name.push(".metadata.json");
    PathBuf::from(name)
}

/// Write recording metadata as a JSON sidecar file next to the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, RecordError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata).map_err(|e| RecordError::Storage {
        path: path.clone(),
        message: format!("failed to serialize metadata: {}", e),
    })?;
    fs::write(&path, json).map_err(|e| RecordError::Storage {
        path: path.clone(),
        message: format!("failed to write metadata: {}", e),
    })?;
    Ok(path)
}

/// Read recording metadata from its JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, RecordError> {
    let path = metadata_path(recording_path);
    let json = fs::read_to_string(&path).map_err(|e| RecordError::Storage {
        path: path.clone(),
        message: format!("failed to read metadata: {}", e),
    })?;
    serde_json::from_str(&json).map_err(|e| RecordError::Storage {
        path,
        message: format!("failed to parse metadata: {}", e),
    })
}
