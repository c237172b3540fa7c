use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::media::TrackKind;

/// Summary produced when a recording session is stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub metadata: RecordingMetadata,
    /// SHA-256 of the finished file, computed only alongside the metadata
    /// sidecar and only if the file could be read back.
    pub checksum: Option<String>,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub tracks: Vec<TrackKind>,
    pub video_samples: u64,
    pub audio_samples: u64,
    pub checksum: Option<String>,
}

impl RecordingMetadata {
    pub fn new(file_path: &str, duration_secs: f64, width: u32, height: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            duration_secs,
            width,
            height,
            tracks: Vec::new(),
            video_samples: 0,
            audio_samples: 0,
            checksum: None,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.contains(&TrackKind::Audio)
    }
}
