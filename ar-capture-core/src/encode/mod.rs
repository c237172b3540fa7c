pub mod audio_track;
pub mod drain;
pub mod video_track;
