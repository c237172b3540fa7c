use crate::models::error::TrackingError;
use crate::models::frame::{TextureId, TrackingFrame};

/// Pose-tracking and marker-detection subsystem.
///
/// Returns a read-only snapshot per tick. Driven from the render thread only.
pub trait TrackingProvider {
    /// Texture the provider should stream camera frames into.
    fn set_camera_texture(&mut self, texture: TextureId);

    /// Display size after a surface change, used for display-correct UVs.
    fn set_display_geometry(&mut self, width: u32, height: u32);

    /// Non-blocking advance to the latest camera frame.
    ///
    /// `Ok(None)` means no new frame this tick.
    fn advance(&mut self) -> Result<Option<TrackingFrame>, TrackingError>;
}
