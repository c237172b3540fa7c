use crate::models::error::RecordError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;

/// Event delegate for recorder notifications.
///
/// Lifecycle calls arrive on whichever thread drives the recorder (normally
/// the render thread). Implementations should marshal to the UI thread if
/// needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the recorder state changes.
    fn on_state_changed(&self, state: RecorderState);

    /// Called when prepare fails; the host should show recording as unavailable.
    fn on_error(&self, error: &RecordError);

    /// Called once the output file is finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
