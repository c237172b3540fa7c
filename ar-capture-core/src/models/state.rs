/// Recording controller state machine.
///
/// State transitions:
/// ```text
/// idle → preparing → recording → stopping → idle
///            ↓ (prepare failed)
///           idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Preparing,
    Recording,
    Stopping,
}

impl RecorderState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }
}

/// Render-loop state of the frame driver.
///
/// ```text
/// created ──surface created──→ rendering ←──surface created── surfaceless
///                                 │  └──────surface destroyed──────↑
///                                 └─provider error─→ session failed (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DriverState {
    #[default]
    Created,
    Surfaceless,
    Rendering,
    SessionFailed,
}

impl DriverState {
    pub fn is_rendering(&self) -> bool {
        matches!(self, Self::Rendering)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionFailed)
    }
}
