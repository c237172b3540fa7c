use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the windowing/GL layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    #[error("no current graphics context")]
    NoCurrentContext,

    /// Neither the display context's config nor a recordable fallback config
    /// could back an encoder surface.
    #[error("no compatible surface config for the encoder input")]
    NoCompatibleConfig,

    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("make current failed: {0}")]
    MakeCurrent(String),

    #[error("swap buffers failed: {0}")]
    SwapBuffers(String),

    #[error("shader compilation failed ({stage}): {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("program link failed: {0}")]
    ProgramLink(String),

    #[error("GL object creation failed: {0}")]
    ResourceCreation(String),

    #[error("video texture update failed: {0}")]
    TextureUpdate(String),
}

/// Errors raised by hardware encoders, the microphone and the container writer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("encoder creation failed: {0}")]
    EncoderCreation(String),

    #[error("encoder configuration failed: {0}")]
    Configuration(String),

    #[error("dequeue failed: {0}")]
    Dequeue(String),

    #[error("queue input failed: {0}")]
    QueueInput(String),

    #[error("invalid output buffer index {0}")]
    InvalidBuffer(usize),

    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error("microphone read failed: {0}")]
    MicrophoneRead(String),

    #[error("container error: {0}")]
    Container(String),
}

/// Failure reported by the tracking provider when advancing a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("tracking session paused")]
    SessionPaused,

    #[error("camera not available")]
    CameraNotAvailable,

    #[error("tracking failed: {0}")]
    Failed(String),
}

/// Errors surfaced by the recording controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid recording dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("a recording is already active")]
    AlreadyRecording,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error at {path:?}: {message}")]
    Storage { path: PathBuf, message: String },

    #[error(transparent)]
    Graphics(#[from] GraphicsError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
