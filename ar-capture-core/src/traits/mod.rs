pub mod codec;
pub mod graphics;
pub mod microphone;
pub mod recorder_delegate;
pub mod tracking;
