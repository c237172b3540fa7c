//! # ar-capture-gl
//!
//! OpenGL ES 2 compositors for ar-capture, built on `glow`.
//!
//! Provides:
//! - `BackgroundCompositor`: camera image across the viewport, with digital zoom
//! - `OverlayCompositor`: video texture on a tracked anchor's footprint
//! - `GlSceneRenderer`: both, behind `ar_capture_core::SceneRenderer`
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use ar_capture_core::FrameDriver;
//! use ar_capture_gl::GlSceneRenderer;
//!
//! let renderer = GlSceneRenderer::new(Arc::new(gl));
//! let mut driver = FrameDriver::new(tracking, renderer, video_source);
//! driver.on_surface_created()?;
//! ```

pub mod background;
pub mod geometry;
pub mod overlay;
pub mod renderer;
pub mod shader;
pub mod state;
pub mod texture;

pub use background::BackgroundCompositor;
pub use overlay::OverlayCompositor;
pub use renderer::GlSceneRenderer;
pub use state::{DepthState, RenderState};
