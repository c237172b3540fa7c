use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::GraphicsError;
use crate::models::frame::TrackingFrame;
use crate::models::state::DriverState;
use crate::session::recorder::{Recorder, RecordingStatus};
use crate::traits::graphics::{SceneRenderer, SceneTextures, VideoSource};
use crate::traits::tracking::TrackingProvider;

/// Set by the video producer when a new frame is ready; consumed at most once
/// per render tick.
#[derive(Debug, Clone, Default)]
pub struct FrameSignal(Arc<AtomicBool>);

impl FrameSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume a pending notification.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// What a single render tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No surface to draw into.
    Inactive,
    /// The tracking provider had no new frame.
    NoFrame,
    Drawn { overlays: usize, recorded: bool },
    /// The tracking session failed; nothing is drawn any more.
    SessionFailed,
}

/// Per-frame render loop body.
///
/// Each tick pulls one tracking frame, draws the camera background and one
/// video overlay per tracked anchor, and while recording issues the same scene
/// again into the encoder surface.
pub struct FrameDriver<P: TrackingProvider, R: SceneRenderer, V: VideoSource> {
    provider: P,
    renderer: R,
    video: V,
    signal: FrameSignal,
    recorder: Option<(Arc<Mutex<Recorder>>, RecordingStatus)>,
    state: DriverState,
    viewport: (u32, u32),
    zoom: f32,
    textures: Option<SceneTextures>,
}

impl<P: TrackingProvider, R: SceneRenderer, V: VideoSource> FrameDriver<P, R, V> {
    pub fn new(provider: P, renderer: R, video: V) -> Self {
        Self {
            provider,
            renderer,
            video,
            signal: FrameSignal::new(),
            recorder: None,
            state: DriverState::Created,
            viewport: (0, 0),
            zoom: 1.0,
            textures: None,
        }
    }

    /// Record through `recorder` whenever it reports recording.
    pub fn with_recorder(mut self, recorder: Arc<Mutex<Recorder>>) -> Self {
        let status = recorder.lock().status();
        self.recorder = Some((recorder, status));
        self
    }

    /// Handle for the video producer's frame-available callback.
    pub fn frame_signal(&self) -> FrameSignal {
        self.signal.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Digital zoom for both the display and the recorded pass.
    /// Non-positive or non-finite values reset it to 1.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    }

    pub fn textures(&self) -> Option<SceneTextures> {
        self.textures
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn video_source(&self) -> &V {
        &self.video
    }

    /// Build GPU resources and hand textures to the provider and video source.
    ///
    /// On error the state is unchanged and the host may retry.
    pub fn on_surface_created(&mut self) -> Result<(), GraphicsError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        let textures = self.renderer.on_surface_created()?;
        self.provider.set_camera_texture(textures.camera);
        self.video.attach(textures.video)?;
        self.textures = Some(textures);
        self.state = DriverState::Rendering;
        log::info!(
            "Render surface ready (camera texture {}, video texture {})",
            textures.camera.0,
            textures.video.0
        );
        Ok(())
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.renderer.set_viewport(width, height);
        self.provider.set_display_geometry(width, height);
    }

    pub fn on_surface_destroyed(&mut self) {
        if self.state.is_rendering() {
            self.state = DriverState::Surfaceless;
        }
    }

    pub fn on_draw_frame(&mut self) -> TickOutcome {
        match self.state {
            DriverState::SessionFailed => return TickOutcome::SessionFailed,
            DriverState::Rendering => {}
            DriverState::Created | DriverState::Surfaceless => return TickOutcome::Inactive,
        }

        self.renderer.clear();
        let frame = match self.provider.advance() {
            Ok(Some(frame)) => frame,
            Ok(None) => return TickOutcome::NoFrame,
            Err(e) => {
                log::error!("Tracking session failed; rendering stopped: {}", e);
                self.state = DriverState::SessionFailed;
                return TickOutcome::SessionFailed;
            }
        };

        self.renderer.draw_background(&frame, self.zoom);

        if frame.has_tracking_anchor() && self.signal.take() {
            if let Err(e) = self.video.update_texture() {
                log::warn!("Failed to update video texture: {}", e);
            }
        }

        let overlays = draw_overlays(&mut self.renderer, &frame);
        let recorded = self.record(&frame);

        TickOutcome::Drawn { overlays, recorded }
    }

    /// Issue the scene a second time into the encoder surface.
    fn record(&mut self, frame: &TrackingFrame) -> bool {
        let Some((recorder, status)) = self.recorder.as_ref() else {
            return false;
        };
        if !status.is_recording() {
            return false;
        }

        let renderer = &mut self.renderer;
        let zoom = self.zoom;
        let mut drew = false;
        let recorded = recorder.lock().record_frame(frame.timestamp_ns, |width, height| {
            renderer.set_viewport(width, height);
            renderer.clear();
            renderer.draw_background(frame, zoom);
            draw_overlays(renderer, frame);
            drew = true;
        });
        if drew {
            self.renderer.set_viewport(self.viewport.0, self.viewport.1);
        }
        recorded
    }
}

fn draw_overlays<R: SceneRenderer>(renderer: &mut R, frame: &TrackingFrame) -> usize {
    let mut drawn = 0;
    for anchor in frame.tracking_anchors() {
        renderer.draw_overlay(anchor, &frame.view, &frame.projection);
        drawn += 1;
    }
    drawn
}
