use std::sync::Arc;

use crate::models::error::GraphicsError;
use crate::processing::clock::PresentationClock;
use crate::traits::graphics::{
    ConfigHandle, ConfigRequest, ContextHandle, DisplayHandle, EglApi, NativeWindowHandle, SurfaceHandle,
};

/// Where the encoder surface's config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// The config of the display context that was current at prepare time.
    SharedContext,
    /// An explicitly requested recordable RGBA8888 config.
    Recordable,
}

/// Window surface over the video encoder's input, sharing the display's
/// graphics context so the scene can be drawn into it a second time.
pub struct EncoderSurfaceBridge {
    egl: Arc<dyn EglApi>,
    display: DisplayHandle,
    context: ContextHandle,
    surface: SurfaceHandle,
    config_source: ConfigSource,
    width: u32,
    height: u32,
    clock: PresentationClock,
    saved: Option<(SurfaceHandle, SurfaceHandle)>,
    released: bool,
}

impl EncoderSurfaceBridge {
    /// Create the encoder surface on the context current on this thread.
    ///
    /// Tries the current context's own config first, then a recordable
    /// RGBA8888 config. Fails with [`GraphicsError::NoCompatibleConfig`] when
    /// neither yields a surface.
    pub fn prepare(
        egl: Arc<dyn EglApi>,
        window: NativeWindowHandle,
        width: u32,
        height: u32,
    ) -> Result<Self, GraphicsError> {
        let binding = egl.current().ok_or(GraphicsError::NoCurrentContext)?;
        let display = binding.display;
        let context = binding.context;

        let (surface, config_source) = match Self::surface_from_context(egl.as_ref(), display, context, window) {
            Ok(surface) => (surface, ConfigSource::SharedContext),
            Err(e) => {
                log::warn!(
                    "Could not reuse the display config for the encoder surface ({}); requesting a recordable config",
                    e
                );
                let surface = Self::surface_from_recordable(egl.as_ref(), display, window)?;
                (surface, ConfigSource::Recordable)
            }
        };

        log::info!(
            "Encoder surface ready: {}x{} ({:?} config)",
            width,
            height,
            config_source
        );

        Ok(Self {
            egl,
            display,
            context,
            surface,
            config_source,
            width,
            height,
            clock: PresentationClock::new(),
            saved: None,
            released: false,
        })
    }

    fn surface_from_context(
        egl: &dyn EglApi,
        display: DisplayHandle,
        context: ContextHandle,
        window: NativeWindowHandle,
    ) -> Result<SurfaceHandle, GraphicsError> {
        let config = egl.config_of_context(display, context)?;
        egl.create_window_surface(display, config, window)
    }

    fn surface_from_recordable(
        egl: &dyn EglApi,
        display: DisplayHandle,
        window: NativeWindowHandle,
    ) -> Result<SurfaceHandle, GraphicsError> {
        let config: ConfigHandle = match egl.choose_config(display, &ConfigRequest::recordable_rgba8888()) {
            Ok(Some(config)) => config,
            Ok(None) => {
                log::error!("No recordable RGBA8888 config available");
                return Err(GraphicsError::NoCompatibleConfig);
            }
            Err(e) => {
                log::error!("Recordable config query failed: {}", e);
                return Err(GraphicsError::NoCompatibleConfig);
            }
        };
        egl.create_window_surface(display, config, window).map_err(|e| {
            log::error!("Encoder surface creation failed with recordable config: {}", e);
            GraphicsError::NoCompatibleConfig
        })
    }

    /// Save the current draw/read surfaces and make the encoder surface current.
    pub fn begin_frame(&mut self) -> Result<(), GraphicsError> {
        if self.released {
            return Err(GraphicsError::MakeCurrent("encoder surface released".into()));
        }
        let binding = self.egl.current().ok_or(GraphicsError::NoCurrentContext)?;
        self.egl
            .make_current(self.display, self.surface, self.surface, self.context)?;
        self.saved = Some((binding.draw, binding.read));
        Ok(())
    }

    /// Stamp and submit the encoder frame, then restore the saved surfaces.
    ///
    /// Returns the zero-based presentation time in nanoseconds. The saved
    /// surfaces are restored even when submission fails.
    pub fn end_frame(&mut self, timestamp_ns: i64) -> Result<i64, GraphicsError> {
        let presentation_ns = self.clock.stamp(timestamp_ns);
        let submitted = self
            .egl
            .set_presentation_time(self.display, self.surface, presentation_ns)
            .and_then(|()| self.egl.swap_buffers(self.display, self.surface));
        let restored = self.restore();
        submitted?;
        restored?;
        Ok(presentation_ns)
    }

    fn restore(&mut self) -> Result<(), GraphicsError> {
        match self.saved.take() {
            Some((draw, read)) => self.egl.make_current(self.display, draw, read, self.context),
            None => Ok(()),
        }
    }

    /// Destroy the encoder surface. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.restore() {
            log::error!("Failed to restore display surface: {}", e);
        }
        if let Err(e) = self.egl.destroy_surface(self.display, self.surface) {
            log::error!("Failed to destroy encoder surface: {}", e);
        }
        self.released = true;
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn config_source(&self) -> ConfigSource {
        self.config_source
    }

    pub fn clock(&self) -> &PresentationClock {
        &self.clock
    }
}

impl Drop for EncoderSurfaceBridge {
    fn drop(&mut self) {
        self.release();
    }
}
