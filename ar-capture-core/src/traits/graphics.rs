use nalgebra::Matrix4;

use crate::models::error::GraphicsError;
use crate::models::frame::{TextureId, TrackedAnchor, TrackingFrame};

/// Opaque EGL display handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayHandle(pub usize);

/// Opaque EGL context handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub usize);

/// Opaque EGL surface handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub usize);

/// Opaque EGL config handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigHandle(pub usize);

/// Native window backing an encoder's input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeWindowHandle(pub usize);

/// What is current on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentBinding {
    pub display: DisplayHandle,
    pub context: ContextHandle,
    pub draw: SurfaceHandle,
    pub read: SurfaceHandle,
}

/// Attributes for an explicitly chosen config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRequest {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    /// Renderable with OpenGL ES 2.
    pub es2_renderable: bool,
    /// Usable as a video encoder input (`EGL_RECORDABLE_ANDROID`).
    pub recordable: bool,
}

impl ConfigRequest {
    /// RGBA 8/8/8/8, ES2, recordable: the config every hardware encoder accepts.
    pub fn recordable_rgba8888() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            es2_renderable: true,
            recordable: true,
        }
    }
}

/// Windowing layer (EGL) operations used by the encoder surface bridge.
pub trait EglApi: Send + Sync {
    /// Binding current on the calling thread, if any.
    fn current(&self) -> Option<CurrentBinding>;

    /// Config the given context was created with.
    fn config_of_context(
        &self,
        display: DisplayHandle,
        context: ContextHandle,
    ) -> Result<ConfigHandle, GraphicsError>;

    /// First config matching `request`, or `None` if nothing matches.
    fn choose_config(
        &self,
        display: DisplayHandle,
        request: &ConfigRequest,
    ) -> Result<Option<ConfigHandle>, GraphicsError>;

    fn create_window_surface(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        window: NativeWindowHandle,
    ) -> Result<SurfaceHandle, GraphicsError>;

    fn make_current(
        &self,
        display: DisplayHandle,
        draw: SurfaceHandle,
        read: SurfaceHandle,
        context: ContextHandle,
    ) -> Result<(), GraphicsError>;

    /// Tag the next swap of `surface` with a presentation time.
    fn set_presentation_time(
        &self,
        display: DisplayHandle,
        surface: SurfaceHandle,
        time_ns: i64,
    ) -> Result<(), GraphicsError>;

    fn swap_buffers(&self, display: DisplayHandle, surface: SurfaceHandle) -> Result<(), GraphicsError>;

    fn destroy_surface(&self, display: DisplayHandle, surface: SurfaceHandle) -> Result<(), GraphicsError>;
}

/// Textures the renderer allocated when the surface was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTextures {
    pub camera: TextureId,
    pub video: TextureId,
}

/// The drawing seam of the frame driver: background and overlay compositors
/// against whatever surface is current.
pub trait SceneRenderer {
    /// Compile programs and allocate textures. Requires a current context.
    fn on_surface_created(&mut self) -> Result<SceneTextures, GraphicsError>;

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear color and depth of the current surface.
    fn clear(&mut self);

    fn draw_background(&mut self, frame: &TrackingFrame, zoom: f32);

    fn draw_overlay(&mut self, anchor: &TrackedAnchor, view: &Matrix4<f32>, projection: &Matrix4<f32>);
}

/// Producer of video frames into the external overlay texture
/// (a `SurfaceTexture` on Android).
pub trait VideoSource {
    /// Bind the producer to the texture the overlay samples.
    fn attach(&mut self, texture: TextureId) -> Result<(), GraphicsError>;

    /// Latch the most recent produced frame into the texture.
    fn update_texture(&mut self) -> Result<(), GraphicsError>;
}
