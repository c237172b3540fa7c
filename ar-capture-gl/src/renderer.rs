use std::sync::Arc;

use ar_capture_core::{GraphicsError, SceneRenderer, SceneTextures, TrackedAnchor, TrackingFrame};
use glow::HasContext;
use nalgebra::Matrix4;

use crate::background::BackgroundCompositor;
use crate::overlay::OverlayCompositor;
use crate::texture::{create_external_texture, texture_id};

struct GlResources {
    background: BackgroundCompositor,
    overlay: OverlayCompositor,
    video_texture: glow::NativeTexture,
}

/// [`SceneRenderer`] over a `glow` context.
///
/// Every call must happen on the thread where the context is current. GPU
/// objects are rebuilt on each `on_surface_created`; handles from a previous
/// context are abandoned, not deleted.
pub struct GlSceneRenderer {
    gl: Arc<glow::Context>,
    resources: Option<GlResources>,
    clear_color: [f32; 4],
}

impl GlSceneRenderer {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self {
            gl,
            resources: None,
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }

    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    /// Delete GPU objects while the context that owns them is still current.
    pub fn destroy(&mut self) {
        if let Some(mut resources) = self.resources.take() {
            unsafe {
                resources.background.destroy(&self.gl);
                resources.overlay.destroy(&self.gl);
                self.gl.delete_texture(resources.video_texture);
            }
        }
    }
}

impl SceneRenderer for GlSceneRenderer {
    fn on_surface_created(&mut self) -> Result<SceneTextures, GraphicsError> {
        let gl = &self.gl;
        let resources = unsafe {
            let mut background = BackgroundCompositor::new(gl)?;
            let mut overlay = match OverlayCompositor::new(gl) {
                Ok(overlay) => overlay,
                Err(e) => {
                    background.destroy(gl);
                    return Err(e);
                }
            };
            let video_texture = match create_external_texture(gl) {
                Ok(texture) => texture,
                Err(e) => {
                    background.destroy(gl);
                    overlay.destroy(gl);
                    return Err(e);
                }
            };
            GlResources {
                background,
                overlay,
                video_texture,
            }
        };
        let textures = SceneTextures {
            camera: texture_id(resources.background.camera_texture()),
            video: texture_id(resources.video_texture),
        };
        self.resources = Some(resources);
        log::debug!("GL scene resources created: {:?}", textures);
        Ok(textures)
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        unsafe {
            self.gl.viewport(0, 0, width, height);
        }
    }

    fn clear(&mut self) {
        let [r, g, b, a] = self.clear_color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_background(&mut self, frame: &TrackingFrame, zoom: f32) {
        let Some(resources) = self.resources.as_mut() else {
            log::warn!("Background draw before surface creation");
            return;
        };
        unsafe {
            resources.background.draw(&self.gl, frame, zoom);
        }
    }

    fn draw_overlay(&mut self, anchor: &TrackedAnchor, view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        let Some(resources) = self.resources.as_ref() else {
            return;
        };
        unsafe {
            resources.overlay.draw(
                &self.gl,
                resources.video_texture,
                &anchor.pose,
                anchor.extent_x,
                anchor.extent_z,
                view,
                projection,
            );
        }
    }
}
