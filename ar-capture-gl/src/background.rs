use ar_capture_core::{GraphicsError, TrackingFrame};
use glow::HasContext;

use crate::geometry::{f32_bytes, sanitize_zoom, zoom_tex_coords, DEFAULT_TEX_COORDS, NDC_QUAD};
use crate::shader::{attrib_location, check_gl_error, compile_program, BACKGROUND_VERT, EXTERNAL_TEXTURE_FRAG};
use crate::state::without_depth;
use crate::texture::{create_external_texture, TEXTURE_EXTERNAL_OES};

/// Display-correct texture coordinates and the zoomed copy last uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TexCoordCache {
    display_uvs: [f32; 8],
    uploaded: ([f32; 8], f32),
}

impl Default for TexCoordCache {
    fn default() -> Self {
        Self {
            display_uvs: DEFAULT_TEX_COORDS,
            uploaded: (DEFAULT_TEX_COORDS, 1.0),
        }
    }
}

impl TexCoordCache {
    /// Coordinates to upload for this frame, or `None` when the GPU buffer
    /// already holds them.
    pub fn update(&mut self, display_uvs: Option<[f32; 8]>, zoom: f32) -> Option<[f32; 8]> {
        if let Some(uvs) = display_uvs {
            self.display_uvs = uvs;
        }
        let key = (self.display_uvs, sanitize_zoom(zoom));
        if self.uploaded == key {
            return None;
        }
        self.uploaded = key;
        Some(zoom_tex_coords(&key.0, key.1))
    }
}

/// Draws the camera image across the whole viewport.
///
/// Texture coordinates come from the tracking frame whenever display geometry
/// changes and are cached between frames. Depth testing and depth writes are
/// off for the draw so the background never occludes overlays.
pub struct BackgroundCompositor {
    program: glow::NativeProgram,
    position_attrib: u32,
    tex_coord_attrib: u32,
    texture_uniform: Option<glow::UniformLocation>,
    camera_texture: glow::NativeTexture,
    position_buffer: glow::NativeBuffer,
    tex_coord_buffer: glow::NativeBuffer,
    tex_coords: TexCoordCache,
}

impl BackgroundCompositor {
    /// # Safety
    /// The GL context behind `gl` must be current on the calling thread.
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, GraphicsError> {
        let program = compile_program(gl, BACKGROUND_VERT, EXTERNAL_TEXTURE_FRAG)?;
        let position_attrib = attrib_location(gl, program, "a_Position")?;
        let tex_coord_attrib = attrib_location(gl, program, "a_TexCoord")?;
        let texture_uniform = gl.get_uniform_location(program, "u_Texture");

        let camera_texture = create_external_texture(gl)?;
        let position_buffer = gl
            .create_buffer()
            .map_err(|e| GraphicsError::ResourceCreation(format!("create_buffer: {e}")))?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(position_buffer));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &f32_bytes(&NDC_QUAD), glow::STATIC_DRAW);

        let tex_coord_buffer = gl
            .create_buffer()
            .map_err(|e| GraphicsError::ResourceCreation(format!("create_buffer: {e}")))?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(tex_coord_buffer));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &f32_bytes(&DEFAULT_TEX_COORDS), glow::DYNAMIC_DRAW);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        check_gl_error(gl, "background setup");
        Ok(Self {
            program,
            position_attrib,
            tex_coord_attrib,
            texture_uniform,
            camera_texture,
            position_buffer,
            tex_coord_buffer,
            tex_coords: TexCoordCache::default(),
        })
    }

    /// Texture the tracking provider renders camera images into.
    pub fn camera_texture(&self) -> glow::NativeTexture {
        self.camera_texture
    }

    /// # Safety
    /// The GL context behind `gl` must be current on the calling thread.
    pub unsafe fn draw(&mut self, gl: &glow::Context, frame: &TrackingFrame, zoom: f32) {
        if let Some(coords) = self.tex_coords.update(frame.display_uvs, zoom) {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.tex_coord_buffer));
            gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, &f32_bytes(&coords));
        }

        without_depth(gl, || self.draw_quad(gl));
        check_gl_error(gl, "background draw");
    }

    unsafe fn draw_quad(&self, gl: &glow::Context) {
        gl.use_program(Some(self.program));
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(TEXTURE_EXTERNAL_OES, Some(self.camera_texture));
        gl.uniform_1_i32(self.texture_uniform.as_ref(), 0);

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.position_buffer));
        gl.vertex_attrib_pointer_f32(self.position_attrib, 2, glow::FLOAT, false, 0, 0);
        gl.enable_vertex_attrib_array(self.position_attrib);
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.tex_coord_buffer));
        gl.vertex_attrib_pointer_f32(self.tex_coord_attrib, 2, glow::FLOAT, false, 0, 0);
        gl.enable_vertex_attrib_array(self.tex_coord_attrib);

        gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);

        gl.disable_vertex_attrib_array(self.position_attrib);
        gl.disable_vertex_attrib_array(self.tex_coord_attrib);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_texture(TEXTURE_EXTERNAL_OES, None);
    }

    /// # Safety
    /// The GL context behind `gl` must be current on the calling thread.
    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_program(self.program);
        gl.delete_texture(self.camera_texture);
        gl.delete_buffer(self.position_buffer);
        gl.delete_buffer(self.tex_coord_buffer);
    }
}
