use ar_capture_core::{GraphicsError, Pose};
use glow::HasContext;
use nalgebra::Matrix4;

use crate::geometry::{f32_bytes, model_matrix, model_view_projection, FOOTPRINT_QUAD, FOOTPRINT_TEX_COORDS};
use crate::shader::{attrib_location, check_gl_error, compile_program, EXTERNAL_TEXTURE_FRAG, OVERLAY_VERT};
use crate::state::with_blending;
use crate::texture::TEXTURE_EXTERNAL_OES;

/// Draws a video texture over an anchor's footprint.
pub struct OverlayCompositor {
    program: glow::NativeProgram,
    position_attrib: u32,
    tex_coord_attrib: u32,
    mvp_uniform: Option<glow::UniformLocation>,
    texture_uniform: Option<glow::UniformLocation>,
    position_buffer: glow::NativeBuffer,
    tex_coord_buffer: glow::NativeBuffer,
}

impl OverlayCompositor {
    /// # Safety
    /// The GL context behind `gl` must be current on the calling thread.
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, GraphicsError> {
        let program = compile_program(gl, OVERLAY_VERT, EXTERNAL_TEXTURE_FRAG)?;
        let position_attrib = attrib_location(gl, program, "a_Position")?;
        let tex_coord_attrib = attrib_location(gl, program, "a_TexCoord")?;
        let mvp_uniform = gl.get_uniform_location(program, "u_ModelViewProjection");
        let texture_uniform = gl.get_uniform_location(program, "u_Texture");

        let position_buffer = gl
            .create_buffer()
            .map_err(|e| GraphicsError::ResourceCreation(format!("create_buffer: {e}")))?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(position_buffer));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &f32_bytes(&FOOTPRINT_QUAD), glow::STATIC_DRAW);

        let tex_coord_buffer = gl
            .create_buffer()
            .map_err(|e| GraphicsError::ResourceCreation(format!("create_buffer: {e}")))?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(tex_coord_buffer));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &f32_bytes(&FOOTPRINT_TEX_COORDS), glow::STATIC_DRAW);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        check_gl_error(gl, "overlay setup");
        Ok(Self {
            program,
            position_attrib,
            tex_coord_attrib,
            mvp_uniform,
            texture_uniform,
            position_buffer,
            tex_coord_buffer,
        })
    }

    /// Draw `texture` on the footprint of an anchor at `pose` with the given
    /// extents. Blending is enabled only for this call.
    ///
    /// # Safety
    /// The GL context behind `gl` must be current on the calling thread.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn draw(
        &self,
        gl: &glow::Context,
        texture: glow::NativeTexture,
        pose: &Pose,
        extent_x: f32,
        extent_z: f32,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) {
        let mvp = model_view_projection(projection, view, &model_matrix(pose, extent_x, extent_z));

        with_blending(gl, || self.draw_quad(gl, texture, mvp.as_slice()));
        check_gl_error(gl, "overlay draw");
    }

    unsafe fn draw_quad(&self, gl: &glow::Context, texture: glow::NativeTexture, mvp: &[f32]) {
        gl.use_program(Some(self.program));
        gl.uniform_matrix_4_f32_slice(self.mvp_uniform.as_ref(), false, mvp);
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(TEXTURE_EXTERNAL_OES, Some(texture));
        gl.uniform_1_i32(self.texture_uniform.as_ref(), 0);

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.position_buffer));
        gl.vertex_attrib_pointer_f32(self.position_attrib, 3, glow::FLOAT, false, 0, 0);
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
        gl.delete_buffer(self.position_buffer);
        gl.delete_buffer(self.tex_coord_buffer);
    }
}
