use ar_capture_core::{GraphicsError, TextureId};
use glow::HasContext;

/// `GL_TEXTURE_EXTERNAL_OES`, the target for camera and decoder images.
pub const TEXTURE_EXTERNAL_OES: u32 = 0x8D65;

/// Create an external texture with linear filtering and edge clamping.
///
/// # Safety
/// The GL context behind `gl` must be current on the calling thread.
pub unsafe fn create_external_texture(gl: &glow::Context) -> Result<glow::NativeTexture, GraphicsError> {
    let texture = gl
        .create_texture()
        .map_err(|e| GraphicsError::ResourceCreation(format!("create_texture failed: {e}")))?;
    gl.bind_texture(TEXTURE_EXTERNAL_OES, Some(texture));
    gl.tex_parameter_i32(TEXTURE_EXTERNAL_OES, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(TEXTURE_EXTERNAL_OES, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(TEXTURE_EXTERNAL_OES, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(TEXTURE_EXTERNAL_OES, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.bind_texture(TEXTURE_EXTERNAL_OES, None);
    Ok(texture)
}

pub fn texture_id(texture: glow::NativeTexture) -> TextureId {
    TextureId(texture.0.get())
}
