use ar_capture_core::GraphicsError;
use glow::HasContext;

/// Compile and link a vertex/fragment pair.
///
/// # Safety
/// The GL context behind `gl` must be current on the calling thread.
pub unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, GraphicsError> {
    let vs = compile_shader(gl, glow::VERTEX_SHADER, "vertex", vert_src)?;
    let fs = match compile_shader(gl, glow::FRAGMENT_SHADER, "fragment", frag_src) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(e);
        }
    };

    let program = match gl.create_program() {
        Ok(program) => program,
        Err(e) => {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(GraphicsError::ResourceCreation(format!("create_program failed: {e}")));
        }
    };
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        log::error!("Program link failed: {}", log);
        return Err(GraphicsError::ProgramLink(log));
    }

    Ok(program)
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::NativeShader, GraphicsError> {
    let shader = gl
        .create_shader(kind)
        .map_err(|e| GraphicsError::ResourceCreation(format!("create_shader({stage}) failed: {e}")))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        log::error!("{} shader compile failed: {}", stage, log);
        return Err(GraphicsError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

/// Attribute location, or an error naming the missing attribute.
///
/// # Safety
/// The GL context behind `gl` must be current on the calling thread.
pub unsafe fn attrib_location(
    gl: &glow::Context,
    program: glow::NativeProgram,
    name: &str,
) -> Result<u32, GraphicsError> {
    gl.get_attrib_location(program, name)
        .ok_or_else(|| GraphicsError::ResourceCreation(format!("attribute {name} not found")))
}

/// Log and clear every pending GL error. Returns whether any was pending.
///
/// # Safety
/// The GL context behind `gl` must be current on the calling thread.
pub unsafe fn check_gl_error(gl: &glow::Context, op: &str) -> bool {
    let mut failed = false;
    loop {
        let error = gl.get_error();
        if error == glow::NO_ERROR {
            return failed;
        }
        log::error!("{}: GL error 0x{:04x}", op, error);
        failed = true;
    }
}

pub const BACKGROUND_VERT: &str = r#"
attribute vec2 a_Position;
attribute vec2 a_TexCoord;
varying vec2 v_TexCoord;
void main() {
    gl_Position = vec4(a_Position, 0.0, 1.0);
    v_TexCoord = a_TexCoord;
}
"#;

pub const OVERLAY_VERT: &str = r#"
uniform mat4 u_ModelViewProjection;
attribute vec3 a_Position;
attribute vec2 a_TexCoord;
varying vec2 v_TexCoord;
void main() {
    gl_Position = u_ModelViewProjection * vec4(a_Position, 1.0);
    v_TexCoord = a_TexCoord;
}
"#;

/// Samples an external (camera or decoder) texture. Shared by both passes.
pub const EXTERNAL_TEXTURE_FRAG: &str = r#"#extension GL_OES_EGL_image_external : require
precision mediump float;
uniform samplerExternalOES u_Texture;
varying vec2 v_TexCoord;
void main() {
    gl_FragColor = texture2D(u_Texture, v_TexCoord);
}
"#;
