use glow::HasContext;

/// Depth test and depth write flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub test: bool,
    pub write: bool,
}

/// Fixed-function state the compositors change around a draw.
///
/// The `glow::Context` implementation issues GL calls directly, so it may
/// only be used while that context is current on the calling thread.
pub trait RenderState {
    fn depth_state(&self) -> DepthState;
    fn set_depth_state(&self, depth: DepthState);
    /// Alpha blending with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` when enabled.
    fn set_blending(&self, enabled: bool);
}

impl RenderState for glow::Context {
    fn depth_state(&self) -> DepthState {
        unsafe {
            DepthState {
                test: self.is_enabled(glow::DEPTH_TEST),
                write: self.get_parameter_i32(glow::DEPTH_WRITEMASK) != 0,
            }
        }
    }

    fn set_depth_state(&self, depth: DepthState) {
        unsafe {
            if depth.test {
                self.enable(glow::DEPTH_TEST);
            } else {
                self.disable(glow::DEPTH_TEST);
            }
            self.depth_mask(depth.write);
        }
    }

    fn set_blending(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.enable(glow::BLEND);
                self.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.disable(glow::BLEND);
            }
        }
    }
}

/// Run `draw` with depth testing and depth writes off, then restore both.
pub fn without_depth<S, R>(state: &S, draw: impl FnOnce() -> R) -> R
where
    S: RenderState + ?Sized,
{
    let saved = state.depth_state();
    state.set_depth_state(DepthState {
        test: false,
        write: false,
    });
    let result = draw();
    state.set_depth_state(saved);
    result
}

/// Run `draw` with alpha blending on; blending is off again afterwards.
pub fn with_blending<S, R>(state: &S, draw: impl FnOnce() -> R) -> R
where
    S: RenderState + ?Sized,
{
    state.set_blending(true);
    let result = draw();
    state.set_blending(false);
    result
}
