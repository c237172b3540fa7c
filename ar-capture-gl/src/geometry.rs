use ar_capture_core::Pose;
use nalgebra::{Matrix4, Vector3};

/// Full-viewport quad in normalized device coordinates, as a triangle strip.
pub const NDC_QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Texture coordinates for [`NDC_QUAD`] when the device supplies none.
pub const DEFAULT_TEX_COORDS: [f32; 8] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];

/// Unit footprint in the anchor's XZ plane, centred on its origin, as a
/// triangle strip.
pub const FOOTPRINT_QUAD: [f32; 12] = [
    -0.5, 0.0, -0.5, //
    0.5, 0.0, -0.5, //
    -0.5, 0.0, 0.5, //
    0.5, 0.0, 0.5,
];

pub const FOOTPRINT_TEX_COORDS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];

/// Digital zoom factor, with non-positive or non-finite values reset to 1.
pub fn sanitize_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() && zoom > 0.0 {
        zoom
    } else {
        1.0
    }
}

/// Pull a texture coordinate toward the centre: `0.5 + (c - 0.5) / zoom`.
pub fn zoom_tex_coord(coord: f32, zoom: f32) -> f32 {
    0.5 + (coord - 0.5) / sanitize_zoom(zoom)
}

pub fn zoom_tex_coords(coords: &[f32; 8], zoom: f32) -> [f32; 8] {
    coords.map(|c| zoom_tex_coord(c, zoom))
}

/// Anchor pose with the unit footprint scaled to the anchor's extents.
pub fn model_matrix(pose: &Pose, extent_x: f32, extent_z: f32) -> Matrix4<f32> {
    pose.to_matrix() * Matrix4::new_nonuniform_scaling(&Vector3::new(extent_x, 1.0, extent_z))
}

pub fn model_view_projection(
    projection: &Matrix4<f32>,
    view: &Matrix4<f32>,
    model: &Matrix4<f32>,
) -> Matrix4<f32> {
    projection * view * model
}

/// Little-endian bytes for a GL vertex buffer upload.
pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
