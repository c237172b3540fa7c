use nalgebra::{Isometry3, Matrix4, Point3};

/// GL texture name as seen by the tracking provider and video source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Per-anchor status reported by the tracking provider each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingState {
    Paused,
    Tracking,
    Stopped,
}

/// Rigid world transform of an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose(pub Isometry3<f32>);

impl Pose {
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self(Isometry3::translation(x, y, z))
    }

    /// Column-major 4x4 world matrix.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        self.0.to_homogeneous()
    }

    pub fn translation(&self) -> Point3<f32> {
        Point3::from(self.0.translation.vector)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Snapshot of one tracked marker, valid for its parent frame only.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedAnchor {
    /// Index of the marker image in the provider's database.
    pub index: u32,
    pub state: TrackingState,
    pub pose: Pose,
    /// Physical width of the marker in meters.
    pub extent_x: f32,
    /// Physical depth of the marker in meters.
    pub extent_z: f32,
}

impl TrackedAnchor {
    pub fn is_tracking(&self) -> bool {
        self.state == TrackingState::Tracking
    }
}

/// Immutable per-tick snapshot produced by the tracking provider.
///
/// Nothing here refers back into the provider, so holding a frame past the
/// next `advance` cannot observe mutated poses.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingFrame {
    /// Camera capture time, monotonic nanoseconds.
    pub timestamp_ns: i64,
    pub camera_texture: TextureId,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub anchors: Vec<TrackedAnchor>,
    /// Camera texture coordinates for the full-screen quad, in the order
    /// (-1,-1), (1,-1), (-1,1), (1,1). Present only when display geometry
    /// changed since the previous frame.
    pub display_uvs: Option<[f32; 8]>,
}

impl TrackingFrame {
    pub fn tracking_anchors(&self) -> impl Iterator<Item = &TrackedAnchor> {
        self.anchors.iter().filter(|a| a.is_tracking())
    }

    pub fn has_tracking_anchor(&self) -> bool {
        self.anchors.iter().any(TrackedAnchor::is_tracking)
    }
}
