pub mod frame_driver;
pub mod recorder;
pub mod surface_bridge;
