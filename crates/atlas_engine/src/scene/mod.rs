//! Scene management
//!
//! The registry owns named meshes and materials plus the flat renderable
//! list; the camera produces the per-frame view matrix.

pub mod camera;
pub mod registry;

pub use camera::FlyCamera;
pub use registry::{RenderObject, SceneRegistry};

pub use crate::render::vulkan::Material;
