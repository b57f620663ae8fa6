//! Rendering subsystem
//!
//! Low-level Vulkan implementation plus the backend-agnostic mesh and
//! draw-list types the scene layer feeds it.

pub mod draw_list;
pub mod mesh;
pub mod vulkan;
pub mod window;

pub use draw_list::{build_draw_list, DrawStep, ResolvedDraw};
pub use mesh::{GpuMesh, Mesh, Vertex};
pub use vulkan::VulkanRenderer;
pub use window::{Window, WindowError};
