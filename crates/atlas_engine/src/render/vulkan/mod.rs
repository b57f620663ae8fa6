//! Vulkan rendering backend
//!
//! RAII wrappers over device objects plus the frame-lifecycle orchestration.
//! Creation order is bootstrap → swapchain → render pass → framebuffers →
//! frame ring → pipelines → meshes; teardown runs in exact reverse.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod deletion_queue;
pub mod descriptor;
pub mod frame;
pub mod framebuffer;
pub mod pipeline;
pub mod render_pass;
pub mod renderer;
pub mod shader;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod vertex_layout;

pub use buffer::{Buffer, UniformBuffer, VertexBuffer};
pub use commands::{ActiveRenderPass, CommandPool, CommandRecorder};
pub use context::{
    LogicalDevice, MemoryAllocator, PhysicalDeviceInfo, VulkanError, VulkanInstance, VulkanResult,
};
pub use deletion_queue::DeletionQueue;
pub use descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder};
pub use frame::{CameraUniformData, FrameRing, FrameScheduler, FrameSlot, MeshPushConstants};
pub use framebuffer::Framebuffer;
pub use pipeline::{GraphicsPipeline, PipelineConfig};
pub use render_pass::RenderPass;
pub use renderer::{Material, MaterialSpec, VulkanRenderer};
pub use shader::ShaderModule;
pub use surface::Surface;
pub use swapchain::Swapchain;
pub use sync::{Fence, FrameSync, Semaphore};
pub use vertex_layout::VertexInputDescription;
