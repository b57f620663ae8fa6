//! Command buffer recording
//!
//! `CommandPool` owns per-frame command buffers; `CommandRecorder` and
//! `ActiveRenderPass` scope recording so begin/end pairs cannot be mismatched.

use ash::{vk, Device};
use bytemuck::Pod;

use crate::render::vulkan::{Framebuffer, RenderPass, VulkanError, VulkanResult};

/// Command pool with RAII cleanup
pub struct CommandPool {
    device: Device,
    handle: vk::CommandPool,
}

impl CommandPool {
    /// Create a resettable command pool for `queue_family`
    pub fn new(device: &Device, queue_family: u32) -> VulkanResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let handle = unsafe {
            device
                .create_command_pool(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: device.clone(),
            handle,
        })
    }

    /// Allocate one primary command buffer from this pool
    pub fn allocate_primary(&self) -> VulkanResult<vk::CommandBuffer> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.handle)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffers = unsafe {
            self.device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::Api)?
        };
        buffers
            .into_iter()
            .next()
            .ok_or_else(|| VulkanError::InitializationFailed(
                "command buffer allocation returned nothing".to_string(),
            ))
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.handle, None);
        }
    }
}

/// Scoped recording of one command buffer
pub struct CommandRecorder<'a> {
    device: &'a Device,
    command_buffer: vk::CommandBuffer,
}

impl<'a> CommandRecorder<'a> {
    /// Reset the buffer and begin recording for one-time submission
    pub fn begin(device: &'a Device, command_buffer: vk::CommandBuffer) -> VulkanResult<Self> {
        unsafe {
            device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::Api)?;

            let begin_info = vk::CommandBufferBeginInfo::builder()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }

        Ok(Self {
            device,
            command_buffer,
        })
    }

    /// Begin `render_pass` into `framebuffer`, clearing color to black and
    /// depth to 1.0
    pub fn begin_render_pass(
        &mut self,
        render_pass: &RenderPass,
        framebuffer: &Framebuffer,
        extent: vk::Extent2D,
    ) -> ActiveRenderPass<'_, 'a> {
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass.handle())
            .framebuffer(framebuffer.handle())
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        unsafe {
            self.device.cmd_begin_render_pass(
                self.command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }

        ActiveRenderPass { recorder: self }
    }

    /// Finish recording
    pub fn end(self) -> VulkanResult<vk::CommandBuffer> {
        unsafe {
            self.device
                .end_command_buffer(self.command_buffer)
                .map_err(VulkanError::Api)?;
        }
        Ok(self.command_buffer)
    }
}

/// Recording scope inside a render pass; ends the pass on drop
pub struct ActiveRenderPass<'r, 'a> {
    recorder: &'r mut CommandRecorder<'a>,
}

impl ActiveRenderPass<'_, '_> {
    /// Set the dynamic viewport and scissor to cover `extent`
    pub fn set_viewport(&mut self, extent: vk::Extent2D) {
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        unsafe {
            self.recorder
                .device
                .cmd_set_viewport(self.recorder.command_buffer, 0, &[viewport]);
            self.recorder
                .device
                .cmd_set_scissor(self.recorder.command_buffer, 0, &[scissor]);
        }
    }

    /// Bind a graphics pipeline
    pub fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
        unsafe {
            self.recorder.device.cmd_bind_pipeline(
                self.recorder.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline,
            );
        }
    }

    /// Bind descriptor set 0
    pub fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, set: vk::DescriptorSet) {
        unsafe {
            self.recorder.device.cmd_bind_descriptor_sets(
                self.recorder.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[set],
                &[],
            );
        }
    }

    /// Bind a vertex buffer at binding 0
    pub fn bind_vertex_buffer(&mut self, buffer: vk::Buffer) {
        unsafe {
            self.recorder.device.cmd_bind_vertex_buffers(
                self.recorder.command_buffer,
                0,
                &[buffer],
                &[0],
            );
        }
    }

    /// Push a Pod value as vertex-stage push constants
    pub fn push_constants<T: Pod>(&mut self, layout: vk::PipelineLayout, value: &T) {
        unsafe {
            self.recorder.device.cmd_push_constants(
                self.recorder.command_buffer,
                layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(value),
            );
        }
    }

    /// Issue a non-indexed draw
    pub fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        unsafe {
            self.recorder
                .device
                .cmd_draw(self.recorder.command_buffer, vertex_count, 1, first_vertex, 0);
        }
    }
}

impl Drop for ActiveRenderPass<'_, '_> {
    fn drop(&mut self) {
        unsafe {
            self.recorder
                .device
                .cmd_end_render_pass(self.recorder.command_buffer);
        }
    }
}
