//! Framebuffer management
//!
//! One framebuffer per swapchain image, each pairing that image's color view
//! with the shared depth view.

use ash::{vk, Device};

use crate::render::vulkan::{RenderPass, Swapchain, VulkanError, VulkanResult};

/// Framebuffer with RAII cleanup
pub struct Framebuffer {
    device: Device,
    handle: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a framebuffer binding `attachments` to `render_pass`
    pub fn new(
        device: &Device,
        render_pass: &RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass.handle())
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let handle = unsafe {
            device
                .create_framebuffer(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: device.clone(),
            handle,
        })
    }

    /// One framebuffer per swapchain image, each with the shared depth view
    /// as the second attachment
    pub fn for_swapchain(
        device: &Device,
        render_pass: &RenderPass,
        swapchain: &Swapchain,
    ) -> VulkanResult<Vec<Self>> {
        swapchain
            .image_views()
            .iter()
            .map(|&color_view| {
                let attachments = [color_view, swapchain.depth_view()];
                Self::new(device, render_pass, &attachments, swapchain.extent())
            })
            .collect()
    }

    /// Raw framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.handle
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.handle, None);
        }
    }
}
