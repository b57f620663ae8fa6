//! Vulkan surface management
//!
//! Owns the `SurfaceKHR` created by the window layer and exposes the
//! capability queries swapchain creation needs.

use ash::extensions::khr::Surface as SurfaceLoader;
use ash::{vk, Entry, Instance};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Owning wrapper around a `SurfaceKHR` and its extension loader
pub struct Surface {
    loader: SurfaceLoader,
    handle: vk::SurfaceKHR,
}

impl Surface {
    /// Wrap a surface handle produced by the window layer
    pub fn new(entry: &Entry, instance: &Instance, handle: vk::SurfaceKHR) -> Self {
        let loader = SurfaceLoader::new(entry, instance);
        Self { loader, handle }
    }

    /// Raw surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// Whether `queue_family` on `device` can present to this surface
    pub fn supports_present(
        &self,
        device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> VulkanResult<bool> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(device, queue_family, self.handle)
                .map_err(VulkanError::Api)
        }
    }

    /// Surface capabilities (image counts, extents, transforms)
    pub fn capabilities(
        &self,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(device, self.handle)
                .map_err(VulkanError::Api)
        }
    }

    /// Supported surface formats
    pub fn formats(
        &self,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_formats(device, self.handle)
                .map_err(VulkanError::Api)
        }
    }

    /// Supported present modes
    pub fn present_modes(
        &self,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(device, self.handle)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}
