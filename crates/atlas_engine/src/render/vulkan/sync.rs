//! Synchronization primitives for Vulkan
//!
//! Semaphores order work on the GPU timeline; fences let the CPU wait for
//! submitted work. A fence wait that exceeds its timeout is reported as a
//! typed `DeviceHung` error rather than blocking forever.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Binary semaphore with RAII cleanup
pub struct Semaphore {
    device: Device,
    handle: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled semaphore
    pub fn new(device: &Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let handle = unsafe {
            device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self {
            device: device.clone(),
            handle,
        })
    }

    /// Raw semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.handle
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.handle, None);
        }
    }
}

/// Fence with RAII cleanup and bounded waits
pub struct Fence {
    device: Device,
    handle: vk::Fence,
}

impl Fence {
    /// Create a fence, optionally already signaled.
    ///
    /// Frame fences start signaled so the first wait of each slot passes
    /// without a prior submission.
    pub fn new(device: &Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let handle = unsafe {
            device
                .create_fence(&create_info, None)
                .map_err(VulkanError::Api)?
        };
        Ok(Self {
            device: device.clone(),
            handle,
        })
    }

    /// Raw fence handle
    pub fn handle(&self) -> vk::Fence {
        self.handle
    }

    /// Wait for the fence to signal, up to `timeout_ns` nanoseconds.
    ///
    /// A timeout means GPU work from a previous frame never completed, which
    /// the caller surfaces as a fatal condition rather than retrying.
    pub fn wait(&self, timeout_ns: u64) -> VulkanResult<()> {
        let fences = [self.handle];
        unsafe {
            match self.device.wait_for_fences(&fences, true, timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => Err(VulkanError::DeviceHung {
                    waited_ns: timeout_ns,
                }),
                Err(e) => Err(VulkanError::Api(e)),
            }
        }
    }

    /// Reset the fence to unsignaled
    pub fn reset(&self) -> VulkanResult<()> {
        let fences = [self.handle];
        unsafe { self.device.reset_fences(&fences).map_err(VulkanError::Api) }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.handle, None);
        }
    }
}

/// The synchronization set one frame slot owns
pub struct FrameSync {
    /// Signaled when the swapchain image is ready to be rendered to
    pub image_available: Semaphore,
    /// Signaled when rendering finishes, waited on by present
    pub render_finished: Semaphore,
    /// Signaled when the frame's GPU work completes
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the semaphore pair and a signaled fence for one frame slot
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device)?,
            render_finished: Semaphore::new(device)?,
            in_flight: Fence::new(device, true)?,
        })
    }
}
