//! Swapchain management
//!
//! Owns the swapchain, its image views, and the depth buffer whose extent is
//! tied to the swapchain. Presentation runs FIFO for vsync; images prefer
//! B8G8R8A8_SRGB.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};

use crate::render::vulkan::{MemoryAllocator, Surface, VulkanError, VulkanResult};

/// Depth format used for every swapchain
pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Device-local depth attachment sized to the swapchain extent
struct DepthImage {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
}

impl DepthImage {
    fn new(allocator: &MemoryAllocator, extent: vk::Extent2D) -> VulkanResult<Self> {
        let device = allocator.device().clone();

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            device
                .create_image(&image_info, None)
                .map_err(VulkanError::Api)?
        };

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory = match allocator.allocate(requirements, vk::MemoryPropertyFlags::DEVICE_LOCAL)
        {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        unsafe {
            if let Err(e) = device.bind_image_memory(image, memory, 0) {
                device.destroy_image(image, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(e));
            }
        }

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(DEPTH_FORMAT)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = unsafe {
            match device.create_image_view(&view_info, None) {
                Ok(view) => view,
                Err(e) => {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                    return Err(VulkanError::Api(e));
                }
            }
        };

        Ok(Self {
            device,
            image,
            memory,
            view,
        })
    }
}

impl Drop for DepthImage {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Swapchain with image views and its matching depth buffer
pub struct Swapchain {
    device: Device,
    loader: SwapchainLoader,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
    depth: DepthImage,
}

impl Swapchain {
    /// Create a swapchain for the given surface and framebuffer size
    pub fn new(
        instance: &Instance,
        device: &Device,
        physical_device: vk::PhysicalDevice,
        surface: &Surface,
        allocator: &MemoryAllocator,
        window_extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        Self::create(
            instance,
            device,
            physical_device,
            surface,
            allocator,
            window_extent,
            vk::SwapchainKHR::null(),
        )
    }

    /// Create a replacement swapchain chained to `old` for smoother handover.
    /// The caller is responsible for retiring `old` once its frames complete.
    pub fn recreate(
        instance: &Instance,
        device: &Device,
        physical_device: vk::PhysicalDevice,
        surface: &Surface,
        allocator: &MemoryAllocator,
        window_extent: vk::Extent2D,
        old: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        Self::create(
            instance,
            device,
            physical_device,
            surface,
            allocator,
            window_extent,
            old,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        instance: &Instance,
        device: &Device,
        physical_device: vk::PhysicalDevice,
        surface: &Surface,
        allocator: &MemoryAllocator,
        window_extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let capabilities = surface.capabilities(physical_device)?;
        let formats = surface.formats(physical_device)?;

        let surface_format = Self::choose_format(&formats)?;
        let extent = Self::choose_extent(&capabilities, window_extent);
        let present_mode = vk::PresentModeKHR::FIFO;

        let mut image_count = capabilities.min_image_count + 1;
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        // Built before the raw swapchain handle: from here on, any failure
        // only has the views and the handle itself to unwind, and the depth
        // image cleans itself up on early return.
        let depth = DepthImage::new(allocator, extent)?;

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let loader = SwapchainLoader::new(instance, device);
        let handle = unsafe {
            loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        let images = unsafe {
            match loader.get_swapchain_images(handle) {
                Ok(images) => images,
                Err(e) => {
                    loader.destroy_swapchain(handle, None);
                    return Err(VulkanError::Api(e));
                }
            }
        };

        let mut image_views = Vec::with_capacity(images.len());
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(surface_format.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe {
                match device.create_image_view(&view_info, None) {
                    Ok(view) => view,
                    Err(e) => {
                        for view in image_views.drain(..) {
                            device.destroy_image_view(view, None);
                        }
                        loader.destroy_swapchain(handle, None);
                        return Err(VulkanError::Api(e));
                    }
                }
            };
            image_views.push(view);
        }

        log::info!(
            "swapchain created: {}x{}, {} images, format {:?}",
            extent.width,
            extent.height,
            images.len(),
            surface_format.format
        );

        Ok(Self {
            device: device.clone(),
            loader,
            handle,
            images,
            image_views,
            format: surface_format.format,
            extent,
            depth,
        })
    }

    fn choose_format(formats: &[vk::SurfaceFormatKHR]) -> VulkanResult<vk::SurfaceFormatKHR> {
        formats
            .iter()
            .find(|f| {
                f.format == vk::Format::B8G8R8A8_SRGB
                    && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .or_else(|| formats.first())
            .copied()
            .ok_or_else(|| VulkanError::InitializationFailed(
                "surface reports no formats".to_string(),
            ))
    }

    fn choose_extent(
        capabilities: &vk::SurfaceCapabilitiesKHR,
        window_extent: vk::Extent2D,
    ) -> vk::Extent2D {
        if capabilities.current_extent.width != u32::MAX {
            capabilities.current_extent
        } else {
            vk::Extent2D {
                width: window_extent.width.clamp(
                    capabilities.min_image_extent.width,
                    capabilities.max_image_extent.width,
                ),
                height: window_extent.height.clamp(
                    capabilities.min_image_extent.height,
                    capabilities.max_image_extent.height,
                ),
            }
        }
    }

    /// Raw swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Swapchain extension loader (shared with acquire/present)
    pub fn loader(&self) -> &SwapchainLoader {
        &self.loader
    }

    /// Number of swapchain images
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Image views, one per swapchain image
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Depth attachment view shared by every framebuffer
    pub fn depth_view(&self) -> vk::ImageView {
        self.depth.view
    }

    /// Color format of the swapchain images
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Current swapchain extent in pixels
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Acquire the next image. Returns the image index and whether the
    /// swapchain is suboptimal; `ERROR_OUT_OF_DATE_KHR` surfaces as `Api`.
    pub fn acquire_next_image(
        &self,
        timeout_ns: u64,
        signal: vk::Semaphore,
    ) -> VulkanResult<(u32, bool)> {
        unsafe {
            self.loader
                .acquire_next_image(self.handle, timeout_ns, signal, vk::Fence::null())
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.handle, None);
        }
    }
}
