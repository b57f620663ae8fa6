//! Vulkan context management
//!
//! Device bootstrap: instance with optional validation, physical device
//! selection, logical device and graphics queue, and the memory allocator the
//! buffer and image wrappers allocate through. Every failure surfaces as a
//! typed `VulkanError`; nothing here aborts the process.

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Entry, Instance};
use std::ffi::{CStr, CString};
use thiserror::Error;

use crate::render::vulkan::Surface;
use crate::render::window::Window;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Vulkan context initialization failed
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// No physical device satisfied the selection criteria
    #[error("no suitable physical device (need API >= 1.1 with a present-capable graphics queue)")]
    NoSuitableDevice,

    /// No suitable memory type found for an allocation
    #[error("no suitable memory type found")]
    NoSuitableMemoryType,

    /// A frame fence did not signal within the configured timeout
    #[error("device hung: fence not signaled after {waited_ns} ns")]
    DeviceHung {
        /// How long the fence wait blocked before giving up
        waited_ns: u64,
    },

    /// Invalid operation attempted
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Minimum instance/device API version the engine requires
pub const MIN_API_VERSION: u32 = vk::API_VERSION_1_1;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    debug_utils: Option<DebugUtils>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance.
    ///
    /// Validation layers and the debug messenger are installed only when
    /// `enable_validation` is set; their absence is never fatal.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| {
            VulkanError::InitializationFailed(format!("failed to load Vulkan: {e:?}"))
        })?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("invalid app name".to_string()))?;
        let engine_name_cstr = CString::new("Atlas").map_err(|_| {
            VulkanError::InitializationFailed("invalid engine name".to_string())
        })?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(MIN_API_VERSION);

        let required_extensions = window.required_instance_extensions().map_err(|e| {
            VulkanError::InitializationFailed(format!("failed to get required extensions: {e}"))
        })?;

        let cstr_extensions: Vec<CString> = required_extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()))
            .collect::<Result<_, _>>()
            .map_err(|_| {
                VulkanError::InitializationFailed("invalid extension name".to_string())
            })?;

        let mut extensions: Vec<*const i8> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if enable_validation {
            vec![CString::new("VK_LAYER_KHRONOS_validation")
                .map_err(|_| VulkanError::InitializationFailed("invalid layer name".to_string()))?]
        } else {
            vec![]
        };
        let layer_names_ptrs: Vec<*const i8> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names_ptrs);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        let (debug_utils, debug_messenger) = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => (Some(debug_utils), Some(messenger)),
                Err(e) => {
                    // Soft failure: validation output is lost, rendering is not
                    log::warn!("failed to install debug messenger: {e}");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        log::info!("Vulkan instance created (validation: {enable_validation})");

        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
        })
    }

    fn setup_debug_messenger(
        debug_utils: &DebugUtils,
    ) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(messenger)) =
                (self.debug_utils.as_ref(), self.debug_messenger.take())
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() {
        std::borrow::Cow::Borrowed("<no message>")
    } else {
        CStr::from_ptr((*callback_data).p_message).to_string_lossy()
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[vulkan] {message}");
    } else {
        log::warn!("[vulkan] {message}");
    }

    vk::FALSE
}

/// A selected physical device and its graphics queue family
pub struct PhysicalDeviceInfo {
    /// Physical device handle
    pub device: vk::PhysicalDevice,
    /// Index of the graphics queue family (also supports present)
    pub graphics_family: u32,
    /// Device name, for logging
    pub name: String,
}

impl PhysicalDeviceInfo {
    /// Select a physical device that meets the minimum API version and can
    /// both render and present to `surface`. Discrete GPUs win ties.
    pub fn select(instance: &Instance, surface: &Surface) -> VulkanResult<Self> {
        let devices = unsafe {
            instance
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        let mut best: Option<(Self, bool)> = None;

        for device in devices {
            let properties = unsafe { instance.get_physical_device_properties(device) };
            if properties.api_version < MIN_API_VERSION {
                continue;
            }

            let Some(graphics_family) = Self::find_graphics_family(instance, surface, device)?
            else {
                continue;
            };

            let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
                .to_string_lossy()
                .into_owned();
            let discrete = properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;

            let candidate = Self {
                device,
                graphics_family,
                name,
            };

            match &best {
                Some((_, true)) => {}
                _ if discrete => best = Some((candidate, true)),
                None => best = Some((candidate, false)),
                _ => {}
            }
        }

        let (selected, _) = best.ok_or(VulkanError::NoSuitableDevice)?;
        log::info!(
            "selected physical device '{}' (graphics family {})",
            selected.name,
            selected.graphics_family
        );
        Ok(selected)
    }

    fn find_graphics_family(
        instance: &Instance,
        surface: &Surface,
        device: vk::PhysicalDevice,
    ) -> VulkanResult<Option<u32>> {
        let families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        for (index, family) in families.iter().enumerate() {
            let index = index as u32;
            if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }
            if surface.supports_present(device, index)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

/// Logical device wrapper owning the graphics queue
pub struct LogicalDevice {
    /// ash device (cloneable function table + handle)
    pub device: Device,
    /// Graphics-capable queue, also used for present
    pub graphics_queue: vk::Queue,
    /// Queue family index of `graphics_queue`
    pub graphics_family: u32,
}

impl LogicalDevice {
    /// Create a logical device with one graphics queue and the swapchain
    /// extension enabled
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let queue_priorities = [1.0f32];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical.graphics_family)
            .queue_priorities(&queue_priorities)
            .build();

        let extension_names = [SwapchainLoader::name().as_ptr()];
        let features = vk::PhysicalDeviceFeatures::default();

        let queue_infos = [queue_info];
        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .create_device(physical.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue = unsafe { device.get_device_queue(physical.graphics_family, 0) };

        log::info!("logical device created");

        Ok(Self {
            device,
            graphics_queue,
            graphics_family: physical.graphics_family,
        })
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle().map_err(VulkanError::Api) }
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// GPU memory allocator bound to {instance, physical device, device}.
///
/// Caches the physical device memory properties once and serves allocations
/// for buffers and images. All device memory in the engine goes through here.
pub struct MemoryAllocator {
    device: Device,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
}

impl MemoryAllocator {
    /// Create an allocator for the given device triple
    pub fn new(
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        device: Device,
    ) -> Self {
        let memory_properties =
            unsafe { instance.get_physical_device_memory_properties(physical_device) };
        Self {
            device,
            memory_properties,
        }
    }

    /// The device this allocator allocates on
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Find a memory type matching `type_filter` with the requested properties
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<u32> {
        for i in 0..self.memory_properties.memory_type_count {
            if (type_filter & (1 << i)) != 0
                && self.memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
            {
                return Ok(i);
            }
        }
        Err(VulkanError::NoSuitableMemoryType)
    }

    /// Allocate device memory satisfying `requirements` with the given
    /// property flags
    pub fn allocate(
        &self,
        requirements: vk::MemoryRequirements,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<vk::DeviceMemory> {
        let memory_type_index =
            self.find_memory_type(requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        unsafe {
            self.device
                .allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)
        }
    }
}
