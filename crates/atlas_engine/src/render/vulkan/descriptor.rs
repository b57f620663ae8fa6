//! Descriptor set management
//!
//! The engine's descriptor usage is small: one uniform-buffer set per frame
//! slot holding the camera data. The builder keeps layout construction
//! declarative anyway so new bindings slot in without churn.

use ash::{vk, Device};

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Builder for a descriptor set layout
#[derive(Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Start an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a uniform buffer binding visible to `stages`
    pub fn add_uniform_buffer(mut self, binding: u32, stages: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stages)
                .build(),
        );
        self
    }

    /// Create the layout
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let create_info =
            vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        let handle = unsafe {
            device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(DescriptorSetLayout {
            device: device.clone(),
            handle,
        })
    }
}

/// Descriptor set layout with RAII cleanup
pub struct DescriptorSetLayout {
    device: Device,
    handle: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Raw layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.handle
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.handle, None);
        }
    }
}

/// Descriptor pool sized for the engine's uniform-buffer sets
pub struct DescriptorPool {
    device: Device,
    handle: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Create a pool able to allocate `max_sets` uniform-buffer sets
    pub fn new(device: &Device, max_sets: u32) -> VulkanResult<Self> {
        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: max_sets,
        }];

        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&pool_sizes)
            .max_sets(max_sets);

        let handle = unsafe {
            device
                .create_descriptor_pool(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: device.clone(),
            handle,
        })
    }

    /// Allocate one set with the given layout. Sets live as long as the pool.
    pub fn allocate(&self, layout: &DescriptorSetLayout) -> VulkanResult<vk::DescriptorSet> {
        let layouts = [layout.handle()];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.handle)
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)?
        };
        sets.into_iter()
            .next()
            .ok_or_else(|| VulkanError::InitializationFailed(
                "descriptor set allocation returned nothing".to_string(),
            ))
    }

    /// Point `set`'s binding at a whole uniform buffer
    pub fn write_uniform_buffer(
        &self,
        set: vk::DescriptorSet,
        binding: u32,
        buffer: vk::Buffer,
        range: vk::DeviceSize,
    ) {
        let buffer_info = vk::DescriptorBufferInfo {
            buffer,
            offset: 0,
            range,
        };
        let buffer_infos = [buffer_info];

        let write = vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&buffer_infos)
            .build();

        unsafe {
            self.device.update_descriptor_sets(&[write], &[]);
        }
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.handle, None);
        }
    }
}
