//! Vulkan buffer management
//!
//! `Buffer` owns a buffer and its backing memory; `VertexBuffer` and
//! `UniformBuffer` specialize it for the two uses the engine has. All
//! allocations go through the `MemoryAllocator`.

use ash::{vk, Device};
use bytemuck::Pod;

use crate::render::vulkan::{MemoryAllocator, VulkanError, VulkanResult};

/// Buffer with bound device memory and RAII cleanup
pub struct Buffer {
    device: Device,
    handle: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer of `size` bytes with the given usage and memory
    /// properties
    pub fn new(
        allocator: &MemoryAllocator,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let device = allocator.device().clone();

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let handle = unsafe {
            device
                .create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(handle) };
        let memory = match allocator.allocate(requirements, properties) {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(handle, None) };
                return Err(e);
            }
        };

        unsafe {
            if let Err(e) = device.bind_buffer_memory(handle, memory, 0) {
                device.destroy_buffer(handle, None);
                device.free_memory(memory, None);
                return Err(VulkanError::Api(e));
            }
        }

        Ok(Self {
            device,
            handle,
            memory,
            size,
        })
    }

    /// Raw buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    /// Buffer size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Copy `data` into the buffer. The memory must be host-visible.
    pub fn write_bytes(&self, data: &[u8]) -> VulkanResult<()> {
        if data.len() as vk::DeviceSize > self.size {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "write of {} bytes exceeds buffer size {}",
                    data.len(),
                    self.size
                ),
            });
        }

        unsafe {
            let mapped = self
                .device
                .map_memory(
                    self.memory,
                    0,
                    data.len() as vk::DeviceSize,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(VulkanError::Api)?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.handle, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Host-visible vertex buffer holding an immutable copy of mesh data
pub struct VertexBuffer {
    buffer: Buffer,
}

impl VertexBuffer {
    /// Create a vertex buffer and fill it with `vertices`
    pub fn new<V: Pod>(allocator: &MemoryAllocator, vertices: &[V]) -> VulkanResult<Self> {
        if vertices.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: "cannot create a vertex buffer from an empty mesh".to_string(),
            });
        }

        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = Buffer::new(
            allocator,
            bytes.len() as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        buffer.write_bytes(bytes)?;
        Ok(Self { buffer })
    }

    /// Raw buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

/// Host-visible uniform buffer for one `T`, rewritten every frame
pub struct UniformBuffer<T: Pod> {
    buffer: Buffer,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    /// Create an uninitialized uniform buffer sized for one `T`
    pub fn new(allocator: &MemoryAllocator) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            allocator,
            std::mem::size_of::<T>() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        Ok(Self {
            buffer,
            _marker: std::marker::PhantomData,
        })
    }

    /// Overwrite the buffer contents with `value`
    pub fn write(&self, value: &T) -> VulkanResult<()> {
        self.buffer.write_bytes(bytemuck::bytes_of(value))
    }

    /// Raw buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Size of the buffer in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}
