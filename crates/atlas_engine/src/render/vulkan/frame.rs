//! Frame ring and scheduling
//!
//! The renderer keeps a small ring of frame slots so the CPU can record frame
//! N+1 while the GPU draws frame N. `FrameScheduler` is the pure state
//! machine behind the ring: it knows nothing about Vulkan, which keeps the
//! back-pressure rules testable without a device.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};

use crate::render::vulkan::{
    CommandPool, DescriptorPool, DescriptorSetLayout, FrameSync, MemoryAllocator, UniformBuffer,
    VulkanError, VulkanResult,
};

/// Per-frame camera data as the shaders see it
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniformData {
    /// View matrix (world → camera), column-major
    pub view: [[f32; 4]; 4],
    /// Projection matrix with Vulkan Y-flip applied
    pub proj: [[f32; 4]; 4],
    /// Premultiplied projection * view
    pub view_proj: [[f32; 4]; 4],
}

/// Per-draw push constants: the model matrix
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshPushConstants {
    /// Model matrix (model → world), column-major
    pub model: [[f32; 4]; 4],
}

impl MeshPushConstants {
    /// Push constant range covering this struct in the vertex stage
    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: 0,
            size: std::mem::size_of::<Self>() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// No GPU work outstanding; the slot can be recorded immediately
    Idle,
    /// CPU is recording into the slot's command buffer
    Recording,
    /// Work submitted; the slot's fence has not been observed signaled
    Submitted,
}

/// Pure state machine tracking which frame slots have work in flight.
///
/// The protocol per frame is `retire_current` (after a fence wait if
/// `requires_retire`), then `begin`, then `submit`, which advances to the
/// next slot. With N slots the CPU can run at most N frames ahead: starting
/// frame i+N requires frame i to have retired first.
pub struct FrameScheduler {
    slots: Vec<SlotState>,
    current: usize,
    frame_number: u64,
}

impl FrameScheduler {
    /// Create a scheduler for `slot_count` frame slots (at least 1)
    pub fn new(slot_count: usize) -> Self {
        assert!(slot_count >= 1, "frame ring needs at least one slot");
        Self {
            slots: vec![SlotState::Idle; slot_count],
            current: 0,
            frame_number: 0,
        }
    }

    /// Number of slots in the ring
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot the next frame will use
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Monotonic count of submitted frames
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Whether the current slot still has GPU work outstanding, meaning the
    /// caller must wait on its fence before recording
    pub fn requires_retire(&self) -> bool {
        self.slots[self.current] == SlotState::Submitted
    }

    /// Mark the current slot's previously submitted work complete
    pub fn retire_current(&mut self) {
        if self.slots[self.current] == SlotState::Submitted {
            self.slots[self.current] = SlotState::Idle;
        }
    }

    /// Begin recording the current slot. Fails if its previous submission
    /// has not been retired.
    pub fn begin(&mut self) -> VulkanResult<usize> {
        match self.slots[self.current] {
            SlotState::Idle => {
                self.slots[self.current] = SlotState::Recording;
                Ok(self.current)
            }
            state => Err(VulkanError::InvalidOperation {
                reason: format!(
                    "cannot begin frame on slot {} in state {state:?}",
                    self.current
                ),
            }),
        }
    }

    /// Mark the current slot submitted and advance to the next slot
    pub fn submit(&mut self) -> VulkanResult<()> {
        if self.slots[self.current] != SlotState::Recording {
            return Err(VulkanError::InvalidOperation {
                reason: format!("slot {} submitted without recording", self.current),
            });
        }
        self.slots[self.current] = SlotState::Submitted;
        self.frame_number += 1;
        self.current = (self.current + 1) % self.slots.len();
        Ok(())
    }

    /// Abandon a recording without submitting (swapchain went out of date
    /// between begin and submit)
    pub fn abandon(&mut self) {
        if self.slots[self.current] == SlotState::Recording {
            self.slots[self.current] = SlotState::Idle;
        }
    }
}

/// The per-frame resources one slot of the ring owns
pub struct FrameSlot {
    /// Command pool the slot's buffer was allocated from
    pub command_pool: CommandPool,
    /// Primary command buffer re-recorded every frame
    pub command_buffer: vk::CommandBuffer,
    /// Semaphores and fence for this slot
    pub sync: FrameSync,
    /// Camera uniform buffer, rewritten each frame
    pub camera_buffer: UniformBuffer<CameraUniformData>,
    /// Descriptor set pointing at `camera_buffer`
    pub descriptor_set: vk::DescriptorSet,
}

/// Ring of frame slots plus the scheduler that sequences them
pub struct FrameRing {
    /// Frame slots, indexed by `scheduler.current_slot()`
    pub slots: Vec<FrameSlot>,
    /// Slot sequencing state machine
    pub scheduler: FrameScheduler,
}

impl FrameRing {
    /// Create `count` frame slots with their pools, sync objects, camera
    /// buffers, and descriptor sets
    pub fn new(
        device: &Device,
        graphics_family: u32,
        allocator: &MemoryAllocator,
        descriptor_pool: &DescriptorPool,
        camera_layout: &DescriptorSetLayout,
        count: usize,
    ) -> VulkanResult<Self> {
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            let command_pool = CommandPool::new(device, graphics_family)?;
            let command_buffer = command_pool.allocate_primary()?;
            let sync = FrameSync::new(device)?;
            let camera_buffer = UniformBuffer::<CameraUniformData>::new(allocator)?;

            let descriptor_set = descriptor_pool.allocate(camera_layout)?;
            descriptor_pool.write_uniform_buffer(
                descriptor_set,
                0,
                camera_buffer.handle(),
                camera_buffer.size(),
            );

            slots.push(FrameSlot {
                command_pool,
                command_buffer,
                sync,
                camera_buffer,
                descriptor_set,
            });
        }

        Ok(Self {
            slots,
            scheduler: FrameScheduler::new(count),
        })
    }

    /// The slot the next frame will record into
    pub fn current(&self) -> &FrameSlot {
        &self.slots[self.scheduler.current_slot()]
    }

    /// Wait for every slot with outstanding work, bounding each wait by
    /// `timeout_ns`. Used before swapchain recreation and shutdown.
    pub fn wait_all(&mut self, timeout_ns: u64) -> VulkanResult<()> {
        for (index, slot) in self.slots.iter().enumerate() {
            if self.scheduler.slots[index] == SlotState::Submitted {
                slot.sync.in_flight.wait(timeout_ns)?;
                self.scheduler.slots[index] = SlotState::Idle;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constants_are_one_matrix() {
        assert_eq!(std::mem::size_of::<MeshPushConstants>(), 64);
        assert_eq!(MeshPushConstants::range().size, 64);
    }

    #[test]
    fn camera_uniform_is_three_matrices() {
        assert_eq!(std::mem::size_of::<CameraUniformData>(), 192);
    }

    #[test]
    fn slots_cycle_in_order() {
        let mut scheduler = FrameScheduler::new(3);
        for expected in [0usize, 1, 2, 0, 1] {
            assert_eq!(scheduler.current_slot(), expected);
            scheduler.retire_current();
            scheduler.begin().unwrap();
            scheduler.submit().unwrap();
        }
        assert_eq!(scheduler.frame_number(), 5);
    }

    #[test]
    fn single_slot_ring_waits_every_frame() {
        let mut scheduler = FrameScheduler::new(1);
        assert!(!scheduler.requires_retire());
        scheduler.begin().unwrap();
        scheduler.submit().unwrap();
        // The only slot is busy until the fence wait retires it
        assert!(scheduler.requires_retire());
        scheduler.retire_current();
        assert!(scheduler.begin().is_ok());
    }

    #[test]
    fn two_slot_ring_applies_back_pressure_on_third_frame() {
        let mut scheduler = FrameScheduler::new(2);

        // Frames 0 and 1 start without waiting: their slots are fresh
        assert!(!scheduler.requires_retire());
        scheduler.begin().unwrap();
        scheduler.submit().unwrap();
        assert!(!scheduler.requires_retire());
        scheduler.begin().unwrap();
        scheduler.submit().unwrap();

        // Frame 2 reuses slot 0, which still has frame 0 in flight
        assert_eq!(scheduler.current_slot(), 0);
        assert!(scheduler.requires_retire());
        assert!(scheduler.begin().is_err());

        scheduler.retire_current();
        assert!(scheduler.begin().is_ok());
    }

    #[test]
    fn abandoned_recording_returns_slot_to_idle() {
        let mut scheduler = FrameScheduler::new(2);
        scheduler.begin().unwrap();
        scheduler.abandon();
        // Slot is reusable without a submit having happened
        assert_eq!(scheduler.frame_number(), 0);
        assert!(scheduler.begin().is_ok());
    }

    #[test]
    fn submit_without_begin_is_rejected() {
        let mut scheduler = FrameScheduler::new(2);
        assert!(scheduler.submit().is_err());
    }
}
