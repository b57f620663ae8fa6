//! Vulkan renderer
//!
//! Owns the whole GPU object graph and drives the per-frame loop: fence wait,
//! image acquire, command recording, submit, present. Field declaration order
//! is teardown order; everything the device owns drops before the device.

use ash::vk;
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::render::draw_list::{DrawStep, ResolvedDraw};
use crate::render::mesh::{GpuMesh, Mesh};
use crate::render::vulkan::{
    CommandRecorder, DeletionQueue, DescriptorPool, DescriptorSetLayout,
    DescriptorSetLayoutBuilder, Framebuffer, FrameRing, GraphicsPipeline, LogicalDevice,
    MemoryAllocator, MeshPushConstants, PhysicalDeviceInfo, PipelineConfig, RenderPass,
    ShaderModule, Surface, Swapchain, VertexInputDescription, VulkanError, VulkanInstance,
    VulkanResult,
};
use crate::render::vulkan::frame::CameraUniformData;
use crate::render::window::Window;

/// Non-owning material handle: a pipeline and its layout.
///
/// Valid for the lifetime of the renderer that built it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    /// Pipeline to bind for this material
    pub pipeline: vk::Pipeline,
    /// Layout of `pipeline`
    pub layout: vk::PipelineLayout,
}

/// Description of a material to build: its shader pair
#[derive(Debug, Clone)]
pub struct MaterialSpec {
    /// Path to the vertex shader SPIR-V
    pub vertex_shader: PathBuf,
    /// Path to the fragment shader SPIR-V
    pub fragment_shader: PathBuf,
}

/// Outcome of presenting a frame
enum PresentOutcome {
    Presented,
    NeedsRecreate,
}

/// The Vulkan renderer: device bootstrap, swapchain, frame ring, pipelines
pub struct VulkanRenderer {
    pipelines: Vec<GraphicsPipeline>,
    framebuffers: Vec<Framebuffer>,
    swapchain: Swapchain,
    frames: FrameRing,
    descriptor_pool: DescriptorPool,
    camera_layout: DescriptorSetLayout,
    render_pass: RenderPass,
    retired: DeletionQueue,
    allocator: MemoryAllocator,
    device: LogicalDevice,
    physical: PhysicalDeviceInfo,
    surface: Surface,
    instance: VulkanInstance,
    fence_timeout_ns: u64,
}

impl VulkanRenderer {
    /// Bootstrap the full rendering stack against `window`.
    ///
    /// Order: instance, surface, device selection, logical device, allocator,
    /// swapchain, render pass, framebuffers, descriptor plumbing, frame ring.
    pub fn new(window: &mut Window, config: &EngineConfig) -> VulkanResult<Self> {
        let instance =
            VulkanInstance::new(window, &config.app_name, config.validation_enabled())?;

        let raw_surface = window
            .create_vulkan_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let surface = Surface::new(&instance.entry, &instance.instance, raw_surface);

        let physical = PhysicalDeviceInfo::select(&instance.instance, &surface)?;
        let device = LogicalDevice::new(&instance.instance, &physical)?;
        let allocator =
            MemoryAllocator::new(&instance.instance, physical.device, device.device.clone());

        let (width, height) = window.framebuffer_size();
        let extent = vk::Extent2D { width, height };
        let swapchain = Swapchain::new(
            &instance.instance,
            &device.device,
            physical.device,
            &surface,
            &allocator,
            extent,
        )?;

        let render_pass = RenderPass::new(
            &device.device,
            swapchain.format(),
            crate::render::vulkan::swapchain::DEPTH_FORMAT,
        )?;
        let framebuffers = Framebuffer::for_swapchain(&device.device, &render_pass, &swapchain)?;

        let camera_layout = DescriptorSetLayoutBuilder::new()
            .add_uniform_buffer(0, vk::ShaderStageFlags::VERTEX)
            .build(&device.device)?;
        let descriptor_pool = DescriptorPool::new(&device.device, config.frames_in_flight as u32)?;

        let frames = FrameRing::new(
            &device.device,
            device.graphics_family,
            &allocator,
            &descriptor_pool,
            &camera_layout,
            config.frames_in_flight,
        )?;

        log::info!(
            "renderer initialized: {} frames in flight",
            config.frames_in_flight
        );

        Ok(Self {
            pipelines: Vec::new(),
            framebuffers,
            swapchain,
            frames,
            descriptor_pool,
            camera_layout,
            render_pass,
            retired: DeletionQueue::new(),
            allocator,
            device,
            physical,
            surface,
            instance,
            fence_timeout_ns: config.fence_timeout_ns,
        })
    }

    /// Build a material from its shader pair.
    ///
    /// Shader modules are transient: dropped as soon as the pipeline exists.
    /// The renderer keeps ownership of the pipeline; the returned handle is
    /// what the scene stores.
    pub fn build_material(&mut self, spec: &MaterialSpec) -> VulkanResult<Material> {
        let vertex = ShaderModule::from_file(
            &self.device.device,
            &spec.vertex_shader,
            vk::ShaderStageFlags::VERTEX,
        )?;
        let fragment = ShaderModule::from_file(
            &self.device.device,
            &spec.fragment_shader,
            vk::ShaderStageFlags::FRAGMENT,
        )?;

        let pipeline = PipelineConfig::new()
            .with_stage(vertex.stage_info())
            .with_stage(fragment.stage_info())
            .with_vertex_input(VertexInputDescription::for_vertex())
            .with_push_constant_range(MeshPushConstants::range())
            .with_descriptor_set_layout(self.camera_layout.handle())
            .build(&self.device.device, &self.render_pass)?;

        let material = Material {
            pipeline: pipeline.handle(),
            layout: pipeline.layout(),
        };
        self.pipelines.push(pipeline);

        log::debug!(
            "built material from {} + {}",
            spec.vertex_shader.display(),
            spec.fragment_shader.display()
        );
        Ok(material)
    }

    /// Upload a mesh into device memory
    pub fn upload_mesh(&self, mesh: &Mesh) -> VulkanResult<GpuMesh> {
        mesh.upload(&self.allocator)
    }

    /// Render one frame: wait for the slot's previous work, acquire an image,
    /// record the draw list, submit, present.
    ///
    /// An out-of-date swapchain (resize, minimize) recreates the chain and
    /// skips the frame; the caller just calls again next iteration.
    pub fn draw_frame(
        &mut self,
        draws: &[ResolvedDraw],
        camera: &CameraUniformData,
        window: &Window,
    ) -> VulkanResult<()> {
        // Back-pressure: the slot's previous submission must retire first
        if self.frames.scheduler.requires_retire() {
            let slot = &self.frames.slots[self.frames.scheduler.current_slot()];
            slot.sync.in_flight.wait(self.fence_timeout_ns)?;
            self.frames.scheduler.retire_current();
        }

        let slot_index = self.frames.scheduler.current_slot();
        let image_available = self.frames.slots[slot_index].sync.image_available.handle();

        let (image_index, suboptimal) = match self
            .swapchain
            .acquire_next_image(self.fence_timeout_ns, image_available)
        {
            Ok(acquired) => acquired,
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => {
                self.recreate_swapchain(window)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.frames.slots[slot_index].camera_buffer.write(camera)?;
        self.frames.scheduler.begin()?;

        let steps = crate::render::draw_list::build_draw_list(draws);
        let record_result = self.record_frame(slot_index, image_index, &steps);
        let command_buffer = match record_result {
            Ok(buffer) => buffer,
            Err(e) => {
                // The acquired image is never presented and its semaphore
                // keeps a pending signal, so the renderer cannot continue
                // past this error. Drain the device so teardown is safe.
                self.frames.scheduler.abandon();
                let _ = self.device.wait_idle();
                return Err(e);
            }
        };

        let slot = &self.frames.slots[slot_index];
        slot.sync.in_flight.reset()?;

        let wait_semaphores = [slot.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.sync.render_finished.handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.device
                .device
                .queue_submit(
                    self.device.graphics_queue,
                    &[submit_info],
                    slot.sync.in_flight.handle(),
                )
                .map_err(VulkanError::Api)?;
        }
        self.frames.scheduler.submit()?;

        match self.present(slot_index, image_index)? {
            PresentOutcome::Presented if suboptimal => self.recreate_swapchain(window),
            PresentOutcome::Presented => Ok(()),
            PresentOutcome::NeedsRecreate => self.recreate_swapchain(window),
        }
    }

    fn record_frame(
        &self,
        slot_index: usize,
        image_index: u32,
        steps: &[DrawStep],
    ) -> VulkanResult<vk::CommandBuffer> {
        let slot = &self.frames.slots[slot_index];
        let mut recorder = CommandRecorder::begin(&self.device.device, slot.command_buffer)?;

        {
            let mut pass = recorder.begin_render_pass(
                &self.render_pass,
                &self.framebuffers[image_index as usize],
                self.swapchain.extent(),
            );
            pass.set_viewport(self.swapchain.extent());

            let mut current_layout = vk::PipelineLayout::null();
            for step in steps {
                match *step {
                    DrawStep::BindPipeline { pipeline, layout } => {
                        pass.bind_pipeline(pipeline);
                        pass.bind_descriptor_set(layout, slot.descriptor_set);
                        current_layout = layout;
                    }
                    DrawStep::BindVertexBuffer { buffer } => {
                        pass.bind_vertex_buffer(buffer);
                    }
                    DrawStep::Draw { vertex_count, model } => {
                        pass.push_constants(current_layout, &MeshPushConstants { model });
                        pass.draw(vertex_count, 0);
                    }
                }
            }
        }

        recorder.end()
    }

    fn present(&mut self, slot_index: usize, image_index: u32) -> VulkanResult<PresentOutcome> {
        let slot = &self.frames.slots[slot_index];
        let wait_semaphores = [slot.sync.render_finished.handle()];
        let swapchains = [self.swapchain.handle()];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.swapchain
                .loader()
                .queue_present(self.device.graphics_queue, &present_info)
        };

        match result {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                Ok(PresentOutcome::NeedsRecreate)
            }
            Err(e) => Err(VulkanError::Api(e)),
        }
    }

    /// Replace the swapchain and framebuffers after a resize.
    ///
    /// Waits for all in-flight frames, flushes previously retired chains,
    /// then builds the new chain linked to the old one. Pipelines survive
    /// because viewport and scissor are dynamic.
    pub fn recreate_swapchain(&mut self, window: &Window) -> VulkanResult<()> {
        let (width, height) = window.framebuffer_size();
        if width == 0 || height == 0 {
            // Minimized; nothing to present to until the window comes back
            return Ok(());
        }

        self.frames.wait_all(self.fence_timeout_ns)?;
        self.retired.flush();

        let new_swapchain = Swapchain::recreate(
            &self.instance.instance,
            &self.device.device,
            self.physical.device,
            &self.surface,
            &self.allocator,
            vk::Extent2D { width, height },
            self.swapchain.handle(),
        )?;
        let new_framebuffers =
            Framebuffer::for_swapchain(&self.device.device, &self.render_pass, &new_swapchain)?;

        let old_swapchain = std::mem::replace(&mut self.swapchain, new_swapchain);
        let old_framebuffers = std::mem::replace(&mut self.framebuffers, new_framebuffers);

        // LIFO flush destroys the framebuffers before the chain whose views
        // they reference
        self.retired.push(move || drop(old_swapchain));
        self.retired.push(move || drop(old_framebuffers));

        log::info!("swapchain recreated at {width}x{height}");
        Ok(())
    }

    /// Current swapchain aspect ratio, for projection
    pub fn aspect_ratio(&self) -> f32 {
        let extent = self.swapchain.extent();
        extent.width as f32 / extent.height.max(1) as f32
    }

    /// Wait until every in-flight frame has retired
    pub fn wait_idle(&mut self) -> VulkanResult<()> {
        self.frames.wait_all(self.fence_timeout_ns)?;
        self.device.wait_idle()
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        // Outstanding GPU work must finish before any owned object drops
        if let Err(e) = self.wait_idle() {
            log::warn!("device wait failed during renderer teardown: {e}");
        }
    }
}
