//! Graphics pipeline construction
//!
//! `PipelineConfig` is an immutable description assembled by value and
//! consumed once by `build`; the resulting `GraphicsPipeline` owns both the
//! pipeline and its layout.

use ash::{vk, Device};

use crate::render::vulkan::{RenderPass, VertexInputDescription, VulkanError, VulkanResult};

/// Immutable pipeline description, consumed by `build`
pub struct PipelineConfig {
    shader_stages: Vec<vk::PipelineShaderStageCreateInfo>,
    vertex_input: Option<VertexInputDescription>,
    topology: vk::PrimitiveTopology,
    polygon_mode: vk::PolygonMode,
    cull_mode: vk::CullModeFlags,
    front_face: vk::FrontFace,
    depth_test: bool,
    depth_write: bool,
    depth_compare: vk::CompareOp,
    push_constant_ranges: Vec<vk::PushConstantRange>,
    descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shader_stages: Vec::new(),
            vertex_input: None,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            depth_test: true,
            depth_write: true,
            depth_compare: vk::CompareOp::LESS_OR_EQUAL,
            push_constant_ranges: Vec::new(),
            descriptor_set_layouts: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Start from the engine defaults: filled triangles, no culling, depth
    /// test and write with LESS_OR_EQUAL
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shader stage
    pub fn with_stage(mut self, stage: vk::PipelineShaderStageCreateInfo) -> Self {
        self.shader_stages.push(stage);
        self
    }

    /// Set the vertex input layout
    pub fn with_vertex_input(mut self, input: VertexInputDescription) -> Self {
        self.vertex_input = Some(input);
        self
    }

    /// Set the primitive topology
    pub fn with_topology(mut self, topology: vk::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the polygon fill mode
    pub fn with_polygon_mode(mut self, mode: vk::PolygonMode) -> Self {
        self.polygon_mode = mode;
        self
    }

    /// Set face culling and winding
    pub fn with_culling(mut self, cull_mode: vk::CullModeFlags, front_face: vk::FrontFace) -> Self {
        self.cull_mode = cull_mode;
        self.front_face = front_face;
        self
    }

    /// Configure the depth test
    pub fn with_depth(mut self, test: bool, write: bool, compare: vk::CompareOp) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self.depth_compare = compare;
        self
    }

    /// Add a push constant range to the layout
    pub fn with_push_constant_range(mut self, range: vk::PushConstantRange) -> Self {
        self.push_constant_ranges.push(range);
        self
    }

    /// Add a descriptor set layout to the pipeline layout
    pub fn with_descriptor_set_layout(mut self, layout: vk::DescriptorSetLayout) -> Self {
        self.descriptor_set_layouts.push(layout);
        self
    }

    /// Check the configuration is complete enough to build
    pub fn validate(&self) -> VulkanResult<()> {
        if self.shader_stages.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: "pipeline config has no shader stages".to_string(),
            });
        }
        Ok(())
    }

    /// Build the pipeline against `render_pass`, consuming the config.
    ///
    /// Viewport and scissor are dynamic state, so pipelines stay valid across
    /// swapchain recreation and the handles handed to the scene never go
    /// stale.
    pub fn build(self, device: &Device, render_pass: &RenderPass) -> VulkanResult<GraphicsPipeline> {
        self.validate()?;

        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&self.descriptor_set_layouts)
            .push_constant_ranges(&self.push_constant_ranges);

        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let empty_input = VertexInputDescription {
            bindings: Vec::new(),
            attributes: Vec::new(),
        };
        let vertex_input = self.vertex_input.as_ref().unwrap_or(&empty_input);
        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&vertex_input.bindings)
            .vertex_attribute_descriptions(&vertex_input.attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(self.topology)
            .primitive_restart_enable(false);

        let mut viewport_state = vk::PipelineViewportStateCreateInfo::builder().build();
        viewport_state.viewport_count = 1;
        viewport_state.scissor_count = 1;

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(self.polygon_mode)
            .line_width(1.0)
            .cull_mode(self.cull_mode)
            .front_face(self.front_face)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(self.depth_test)
            .depth_write_enable(self.depth_write)
            .depth_compare_op(if self.depth_test {
                self.depth_compare
            } else {
                vk::CompareOp::ALWAYS
            })
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        // Opaque: blending disabled, full color write mask
        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build();
        let blend_attachments = [color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&self.shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0)
            .build();

        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        };

        let pipeline = match pipelines {
            Ok(mut pipelines) if !pipelines.is_empty() => pipelines.remove(0),
            Ok(_) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::InitializationFailed(
                    "pipeline creation returned no pipeline".to_string(),
                ));
            }
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::Api(e));
            }
        };

        Ok(GraphicsPipeline {
            device: device.clone(),
            pipeline,
            layout,
        })
    }
}

/// Graphics pipeline owning its layout, with RAII cleanup
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Raw pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Raw pipeline layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_without_stages_fails_validation() {
        let config = PipelineConfig::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_stage_passes_validation() {
        let stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .build();
        let config = PipelineConfig::new().with_stage(stage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_match_forward_pass_expectations() {
        let config = PipelineConfig::new();
        assert_eq!(config.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert_eq!(config.polygon_mode, vk::PolygonMode::FILL);
        assert_eq!(config.cull_mode, vk::CullModeFlags::NONE);
        assert!(config.depth_test);
        assert!(config.depth_write);
        assert_eq!(config.depth_compare, vk::CompareOp::LESS_OR_EQUAL);
    }
}
