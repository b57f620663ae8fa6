//! Vertex input layout description
//!
//! Maps the CPU-side `Vertex` record onto Vulkan binding and attribute
//! descriptions for pipeline creation.

use ash::vk;
use std::mem::offset_of;

use crate::render::mesh::Vertex;

/// Binding and attribute descriptions for one vertex layout
pub struct VertexInputDescription {
    /// Buffer binding descriptions
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    /// Per-attribute location/format/offset descriptions
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl VertexInputDescription {
    /// Layout for `Vertex`: position, normal, color at locations 0..=2 in one
    /// interleaved binding
    pub fn for_vertex() -> Self {
        let bindings = vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: Vertex::stride(),
            input_rate: vk::VertexInputRate::VERTEX,
        }];

        let attributes = vec![
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, normal) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, color) as u32,
            },
        ];

        Self { bindings, attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        let description = VertexInputDescription::for_vertex();
        assert_eq!(description.bindings.len(), 1);
        assert_eq!(description.bindings[0].stride, 36);

        let offsets: Vec<u32> = description.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }
}
