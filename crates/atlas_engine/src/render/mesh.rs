//! Mesh representation for 3D models
//!
//! `Vertex` and `Mesh` are pure CPU-side data; the Vulkan vertex input layout
//! lives in `render::vulkan::vertex_layout` and the device-resident copy in
//! `GpuMesh`.

use crate::render::vulkan::{MemoryAllocator, VertexBuffer, VulkanResult};
use bytemuck::{Pod, Zeroable};

/// 3D vertex with position, normal, and color
///
/// `#[repr(C)]` guarantees the byte layout the vertex input description and
/// the GPU upload both rely on.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Vertex color
    pub color: [f32; 3],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, normal, color }
    }

    /// Size of one vertex in bytes
    pub fn stride() -> u32 {
        std::mem::size_of::<Self>() as u32
    }
}

/// CPU-side mesh: an ordered vertex sequence
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data in draw order (non-indexed)
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// The single triangle the engine uses as its smoke-test geometry
    pub fn triangle() -> Self {
        let color = [0.0, 1.0, 0.0];
        let normal = [0.0, 0.0, 1.0];
        Self {
            vertices: vec![
                Vertex::new([1.0, 1.0, 0.0], normal, color),
                Vertex::new([-1.0, 1.0, 0.0], normal, color),
                Vertex::new([0.0, -1.0, 0.0], normal, color),
            ],
        }
    }

    /// Upload this mesh into a device-visible vertex buffer.
    ///
    /// The copy is byte-exact and the resulting buffer is immutable; its
    /// lifetime is owned by the returned `GpuMesh`.
    pub fn upload(&self, allocator: &MemoryAllocator) -> VulkanResult<GpuMesh> {
        let vertex_buffer = VertexBuffer::new(allocator, &self.vertices)?;
        log::debug!(
            "uploaded mesh: {} vertices, {} bytes",
            self.vertices.len(),
            self.vertices.len() * Vertex::stride() as usize
        );
        Ok(GpuMesh {
            vertex_buffer,
            vertex_count: self.vertex_count(),
        })
    }
}

/// Device-resident mesh: a vertex buffer plus its draw count
pub struct GpuMesh {
    vertex_buffer: VertexBuffer,
    vertex_count: u32,
}

impl GpuMesh {
    /// Vulkan handle of the vertex buffer
    pub fn buffer(&self) -> ash::vk::Buffer {
        self.vertex_buffer.handle()
    }

    /// Number of vertices to draw
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_layout() {
        // position + normal + color, three f32 each
        assert_eq!(Vertex::stride(), 36);
    }

    #[test]
    fn vertex_bytes_round_trip() {
        let vertices = vec![
            Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5, 0.5]),
            Vertex::new([-1.0, 0.25, 9.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        // The upload path copies raw bytes; a cast there-and-back must
        // reproduce the records exactly.
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), vertices.len() * Vertex::stride() as usize);
        let restored: &[Vertex] = bytemuck::cast_slice(bytes);
        assert_eq!(restored, vertices.as_slice());
    }

    #[test]
    fn triangle_has_three_vertices() {
        let mesh = Mesh::triangle();
        assert_eq!(mesh.vertex_count(), 3);
    }
}
