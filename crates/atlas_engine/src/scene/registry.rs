//! Scene registry
//!
//! Named storage for GPU meshes and materials, and the renderable list that
//! references them by name. Resolution happens once per frame when the list
//! is flattened into draws.

use std::collections::HashMap;

use crate::foundation::math::Mat4;
use crate::render::draw_list::ResolvedDraw;
use crate::render::mesh::GpuMesh;
use crate::render::vulkan::Material;

/// One renderable: a mesh and material by name, plus a transform
#[derive(Debug, Clone)]
pub struct RenderObject {
    /// Name of the mesh in the registry
    pub mesh: String,
    /// Name of the material in the registry
    pub material: String,
    /// Model matrix
    pub transform: Mat4,
}

/// Registry of scene resources and renderables
#[derive(Default)]
pub struct SceneRegistry {
    meshes: HashMap<String, GpuMesh>,
    materials: HashMap<String, Material>,
    renderables: Vec<RenderObject>,
}

impl SceneRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh under `name`, replacing any previous entry
    pub fn add_mesh(&mut self, name: impl Into<String>, mesh: GpuMesh) {
        self.meshes.insert(name.into(), mesh);
    }

    /// Register a material under `name`, replacing any previous entry
    pub fn add_material(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    /// Look up a mesh by name
    pub fn get_mesh(&self, name: &str) -> Option<&GpuMesh> {
        self.meshes.get(name)
    }

    /// Look up a material by name
    pub fn get_material(&self, name: &str) -> Option<Material> {
        self.materials.get(name).copied()
    }

    /// Append a renderable to the draw order
    pub fn add_render_object(&mut self, object: RenderObject) {
        self.renderables.push(object);
    }

    /// Renderables in submission order
    pub fn renderables(&self) -> &[RenderObject] {
        &self.renderables
    }

    /// Resolve every renderable against the registry.
    ///
    /// A renderable naming a missing mesh or material is skipped with a
    /// warning rather than failing the frame.
    pub fn resolve_draws(&self) -> Vec<ResolvedDraw> {
        let mut draws = Vec::with_capacity(self.renderables.len());
        for object in &self.renderables {
            let Some(mesh) = self.meshes.get(&object.mesh) else {
                log::warn!("renderable references unknown mesh '{}'", object.mesh);
                continue;
            };
            let Some(material) = self.get_material(&object.material) else {
                log::warn!(
                    "renderable references unknown material '{}'",
                    object.material
                );
                continue;
            };
            draws.push(ResolvedDraw {
                pipeline: material.pipeline,
                layout: material.layout,
                vertex_buffer: mesh.buffer(),
                vertex_count: mesh.vertex_count(),
                model: object.transform.into(),
            });
        }
        draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::{self, Handle};

    fn material(id: u64) -> Material {
        Material {
            pipeline: vk::Pipeline::from_raw(id),
            layout: vk::PipelineLayout::from_raw(id),
        }
    }

    #[test]
    fn material_lookup_returns_registered_handle() {
        let mut registry = SceneRegistry::new();
        registry.add_material("flat", material(7));

        assert_eq!(registry.get_material("flat"), Some(material(7)));
        assert_eq!(registry.get_material("missing"), None);
    }

    #[test]
    fn registering_same_name_replaces() {
        let mut registry = SceneRegistry::new();
        registry.add_material("flat", material(1));
        registry.add_material("flat", material(2));
        assert_eq!(registry.get_material("flat"), Some(material(2)));
    }

    #[test]
    fn renderable_with_missing_resources_is_skipped() {
        let mut registry = SceneRegistry::new();
        registry.add_material("flat", material(1));
        registry.add_render_object(RenderObject {
            mesh: "nonexistent".to_string(),
            material: "flat".to_string(),
            transform: Mat4::identity(),
        });

        // No mesh registered under that name: resolution drops the object
        assert!(registry.resolve_draws().is_empty());
    }
}
