//! Draw list construction
//!
//! Turns the scene's resolved renderables into a linear sequence of recording
//! steps, skipping redundant pipeline and vertex buffer binds. Pure code: the
//! renderer replays the steps into a command buffer, tests inspect them
//! directly.

use ash::vk;

/// One renderable with every handle already resolved
#[derive(Debug, Clone, Copy)]
pub struct ResolvedDraw {
    /// Pipeline to draw with
    pub pipeline: vk::Pipeline,
    /// Layout of `pipeline`, needed for push constants
    pub layout: vk::PipelineLayout,
    /// Vertex buffer to source from
    pub vertex_buffer: vk::Buffer,
    /// Non-indexed vertex count
    pub vertex_count: u32,
    /// Model matrix, column-major
    pub model: [[f32; 4]; 4],
}

/// One step of command buffer recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawStep {
    /// Bind a pipeline (and remember its layout for push constants)
    BindPipeline {
        /// Pipeline handle
        pipeline: vk::Pipeline,
        /// The pipeline's layout
        layout: vk::PipelineLayout,
    },
    /// Bind a vertex buffer at binding 0
    BindVertexBuffer {
        /// Buffer handle
        buffer: vk::Buffer,
    },
    /// Push the model matrix and draw
    Draw {
        /// Vertex count for the non-indexed draw
        vertex_count: u32,
        /// Model matrix pushed before the draw
        model: [[f32; 4]; 4],
    },
}

/// Build the recording steps for `draws`.
///
/// Draws are grouped by pipeline, then by vertex buffer within a pipeline,
/// both in order of first appearance; ties keep submission order. Binds are
/// emitted only when the bound object actually changes, so a scene of many
/// objects sharing one material and one mesh costs exactly one bind of each.
pub fn build_draw_list(draws: &[ResolvedDraw]) -> Vec<DrawStep> {
    let mut pipeline_rank: Vec<vk::Pipeline> = Vec::new();
    let mut buffer_rank: Vec<vk::Buffer> = Vec::new();

    let mut rank_of = |pipeline: vk::Pipeline, buffer: vk::Buffer| {
        let p = match pipeline_rank.iter().position(|&h| h == pipeline) {
            Some(p) => p,
            None => {
                pipeline_rank.push(pipeline);
                pipeline_rank.len() - 1
            }
        };
        let b = match buffer_rank.iter().position(|&h| h == buffer) {
            Some(b) => b,
            None => {
                buffer_rank.push(buffer);
                buffer_rank.len() - 1
            }
        };
        (p, b)
    };

    let mut order: Vec<(usize, usize, usize)> = draws
        .iter()
        .enumerate()
        .map(|(i, draw)| {
            let (p, b) = rank_of(draw.pipeline, draw.vertex_buffer);
            (p, b, i)
        })
        .collect();
    // Stable: equal keys keep submission order
    order.sort_by_key(|&(p, b, _)| (p, b));

    let mut steps = Vec::new();
    let mut bound_pipeline: Option<vk::Pipeline> = None;
    let mut bound_buffer: Option<vk::Buffer> = None;

    for (_, _, index) in order {
        let draw = &draws[index];

        if bound_pipeline != Some(draw.pipeline) {
            steps.push(DrawStep::BindPipeline {
                pipeline: draw.pipeline,
                layout: draw.layout,
            });
            bound_pipeline = Some(draw.pipeline);
        }
        if bound_buffer != Some(draw.vertex_buffer) {
            steps.push(DrawStep::BindVertexBuffer {
                buffer: draw.vertex_buffer,
            });
            bound_buffer = Some(draw.vertex_buffer);
        }
        steps.push(DrawStep::Draw {
            vertex_count: draw.vertex_count,
            model: draw.model,
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn pipeline(id: u64) -> vk::Pipeline {
        vk::Pipeline::from_raw(id)
    }

    fn layout(id: u64) -> vk::PipelineLayout {
        vk::PipelineLayout::from_raw(id)
    }

    fn buffer(id: u64) -> vk::Buffer {
        vk::Buffer::from_raw(id)
    }

    fn draw(pipeline_id: u64, buffer_id: u64, vertex_count: u32) -> ResolvedDraw {
        ResolvedDraw {
            pipeline: pipeline(pipeline_id),
            layout: layout(pipeline_id),
            vertex_buffer: buffer(buffer_id),
            vertex_count,
            model: nalgebra::Matrix4::identity().into(),
        }
    }

    #[test]
    fn single_draw_emits_bind_bind_draw() {
        let steps = build_draw_list(&[draw(1, 10, 3)]);
        assert_eq!(
            steps,
            vec![
                DrawStep::BindPipeline {
                    pipeline: pipeline(1),
                    layout: layout(1),
                },
                DrawStep::BindVertexBuffer { buffer: buffer(10) },
                DrawStep::Draw {
                    vertex_count: 3,
                    model: nalgebra::Matrix4::identity().into(),
                },
            ]
        );
    }

    #[test]
    fn shared_material_and_mesh_bind_once() {
        // A large grid of objects sharing one material and one mesh
        let draws: Vec<ResolvedDraw> = (0..1681).map(|_| draw(1, 10, 36)).collect();
        let steps = build_draw_list(&draws);

        let pipeline_binds = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::BindPipeline { .. }))
            .count();
        let buffer_binds = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::BindVertexBuffer { .. }))
            .count();
        let draw_calls = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::Draw { .. }))
            .count();

        assert_eq!(pipeline_binds, 1);
        assert_eq!(buffer_binds, 1);
        assert_eq!(draw_calls, 1681);
    }

    #[test]
    fn interleaved_draws_are_grouped_by_first_appearance() {
        let draws = vec![
            draw(1, 10, 3),
            draw(2, 20, 6),
            draw(1, 10, 9),
            draw(2, 20, 12),
        ];
        let steps = build_draw_list(&draws);

        // Pipeline 1's draws come first in submission order, then pipeline
        // 2's; each pipeline and buffer is bound once.
        assert_eq!(
            steps,
            vec![
                DrawStep::BindPipeline {
                    pipeline: pipeline(1),
                    layout: layout(1),
                },
                DrawStep::BindVertexBuffer { buffer: buffer(10) },
                DrawStep::Draw {
                    vertex_count: 3,
                    model: nalgebra::Matrix4::identity().into(),
                },
                DrawStep::Draw {
                    vertex_count: 9,
                    model: nalgebra::Matrix4::identity().into(),
                },
                DrawStep::BindPipeline {
                    pipeline: pipeline(2),
                    layout: layout(2),
                },
                DrawStep::BindVertexBuffer { buffer: buffer(20) },
                DrawStep::Draw {
                    vertex_count: 6,
                    model: nalgebra::Matrix4::identity().into(),
                },
                DrawStep::Draw {
                    vertex_count: 12,
                    model: nalgebra::Matrix4::identity().into(),
                },
            ]
        );
    }

    #[test]
    fn mesh_change_within_pipeline_rebinds_buffer_only() {
        let draws = vec![draw(1, 10, 3), draw(1, 20, 6)];
        let steps = build_draw_list(&draws);

        let pipeline_binds = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::BindPipeline { .. }))
            .count();
        let buffer_binds = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::BindVertexBuffer { .. }))
            .count();
        assert_eq!(pipeline_binds, 1);
        assert_eq!(buffer_binds, 2);
    }

    #[test]
    fn two_materials_sharing_a_mesh_rebind_pipeline_only() {
        // Alternating materials over one mesh, as in a checkerboard grid
        let draws: Vec<ResolvedDraw> = (0..10)
            .map(|i| draw(if i % 2 == 0 { 1 } else { 2 }, 10, 3))
            .collect();
        let steps = build_draw_list(&draws);

        let pipeline_binds = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::BindPipeline { .. }))
            .count();
        let buffer_binds = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::BindVertexBuffer { .. }))
            .count();
        let draw_calls = steps
            .iter()
            .filter(|s| matches!(s, DrawStep::Draw { .. }))
            .count();

        // Grouping collapses the alternation to one bind per material; the
        // shared buffer is bound once for the whole list
        assert_eq!(pipeline_binds, 2);
        assert_eq!(buffer_binds, 1);
        assert_eq!(draw_calls, 10);
    }

    #[test]
    fn empty_input_produces_no_steps() {
        assert!(build_draw_list(&[]).is_empty());
    }
}
