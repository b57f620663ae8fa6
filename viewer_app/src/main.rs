//! Atlas demo viewer
//!
//! Draws a checkerboard grid of triangles in two materials around an OBJ
//! model. WASD and mouse fly the camera; Escape quits.

use atlas_engine::foundation::math::{Mat4, Point3, Vec3};
use atlas_engine::prelude::*;
use atlas_engine::render::mesh::Mesh;
use atlas_engine::render::vulkan::MaterialSpec;

const GRID_HALF_EXTENT: i32 = 20;
const GRID_SCALE: f32 = 0.2;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run() {
        log::error!("viewer exited with error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)?,
        None => EngineConfig::default(),
    };

    let mut engine = Engine::new(config)?;
    engine.create_default_material("flat")?;
    engine.load_mesh("triangle", &Mesh::triangle())?;

    // A second material sharing the vertex shader; its absence only costs
    // the two-material checkerboard
    let red_spec = MaterialSpec {
        vertex_shader: engine.config().asset_path(&engine.config().vertex_shader),
        fragment_shader: engine.config().asset_path("shaders/red.frag.spv"),
    };
    let has_red = match engine.create_material("red", &red_spec) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("second material unavailable, using one: {e}");
            false
        }
    };

    // The model is optional scenery; the grid renders without it
    match engine.load_obj_mesh("monkey", "models/monkey_smooth.obj") {
        Ok(()) => engine.add_render_object(RenderObject {
            mesh: "monkey".to_string(),
            material: "flat".to_string(),
            transform: Mat4::identity(),
        }),
        Err(e) => log::warn!("model unavailable, rendering grid only: {e}"),
    }

    for x in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
        for z in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
            let material = if has_red && (x + z).rem_euclid(2) == 1 {
                "red"
            } else {
                "flat"
            };
            let translation = Mat4::new_translation(&Vec3::new(x as f32, 0.0, z as f32));
            let scale = Mat4::new_scaling(GRID_SCALE);
            engine.add_render_object(RenderObject {
                mesh: "triangle".to_string(),
                material: material.to_string(),
                transform: translation * scale,
            });
        }
    }

    let speed = engine.config().camera_speed;
    let sensitivity = engine.config().mouse_sensitivity;
    *engine.camera_mut() =
        atlas_engine::scene::FlyCamera::new(Point3::new(0.0, 6.0, 10.0), speed, sensitivity);

    engine.run()?;
    Ok(())
}
