//! Engine orchestration
//!
//! `Engine` wires the subsystems together and owns the main loop: pump
//! events, update input and camera, resolve the scene, draw. Field order
//! matters: the registry's GPU resources drop before the renderer tears the
//! device down.

use std::time::Instant;

use thiserror::Error;

use crate::assets::{self, ObjError};
use crate::audio::AudioSystem;
use crate::config::{ConfigError, EngineConfig};
use crate::foundation::math::{perspective_vk, Point3};
use crate::input::Input;
use crate::render::mesh::Mesh;
use crate::render::vulkan::{
    CameraUniformData, Material, MaterialSpec, VulkanError, VulkanRenderer,
};
use crate::render::window::{Window, WindowError};
use crate::scene::{FlyCamera, RenderObject, SceneRegistry};

const FOV_DEGREES: f32 = 70.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 200.0;

/// Top-level engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window system failure
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// Renderer failure
    #[error("renderer error: {0}")]
    Renderer(#[from] VulkanError),

    /// Asset loading failure
    #[error("asset error: {0}")]
    Asset(#[from] ObjError),
}

/// The engine: window, renderer, scene, input, audio
pub struct Engine {
    registry: SceneRegistry,
    camera: FlyCamera,
    input: Input,
    audio: AudioSystem,
    renderer: VulkanRenderer,
    window: Window,
    config: EngineConfig,
}

impl Engine {
    /// Validate the configuration and bring up every subsystem
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate_settings()?;
        config.validate_assets()?;

        let mut window = Window::new(
            &config.app_name,
            config.window_width,
            config.window_height,
        )?;
        let renderer = VulkanRenderer::new(&mut window, &config)?;

        let camera = FlyCamera::new(
            Point3::new(0.0, 0.0, 3.0),
            config.camera_speed,
            config.mouse_sensitivity,
        );

        log::info!("engine initialized: {}", config.app_name);

        Ok(Self {
            registry: SceneRegistry::new(),
            camera,
            input: Input::new(),
            audio: AudioSystem::new(),
            renderer,
            window,
            config,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene registry
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Camera, for repositioning before the loop starts
    pub fn camera_mut(&mut self) -> &mut FlyCamera {
        &mut self.camera
    }

    /// Audio system
    pub fn audio_mut(&mut self) -> &mut AudioSystem {
        &mut self.audio
    }

    /// Build a material and register it under `name`
    pub fn create_material(
        &mut self,
        name: &str,
        spec: &MaterialSpec,
    ) -> Result<Material, EngineError> {
        let material = self.renderer.build_material(spec)?;
        self.registry.add_material(name, material);
        Ok(material)
    }

    /// Build the material described by the configuration's shader pair
    pub fn create_default_material(&mut self, name: &str) -> Result<Material, EngineError> {
        let spec = MaterialSpec {
            vertex_shader: self.config.asset_path(&self.config.vertex_shader),
            fragment_shader: self.config.asset_path(&self.config.fragment_shader),
        };
        self.create_material(name, &spec)
    }

    /// Upload a mesh and register it under `name`
    pub fn load_mesh(&mut self, name: &str, mesh: &Mesh) -> Result<(), EngineError> {
        let gpu_mesh = self.renderer.upload_mesh(mesh)?;
        self.registry.add_mesh(name, gpu_mesh);
        Ok(())
    }

    /// Load an OBJ model from the asset root, upload it, and register it
    pub fn load_obj_mesh(&mut self, name: &str, relative_path: &str) -> Result<(), EngineError> {
        let path = self.config.asset_path(relative_path);
        let mesh = assets::load_obj_file(&path)?;
        self.load_mesh(name, &mesh)
    }

    /// Add a renderable to the scene
    pub fn add_render_object(&mut self, object: RenderObject) {
        self.registry.add_render_object(object);
    }

    /// Run the main loop until the window closes
    pub fn run(&mut self) -> Result<(), EngineError> {
        let mut last_frame = Instant::now();

        while !self.window.should_close() {
            let now = Instant::now();
            let dt = (now - last_frame).as_secs_f32();
            last_frame = now;

            self.window.poll_events();
            self.input.begin_frame();
            for event in self.window.drain_events() {
                self.input.handle_event(&event);
            }
            if self.input.was_key_pressed(glfw::Key::Escape) {
                self.window.set_should_close(true);
            }

            self.camera.update(&self.input, dt);
            self.audio.set_listener_position(self.camera.position());

            let view = self.camera.view();
            let proj = perspective_vk(
                FOV_DEGREES,
                self.renderer.aspect_ratio(),
                NEAR_PLANE,
                FAR_PLANE,
            );
            let camera_data = CameraUniformData {
                view: view.into(),
                proj: proj.into(),
                view_proj: (proj * view).into(),
            };

            let draws = self.registry.resolve_draws();
            self.renderer.draw_frame(&draws, &camera_data, &self.window)?;
        }

        self.renderer.wait_idle()?;
        log::info!("engine shut down cleanly");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Fields drop in declaration order, registry first, so its GPU
        // buffers are freed before the renderer tears down. When run() exits
        // through an error, frames may still be in flight; drain them here
        // before any field drops.
        if let Err(e) = self.renderer.wait_idle() {
            log::warn!("device wait failed during engine teardown: {e}");
        }
    }
}
