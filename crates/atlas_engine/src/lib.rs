//! # Atlas Engine
//!
//! A real-time 3D rendering engine built directly on Vulkan. The hard core of
//! the crate is the frame-lifecycle and GPU-resource-management subsystem:
//! device bootstrap, double-buffered frame state, render pass and pipeline
//! construction, mesh upload, and a steady-state draw loop that never reuses
//! in-flight GPU resources and tears everything down in reverse creation
//! order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use atlas_engine::{Engine, EngineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     atlas_engine::foundation::logging::init();
//!     let config = EngineConfig::default();
//!     let mut engine = Engine::new(config)?;
//!     engine.run()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod audio;
pub mod config;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

mod engine;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, EngineError};
    pub use crate::foundation::math::{Mat4, Vec3};
    pub use crate::render::mesh::{Mesh, Vertex};
    pub use crate::scene::{Material, RenderObject, SceneRegistry};
}
