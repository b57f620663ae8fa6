//! Asset loading

pub mod obj_loader;

pub use obj_loader::{load_obj, load_obj_file, ObjError};
