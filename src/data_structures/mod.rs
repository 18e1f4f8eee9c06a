//! Engine data structures: scene graph, appearances, meshes and textures.
//!
//! - `appearance` holds surface descriptions and the room's appearance table
//! - `instance` holds node transforms and their GPU layout
//! - `model` contains GPU meshes, materials and the draw helper
//! - `scene_graph` is the CPU-side node tree parsed from the model
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod appearance;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
