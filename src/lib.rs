//! baked-room
//!
//! A viewer for a single room whose lighting is baked into textures. It
//! loads a glTF model and its baked textures behind a black curtain with a
//! loading bar, assigns every sub-mesh its texture or flat colour, fades the
//! room in once loading ends and lets the user orbit, pan and dolly around it
//! with damped controls. Runs natively and in the browser via WASM.
//!
//! High-level modules
//! - `loading`: progress tracking across all asset fetches
//! - `progress` / `reveal`: loading bar and the fade that uncovers the room
//! - `resources`: fetching and decoding textures and glTF models
//! - `assembler`: binds appearances to named sub-meshes and builds the scene
//! - `camera`: perspective camera and the damped orbit controller
//! - `viewer`: per-frame state without GPU handles
//! - `context` / `pipelines` / `render`: everything that draws
//! - `flow`: the event loop tying it together
//!

pub mod assembler;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod frame;
pub mod loading;
pub mod pipelines;
pub mod progress;
pub mod render;
pub mod resources;
pub mod reveal;
pub mod viewer;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    flow::run(config::ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
