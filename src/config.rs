//! Viewer configuration.
//!
//! Every tunable of the viewer lives in [`ViewerConfig`]. The defaults describe
//! the baked room: its asset layout, the camera framing, the scene scale and the
//! timing of the reveal transition. Nothing is read from files or the
//! environment; callers adjust the struct before handing it to
//! [`crate::flow::run`].

use instant::Duration;

/// Asset root used by native builds. `build.rs` bundles `assets/` next to the
/// build output and points this at the copy.
const NATIVE_ASSET_ROOT: &str = env!("BAKED_ROOM_ASSETS");

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Directory (native) or URL prefix relative to the page (web) that all
    /// asset paths are resolved against.
    pub asset_root: String,
    /// Packed room model, relative to `asset_root`.
    pub model: String,
    /// Directory of the Draco decoder module. Only reported in errors, this
    /// crate expects uncompressed geometry.
    pub decoder_path: String,
    /// CSS selector of the canvas the viewer renders into (web only).
    pub canvas_selector: String,
    /// CSS selector of the loading bar element (web only, optional).
    pub loading_bar_selector: String,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    /// Uniform scale applied to the whole model.
    pub scene_scale: f32,
    pub reveal: RevealConfig,
    /// Upper bound of the device pixel ratio used for the drawing surface.
    pub max_pixel_ratio: f64,
    /// Requested multisample count. Lowered to what the adapter supports.
    pub msaa_samples: u32,
    pub clear_colour: wgpu::Color,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealConfig {
    /// Settle time between load completion and the start of the fade.
    pub delay: Duration,
    /// Length of the overlay fade.
    pub duration: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let asset_root = if cfg!(target_arch = "wasm32") {
            String::new()
        } else {
            NATIVE_ASSET_ROOT.to_string()
        };
        Self {
            asset_root,
            model: "room/draco_room.glb".to_string(),
            decoder_path: "draco/".to_string(),
            canvas_selector: "canvas.webgl".to_string(),
            loading_bar_selector: ".loading-bar".to_string(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            scene_scale: 0.2,
            reveal: RevealConfig::default(),
            max_pixel_ratio: 2.0,
            msaa_samples: 4,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy_degrees: 45.0,
            znear: 0.1,
            zfar: 100.0,
            position: [4.0, 2.0, 4.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            duration: Duration::from_secs(3),
        }
    }
}
