//! Viewer state.
//!
//! [`Viewer`] owns everything the frame loop reads and the loading callbacks
//! write: camera and controls, viewport, loading bar, reveal transition and
//! the scene. It has no GPU handles, so the whole lifecycle can be driven by
//! hand with [`crate::frame::ManualFrames`].

use instant::Duration;
use winit::{dpi::PhysicalSize, event::WindowEvent};

use crate::{
    assembler::Scene,
    camera::{Camera, CameraUniform, OrbitController, Projection},
    config::ViewerConfig,
    data_structures::scene_graph::SceneNode,
    error::SceneGraphLookupError,
    frame::FrameScheduler,
    loading::Progress,
    pipelines::overlay::OverlayUniform,
    progress::ProgressBar,
    reveal::Reveal,
    viewport::Viewport,
};

/// Uniform data produced by one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameUniforms {
    pub camera: CameraUniform,
    pub overlay: OverlayUniform,
}

pub struct Viewer {
    config: ViewerConfig,
    pub camera: Camera,
    pub projection: Projection,
    pub controls: OrbitController,
    viewport: Viewport,
    bar: ProgressBar,
    reveal: Reveal,
    scene: Scene,
    #[cfg(target_arch = "wasm32")]
    dom_bar: Option<crate::progress::DomLoadingBar>,
}

impl Viewer {
    pub fn new(config: ViewerConfig, viewport: Viewport) -> Self {
        let camera = Camera::from_config(&config.camera);
        let mut projection = Projection::from_config(1, 1, &config.camera);
        projection.set_aspect(viewport.aspect());
        let mut controls = OrbitController::new(config.controls);
        controls.set_viewport_height(viewport.pointer_height());
        let reveal = Reveal::new(config.reveal);
        Self {
            config,
            camera,
            projection,
            controls,
            viewport,
            bar: ProgressBar::new(),
            reveal,
            scene: Scene::new(),
            #[cfg(target_arch = "wasm32")]
            dom_bar: None,
        }
    }

    /// Show progress in the page's loading bar element instead of drawing it.
    #[cfg(target_arch = "wasm32")]
    pub fn use_dom_bar(&mut self, bar: crate::progress::DomLoadingBar) {
        bar.show(&self.bar);
        self.dom_bar = Some(bar);
    }

    #[cfg(target_arch = "wasm32")]
    fn draws_bar(&self) -> bool {
        self.dom_bar.is_none()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn draws_bar(&self) -> bool {
        true
    }

    fn show_bar(&self) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(dom_bar) = &self.dom_bar {
                dom_bar.show(&self.bar);
            }
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn reveal(&self) -> &Reveal {
        &self.reveal
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn on_progress(&mut self, loaded: usize, total: usize) {
        self.bar.update(Progress::new(loaded, total));
        self.show_bar();
    }

    /// Loading has completed, successfully or not.
    pub fn on_loaded(&mut self) {
        self.reveal.trigger();
    }

    pub fn attach_model(&mut self, model: SceneNode) -> Result<(), SceneGraphLookupError> {
        self.scene.attach(model)
    }

    /// Apply a new window size. Returns the drawing buffer size.
    pub fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> (u32, u32) {
        self.viewport = Viewport::from_physical(size, scale_factor, self.config.max_pixel_ratio);
        self.projection.set_aspect(self.viewport.aspect());
        self.controls
            .set_viewport_height(self.viewport.pointer_height());
        self.viewport.drawing_buffer_size()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if self.controls.handle_window_event(event) {
            log::trace!("Orbit controls consumed {:?}", event);
        }
    }

    /// Advance one frame by `dt` and schedule the next one.
    pub fn frame(&mut self, dt: Duration, scheduler: &impl FrameScheduler) -> FrameUniforms {
        if self.reveal.advance(dt, &mut self.bar) {
            self.show_bar();
        }
        self.controls.update(&mut self.camera, &self.projection);

        let mut camera = CameraUniform::new();
        camera.update_view_proj(&self.camera, &self.projection);
        let bar = self.draws_bar().then_some(&self.bar);
        let overlay = OverlayUniform::new(self.reveal.alpha(), bar);

        scheduler.request_frame();
        FrameUniforms { camera, overlay }
    }
}
