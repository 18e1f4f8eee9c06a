//! Application event loop.
//!
//! [`run`] opens the window, creates the GPU [`Context`] and starts loading
//! the room. Loading runs beside the event loop (on a blocking tokio worker
//! natively, on the browser's task queue on the web) and reports back through
//! [`ViewerEvent`]s:
//!
//! 1. `Progress` for every finished (or failed) asset
//! 2. `Loaded` once all assets have ended, which starts the reveal
//! 3. `SceneReady` with the assembled room, which is uploaded to the GPU
//!
//! Every `RedrawRequested` advances the [`Viewer`] by the elapsed time, writes
//! its uniforms, draws and requests the next frame.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::appearance::AppearanceTable,
    error::AssetLoadError,
    loading::{LoadObserver, LoadingManager},
    render::GpuScene,
    resources::{Assets, LoadedScene, load_room},
    viewer::Viewer,
    viewport::Viewport,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum ViewerEvent {
    /// The GPU context finished initialising on the web.
    #[cfg(target_arch = "wasm32")]
    Initialized { ctx: Context },
    Progress {
        url: String,
        loaded: usize,
        total: usize,
    },
    LoadFailed { url: String, reason: String },
    /// Every registered asset has ended.
    Loaded,
    SceneReady(LoadedScene),
    SceneFailed(String),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized { .. } => f.write_str("Initialized"),
            Self::Progress { url, loaded, total } => f
                .debug_struct("Progress")
                .field("url", url)
                .field("loaded", loaded)
                .field("total", total)
                .finish(),
            Self::LoadFailed { url, reason } => f
                .debug_struct("LoadFailed")
                .field("url", url)
                .field("reason", reason)
                .finish(),
            Self::Loaded => f.write_str("Loaded"),
            Self::SceneReady(scene) => f.debug_tuple("SceneReady").field(scene).finish(),
            Self::SceneFailed(reason) => f.debug_tuple("SceneFailed").field(reason).finish(),
        }
    }
}

fn send(proxy: &EventLoopProxy<ViewerEvent>, event: ViewerEvent) {
    if let Err(err) = proxy.send_event(event) {
        log::warn!("Event loop closed before {:?} was delivered", err.0);
    }
}

impl LoadObserver for EventLoopProxy<ViewerEvent> {
    fn on_progress(&self, url: &str, loaded: usize, total: usize) {
        send(
            self,
            ViewerEvent::Progress {
                url: url.to_string(),
                loaded,
                total,
            },
        );
    }

    fn on_error(&self, url: &str, error: &AssetLoadError) {
        send(
            self,
            ViewerEvent::LoadFailed {
                url: url.to_string(),
                reason: error.to_string(),
            },
        );
    }

    fn on_load(&self) {
        send(self, ViewerEvent::Loaded);
    }
}

/// Load and assemble the room, reporting progress to `observer`.
pub async fn load_scene<O: LoadObserver>(
    observer: O,
    config: &ViewerConfig,
) -> anyhow::Result<LoadedScene> {
    let assets = Assets::new(config.asset_root.clone());
    let table = AppearanceTable::room();
    let manager = LoadingManager::new(observer);
    load_room(&assets, &manager, &table, config).await
}

/// Run [`load_scene`] on a blocking worker of `runtime` so the event loop
/// keeps drawing while assets arrive. `done` receives the result.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_loading<O, F>(
    runtime: &tokio::runtime::Runtime,
    observer: O,
    config: ViewerConfig,
    done: F,
) -> tokio::task::JoinHandle<()>
where
    O: LoadObserver + Send + 'static,
    F: FnOnce(anyhow::Result<LoadedScene>) + Send + 'static,
{
    let handle = runtime.handle().clone();
    // The loading manager is not Send, so the whole load stays on this worker
    runtime.spawn_blocking(move || done(handle.block_on(load_scene(observer, &config))))
}

fn scene_event(result: anyhow::Result<LoadedScene>) -> ViewerEvent {
    match result {
        Ok(scene) => ViewerEvent::SceneReady(scene),
        Err(e) => ViewerEvent::SceneFailed(format!("{:#}", e)),
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    ctx: Option<Context>,
    viewer: Option<Viewer>,
    gpu_scene: Option<GpuScene>,
    // Decoded textures wait here until the GPU context exists
    pending_images: Option<HashMap<String, image::RgbaImage>>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            window: None,
            ctx: None,
            viewer: None,
            gpu_scene: None,
            pending_images: None,
            last_time: Instant::now(),
        })
    }

    fn window_attributes(&self) -> anyhow::Result<winit::window::WindowAttributes> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Baked room");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| {
                    document
                        .query_selector(&self.config.canvas_selector)
                        .ok()
                        .flatten()
                })
                .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("No canvas matches {}", self.config.canvas_selector)
                })?;
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        Ok(window_attributes)
    }

    /// Create the GPU scene once both the context and the assembled room exist.
    fn upload_scene(&mut self) {
        let (Some(ctx), Some(viewer)) = (&self.ctx, &self.viewer) else {
            return;
        };
        if self.gpu_scene.is_some() || !viewer.scene().is_ready() {
            return;
        }
        let Some(images) = self.pending_images.take() else {
            return;
        };
        self.gpu_scene = Some(GpuScene::upload(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            viewer.scene().root(),
            &images,
        ));
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        let (width, height) = viewer.resize(size, scale_factor);
        if let Some(ctx) = &mut self.ctx {
            ctx.resize(width, height);
        }
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match self
            .window_attributes()
            .and_then(|attributes| Ok(event_loop.create_window(attributes)?))
        {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot open the viewer window: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        let viewport = Viewport::from_physical(
            window.inner_size(),
            window.scale_factor(),
            self.config.max_pixel_ratio,
        );
        #[allow(unused_mut)]
        let mut viewer = Viewer::new(self.config.clone(), viewport);
        #[cfg(target_arch = "wasm32")]
        {
            match crate::progress::DomLoadingBar::find(&self.config.loading_bar_selector) {
                Some(bar) => viewer.use_dom_bar(bar),
                None => log::info!(
                    "No element matches {}, drawing the loading bar",
                    self.config.loading_bar_selector
                ),
            }
        }
        self.viewer = Some(viewer);
        self.window = Some(window.clone());

        let size = viewport.drawing_buffer_size();
        let clear_colour = self.config.clear_colour;
        let init_future = Context::new(window, size, clear_colour, self.config.msaa_samples);
        let proxy = self.proxy.clone();
        let config = self.config.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(ctx) => {
                    ctx.window().request_redraw();
                    self.ctx = Some(ctx);
                }
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                    event_loop.exit();
                    return;
                }
            }
            // Frame time starts with the first frame, not with startup
            self.last_time = Instant::now();
            let observer = proxy.clone();
            spawn_loading(&self.async_runtime, observer, config, move |result| {
                send(&proxy, scene_event(result))
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let init_proxy = proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(ctx) => send(&init_proxy, ViewerEvent::Initialized { ctx }),
                    Err(e) => log::error!("Cannot create the main context: {:#}", e),
                }
            });
            wasm_bindgen_futures::spawn_local(async move {
                let result = load_scene(proxy.clone(), &config).await;
                send(&proxy, scene_event(result));
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        let Some(viewer) = &mut self.viewer else {
            log::warn!("Dropping {:?} before the viewer exists", event);
            return;
        };
        match event {
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::Initialized { ctx } => {
                // This is the message from our wasm `spawn_local`
                let size = ctx.window().inner_size();
                let scale_factor = ctx.window().scale_factor();
                ctx.window().request_redraw();
                self.ctx = Some(ctx);
                self.last_time = Instant::now();
                self.resize(size, scale_factor);
                self.upload_scene();
            }
            ViewerEvent::Progress { url, loaded, total } => {
                log::debug!("{} ended ({}/{})", url, loaded, total);
                viewer.on_progress(loaded, total);
            }
            ViewerEvent::LoadFailed { url, reason } => {
                log::warn!("{} is missing from the room: {}", url, reason);
            }
            ViewerEvent::Loaded => viewer.on_loaded(),
            ViewerEvent::SceneReady(scene) => {
                if let Err(e) = viewer.attach_model(scene.model) {
                    log::error!("{}", e);
                    return;
                }
                self.pending_images = Some(scene.images);
                self.upload_scene();
            }
            ViewerEvent::SceneFailed(reason) => {
                log::error!("The room could not be loaded: {}", reason);
                if self.ctx.is_none() {
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let Some(viewer) = &mut self.viewer {
            viewer.handle_window_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let scale_factor = self
                    .window
                    .as_ref()
                    .map_or(1.0, |window| window.scale_factor());
                self.resize(size, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(size) = self.window.as_ref().map(|window| window.inner_size()) {
                    self.resize(size, scale_factor);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                let (Some(ctx), Some(viewer)) = (&mut self.ctx, &mut self.viewer) else {
                    return;
                };
                let uniforms = viewer.frame(dt, ctx.window());
                ctx.write_uniforms(&uniforms);
                match ctx.render(self.gpu_scene.as_ref()) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (width, height) = viewer.viewport().drawing_buffer_size();
                        ctx.resize(width, height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::sync::{Arc, Mutex, mpsc};

    use super::*;

    const GATE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    /// Records callbacks. The first progress report waits for the test to open
    /// `gate`.
    #[derive(Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
        gate: Arc<Mutex<mpsc::Receiver<()>>>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl LoadObserver for Recorder {
        fn on_progress(&self, _: &str, loaded: usize, total: usize) {
            if loaded == 1 {
                let opened = self.gate.lock().unwrap().recv_timeout(GATE_TIMEOUT).is_ok();
                self.push(format!("gate opened {}", opened));
            }
            self.push(format!("progress {}/{}", loaded, total));
        }

        fn on_error(&self, url: &str, _: &AssetLoadError) {
            self.push(format!("error {}", url));
        }

        fn on_load(&self) {
            self.push("load".to_string());
        }
    }

    #[test]
    fn loading_does_not_block_the_caller() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (gate_tx, gate_rx) = mpsc::channel();
        let recorder = Recorder {
            events: Arc::new(Mutex::new(Vec::new())),
            gate: Arc::new(Mutex::new(gate_rx)),
        };
        let config = ViewerConfig {
            asset_root: "does/not/exist".to_string(),
            ..ViewerConfig::default()
        };
        let (done_tx, done_rx) = mpsc::channel();

        let task = spawn_loading(&runtime, recorder.clone(), config, move |result| {
            done_tx.send(result.is_ok()).unwrap();
        });
        // Only reachable if spawning returned before the first asset ended
        gate_tx.send(()).unwrap();
        runtime.block_on(task).unwrap();

        assert!(!done_rx.recv().unwrap());
        let events = recorder.events.lock().unwrap();
        assert!(events.contains(&"gate opened true".to_string()));
        assert_eq!(events.iter().filter(|e| e.starts_with("error")).count(), 6);
        assert!(events.contains(&"progress 6/6".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("load"));
    }
}
