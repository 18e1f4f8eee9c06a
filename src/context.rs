use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{CameraResources, CameraUniform},
    data_structures::texture::Texture,
    pipelines::{Pipelines, baked::mk_baked_pipeline, overlay::OverlayResources, sample_count},
    render::GpuScene,
    resources::texture::material_layout,
    viewer::FrameUniforms,
};

/// Everything that talks to the GPU: surface, device, shared bind groups and
/// pipelines.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    // Multisampled colour target, `None` when multisampling is off
    msaa_view: Option<wgpu::TextureView>,
    sample_count: u32,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipelines: Pipelines,
    pub overlay: OverlayResources,
    pub clear_colour: wgpu::Color,
    is_surface_configured: bool,
}

impl Context {
    /// `size` is the drawing buffer size, which may be smaller than the window
    /// on high density displays. `msaa_samples` is lowered to what the adapter
    /// supports.
    pub async fn new(
        window: Arc<Window>,
        size: (u32, u32),
        clear_colour: wgpu::Color,
        msaa_samples: u32,
    ) -> anyhow::Result<Self> {
        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {}", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The baked textures are sRGB and the shader writes linear colour, so
        // the surface has to encode back to sRGB.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("The surface supports no texture format"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let sample_count = sample_count(
            adapter.get_texture_format_features(config.format).flags,
            adapter.get_texture_format_features(Texture::DEPTH_FORMAT).flags,
            msaa_samples,
        );
        log::info!("Drawing with {}x multisampling", sample_count);

        let camera = CameraResources::new(&device, CameraUniform::new());
        let material_layout = material_layout(&device);
        let pipelines = Pipelines {
            baked: mk_baked_pipeline(
                &device,
                &config,
                sample_count,
                &material_layout,
                &camera.bind_group_layout,
            ),
        };
        let overlay = OverlayResources::new(&device, &config, sample_count);

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );

        let mut ctx = Self {
            window,
            depth_texture,
            msaa_view: None,
            sample_count,
            surface,
            device,
            queue,
            config,
            camera,
            material_layout,
            pipelines,
            overlay,
            clear_colour,
            is_surface_configured: false,
        };
        ctx.resize(size.0, size.1);
        Ok(ctx)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.is_surface_configured = true;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                [self.config.width, self.config.height],
                self.sample_count,
                "depth_texture",
            );
            self.msaa_view = (self.sample_count > 1).then(|| {
                Texture::create_msaa_target(
                    &self.device,
                    [self.config.width, self.config.height],
                    self.config.format,
                    self.sample_count,
                )
            });
        }
    }

    pub fn write_uniforms(&mut self, frame: &FrameUniforms) {
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[frame.camera]),
        );
        self.overlay.write(&self.queue, frame.overlay);
    }

    /// Draw `scene` (if it is ready) and the overlay on top.
    pub fn render(&mut self, scene: Option<&GpuScene>) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    // Draw into the multisampled target and resolve into the surface
                    view: self.msaa_view.as_ref().unwrap_or(&view),
                    resolve_target: self.msaa_view.as_ref().map(|_| &view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(scene) = scene {
                scene.draw(
                    &mut render_pass,
                    &self.pipelines.baked,
                    &self.camera.bind_group,
                );
            }
            self.overlay.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
