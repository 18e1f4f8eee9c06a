use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture, pipelines::baked::mk_render_pipeline,
    progress::ProgressBar,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayUniform {
    /// Opacity of the black curtain.
    pub alpha: f32,
    pub bar_scale: f32,
    /// `1.0` while the loading bar is drawn, `0.0` otherwise.
    pub bar_visible: f32,
    // Uniforms are laid out in 16 byte blocks
    _padding: f32,
}

impl OverlayUniform {
    pub fn new(alpha: f32, bar: Option<&ProgressBar>) -> Self {
        let (bar_scale, bar_visible) = match bar {
            Some(bar) if !bar.is_ended() => (bar.scale(), 1.0),
            Some(bar) => (bar.scale(), 0.0),
            None => (0.0, 0.0),
        };
        Self {
            alpha,
            bar_scale,
            bar_visible,
            _padding: 0.0,
        }
    }

    /// Nothing of the overlay is visible.
    pub fn is_clear(&self) -> bool {
        self.alpha <= 0.0 && self.bar_visible <= 0.0
    }
}

impl Default for OverlayUniform {
    fn default() -> Self {
        Self::new(1.0, None)
    }
}

#[derive(Debug)]
pub struct OverlayResources {
    pub uniform: OverlayUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub render_pipeline: wgpu::RenderPipeline,
}

impl OverlayResources {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Self {
        let uniform = OverlayUniform::default();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("overlay_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("overlay_bind_group"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        };
        // Shares the scene's depth attachment but always draws on top
        let depth = wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };
        let render_pipeline = mk_render_pipeline(
            device,
            &layout,
            config.format,
            sample_count,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            Some(depth),
            &[],
            shader,
        );

        Self {
            uniform,
            buffer,
            bind_group,
            render_pipeline,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniform: OverlayUniform) {
        if self.uniform == uniform {
            return;
        }
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if self.uniform.is_clear() {
            return;
        }
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        // Six corners, two quads: curtain and bar
        render_pass.draw(0..6, 0..2);
    }
}
