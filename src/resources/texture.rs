/// Bind group layout shared by every room material: the surface texture at
/// binding 0 and its sampler at binding 1.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Material texture_bind_group_layout"),
    })
}

/// Decode an image file, trusting the file extension when there is one.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<image::RgbaImage, image::ImageError> {
    let img = match image::ImageFormat::from_path(url) {
        Ok(format) => image::load_from_memory_with_format(bytes, format)?,
        // Let the image lib guess
        Err(_) => image::load_from_memory(bytes)?,
    };
    Ok(img.to_rgba8())
}
