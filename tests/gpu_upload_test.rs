#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_upload_the_room_headless() {
    use std::collections::HashMap;

    use baked_room::{
        assembler::assemble, data_structures::appearance::AppearanceTable, render::GpuScene,
        resources::texture::material_layout,
    };
    use futures::executor::block_on;

    use crate::common::test_utils::room_model;

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
        .expect("no GPU adapter available");
    let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))
        .expect("device creation failed");

    let table = AppearanceTable::room();
    let room = assemble(room_model(), &table, 0.2).expect("room assembles");
    let mut images = HashMap::new();
    images.insert(
        "room/textures/new/base.jpg".to_string(),
        image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255])),
    );

    let layout = material_layout(&device);
    let scene = GpuScene::upload(&device, &queue, &layout, &room, &images);
    assert_eq!(scene.mesh_count(), 7);
    // base.jpg, white for the four missing textures and the screen, blue accent
    assert_eq!(scene.material_count(), 3);
}
