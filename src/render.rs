//! GPU side of the scene.
//!
//! [`GpuScene::upload`] flattens an assembled scene graph into drawable
//! meshes. Each node with geometry gets one instance buffer holding its world
//! matrix, and every distinct appearance becomes one [`Material`]. Flat
//! colours are uploaded as 1x1 textures so all meshes share the baked pipeline.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::data_structures::{
    appearance::{Appearance, ColorSpace},
    instance::Instance,
    model::{DrawModel, Material, Mesh},
    scene_graph::SceneNode,
    texture::Texture,
};

const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// What a material is built from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    Texture { url: String, color_space: ColorSpace },
    Colour([u8; 3]),
}

impl MaterialKey {
    /// Material for a node. Textures that did not load and nodes without an
    /// appearance fall back to white.
    pub fn for_appearance(
        appearance: Option<&Appearance>,
        images: &HashMap<String, image::RgbaImage>,
    ) -> Self {
        match appearance {
            Some(Appearance::Baked { url, color_space }) if images.contains_key(url) => {
                MaterialKey::Texture {
                    url: url.clone(),
                    color_space: *color_space,
                }
            }
            Some(Appearance::Baked { url, .. }) => {
                log::warn!("Texture {} is not loaded, drawing white", url);
                MaterialKey::Colour(WHITE)
            }
            Some(Appearance::Flat { color }) => MaterialKey::Colour(*color),
            None => MaterialKey::Colour(WHITE),
        }
    }

    fn label(&self) -> String {
        match self {
            MaterialKey::Texture { url, .. } => url.clone(),
            MaterialKey::Colour([r, g, b]) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        }
    }
}

struct NodeDraw {
    instance_buffer: wgpu::Buffer,
    meshes: Vec<Mesh>,
}

pub struct GpuScene {
    materials: Vec<Material>,
    nodes: Vec<NodeDraw>,
}

impl GpuScene {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        root: &SceneNode,
        images: &HashMap<String, image::RgbaImage>,
    ) -> Self {
        let mut materials = Vec::new();
        let mut material_ids: HashMap<MaterialKey, usize> = HashMap::new();
        let mut nodes = Vec::new();

        root.walk(&Instance::new(), &mut |node, world| {
            if node.primitives.is_empty() {
                return;
            }
            let key = MaterialKey::for_appearance(node.appearance.as_ref(), images);
            let material = *material_ids.entry(key).or_insert_with_key(|key| {
                let texture = match key {
                    MaterialKey::Texture { url, color_space } => {
                        Texture::from_rgba(device, queue, &images[url], Some(url.as_str()), *color_space)
                    }
                    MaterialKey::Colour([r, g, b]) => {
                        Texture::solid(device, queue, [*r, *g, *b, 0xFF], &key.label())
                    }
                };
                materials.push(Material::new(device, &key.label(), texture, material_layout));
                materials.len() - 1
            });

            let meshes: Vec<Mesh> = node
                .primitives
                .iter()
                .enumerate()
                .filter(|(_, primitive)| !primitive.indices.is_empty())
                .map(|(idx, primitive)| {
                    Mesh::new(
                        device,
                        &format!("{}#{}", node.name, idx),
                        &primitive.vertices,
                        &primitive.indices,
                        material,
                    )
                })
                .collect();
            if meshes.is_empty() {
                log::warn!("Node {} has no drawable primitives", node.name);
                return;
            }

            let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Instance Buffer", node.name)),
                contents: bytemuck::cast_slice(&[world.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX,
            });
            nodes.push(NodeDraw {
                instance_buffer,
                meshes,
            });
        });

        log::info!(
            "Uploaded {} nodes with {} materials",
            nodes.len(),
            materials.len()
        );
        Self { materials, nodes }
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().map(|node| node.meshes.len()).sum()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a wgpu::RenderPipeline,
        camera_bind_group: &'a wgpu::BindGroup,
    ) {
        render_pass.set_pipeline(pipeline);
        for node in &self.nodes {
            render_pass.set_vertex_buffer(1, node.instance_buffer.slice(..));
            for mesh in &node.meshes {
                render_pass.draw_mesh_instanced(
                    mesh,
                    &self.materials[mesh.material],
                    0..1,
                    camera_bind_group,
                );
            }
        }
    }
}
