use std::collections::HashMap;

use futures::future::{join, join_all};

use crate::{
    assembler,
    config::ViewerConfig,
    data_structures::{
        appearance::{Appearance, AppearanceTable},
        instance::Instance,
        model::ModelVertex,
        scene_graph::{MeshData, SceneNode},
    },
    error::AssetLoadError,
    loading::{LoadObserver, LoadingManager},
};

/**
 * This module contains all logic for loading the room model and its textures from external files.
 */
pub mod texture;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Resolves asset paths against the asset root and fetches their bytes.
///
/// Natively the root is a directory on disk. On the web it is a path relative
/// to the page URL and files are fetched over HTTP.
#[derive(Clone, Debug)]
pub struct Assets {
    root: String,
}

impl Assets {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    #[cfg(target_arch = "wasm32")]
    fn format_url(&self, file_name: &str) -> Result<reqwest::Url, AssetLoadError> {
        let invalid = || AssetLoadError::InvalidUrl(file_name.to_string());
        let href = web_sys::window()
            .and_then(|window| window.location().href().ok())
            .ok_or_else(invalid)?;
        let base = reqwest::Url::parse(&href).map_err(|_| invalid())?;
        let path = if self.root.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.root.trim_end_matches('/'), file_name)
        };
        base.join(&path).map_err(|_| invalid())
    }

    pub async fn load_binary(&self, file_name: &str) -> Result<Vec<u8>, AssetLoadError> {
        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = self.format_url(file_name)?;
            let http = |source| AssetLoadError::Http {
                url: file_name.to_string(),
                source,
            };
            reqwest::get(url)
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(http)?
                .bytes()
                .await
                .map_err(http)?
                .to_vec()
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            let path = std::path::Path::new(&self.root).join(file_name);
            std::fs::read(path).map_err(|source| AssetLoadError::Io {
                url: file_name.to_string(),
                source,
            })?
        };

        Ok(data)
    }
}

pub async fn load_image(assets: &Assets, url: &str) -> Result<image::RgbaImage, AssetLoadError> {
    let bytes = assets.load_binary(url).await?;
    texture::decode_image(url, &bytes).map_err(|source| AssetLoadError::Image {
        url: url.to_string(),
        source,
    })
}

/// Parse a glTF/GLB document into a scene graph.
///
/// The returned root is named after the document's scene (`"Scene"` when the
/// scene has no name) and holds the scene's top-level nodes as direct
/// children. External buffers are fetched relative to the model's directory.
/// Documents that require Draco mesh compression are rejected; `decoder_path`
/// only shows up in that error.
pub async fn load_model_gltf(
    url: &str,
    bytes: &[u8],
    assets: &Assets,
    decoder_path: &str,
) -> Result<SceneNode, AssetLoadError> {
    let model_error = |source| AssetLoadError::Model {
        url: url.to_string(),
        source,
    };
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice_without_validation(bytes).map_err(model_error)?;
    if document.extensions_required().any(|ext| ext == DRACO_EXTENSION) {
        return Err(AssetLoadError::UnsupportedCompression {
            url: url.to_string(),
            decoder_path: decoder_path.to_string(),
        });
    }
    let document = gltf::Document::from_json(document.into_json()).map_err(model_error)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in document.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let bin = blob.as_deref().ok_or_else(|| AssetLoadError::MissingBuffer {
                    url: url.to_string(),
                    index: buffer.index(),
                })?;
                buffer_data.push(bin.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    return Err(AssetLoadError::InvalidUrl(format!("{} (embedded data uri)", url)));
                }
                let bin = assets.load_binary(&sibling(url, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    let mut root = SceneNode::new(scene.as_ref().and_then(|s| s.name()).unwrap_or("Scene"));
    if let Some(scene) = scene {
        for node in scene.nodes() {
            root.add_child(to_scene_node(node, &buffer_data));
        }
    } else {
        log::warn!("{} contains no scene", url);
    }
    log::debug!("Parsed {} into {} nodes", url, root.node_count());

    Ok(root)
}

/// Path of `uri` next to `url`.
fn sibling(url: &str, uri: &str) -> String {
    match url.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    }
}

fn to_scene_node(node: gltf::scene::Node, buf: &[Vec<u8>]) -> SceneNode {
    let mut scene_node = SceneNode::new(node.name().unwrap_or_default());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping {:?} primitive of mesh {:?}",
                    primitive.mode(),
                    mesh.name()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

            let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
                Some(positions) => positions
                    .map(|position| ModelVertex {
                        position,
                        tex_coords: Default::default(),
                    })
                    .collect(),
                None => continue,
            };
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
                    vertex.tex_coords = tex_coord;
                }
            }
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            scene_node.primitives.push(MeshData { vertices, indices });
        }

        // Until the appearance table says otherwise, a mesh looks like its material's base colour
        if let Some(primitive) = mesh.primitives().next() {
            let [r, g, b, _] = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();
            scene_node.appearance = Some(Appearance::Flat {
                color: [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)],
            });
        }
    }

    let decomp_pos = node.transform().decomposed();
    scene_node.local = Instance {
        position: decomp_pos.0.into(),
        rotation: decomp_pos.1.into(),
        scale: decomp_pos.2.into(),
    };
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buf));
    }

    scene_node
}

fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let srgb = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (srgb * 255.0).round() as u8
}

/// The assembled room and the decoded textures it references.
pub struct LoadedScene {
    pub model: SceneNode,
    pub images: HashMap<String, image::RgbaImage>,
}

impl std::fmt::Debug for LoadedScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedScene")
            .field("model", &self.model.name)
            .field("images", &self.images.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Fetch every texture of `table` and the room model through `manager`, then
/// assemble the model.
///
/// All fetches are registered before any of them is polled. A texture that
/// fails to load is reported by the manager and left out of
/// [`LoadedScene::images`]; the meshes using it render white. A model that
/// fails to load, or lacks one of the table's nodes, fails the whole load.
pub async fn load_room<O: LoadObserver>(
    assets: &Assets,
    manager: &LoadingManager<O>,
    table: &AppearanceTable,
    config: &ViewerConfig,
) -> anyhow::Result<LoadedScene> {
    let textures: Vec<_> = table
        .texture_urls()
        .into_iter()
        .map(|url| {
            let fetch_url = url.to_string();
            manager.track(url, async move {
                let image = load_image(assets, &fetch_url).await?;
                Ok::<_, AssetLoadError>((fetch_url, image))
            })
        })
        .collect();
    let model_url = config.model.clone();
    let decoder_path = config.decoder_path.clone();
    let model = manager.track(&config.model, async move {
        let bytes = assets.load_binary(&model_url).await?;
        load_model_gltf(&model_url, &bytes, assets, &decoder_path).await
    });

    let (textures, model) = join(join_all(textures), model).await;

    let mut images = HashMap::new();
    for texture in textures {
        match texture {
            Ok((url, image)) => {
                images.insert(url, image);
            }
            Err(e) => log::warn!("Rendering without texture: {}", e),
        }
    }
    let model = assembler::assemble(model?, table, config.scene_scale)?;

    Ok(LoadedScene { model, images })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_resolve_next_to_the_model() {
        assert_eq!(sibling("room/draco_room.gltf", "room.bin"), "room/room.bin");
        assert_eq!(sibling("room.gltf", "room.bin"), "room.bin");
    }

    #[test]
    fn base_colour_is_converted_to_srgb() {
        assert_eq!(linear_to_srgb(0.0), 0);
        assert_eq!(linear_to_srgb(1.0), 255);
        assert_eq!(linear_to_srgb(0.214_041_14), 128);
        assert_eq!(linear_to_srgb(2.0), 255);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_files_are_io_errors() {
        let assets = Assets::new("/nonexistent-asset-root");
        let err = futures::executor::block_on(assets.load_binary("room/base.jpg")).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { ref url, .. } if url == "room/base.jpg"));
    }
}
