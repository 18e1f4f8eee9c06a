use std::cell::RefCell;

use baked_room::{
    config::ViewerConfig,
    data_structures::{
        appearance::Role,
        model::ModelVertex,
        scene_graph::{MeshData, SceneNode},
    },
    error::AssetLoadError,
    loading::LoadObserver,
    viewer::Viewer,
    viewport::Viewport,
};

/// Forwards loading callbacks to a [`Viewer`] the way the event loop does.
pub(crate) struct ViewerObserver {
    pub viewer: RefCell<Viewer>,
    pub errors: RefCell<Vec<String>>,
}

impl ViewerObserver {
    pub fn new() -> Self {
        Self {
            viewer: RefCell::new(Viewer::new(
                ViewerConfig::default(),
                Viewport::new(800.0, 600.0, 1.0, 2.0),
            )),
            errors: RefCell::new(Vec::new()),
        }
    }
}

impl LoadObserver for ViewerObserver {
    fn on_progress(&self, _: &str, loaded: usize, total: usize) {
        self.viewer.borrow_mut().on_progress(loaded, total);
    }

    fn on_error(&self, url: &str, _: &AssetLoadError) {
        self.errors.borrow_mut().push(url.to_string());
    }

    fn on_load(&self) {
        self.viewer.borrow_mut().on_loaded();
    }
}

/// A single triangle.
pub fn triangle() -> MeshData {
    let vertex = |x: f32, y: f32| ModelVertex {
        position: [x, y, 0.0],
        tex_coords: [x, y],
    };
    MeshData {
        vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
        indices: vec![0, 1, 2],
    }
}

/// A model root with one triangle node per role.
pub fn room_model() -> SceneNode {
    Role::ALL.iter().fold(SceneNode::new("Scene"), |root, role| {
        root.with_child(SceneNode::new(role.node_name()).with_primitive(triangle()))
    })
}

/// glTF JSON with one empty node per name.
pub fn gltf_with_nodes(names: &[&str], extensions_required: &[&str]) -> Vec<u8> {
    let nodes: Vec<String> = names
        .iter()
        .map(|name| format!("{{\"name\":\"{}\"}}", name))
        .collect();
    let indices: Vec<String> = (0..names.len()).map(|idx| idx.to_string()).collect();
    let extensions: Vec<String> = extensions_required
        .iter()
        .map(|ext| format!("\"{}\"", ext))
        .collect();
    let extensions = extensions.join(",");
    format!(
        "{{\"asset\":{{\"version\":\"2.0\"}},\"extensionsUsed\":[{}],\"extensionsRequired\":[{}],\"scene\":0,\"scenes\":[{{\"name\":\"Scene\",\"nodes\":[{}]}}],\"nodes\":[{}]}}",
        extensions,
        extensions,
        indices.join(","),
        nodes.join(",")
    )
    .into_bytes()
}
