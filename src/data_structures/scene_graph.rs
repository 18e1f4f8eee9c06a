//! Scene graph.
//!
//! A CPU-side tree of named nodes as parsed from the room model. Nodes carry
//! their local transform, the geometry of their primitives and the appearance
//! they are drawn with. Nothing here touches the GPU; [`crate::render::GpuScene`]
//! uploads a finished tree.

use crate::data_structures::{appearance::Appearance, instance::Instance, model::ModelVertex};

/// Geometry of one primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub primitives: Vec<MeshData>,
    pub appearance: Option<Appearance>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_primitive(mut self, primitive: MeshData) -> Self {
        self.primitives.push(primitive);
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Index of the direct child called exactly `name`.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&SceneNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn set_appearance(&mut self, appearance: Appearance) {
        self.appearance = Some(appearance);
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.local.scale = cgmath::Vector3::new(scale, scale, scale);
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Visits every node depth-first with its world transform.
    pub fn walk<'a>(&'a self, parent: &Instance, visit: &mut dyn FnMut(&'a SceneNode, &Instance)) {
        let world = parent * &self.local;
        visit(self, &world);
        for child in &self.children {
            child.walk(&world, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    fn room() -> SceneNode {
        SceneNode::new("Scene")
            .with_child(SceneNode::new("BaseBaked").with_child(SceneNode::new("nested")))
            .with_child(SceneNode::new("pcBaked"))
    }

    #[test]
    fn looks_up_direct_children_by_exact_name() {
        let root = room();
        assert_eq!(root.child_index("pcBaked"), Some(1));
        assert_eq!(root.child_index("pcbaked"), None);
        assert_eq!(root.child_index("nested"), None);
        assert!(root.child("BaseBaked").is_some());
    }

    #[test]
    fn walk_composes_world_transforms() {
        let mut root = room();
        root.set_uniform_scale(0.5);
        root.children[1].local.position = Vector3::new(4.0, 0.0, 0.0);

        let mut seen = Vec::new();
        root.walk(&Instance::default(), &mut |node, world| {
            seen.push((node.name.clone(), world.position, world.scale.x));
        });
        assert_eq!(root.node_count(), 4);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].0, "Scene");
        assert_eq!(seen[3], ("pcBaked".to_string(), Vector3::new(2.0, 0.0, 0.0), 0.5));
    }
}
