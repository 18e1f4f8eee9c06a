//! Scene assembly.
//!
//! Turns the freshly parsed room model into the scene that gets drawn: every
//! role of the [`AppearanceTable`] is looked up among the model root's direct
//! children, receives its appearance, and the whole model is scaled down.

use crate::{
    data_structures::{appearance::AppearanceTable, scene_graph::SceneNode},
    error::SceneGraphLookupError,
};

/// Apply `table` to the direct children of `model` and scale `model` by
/// `scale` on every axis.
///
/// All node names are resolved before anything is changed, so a missing node
/// leaves the model untouched and is reported by name.
pub fn assemble(
    mut model: SceneNode,
    table: &AppearanceTable,
    scale: f32,
) -> Result<SceneNode, SceneGraphLookupError> {
    let mut located = Vec::new();
    for (role, appearance) in table.iter() {
        let name = role.node_name();
        let idx = model
            .child_index(name)
            .ok_or_else(|| SceneGraphLookupError::MissingNode(name.to_string()))?;
        located.push((idx, appearance));
    }

    for (idx, appearance) in located {
        model.children[idx].set_appearance(appearance.clone());
    }
    model.set_uniform_scale(scale);
    log::info!(
        "Assembled {} with {} appearances at scale {}",
        model.name,
        table.iter().count(),
        scale
    );

    Ok(model)
}

/// Root of everything that is drawn.
#[derive(Debug)]
pub struct Scene {
    root: SceneNode,
    model_attached: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            root: SceneNode::new("root"),
            model_attached: false,
        }
    }

    /// Attach the assembled model. There is only one model per scene.
    pub fn attach(&mut self, model: SceneNode) -> Result<(), SceneGraphLookupError> {
        if self.model_attached {
            log::warn!("Ignoring second model {}", model.name);
            return Err(SceneGraphLookupError::AlreadyAttached);
        }
        self.root.add_child(model);
        self.model_attached = true;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.model_attached
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
