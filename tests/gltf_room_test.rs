use baked_room::{
    assembler::{Scene, assemble},
    data_structures::appearance::{Appearance, AppearanceTable, Role},
    error::{AssetLoadError, SceneGraphLookupError},
    resources::{Assets, DRACO_EXTENSION, load_model_gltf},
};
use futures::executor::block_on;

use crate::common::test_utils::gltf_with_nodes;

mod common;

fn room_node_names() -> Vec<&'static str> {
    Role::ALL.iter().map(|role| role.node_name()).collect()
}

#[test]
fn should_assemble_a_parsed_room() {
    let mut names = room_node_names();
    names.push("lamp");
    let bytes = gltf_with_nodes(&names, &[]);
    let model = block_on(load_model_gltf("room.gltf", &bytes, &Assets::new(""), "draco/"))
        .expect("model should parse");
    assert_eq!(model.name, "Scene");
    assert_eq!(model.children.len(), 8);

    let table = AppearanceTable::room();
    let room = assemble(model, &table, 0.2).expect("every role is present");
    assert_eq!(room.local.scale, cgmath::Vector3::new(0.2, 0.2, 0.2));
    for role in Role::ALL {
        let node = room.child(role.node_name()).expect("node exists");
        assert_eq!(node.appearance.as_ref(), table.get(role));
    }
    assert_eq!(
        room.child("eBaked").and_then(|node| node.appearance.clone()),
        Some(Appearance::flat(0x0E54FF))
    );
    assert_eq!(room.child("lamp").and_then(|node| node.appearance.clone()), None);

    let mut scene = Scene::new();
    scene.attach(room).expect("first model attaches");
    assert!(scene.is_ready());
    assert_eq!(scene.root().node_count(), 10);
}

#[test]
fn should_name_the_missing_sub_mesh() {
    let names: Vec<&str> = room_node_names()
        .into_iter()
        .filter(|name| *name != "chairBack")
        .collect();
    let bytes = gltf_with_nodes(&names, &[]);
    let model = block_on(load_model_gltf("room.gltf", &bytes, &Assets::new(""), "draco/"))
        .expect("model should parse");

    let err = assemble(model, &AppearanceTable::room(), 0.2).unwrap_err();
    assert_eq!(err, SceneGraphLookupError::MissingNode("chairBack".to_string()));
}

#[test]
fn should_reject_draco_compressed_models() {
    let bytes = gltf_with_nodes(&room_node_names(), &[DRACO_EXTENSION]);
    let err = block_on(load_model_gltf("room.gltf", &bytes, &Assets::new(""), "draco/")).unwrap_err();
    match err {
        AssetLoadError::UnsupportedCompression { url, decoder_path } => {
            assert_eq!(url, "room.gltf");
            assert_eq!(decoder_path, "draco/");
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn should_reject_malformed_models() {
    let err = block_on(load_model_gltf("room.gltf", b"not a model", &Assets::new(""), "draco/"))
        .unwrap_err();
    assert!(matches!(err, AssetLoadError::Model { .. }));
}
