use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Copies `assets/` next to the build output so native runs find the room
/// model and its baked textures regardless of the working directory.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");

    let asset_root = if assets_src.exists() {
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&[&assets_src], &out_dir, &copy_options)?;
        out_dir.join("assets")
    } else {
        // Nothing to bundle: fall back to the working directory at runtime.
        PathBuf::from("assets")
    };
    println!("cargo:rustc-env=BAKED_ROOM_ASSETS={}", asset_root.display());

    Ok(())
}
