use baked_room::{config::ViewerConfig, flow};

fn main() -> anyhow::Result<()> {
    flow::run(ViewerConfig::default())
}
