use cube_viewer::{flow, viewer::ViewerConfig};

fn main() -> anyhow::Result<()> {
    flow::run(ViewerConfig::default())
}
