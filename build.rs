use std::{env, path::PathBuf};

use anyhow::Context;
use fs_extra::{copy_items, dir::CopyOptions};

/// Bundles `assets/` next to the build output so the native viewer finds its
/// color map even when started outside the crate root.
fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.is_dir() {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy_items(&[&assets], &out_dir, &options)
        .with_context(|| format!("copying {} to {}", assets.display(), out_dir.display()))?;

    Ok(())
}
