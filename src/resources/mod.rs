/**
 * Loading of external assets. The viewer's only asset is the cube's color map.
 */
pub mod texture;

pub use texture::{decode_texture_image, load_binary, load_texture_image};
