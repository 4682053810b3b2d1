use crate::scene::material::TextureImage;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::Context as _;

    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

/// Where a native build looks for `file_name`: `./assets/` when the file is
/// there, otherwise the copy bundled at build time.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_path(file_name: &str) -> std::path::PathBuf {
    let local = std::path::Path::new("./").join("assets").join(file_name);
    if local.exists() {
        return local;
    }
    std::path::Path::new(env!("OUT_DIR"))
        .join("assets")
        .join(file_name)
}

/// Reads an asset: from [`asset_path`] natively, over HTTP from
/// `<origin>/assets/` in the browser.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use anyhow::Context as _;

        let path = asset_path(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?
    };

    Ok(data)
}

/// Loads and decodes a color map. The image format is guessed from the data.
pub async fn load_texture_image(file_name: &str) -> anyhow::Result<TextureImage> {
    let data = load_binary(file_name).await?;
    decode_texture_image(file_name, &data)
}

pub fn decode_texture_image(label: &str, bytes: &[u8]) -> anyhow::Result<TextureImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(TextureImage::new(label, img.to_rgba8()))
}
