#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn render_empty_scene(background: cube_viewer::scene::Color) -> image::RgbaImage {
    use cgmath::Deg;
    use cube_viewer::{
        camera::Camera,
        render::{Renderer, RendererOptions, gpu::GpuBackend},
        scene::Scene,
    };

    let runtime = tokio::runtime::Runtime::new().expect("Failed to start a runtime");
    let options = RendererOptions::default();
    let backend = runtime
        .block_on(GpuBackend::headless(64, 64, options))
        .expect("Failed to create a headless GPU backend");
    let mut renderer = Renderer::new(backend, options);
    renderer.set_size(64, 64);

    let scene = Scene::new(background);
    let mut camera = Camera::new(Deg(35.0), 1.0, 0.1, 100.0).unwrap();
    camera.set_position(0.0, 5.0, 2.0);
    renderer.render(&scene, &camera).expect("Failed to render");

    runtime
        .block_on(renderer.backend().read_pixels())
        .expect("Failed to read back the frame")
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use cube_viewer::scene::Color;

    let texture = render_empty_scene(Color::WHITE);
    assert_eq!(texture.dimensions(), (64, 64));
    for pixel in texture.pixels() {
        assert_eq!(*pixel, image::Rgba([255, 255, 255, 255]));
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn background_keeps_its_srgb_value() {
    use cube_viewer::scene::Color;

    let texture = render_empty_scene(Color::SKY_BLUE);
    let close = |a: u8, b: u8| a.abs_diff(b) <= 1;
    for pixel in texture.pixels() {
        let [r, g, b, a] = pixel.0;
        assert!(close(r, 0x87) && close(g, 0xce) && close(b, 0xeb) && a == 255, "{pixel:?}");
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn textured_cube_covers_the_screen_center() {
    use common::test_utils::FakeHost;
    use cube_viewer::{
        Viewer, ViewerConfig,
        render::gpu::GpuBackend,
        scene::material::TextureImage,
    };

    let runtime = tokio::runtime::Runtime::new().expect("Failed to start a runtime");
    let config = ViewerConfig::default();
    let backend = runtime
        .block_on(GpuBackend::headless(128, 96, config.renderer_options()))
        .expect("Failed to create a headless GPU backend");
    let mut host = FakeHost::new(128, 96);
    let mut viewer = Viewer::init(config, &mut host, backend).unwrap();
    let red = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
    viewer.apply_texture(Ok(TextureImage::new("red", red)));
    viewer.frame(&host, 0.0).expect("Failed to render");

    let frame = runtime
        .block_on(viewer.renderer().backend().read_pixels())
        .expect("Failed to read back the frame");
    let center = frame.get_pixel(64, 48).0;
    // lit red cube, not the sky blue background
    assert!(center[0] > center[2], "{center:?}");
    assert!(center[1] < 0x80, "{center:?}");
}
