mod common;

use cgmath::{Deg, EuclideanSpace, InnerSpace, Point3, Rad};
use common::test_utils::{FakeHost, RecordingBackend};
use cube_viewer::{
    Error, Viewer, ViewerConfig,
    animation_loop::LoopState,
    controls::{ControlEvent, PointerButton},
    resize::Viewport,
    scene::{
        Color,
        material::{ColorSpace, TextureImage},
    },
};

fn start(width: u32, height: u32) -> (FakeHost, Viewer<RecordingBackend>) {
    let mut host = FakeHost::new(width, height);
    let viewer = Viewer::init(ViewerConfig::default(), &mut host, RecordingBackend::new())
        .expect("viewer should start");
    (host, viewer)
}

#[test]
fn init_matches_container_size() {
    let (host, viewer) = start(1024, 768);

    assert!((viewer.camera().projection.aspect() - 1024.0 / 768.0).abs() < 1e-6);
    assert_eq!(viewer.renderer().size(), (1024, 768));
    assert_eq!(viewer.renderer().backend().resizes.last(), Some(&(1024, 768)));
    assert_eq!(host.appended, 1);
    assert!(viewer.animation().is_running());
    assert_eq!(host.requests(), 1);
}

#[test]
fn init_builds_the_default_scene() {
    let (_host, viewer) = start(1024, 768);
    let scene = viewer.scene();

    assert_eq!(scene.background, Color::SKY_BLUE);
    assert_eq!(scene.len(), 3);
    assert_eq!(scene.meshes().count(), 1);
    assert_eq!(scene.hemisphere_lights().count(), 1);
    assert_eq!(scene.directional_lights().count(), 1);

    let cube = scene.mesh(viewer.cube()).expect("cube mesh");
    assert_eq!(cube.geometry.dimensions(), [2.0, 2.0, 2.0]);
    assert!(cube.material.map().is_none());

    let camera = viewer.camera();
    assert_eq!(camera.position, Point3::new(-4.0, 4.0, 10.0));
    assert_eq!(camera.target, Point3::origin());
    assert_eq!(camera.projection.fovy(), Deg(35.0));
    assert_eq!(camera.projection.znear(), 0.1);
    assert_eq!(camera.projection.zfar(), 100.0);

    let renderer = viewer.renderer();
    assert!(renderer.antialias());
    assert!(renderer.physically_correct_lights);
    assert_eq!(renderer.output.gamma_factor, 2.2);
    assert!(renderer.output.gamma_output);
}

#[test]
fn pixel_ratio_is_taken_from_the_host() {
    let mut host = FakeHost::new(400, 300);
    host.pixel_ratio = 2.0;
    let viewer = Viewer::init(ViewerConfig::default(), &mut host, RecordingBackend::new()).unwrap();

    assert_eq!(viewer.renderer().size(), (400, 300));
    assert_eq!(viewer.renderer().backend().resizes.last(), Some(&(800, 600)));
}

#[test]
fn resize_updates_camera_and_renderer_only() {
    let (host, mut viewer) = start(1024, 768);
    viewer.frame(&host, 0.016).unwrap();
    let before = viewer.renderer().backend().last_frame().cloned().unwrap();

    assert!(viewer.resize(Viewport::new(800, 600)));
    assert!((viewer.camera().projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert_eq!(viewer.renderer().size(), (800, 600));

    viewer.frame(&host, 0.016).unwrap();
    let after = viewer.renderer().backend().last_frame().cloned().unwrap();
    assert_eq!(after.nodes, before.nodes);
    assert_eq!(after.background, before.background);
    assert!((after.aspect - 800.0 / 600.0).abs() < 1e-6);
}

#[test]
fn odd_physical_size_reaches_the_backend_unchanged() {
    let mut host = FakeHost::new(0, 0);
    host.size = Viewport::from_physical(1003, 701, 2.0);
    host.pixel_ratio = 2.0;
    let mut viewer =
        Viewer::init(ViewerConfig::default(), &mut host, RecordingBackend::new()).unwrap();

    assert_eq!(viewer.renderer().size(), (502, 351));
    // configured once, at the window's real size
    assert_eq!(viewer.renderer().backend().resizes, vec![(1003, 701)]);

    assert!(viewer.resize(Viewport::from_physical(1201, 799, 2.0)));
    assert_eq!(viewer.renderer().backend().resizes.last(), Some(&(1201, 799)));
}

#[test]
fn resizing_twice_to_the_same_size_changes_nothing() {
    let (_host, mut viewer) = start(1024, 768);

    assert!(viewer.resize(Viewport::new(800, 600)));
    let aspect = viewer.camera().projection.aspect();
    let matrix = viewer.camera().projection.matrix();
    let size = viewer.renderer().size();

    assert!(viewer.resize(Viewport::new(800, 600)));
    assert_eq!(viewer.camera().projection.aspect(), aspect);
    assert_eq!(viewer.camera().projection.matrix(), matrix);
    assert_eq!(viewer.renderer().size(), size);
    assert_eq!(aspect, 800.0 / 600.0);
    assert_eq!(size, (800, 600));
}

#[test]
fn resize_to_nothing_is_ignored() {
    let (_host, mut viewer) = start(1024, 768);
    assert!(!viewer.resize(Viewport::new(1024, 0)));
    assert_eq!(viewer.renderer().size(), (1024, 768));
}

#[test]
fn stopping_twice_is_a_no_op() {
    let (host, mut viewer) = start(1024, 768);

    assert!(viewer.stop());
    assert!(!viewer.stop());
    assert_eq!(viewer.animation().state(), LoopState::Stopped);

    // frames already requested before the stop do nothing
    assert!(!viewer.frame(&host, 0.016).unwrap());
    assert!(viewer.renderer().backend().frames.is_empty());
}

#[test]
fn play_while_running_keeps_a_single_frame_chain() {
    let (host, mut viewer) = start(1024, 768);
    assert!(!viewer.play(&host));
    assert_eq!(host.requests(), 1);

    assert!(viewer.frame(&host, 0.016).unwrap());
    assert_eq!(host.requests(), 2);
    assert_eq!(viewer.renderer().backend().frames.len(), 1);
}

#[test]
fn missing_container_is_fatal() {
    let mut host = FakeHost::without_container();
    let result = Viewer::init(ViewerConfig::default(), &mut host, RecordingBackend::new());
    assert!(matches!(result, Err(Error::ContainerNotFound(id)) if id == "scene-container"));
    assert_eq!(host.appended, 0);
}

#[test]
fn failing_to_attach_the_render_target_is_fatal() {
    let mut host = FakeHost::new(1024, 768);
    host.attach_fails = true;
    let result = Viewer::init(ViewerConfig::default(), &mut host, RecordingBackend::new());
    assert!(matches!(result, Err(Error::AttachFailed(_))));
    assert_eq!(host.requests(), 0);
}

#[test]
fn invalid_camera_settings_are_rejected() {
    let mut host = FakeHost::new(1024, 768);
    let config = ViewerConfig::default().with_fov(Deg(180.0));
    let result = Viewer::init(config, &mut host, RecordingBackend::new());
    assert!(matches!(result, Err(Error::InvalidCamera(_))));

    let config = ViewerConfig::default().with_clip_planes(10.0, 1.0);
    let result = Viewer::init(config, &mut host, RecordingBackend::new());
    assert!(matches!(result, Err(Error::InvalidCamera(_))));
}

#[test]
fn loaded_texture_becomes_the_color_map() {
    let (host, mut viewer) = start(1024, 768);
    let pixels = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
    viewer.apply_texture(Ok(TextureImage::new("textures/uv_test_bw.png", pixels)));

    let material = &viewer.scene().mesh(viewer.cube()).unwrap().material;
    assert_eq!(material.map().map(|m| m.dimensions()), Some((4, 4)));
    assert_eq!(material.color_space(), ColorSpace::Srgb);
    assert_eq!(material.anisotropy(), 16);

    viewer.frame(&host, 0.016).unwrap();
    assert_eq!(viewer.renderer().backend().last_frame().unwrap().mesh_maps, vec![true]);
}

#[test]
fn failed_texture_keeps_rendering_without_a_map() {
    let (host, mut viewer) = start(1024, 768);
    viewer.apply_texture(Err(anyhow::anyhow!("404 Not Found")));

    let material = &viewer.scene().mesh(viewer.cube()).unwrap().material;
    assert!(material.map().is_none());
    assert_eq!(material.revision(), 0);

    assert!(viewer.frame(&host, 0.016).unwrap());
    assert_eq!(viewer.renderer().backend().last_frame().unwrap().mesh_maps, vec![false]);
}

#[test]
fn backend_sees_nodes_in_insertion_order() {
    let (host, mut viewer) = start(640, 480);
    viewer.frame(&host, 0.016).unwrap();

    let kinds: Vec<_> = viewer
        .renderer()
        .backend()
        .last_frame()
        .unwrap()
        .nodes
        .iter()
        .map(|(_, kind)| *kind)
        .collect();
    assert_eq!(kinds, ["mesh", "hemisphere", "directional"]);
}

#[test]
fn update_is_a_no_op_without_spin() {
    let (_host, mut viewer) = start(640, 480);
    let before = viewer.scene().mesh(viewer.cube()).unwrap().transform.clone();
    viewer.update(1.0);
    assert_eq!(viewer.scene().mesh(viewer.cube()).unwrap().transform, before);
}

#[test]
fn spin_rotates_the_cube_every_frame() {
    let mut host = FakeHost::new(640, 480);
    let config = ViewerConfig::default().with_spin(Some([Rad(0.0), Rad(1.0), Rad(0.0)]));
    let mut viewer = Viewer::init(config, &mut host, RecordingBackend::new()).unwrap();
    let before = viewer.scene().mesh(viewer.cube()).unwrap().transform.rotation;

    viewer.frame(&host, 0.5).unwrap();
    let after = viewer.scene().mesh(viewer.cube()).unwrap().transform.rotation;
    assert_ne!(after, before);
}

#[test]
fn wheel_input_moves_the_camera_closer() {
    let (_host, mut viewer) = start(1024, 768);
    let start_distance = viewer.camera().position.to_vec().magnitude();

    assert!(viewer.handle_input(&ControlEvent::Wheel { delta_y: -100.0 }));
    let distance = viewer.camera().position.to_vec().magnitude();
    assert!((distance - start_distance * 0.95).abs() < 1e-4);

    viewer.controls_mut().enabled = false;
    assert!(!viewer.handle_input(&ControlEvent::PointerDown {
        button: PointerButton::Primary,
        x: 0.0,
        y: 0.0
    }));
}
