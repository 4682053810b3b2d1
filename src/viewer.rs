//! The viewer: one scene, one camera, one renderer and one set of orbit
//! controls, wired together and driven by an animation loop.
//!
//! [`Viewer::init`] builds everything from a [`ViewerConfig`] against a
//! [`DisplayHost`] and starts the loop. The event loop in [`crate::flow`]
//! then forwards frames, resizes, input and the loaded texture to it.

use cgmath::{Deg, Point3, Rad};

use crate::{
    animation_loop::AnimationLoop,
    camera::Camera,
    controls::{ControlEvent, OrbitControls},
    error::Result,
    host::{DEFAULT_CONTAINER_ID, DisplayHost, FrameSource},
    render::{OutputSettings, RenderBackend, Renderer, RendererOptions},
    resize::{Viewport, handle_resize},
    scene::{
        Color, NodeId, Scene,
        geometry::BoxGeometry,
        light::{DirectionalLight, HemisphereLight},
        material::{ColorSpace, Material, MaterialKind, TextureImage},
        mesh::MeshBuilder,
    },
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereSettings {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalSettings {
    pub color: Color,
    pub intensity: f32,
    pub position: [f32; 3],
}

/// Everything [`Viewer::init`] needs to know. `Default` gives the sky blue
/// scene with a 2x2x2 textured cube.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub container_id: String,
    pub background: Color,
    pub fov: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub camera_position: [f32; 3],
    pub box_size: [f32; 3],
    /// Relative to the assets directory.
    pub texture_path: String,
    pub anisotropy: u16,
    pub material_kind: MaterialKind,
    pub hemisphere: HemisphereSettings,
    pub directional: DirectionalSettings,
    pub antialias: bool,
    pub output: OutputSettings,
    pub physically_correct_lights: bool,
    /// Mesh rotation per second around x, y and z. `None` keeps it still.
    pub spin: Option<[Rad<f32>; 3]>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            background: Color::SKY_BLUE,
            fov: Deg(35.0),
            near: 0.1,
            far: 100.0,
            camera_position: [-4.0, 4.0, 10.0],
            box_size: [2.0, 2.0, 2.0],
            texture_path: "textures/uv_test_bw.png".to_string(),
            anisotropy: 16,
            material_kind: MaterialKind::Standard,
            hemisphere: HemisphereSettings {
                sky: Color::from_hex(0xddeeff),
                ground: Color::from_hex(0x202020),
                intensity: 3.0,
            },
            directional: DirectionalSettings {
                color: Color::WHITE,
                intensity: 3.0,
                position: [10.0, 10.0, 10.0],
            },
            antialias: true,
            output: OutputSettings::default(),
            physically_correct_lights: true,
            spin: None,
        }
    }
}

impl ViewerConfig {
    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = id.into();
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_fov(mut self, fov: Deg<f32>) -> Self {
        self.fov = fov;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_camera_position(mut self, position: [f32; 3]) -> Self {
        self.camera_position = position;
        self
    }

    pub fn with_box_size(mut self, size: [f32; 3]) -> Self {
        self.box_size = size;
        self
    }

    pub fn with_texture_path(mut self, path: impl Into<String>) -> Self {
        self.texture_path = path.into();
        self
    }

    pub fn with_anisotropy(mut self, anisotropy: u16) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    pub fn with_material_kind(mut self, kind: MaterialKind) -> Self {
        self.material_kind = kind;
        self
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = output;
        self
    }

    pub fn with_physically_correct_lights(mut self, enabled: bool) -> Self {
        self.physically_correct_lights = enabled;
        self
    }

    pub fn with_spin(mut self, spin: Option<[Rad<f32>; 3]>) -> Self {
        self.spin = spin;
        self
    }

    /// Options the render backend has to be created with.
    pub fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            antialias: self.antialias,
        }
    }
}

pub struct Viewer<B> {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    renderer: Renderer<B>,
    controls: OrbitControls,
    animation: AnimationLoop,
    cube: NodeId,
    viewport: Viewport,
}

impl<B: RenderBackend> Viewer<B> {
    /// Builds the scene, camera, cube, lights, renderer and controls, attaches
    /// the render target to `host` and starts the animation loop.
    ///
    /// The cube starts without a color map; the texture named by
    /// [`ViewerConfig::texture_path`] is loaded by the caller and handed to
    /// [`Viewer::apply_texture`].
    pub fn init<H: DisplayHost>(
        config: ViewerConfig,
        host: &mut H,
        backend: B,
    ) -> Result<Self> {
        let viewport = host.element_size()?;

        let mut scene = Scene::new(config.background);

        let aspect = if viewport.is_empty() {
            log::debug!("container has no size yet, starting with a square aspect");
            1.0
        } else {
            viewport.aspect()
        };
        let mut camera = Camera::new(config.fov, aspect, config.near, config.far)?;
        let [x, y, z] = config.camera_position;
        camera.set_position(x, y, z);

        let material = match config.material_kind {
            MaterialKind::Standard => Material::standard(),
            MaterialKind::Basic => Material::basic(),
        };

        let [width, height, depth] = config.box_size;
        let geometry = BoxGeometry::new(width, height, depth);

        let mesh = MeshBuilder::default()
            .geometry(geometry)
            .material(material)
            .build()?;
        let cube = scene.add(mesh);

        let hemisphere = HemisphereLight::new(
            config.hemisphere.sky,
            config.hemisphere.ground,
            config.hemisphere.intensity,
        );
        let mut main_light =
            DirectionalLight::new(config.directional.color, config.directional.intensity);
        let [lx, ly, lz] = config.directional.position;
        main_light.set_position(lx, ly, lz);
        scene.add(hemisphere);
        scene.add(main_light);

        let mut renderer = Renderer::new(backend, config.renderer_options());
        renderer.set_pixel_ratio(host.pixel_ratio());
        renderer.set_viewport(viewport);
        renderer.output = config.output;
        renderer.physically_correct_lights = config.physically_correct_lights;
        host.append_render_target()?;

        let controls = OrbitControls::new(Point3::new(0.0, 0.0, 0.0));
        controls.attach(&mut camera);

        log::info!(
            "viewer ready: {}x{} at pixel ratio {}, {} scene nodes",
            viewport.width,
            viewport.height,
            renderer.pixel_ratio(),
            scene.len()
        );

        let mut viewer = Self {
            config,
            scene,
            camera,
            renderer,
            controls,
            animation: AnimationLoop::new(),
            cube,
            viewport,
        };
        viewer.play(&*host);
        Ok(viewer)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> &Renderer<B> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<B> {
        &mut self.renderer
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn animation(&self) -> &AnimationLoop {
        &self.animation
    }

    /// The cube mesh added by [`Viewer::init`].
    pub fn cube(&self) -> NodeId {
        self.cube
    }

    pub fn texture_path(&self) -> &str {
        &self.config.texture_path
    }

    /// Takes the outcome of loading the color map. A failed load leaves the
    /// cube without a map; it keeps rendering in its base color.
    pub fn apply_texture(&mut self, loaded: anyhow::Result<TextureImage>) {
        let anisotropy = self.config.anisotropy;
        let Some(mesh) = self.scene.mesh_mut(self.cube) else {
            log::warn!("cube mesh is gone, dropping texture");
            return;
        };
        match loaded {
            Ok(texture) => {
                let (w, h) = texture.dimensions();
                log::info!("loaded color map {} ({w}x{h})", texture.label);
                mesh.material.set_map(texture, ColorSpace::Srgb, anisotropy);
            }
            Err(e) => {
                log::warn!(
                    "could not load color map {}, rendering without it: {e:#}",
                    self.config.texture_path
                );
            }
        }
    }

    /// Advances the scene by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        spin_cube(&mut self.scene, self.cube, self.config.spin, dt);
    }

    /// Draws the current scene once.
    pub fn render(&mut self) -> Result<()> {
        self.renderer.render(&self.scene, &self.camera)
    }

    /// One tick of the animation loop: update then render, and schedule the
    /// next frame. Does nothing while stopped. Returns whether a frame ran.
    pub fn frame(&mut self, source: &dyn FrameSource, dt: f32) -> Result<bool> {
        let Self {
            animation,
            scene,
            camera,
            renderer,
            config,
            cube,
            ..
        } = self;
        let mut result = Ok(());
        let ran = animation.on_frame(source, || {
            spin_cube(scene, *cube, config.spin, dt);
            result = renderer.render(scene, camera);
        });
        result.map(|()| ran)
    }

    /// Starts the animation loop. Returns `false` if it was already running.
    pub fn play(&mut self, source: &dyn FrameSource) -> bool {
        self.animation.play(source)
    }

    /// Stops the animation loop. Returns `false` if it was already stopped.
    pub fn stop(&mut self) -> bool {
        self.animation.stop()
    }

    pub fn resize(&mut self, viewport: Viewport) -> bool {
        let changed = handle_resize(&mut self.camera, &mut self.renderer, viewport);
        if changed {
            self.viewport = viewport;
            log::debug!("resized to {}x{}", viewport.width, viewport.height);
        }
        changed
    }

    /// Feeds input to the orbit controls. Returns whether the camera moved.
    pub fn handle_input(&mut self, event: &ControlEvent) -> bool {
        self.controls
            .handle(&mut self.camera, event, self.viewport.height as f32)
    }
}

fn spin_cube(scene: &mut Scene, cube: NodeId, spin: Option<[Rad<f32>; 3]>, dt: f32) {
    let Some([x, y, z]) = spin else {
        return;
    };
    if let Some(mesh) = scene.mesh_mut(cube) {
        mesh.transform.rotate_euler(x * dt, y * dt, z * dt);
    }
}
