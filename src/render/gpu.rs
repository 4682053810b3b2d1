//! wgpu render backend.
//!
//! [`GpuBackend`] draws frames into a window surface or an offscreen texture.
//! Mesh resources are created lazily the first time a mesh shows up in a
//! frame and kept per [`NodeId`]; material bind groups are rebuilt whenever
//! the material's revision changes (e.g. its color map finished loading).

use std::{collections::HashMap, iter, time::Duration};

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::{
    camera::CameraUniform,
    context::Context,
    data_structures::texture::{Texture, create_default_sampler},
    error::{Error, Result},
    pipelines::{
        basic::mk_standard_pipeline, camera_layout, light::LightUniform, light_layout,
        material::MaterialUniform, material_layout,
    },
    render::{Frame, RenderBackend, RendererOptions},
    scene::{NodeId, mesh::Mesh},
};

/// Sample count used when antialiasing is requested and supported.
const MSAA_SAMPLES: u32 = 4;

struct MeshResources {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    num_indices: u32,
    instance: wgpu::Buffer,
    material_uniform: wgpu::Buffer,
    material_group: wgpu::BindGroup,
    // Keeps the uploaded map alive for as long as the bind group uses it
    _map: Option<Texture>,
    material_revision: u64,
}

enum Target {
    Surface,
    Offscreen(wgpu::Texture),
}

pub struct GpuBackend {
    ctx: Context,
    target: Target,
    is_surface_configured: bool,
    sample_count: u32,
    depth: Texture,
    msaa: Option<Texture>,
    pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    light_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    white: Texture,
    default_sampler: wgpu::Sampler,
    meshes: HashMap<NodeId, MeshResources>,
}

impl GpuBackend {
    /// Creates a backend for `ctx`. Window contexts stay idle until the first
    /// [`RenderBackend::resize`] with a non-zero size configures the surface.
    pub fn new(ctx: Context, options: RendererOptions) -> Self {
        let wanted = if options.antialias { MSAA_SAMPLES } else { 1 };
        let sample_count = ctx.supported_sample_count(wanted);
        if sample_count != wanted {
            log::warn!(
                "{:?} does not support {wanted}x multisampling, antialiasing disabled",
                ctx.config.format
            );
        }

        let device = &ctx.device;
        let camera_layout = camera_layout(device);
        let light_layout = light_layout(device);
        let material_layout = material_layout(device);
        let pipeline = mk_standard_pipeline(
            device,
            ctx.config.format,
            sample_count,
            &camera_layout,
            &light_layout,
            &material_layout,
        );

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Buffer"),
            size: std::mem::size_of::<LightUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });

        let size = [ctx.config.width, ctx.config.height];
        let depth = Texture::create_depth_texture(device, size, sample_count, "depth_texture");
        let msaa = (sample_count > 1)
            .then(|| Texture::create_msaa_target(device, size, sample_count, ctx.config.format));
        let white = Texture::create_white(device, &ctx.queue);
        let default_sampler = create_default_sampler(device);

        let (target, is_surface_configured) = match ctx.surface {
            Some(_) => (Target::Surface, false),
            None => (Target::Offscreen(mk_offscreen_texture(&ctx)), true),
        };

        Self {
            target,
            is_surface_configured,
            sample_count,
            depth,
            msaa,
            pipeline,
            camera_uniform,
            camera_buffer,
            camera_group,
            light_buffer,
            light_group,
            material_layout,
            white,
            default_sampler,
            meshes: HashMap::new(),
            ctx,
        }
    }

    /// Creates a backend rendering into an offscreen texture.
    pub async fn headless(
        width: u32,
        height: u32,
        options: RendererOptions,
    ) -> anyhow::Result<Self> {
        let ctx = Context::headless(width.max(1), height.max(1)).await?;
        Ok(Self::new(ctx, options))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn surface_is_srgb(&self) -> bool {
        self.ctx.config.format.is_srgb()
    }

    fn recreate_attachments(&mut self) {
        let size = [self.ctx.config.width, self.ctx.config.height];
        let device = &self.ctx.device;
        self.depth =
            Texture::create_depth_texture(device, size, self.sample_count, "depth_texture");
        self.msaa = (self.sample_count > 1).then(|| {
            Texture::create_msaa_target(device, size, self.sample_count, self.ctx.config.format)
        });
    }

    fn sync_mesh(&mut self, id: NodeId, mesh: &Mesh) {
        let device = &self.ctx.device;
        let queue = &self.ctx.queue;
        let resources = self.meshes.entry(id).or_insert_with(|| {
            log::debug!("uploading mesh {id:?}");
            let vertices = mesh.geometry.vertices();
            let indices = mesh.geometry.indices();
            let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{id:?} Vertex Buffer")),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{id:?} Index Buffer")),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let instance = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{id:?} Instance Buffer")),
                contents: bytemuck::cast_slice(&[mesh.transform.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            let material_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{id:?} Material Buffer")),
                contents: bytemuck::cast_slice(&[MaterialUniform::from(&mesh.material)]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let (material_group, map) = mk_material_group(
                device,
                queue,
                &self.material_layout,
                &self.white,
                &self.default_sampler,
                mesh,
                &material_uniform,
            );
            MeshResources {
                vertex,
                index,
                num_indices: indices.len() as u32,
                instance,
                material_uniform,
                material_group,
                _map: map,
                material_revision: mesh.material.revision(),
            }
        });

        if resources.material_revision != mesh.material.revision() {
            log::debug!("material of {id:?} changed, rebuilding its bind group");
            let (group, map) = mk_material_group(
                device,
                queue,
                &self.material_layout,
                &self.white,
                &self.default_sampler,
                mesh,
                &resources.material_uniform,
            );
            resources.material_group = group;
            resources._map = map;
            resources.material_revision = mesh.material.revision();
        }

        queue.write_buffer(
            &resources.instance,
            0,
            bytemuck::cast_slice(&[mesh.transform.to_raw()]),
        );
        queue.write_buffer(
            &resources.material_uniform,
            0,
            bytemuck::cast_slice(&[MaterialUniform::from(&mesh.material)]),
        );
    }

    /// Copies the offscreen target back into CPU memory.
    ///
    /// Only available for headless backends; window surfaces cannot be read.
    pub async fn read_pixels(&self) -> anyhow::Result<image::RgbaImage> {
        let Target::Offscreen(texture) = &self.target else {
            anyhow::bail!("only offscreen targets can be read back");
        };
        let (width, height) = (self.ctx.config.width, self.ctx.config.height);
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let output_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (padded * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.ctx
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .context("device poll failed while reading back pixels")?;
        rx.receive()
            .await
            .context("readback channel closed")?
            .context("failed to map readback buffer")?;

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in data.chunks(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(data);
        output_buffer.unmap();
        image::RgbaImage::from_raw(width, height, pixels).context("readback size mismatch")
    }
}

fn mk_offscreen_texture(ctx: &Context) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: ctx.config.width.max(1),
            height: ctx.config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctx.config.format,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

fn mk_material_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    white: &Texture,
    default_sampler: &wgpu::Sampler,
    mesh: &Mesh,
    uniform: &wgpu::Buffer,
) -> (wgpu::BindGroup, Option<Texture>) {
    let material = &mesh.material;
    let map = material.map().map(|image| {
        Texture::from_image(
            device,
            queue,
            &image.pixels,
            Some(image.label.as_str()),
            material.color_space(),
            material.anisotropy(),
        )
    });
    let texture = map.as_ref().unwrap_or(white);
    let sampler = texture.sampler.as_ref().unwrap_or(default_sampler);
    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
        label: Some("material_bind_group"),
    });
    (group, map)
}

impl RenderBackend for GpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let unchanged = (width, height) == (self.ctx.config.width, self.ctx.config.height);
        if unchanged && self.is_surface_configured {
            return;
        }
        self.ctx.config.width = width;
        self.ctx.config.height = height;
        match &self.target {
            Target::Surface => {
                if let Some(surface) = &self.ctx.surface {
                    surface.configure(&self.ctx.device, &self.ctx.config);
                    self.is_surface_configured = true;
                }
            }
            Target::Offscreen(_) => {
                self.target = Target::Offscreen(mk_offscreen_texture(&self.ctx));
            }
        }
        self.recreate_attachments();
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let surface_texture = match (&self.target, &self.ctx.surface) {
            (Target::Surface, Some(surface)) => match surface.get_current_texture() {
                Ok(texture) => Some(texture),
                // Reconfigure the surface if it's lost or outdated and skip this frame
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    log::debug!("surface lost or outdated, reconfiguring");
                    surface.configure(&self.ctx.device, &self.ctx.config);
                    return Ok(());
                }
                Err(e) => return Err(Error::Surface(e)),
            },
            _ => None,
        };
        let view = match (&surface_texture, &self.target) {
            (Some(output), _) => output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            (None, Target::Offscreen(texture)) => {
                texture.create_view(&wgpu::TextureViewDescriptor::default())
            }
            (None, Target::Surface) => return Ok(()),
        };

        self.camera_uniform.update_view_proj(frame.camera);
        self.ctx.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
        let lights = LightUniform::from_frame(frame, self.surface_is_srgb());
        self.ctx
            .queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[lights]));

        let meshes: Vec<_> = frame.scene.meshes().collect();
        for (id, mesh) in &meshes {
            self.sync_mesh(*id, mesh);
        }

        // sRGB targets re-encode on store, so hand them linear values
        let clear = if self.surface_is_srgb() {
            frame.background.to_linear()
        } else {
            frame.background
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let (color_view, resolve_target) = match &self.msaa {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_group, &[]);
            render_pass.set_bind_group(1, &self.light_group, &[]);
            for (id, _) in &meshes {
                let Some(resources) = self.meshes.get(id) else {
                    continue;
                };
                render_pass.set_bind_group(2, &resources.material_group, &[]);
                render_pass.set_vertex_buffer(0, resources.vertex.slice(..));
                render_pass.set_vertex_buffer(1, resources.instance.slice(..));
                render_pass.set_index_buffer(resources.index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..resources.num_indices, 0, 0..1);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        if let Some(output) = surface_texture {
            output.present();
        }
        Ok(())
    }
}
