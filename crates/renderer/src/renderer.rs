//! Main renderer managing wgpu state and technique dispatch.
//!
//! The frame protocol is `begin_scene` → any number of `draw_*` dispatch
//! calls → `end_scene`. One render pass spans the whole frame; per-draw
//! uniforms go into per-technique pools where every draw writes its own
//! 256-aligned region, so `queue.write_buffer` calls cannot overwrite each
//! other before the command buffer executes.

use crate::{
    light::DirectionalLight,
    model::{self, BumpModel, FireModel, Model},
    pipeline::{
        create_texture_bind_group_layout, create_uniform_bind_group_layout, pack, pack4,
        BumpUniform, FireParams, FireUniform, LitUniform, ObjectUniform, TechniquePipeline,
    },
    texture::Texture,
    vertex::{BumpVertex, Vertex},
};
use anyhow::Result;
use glam::{Mat4, Vec3};
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use winit::window::Window;

/// Uniform slots are aligned to the conventional 256-byte dynamic-offset
/// boundary.
const UNIFORM_ALIGN: u64 = 256;

/// Per-frame draw capacity per technique. The lit pool covers the tree
/// field plus every other lit body with headroom.
const TEXTURED_DRAWS: u32 = 16;
const LIT_DRAWS: u32 = 256;
const BUMP_DRAWS: u32 = 16;
const FIRE_DRAWS: u32 = 16;

/// A failed dispatch or frame operation. All variants end the session.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no active scene; begin_scene must run first")]
    NoActiveScene,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("per-frame draw capacity exhausted for the {technique} technique")]
    DrawCapacity { technique: &'static str },
}

/// A per-technique uniform buffer carved into dynamic-offset slots.
struct UniformPool {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u32,
    capacity: u32,
    cursor: u32,
    technique: &'static str,
}

impl UniformPool {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        slot_size: u64,
        capacity: u32,
        technique: &'static str,
    ) -> Self {
        let stride = slot_size.next_multiple_of(UNIFORM_ALIGN);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(technique),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(technique),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(slot_size),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride: stride as u32,
            capacity,
            cursor: 0,
            technique,
        }
    }

    /// Claim the next slot; the returned byte offset is unique this frame.
    fn alloc(&mut self) -> Result<u32, RenderError> {
        if self.cursor >= self.capacity {
            return Err(RenderError::DrawCapacity {
                technique: self.technique,
            });
        }
        let offset = self.cursor * self.stride;
        self.cursor += 1;
        Ok(offset)
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// State held between `begin_scene` and `end_scene`.
struct FrameState {
    output: wgpu::SurfaceTexture,
    encoder: wgpu::CommandEncoder,
    pass: wgpu::RenderPass<'static>,
}

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,

    depth_texture: Texture,

    // One pipeline pair (opaque + blended) per technique
    textured_pipeline: TechniquePipeline,
    lit_pipeline: TechniquePipeline,
    bump_pipeline: TechniquePipeline,
    fire_pipeline: TechniquePipeline,

    // Per-draw uniform pools
    textured_pool: UniformPool,
    lit_pool: UniformPool,
    bump_pool: UniformPool,
    fire_pool: UniformPool,

    // Texture bind group layouts by texture count
    single_texture_layout: wgpu::BindGroupLayout,
    dual_texture_layout: wgpu::BindGroupLayout,
    triple_texture_layout: wgpu::BindGroupLayout,

    frame: Option<FrameState>,
}

impl Renderer {
    /// Create a new renderer for the given window. Fails fast: any missing
    /// adapter, device, or surface capability aborts startup.
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();

        // Vulkan/DX12 on Windows/Linux, Metal on macOS
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = Texture::create_depth(&device, &config);

        // Layouts shared by the techniques
        let uniform_layout = create_uniform_bind_group_layout(&device, "Per-Draw Uniforms");
        let single_texture_layout = create_texture_bind_group_layout(&device, 1, "One Texture");
        let dual_texture_layout = create_texture_bind_group_layout(&device, 2, "Two Textures");
        let triple_texture_layout = create_texture_bind_group_layout(&device, 3, "Three Textures");

        let textured_pipeline = TechniquePipeline::new(
            &device,
            surface_format,
            include_str!("shaders/texture.wgsl"),
            "Textured Pipeline",
            &[&uniform_layout, &single_texture_layout],
            Vertex::layout(),
        );
        let lit_pipeline = TechniquePipeline::new(
            &device,
            surface_format,
            include_str!("shaders/light.wgsl"),
            "Lit Pipeline",
            &[&uniform_layout, &single_texture_layout],
            Vertex::layout(),
        );
        let bump_pipeline = TechniquePipeline::new(
            &device,
            surface_format,
            include_str!("shaders/normal_map.wgsl"),
            "Normal Map Pipeline",
            &[&uniform_layout, &dual_texture_layout],
            BumpVertex::layout(),
        );
        let fire_pipeline = TechniquePipeline::new(
            &device,
            surface_format,
            include_str!("shaders/fire.wgsl"),
            "Fire Pipeline",
            &[&uniform_layout, &triple_texture_layout],
            Vertex::layout(),
        );

        let textured_pool = UniformPool::new(
            &device,
            &uniform_layout,
            std::mem::size_of::<ObjectUniform>() as u64,
            TEXTURED_DRAWS,
            "textured",
        );
        let lit_pool = UniformPool::new(
            &device,
            &uniform_layout,
            std::mem::size_of::<LitUniform>() as u64,
            LIT_DRAWS,
            "lit",
        );
        let bump_pool = UniformPool::new(
            &device,
            &uniform_layout,
            std::mem::size_of::<BumpUniform>() as u64,
            BUMP_DRAWS,
            "normal-mapped",
        );
        let fire_pool = UniformPool::new(
            &device,
            &uniform_layout,
            std::mem::size_of::<FireUniform>() as u64,
            FIRE_DRAWS,
            "fire",
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            depth_texture,
            textured_pipeline,
            lit_pipeline,
            bump_pipeline,
            fire_pipeline,
            textured_pool,
            lit_pool,
            bump_pool,
            fire_pool,
            single_texture_layout,
            dual_texture_layout,
            triple_texture_layout,
            frame: None,
        })
    }

    /// Handle window resize.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth(&self.device, &self.config);
    }

    // ── Asset loading ───────────────────────────────────────────────────

    /// Load a plain renderable: text geometry + one color texture.
    pub fn load_model(&self, geometry: &Path, texture: &Path) -> Result<Model> {
        let (vertices, indices) = model::load_geometry(geometry)?;
        let mesh = model::upload(&self.device, &vertices, &indices);
        let texture = Texture::from_file(&self.device, &self.queue, texture)?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Textures"),
            layout: &self.single_texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        log::info!(
            "loaded model {} ({} indices)",
            geometry.display(),
            mesh.num_indices
        );
        Ok(Model { mesh, bind_group })
    }

    /// Load a normal-mapped renderable: geometry gains a tangent basis.
    pub fn load_bump_model(
        &self,
        geometry: &Path,
        color: &Path,
        normal_map: &Path,
    ) -> Result<BumpModel> {
        let (vertices, indices) = model::load_geometry(geometry)?;
        let bump_vertices = model::with_tangents(&vertices);
        let mesh = model::upload_bump(&self.device, &bump_vertices, &indices);
        let color = Texture::from_file(&self.device, &self.queue, color)?;
        let normal = Texture::from_file(&self.device, &self.queue, normal_map)?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bump Model Textures"),
            layout: &self.dual_texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&color.sampler),
                },
            ],
        });
        log::info!(
            "loaded bump model {} ({} indices)",
            geometry.display(),
            mesh.num_indices
        );
        Ok(BumpModel { mesh, bind_group })
    }

    /// Load an animated-fire renderable: geometry + fire/noise/alpha layers.
    pub fn load_fire_model(
        &self,
        geometry: &Path,
        fire: &Path,
        noise: &Path,
        alpha: &Path,
    ) -> Result<FireModel> {
        let (vertices, indices) = model::load_geometry(geometry)?;
        let mesh = model::upload(&self.device, &vertices, &indices);
        let fire = Texture::from_file(&self.device, &self.queue, fire)?;
        let noise = Texture::from_file(&self.device, &self.queue, noise)?;
        let alpha = Texture::from_file(&self.device, &self.queue, alpha)?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fire Model Textures"),
            layout: &self.triple_texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&fire.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&noise.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&alpha.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&fire.sampler),
                },
            ],
        });
        log::info!(
            "loaded fire model {} ({} indices)",
            geometry.display(),
            mesh.num_indices
        );
        Ok(FireModel { mesh, bind_group })
    }

    // ── Frame protocol ──────────────────────────────────────────────────

    /// Acquire the next surface frame and open the scene's render pass.
    pub fn begin_scene(&mut self, clear: [f64; 4]) -> Result<(), RenderError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: clear[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        self.frame = Some(FrameState {
            output,
            encoder,
            pass,
        });
        Ok(())
    }

    /// Close the pass, submit the frame, and present it.
    pub fn end_scene(&mut self) -> Result<(), RenderError> {
        let frame = self.frame.take().ok_or(RenderError::NoActiveScene)?;
        drop(frame.pass);
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();

        self.textured_pool.reset();
        self.lit_pool.reset();
        self.bump_pool.reset();
        self.fire_pool.reset();
        Ok(())
    }

    // ── Technique dispatch ──────────────────────────────────────────────

    /// Draw with the plain textured technique.
    pub fn draw_textured(
        &mut self,
        model: &Model,
        world: Mat4,
        view: Mat4,
        proj: Mat4,
        blend: bool,
    ) -> Result<(), RenderError> {
        let uniform = ObjectUniform::new(world, view, proj);
        let offset = self.textured_pool.alloc()?;
        self.queue.write_buffer(
            &self.textured_pool.buffer,
            offset as u64,
            bytemuck::bytes_of(&uniform),
        );

        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveScene)?;
        frame
            .pass
            .set_pipeline(self.textured_pipeline.select(blend));
        frame
            .pass
            .set_bind_group(0, &self.textured_pool.bind_group, &[offset]);
        frame.pass.set_bind_group(1, &model.bind_group, &[]);
        draw_mesh(&mut frame.pass, &model.mesh);
        Ok(())
    }

    /// Draw with the per-pixel lit technique (ambient + diffuse + specular).
    #[allow(clippy::too_many_arguments)]
    pub fn draw_lit(
        &mut self,
        model: &Model,
        world: Mat4,
        view: Mat4,
        proj: Mat4,
        light: &DirectionalLight,
        camera_pos: Vec3,
        blend: bool,
    ) -> Result<(), RenderError> {
        let uniform = LitUniform {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            camera_pos: pack(camera_pos, 0.0),
            light_direction: pack(light.direction, 0.0),
            ambient: pack4(light.ambient),
            diffuse: pack4(light.diffuse),
            specular: pack4(light.specular),
            specular_power: [light.specular_power, 0.0, 0.0, 0.0],
        };
        let offset = self.lit_pool.alloc()?;
        self.queue.write_buffer(
            &self.lit_pool.buffer,
            offset as u64,
            bytemuck::bytes_of(&uniform),
        );

        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveScene)?;
        frame.pass.set_pipeline(self.lit_pipeline.select(blend));
        frame
            .pass
            .set_bind_group(0, &self.lit_pool.bind_group, &[offset]);
        frame.pass.set_bind_group(1, &model.bind_group, &[]);
        draw_mesh(&mut frame.pass, &model.mesh);
        Ok(())
    }

    /// Draw with the normal-mapped technique.
    pub fn draw_normal_mapped(
        &mut self,
        model: &BumpModel,
        world: Mat4,
        view: Mat4,
        proj: Mat4,
        light: &DirectionalLight,
        blend: bool,
    ) -> Result<(), RenderError> {
        let uniform = BumpUniform {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            light_direction: pack(light.direction, 0.0),
            diffuse: pack4(light.diffuse),
        };
        let offset = self.bump_pool.alloc()?;
        self.queue.write_buffer(
            &self.bump_pool.buffer,
            offset as u64,
            bytemuck::bytes_of(&uniform),
        );

        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveScene)?;
        frame.pass.set_pipeline(self.bump_pipeline.select(blend));
        frame
            .pass
            .set_bind_group(0, &self.bump_pool.bind_group, &[offset]);
        frame.pass.set_bind_group(1, &model.bind_group, &[]);
        draw_mesh(&mut frame.pass, &model.mesh);
        Ok(())
    }

    /// Draw with the animated fire technique.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_fire(
        &mut self,
        model: &FireModel,
        world: Mat4,
        view: Mat4,
        proj: Mat4,
        params: &FireParams,
        scroll_time: f32,
        blend: bool,
    ) -> Result<(), RenderError> {
        let uniform = FireUniform {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            scroll: pack(params.scroll_speeds, scroll_time),
            scales: pack(params.scales, params.distortion_scale),
            distortion12: [
                params.distortion[0].x,
                params.distortion[0].y,
                params.distortion[1].x,
                params.distortion[1].y,
            ],
            distortion3: [
                params.distortion[2].x,
                params.distortion[2].y,
                params.distortion_bias,
                0.0,
            ],
        };
        let offset = self.fire_pool.alloc()?;
        self.queue.write_buffer(
            &self.fire_pool.buffer,
            offset as u64,
            bytemuck::bytes_of(&uniform),
        );

        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveScene)?;
        frame.pass.set_pipeline(self.fire_pipeline.select(blend));
        frame
            .pass
            .set_bind_group(0, &self.fire_pool.bind_group, &[offset]);
        frame.pass.set_bind_group(1, &model.bind_group, &[]);
        draw_mesh(&mut frame.pass, &model.mesh);
        Ok(())
    }
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'static>, mesh: &crate::mesh::Mesh) {
    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
}
