//! Bind group layouts, per-draw uniform structs, and pipeline construction
//! for the four shading techniques.

use crate::texture::Texture;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-draw uniform for the plain textured technique.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn new(world: Mat4, view: Mat4, proj: Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
        }
    }
}

/// Per-draw uniform for the per-pixel lit technique.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LitUniform {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// xyz = camera position, w unused.
    pub camera_pos: [f32; 4],
    /// xyz = light direction, w unused.
    pub light_direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// x = specular power, yzw unused.
    pub specular_power: [f32; 4],
}

/// Per-draw uniform for the normal-mapped technique.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BumpUniform {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// xyz = light direction, w unused.
    pub light_direction: [f32; 4],
    pub diffuse: [f32; 4],
}

/// Per-draw uniform for the animated fire technique.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FireUniform {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// xyz = per-layer scroll speeds, w = elapsed scroll time.
    pub scroll: [f32; 4],
    /// xyz = per-layer UV scales, w = distortion scale.
    pub scales: [f32; 4],
    /// xy = layer-1 distortion, zw = layer-2 distortion.
    pub distortion12: [f32; 4],
    /// xy = layer-3 distortion, z = distortion bias, w unused.
    pub distortion3: [f32; 4],
}

/// Session-constant configuration for the fire technique. The live scroll
/// time is passed alongside at dispatch.
#[derive(Debug, Clone)]
pub struct FireParams {
    pub scroll_speeds: Vec3,
    pub scales: Vec3,
    pub distortion: [glam::Vec2; 3],
    pub distortion_scale: f32,
    pub distortion_bias: f32,
}

/// Pad a vec3 + scalar into a uniform-friendly vec4.
pub(crate) fn pack(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

pub(crate) fn pack4(v: Vec4) -> [f32; 4] {
    v.to_array()
}

/// Layout for a per-draw uniform buffer addressed with dynamic offsets.
pub fn create_uniform_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Layout for `texture_count` sampled textures plus one shared sampler.
pub fn create_texture_bind_group_layout(
    device: &wgpu::Device,
    texture_count: u32,
    label: &str,
) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..texture_count)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: texture_count,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

/// A technique's pipeline pair: opaque and alpha-blended variants.
/// Blend state is pipeline state in wgpu, so the old global blend toggle
/// becomes a per-draw variant selection.
pub struct TechniquePipeline {
    opaque: wgpu::RenderPipeline,
    blended: wgpu::RenderPipeline,
}

impl TechniquePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        shader_source: &str,
        label: &str,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        vertex_layout: wgpu::VertexBufferLayout<'static>,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        let build = |blend: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout.clone()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(if blend {
                            wgpu::BlendState::ALPHA_BLENDING
                        } else {
                            wgpu::BlendState::REPLACE
                        }),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    // The text models carry mixed winding; draw double-sided.
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: Texture::DEPTH_FORMAT,
                    // Blended draws read depth but must not occlude.
                    depth_write_enabled: !blend,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        Self {
            opaque: build(false),
            blended: build(true),
        }
    }

    pub fn select(&self, blend: bool) -> &wgpu::RenderPipeline {
        if blend {
            &self.blended
        } else {
            &self.opaque
        }
    }
}
