use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use globeview_assets::{AssetStore, Raster};
use globeview_common::{Color, Extent, Transform};
use globeview_render::{FrameView, RenderError};
use globeview_scene::{Face, LineMesh, Mesh, Scene, ShellGeometry, ShellMaterial, SurfaceShader};
use wgpu::util::DeviceExt;

use crate::shaders;

const MAX_LIGHTS: usize = 3;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    globe: [[f32; 4]; 4],
    ambient: [f32; 4],
    light_pos: [[f32; 4]; MAX_LIGHTS],
    light_color: [[f32; 4]; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct RimUniforms {
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: Color, alpha: f32) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: color.with_alpha(alpha),
        }
    }
}

/// Vertex and index buffers for one mesh.
struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn lit(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertices: Vec<Vertex> = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .zip(&mesh.uvs)
            .map(|((p, n), uv)| Vertex {
                position: *p,
                normal: *n,
                uv: *uv,
            })
            .collect();
        Self::upload(device, label, bytemuck::cast_slice(&vertices), &mesh.indices)
    }

    fn unlit(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        Self::upload(device, label, bytemuck::cast_slice(&mesh.positions), &mesh.indices)
    }

    fn lines(device: &wgpu::Device, label: &str, mesh: &LineMesh) -> Self {
        Self::upload(device, label, bytemuck::cast_slice(&mesh.positions), &mesh.indices)
    }

    fn upload(device: &wgpu::Device, label: &str, vertices: &[u8], indices: &[u32]) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices: index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: std::ops::Range<u32>) {
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instances);
    }

    fn destroy(&self) -> usize {
        self.vertices.destroy();
        self.indices.destroy();
        2
    }
}

struct RimShell {
    mesh: GpuMesh,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

/// Instance buffer sized once at creation and rewritten every frame.
struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: u32,
    len: u32,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &str, capacity: u32) -> Self {
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity,
            len: 0,
        }
    }

    fn write(&mut self, queue: &wgpu::Queue, instances: &[InstanceData]) {
        let n = instances.len().min(self.capacity as usize);
        if n > 0 {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&instances[..n]));
        }
        self.len = n as u32;
    }
}

/// GPU-resident copy of a [`Scene`]: one pipeline per material, buffers
/// created once, per-frame work limited to uniform and instance writes.
pub struct GlobeRenderer {
    globals: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    globe_pipeline: wgpu::RenderPipeline,
    globe_mesh: Option<GpuMesh>,
    surface_texture: wgpu::Texture,
    surface_bind_group: wgpu::BindGroup,

    wire_pipeline: wgpu::RenderPipeline,
    wire_mesh: Option<GpuMesh>,
    wire_color: (Color, f32),
    wire_instance: InstanceBuffer,

    rims: Vec<RimShell>,

    marker_pipeline: wgpu::RenderPipeline,
    sphere_mesh: GpuMesh,
    ring_mesh: GpuMesh,
    beam_mesh: GpuMesh,
    sphere_instances: InstanceBuffer,
    ring_instances: InstanceBuffer,
    beam_instances: InstanceBuffer,

    star_pipeline: wgpu::RenderPipeline,
    star_vertices: wgpu::Buffer,
    star_count: u32,
    star_instance: InstanceBuffer,

    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

fn additive() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    layout: &'a wgpu::PipelineLayout,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(spec.layout),
        vertex: wgpu::VertexState {
            module: spec.module,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: spec.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.module,
            entry_point: Some(spec.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            cull_mode: spec.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

const LIT_VERTEX: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ],
};

const UNLIT_VERTEX: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

const INSTANCE: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<InstanceData>() as u64,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![
        1 => Float32x4,
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ],
};

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl GlobeRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        extent: Extent,
        scene: &Scene,
        assets: &AssetStore,
    ) -> Result<Self, RenderError> {
        let _span = tracing::info_span!("gpu_upload", shells = scene.shells.len()).entered();
        let raster = assets
            .texture(scene.texture)
            .ok_or(RenderError::MissingAsset(scene.texture))?;

        // Group 0: per-frame globals.
        let globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals_buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.as_entire_binding(),
            }],
        });

        // Group 1 (globe): surface texture + sampler.
        let surface_texture = upload_texture(device, queue, &raster);
        let texture_view = surface_texture.create_view(&Default::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("surface_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("surface_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let surface_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("surface_texture_bind_group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        // Group 1 (rim): per-shell shading parameters.
        let rim_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("rim_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });

        let globe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let rim_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rim_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &rim_layout],
            push_constant_ranges: &[],
        });
        let unlit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("unlit_pipeline_layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let module = |label: &str, body: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(shaders::with_globals(body).into()),
            })
        };
        let globe_shader = module("globe_shader", shaders::GLOBE_SHADER);
        let rim_shader = module("rim_shader", shaders::RIM_SHADER);
        let unlit_shader = module("unlit_shader", shaders::UNLIT_SHADER);

        let globe_pipeline = pipeline(
            device,
            surface_format,
            PipelineSpec {
                label: "globe_pipeline",
                module: &globe_shader,
                vs: "vs_globe",
                fs: "fs_globe",
                layout: &globe_layout,
                buffers: &[LIT_VERTEX],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );
        let unlit = |label: &str, topology: wgpu::PrimitiveTopology| {
            pipeline(
                device,
                surface_format,
                PipelineSpec {
                    label,
                    module: &unlit_shader,
                    vs: "vs_unlit",
                    fs: "fs_unlit",
                    layout: &unlit_layout,
                    buffers: &[UNLIT_VERTEX, INSTANCE],
                    topology,
                    cull_mode: None,
                    blend: wgpu::BlendState::ALPHA_BLENDING,
                    depth_write: false,
                },
            )
        };
        let wire_pipeline = unlit("wireframe_pipeline", wgpu::PrimitiveTopology::LineList);
        let marker_pipeline = unlit("marker_pipeline", wgpu::PrimitiveTopology::TriangleList);
        let star_pipeline = unlit("star_pipeline", wgpu::PrimitiveTopology::PointList);

        let mut globe_mesh = None;
        let mut wire_mesh = None;
        let mut wire_color = (Color::WHITE, 0.0);
        let mut rims = Vec::new();
        for shell in &scene.shells {
            let label = shell.kind.name();
            match (&shell.material, &shell.geometry) {
                (ShellMaterial::Textured { .. }, ShellGeometry::Triangles(mesh)) => {
                    globe_mesh = Some(GpuMesh::lit(device, label, mesh));
                }
                (ShellMaterial::Wire { color, opacity, .. }, ShellGeometry::Lines(mesh)) => {
                    wire_mesh = Some(GpuMesh::lines(device, label, mesh));
                    wire_color = (*color, *opacity);
                }
                (ShellMaterial::Rim(shader), ShellGeometry::Triangles(mesh)) => {
                    let uniforms = rim_uniforms(shader.as_ref());
                    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{label}_rim_buffer")),
                        contents: bytemuck::bytes_of(&uniforms),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&format!("{label}_rim_bind_group")),
                        layout: &rim_layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: buffer.as_entire_binding(),
                        }],
                    });
                    // Back-face shells cull their front faces and vice versa.
                    let cull = match shader.face() {
                        Face::Front => wgpu::Face::Back,
                        Face::Back => wgpu::Face::Front,
                    };
                    let rim_pipeline = pipeline(
                        device,
                        surface_format,
                        PipelineSpec {
                            label: &format!("{label}_pipeline"),
                            module: &rim_shader,
                            vs: "vs_rim",
                            fs: "fs_rim",
                            layout: &rim_pipeline_layout,
                            buffers: &[LIT_VERTEX],
                            topology: wgpu::PrimitiveTopology::TriangleList,
                            cull_mode: Some(cull),
                            blend: additive(),
                            depth_write: false,
                        },
                    );
                    rims.push(RimShell {
                        mesh: GpuMesh::lit(device, label, mesh),
                        uniforms: buffer,
                        bind_group,
                        pipeline: rim_pipeline,
                    });
                }
                _ => {
                    tracing::warn!(shell = label, "unsupported shell geometry/material pairing skipped");
                }
            }
        }

        let overlay = &scene.markers;
        let count = overlay.len() as u32;
        let star_points: Vec<[f32; 3]> = scene.stars.positions.iter().map(|p| p.to_array()).collect();
        let star_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star_vertex_buffer"),
            contents: bytemuck::cast_slice(&star_points),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let (depth_texture, depth_view) = create_depth_texture(device, extent);

        tracing::info!(
            markers = count,
            stars = scene.stars.len(),
            rims = rims.len(),
            "GPU scene uploaded"
        );

        Ok(Self {
            globals,
            globals_bind_group,
            globe_pipeline,
            globe_mesh,
            surface_texture,
            surface_bind_group,
            wire_pipeline,
            wire_mesh,
            wire_color,
            wire_instance: InstanceBuffer::new(device, "wire_instance_buffer", 1),
            rims,
            marker_pipeline,
            sphere_mesh: GpuMesh::unlit(device, "marker_sphere", &overlay.sphere),
            ring_mesh: GpuMesh::unlit(device, "marker_ring", &overlay.ring),
            beam_mesh: GpuMesh::unlit(device, "marker_beam", &overlay.beam),
            sphere_instances: InstanceBuffer::new(device, "sphere_instance_buffer", count * 2),
            ring_instances: InstanceBuffer::new(device, "ring_instance_buffer", count),
            beam_instances: InstanceBuffer::new(device, "beam_instance_buffer", count),
            star_pipeline,
            star_vertices,
            star_count: scene.stars.len() as u32,
            star_instance: InstanceBuffer::new(device, "star_instance_buffer", 1),
            depth_texture,
            depth_view,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, extent: Extent) {
        self.depth_texture.destroy();
        let (texture, view) = create_depth_texture(device, extent);
        self.depth_texture = texture;
        self.depth_view = view;
    }

    /// Render one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &FrameView<'_>,
    ) {
        let cam = frame.camera;
        let globe = frame.state.globe_orientation().to_quat();
        let group = Mat4::from_quat(globe);

        let lighting = frame
            .scene
            .shells
            .iter()
            .find_map(|s| match &s.material {
                ShellMaterial::Textured { lighting, .. } => Some(lighting),
                _ => None,
            });
        let mut g = Globals {
            view_proj: cam.view_projection().to_cols_array_2d(),
            view: cam.view_matrix().to_cols_array_2d(),
            globe: group.to_cols_array_2d(),
            ambient: [0.0; 4],
            light_pos: [[0.0; 4]; MAX_LIGHTS],
            light_color: [[0.0; 4]; MAX_LIGHTS],
        };
        if let Some(l) = lighting {
            let a = l.ambient.scaled(l.ambient_intensity);
            let n = l.lights.len().min(MAX_LIGHTS);
            g.ambient = [a.r, a.g, a.b, n as f32];
            for (i, light) in l.lights.iter().take(n).enumerate() {
                let p = light.position;
                g.light_pos[i] = [p[0], p[1], p[2], 1.0];
                g.light_color[i] = light.color.scaled(light.intensity).with_alpha(1.0);
            }
        }
        queue.write_buffer(&self.globals, 0, bytemuck::bytes_of(&g));

        self.write_instances(queue, frame, group);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("globe_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("globe_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.globals_bind_group, &[]);

            if self.star_count > 0 {
                pass.set_pipeline(&self.star_pipeline);
                pass.set_vertex_buffer(0, self.star_vertices.slice(..));
                pass.set_vertex_buffer(1, self.star_instance.buffer.slice(..));
                pass.draw(0..self.star_count, 0..self.star_instance.len);
            }

            if let Some(mesh) = &self.globe_mesh {
                pass.set_pipeline(&self.globe_pipeline);
                pass.set_bind_group(1, &self.surface_bind_group, &[]);
                mesh.draw(&mut pass, 0..1);
            }

            if let Some(mesh) = &self.wire_mesh {
                pass.set_pipeline(&self.wire_pipeline);
                pass.set_vertex_buffer(1, self.wire_instance.buffer.slice(..));
                mesh.draw(&mut pass, 0..self.wire_instance.len);
            }

            for rim in &self.rims {
                pass.set_pipeline(&rim.pipeline);
                pass.set_bind_group(1, &rim.bind_group, &[]);
                rim.mesh.draw(&mut pass, 0..1);
            }

            pass.set_pipeline(&self.marker_pipeline);
            for (mesh, instances) in [
                (&self.sphere_mesh, &self.sphere_instances),
                (&self.ring_mesh, &self.ring_instances),
                (&self.beam_mesh, &self.beam_instances),
            ] {
                if instances.len > 0 {
                    pass.set_vertex_buffer(1, instances.buffer.slice(..));
                    mesh.draw(&mut pass, 0..instances.len);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn write_instances(&mut self, queue: &wgpu::Queue, frame: &FrameView<'_>, group: Mat4) {
        let overlay = &frame.scene.markers;
        let cfg = &overlay.config;

        let (wire_color, wire_alpha) = self.wire_color;
        self.wire_instance
            .write(queue, &[InstanceData::new(group, wire_color, wire_alpha)]);

        let stars = &frame.scene.stars;
        let star_model = Mat4::from_quat(Quat::from_rotation_y(frame.state.star_yaw as f32));
        self.star_instance
            .write(queue, &[InstanceData::new(star_model, Color::WHITE, stars.opacity)]);

        let mut spheres = Vec::with_capacity(overlay.len() * 2);
        let mut rings = Vec::with_capacity(overlay.len());
        let mut beams = Vec::with_capacity(overlay.len());
        for m in &overlay.markers {
            // Halos first so the opaque dot blends over them.
            spheres.push(InstanceData::new(group * m.halo.matrix(), m.color, cfg.halo_opacity));
            spheres.push(InstanceData::new(group * m.dot.matrix(), m.color, 1.0));

            let p = frame.state.pulse(m.phase, &cfg.pulse);
            let ring = Transform {
                scale: Vec3::splat(p.scale as f32),
                ..m.ring
            };
            rings.push(InstanceData::new(
                group * ring.matrix(),
                m.color,
                p.opacity.clamp(0.0, 1.0) as f32,
            ));
            if let Some(beam) = &m.beam {
                beams.push(InstanceData::new(group * beam.matrix(), m.color, cfg.beam_opacity));
            }
        }
        self.sphere_instances.write(queue, &spheres);
        self.ring_instances.write(queue, &rings);
        self.beam_instances.write(queue, &beams);
    }

    /// Destroy every buffer and texture. Returns how many were released.
    pub fn destroy(self) -> usize {
        let mut released = 0;
        for buffer in [
            &self.globals,
            &self.wire_instance.buffer,
            &self.sphere_instances.buffer,
            &self.ring_instances.buffer,
            &self.beam_instances.buffer,
            &self.star_vertices,
            &self.star_instance.buffer,
        ] {
            buffer.destroy();
            released += 1;
        }
        for mesh in [&self.globe_mesh, &self.wire_mesh].into_iter().flatten() {
            released += mesh.destroy();
        }
        for mesh in [&self.sphere_mesh, &self.ring_mesh, &self.beam_mesh] {
            released += mesh.destroy();
        }
        for rim in &self.rims {
            rim.uniforms.destroy();
            released += 1 + rim.mesh.destroy();
        }
        self.surface_texture.destroy();
        self.depth_texture.destroy();
        released + 2
    }
}

fn rim_uniforms(shader: &dyn SurfaceShader) -> RimUniforms {
    let p = shader.params();
    RimUniforms {
        color: shader.color().with_alpha(1.0),
        params: [p.c, p.p, p.alpha_scale, 0.0],
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, raster: &Raster) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: raster.width(),
        height: raster.height(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("surface_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &raster.as_bytes(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * raster.width()),
            rows_per_image: Some(raster.height()),
        },
        size,
    );
    texture
}

fn create_depth_texture(device: &wgpu::Device, extent: Extent) -> (wgpu::Texture, wgpu::TextureView) {
    let extent = extent.clamped();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    (texture, view)
}
