//! wgpu renderer for a [`TreeScene`].
//!
//! All particles are drawn instanced: one upload of [`InstanceRaw`] per frame,
//! split into ranges per mesh. Photos get one draw each so every panel can
//! bind its own texture.

mod camera;
mod mesh;
mod shaders;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
use mesh::{Mesh, Vertex};
use shaders::SceneUniforms;

use crate::config::Palette;
use crate::error::GpuError;
use crate::layout::Pose;
use crate::particle::ParticleKind;
use crate::photo::{PanelTexture, PhotoId, PhotoTexture};
use crate::scene::TreeScene;
use crate::snow::SnowInstance;
use crate::transform::InstanceRaw;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const PHOTO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Outer frame of a photo panel.
pub const FRAME_SIZE: Vec3 = Vec3::new(1.5, 1.8, 0.02);
/// Side of the square image inside the frame.
pub const IMAGE_SIZE: f32 = 1.3;
/// Image offset from the frame centre: raised, and just proud of the face.
pub const IMAGE_OFFSET: Vec3 = Vec3::new(0.0, 0.15, 0.011);
const STAR_OUTER_RADIUS: f32 = 0.9;
const STAR_INNER_RADIUS: f32 = 0.35;
const STAR_DEPTH: f32 = 0.25;

// Model columns, colour, then normal matrix columns, in `InstanceRaw` order.
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
    8 => Float32x4,
    9 => Float32x4,
    10 => Float32x4,
];
const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];
const SNOW_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32,
];

/// Model matrix for the image quad of a panel at `pose`.
pub fn photo_image_matrix(group: Mat4, pose: Pose) -> Mat4 {
    photo_frame_matrix(group, pose) * Mat4::from_translation(IMAGE_OFFSET)
}

/// Model matrix for the frame of a panel at `pose`.
pub fn photo_frame_matrix(group: Mat4, pose: Pose) -> Mat4 {
    group * Mat4::from_rotation_translation(pose.rotation, pose.position)
}

/// Which mesh draws a particle kind.
fn mesh_for(kind: ParticleKind) -> MeshId {
    match kind {
        ParticleKind::GreenApple | ParticleKind::RedApple => MeshId::Sphere,
        ParticleKind::Peel => MeshId::Cube,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshId {
    Sphere,
    Cube,
    Quad,
    Star,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }
}

/// A vertex buffer that grows to fit whatever is written to it.
struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: &'static str,
}

impl DynamicBuffer {
    fn new(device: &wgpu::Device, capacity: u64, label: &'static str) -> Self {
        let capacity = capacity.max(256);
        Self {
            buffer: Self::allocate(device, capacity, label),
            capacity,
            label,
        }
    }

    fn allocate(device: &wgpu::Device, size: u64, label: &str) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.capacity, self.label);
            log::debug!("{} grown to {} bytes", self.label, self.capacity);
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }
}

/// One contiguous run of instances drawn with the same mesh.
struct Batch {
    mesh: MeshId,
    instances: Range<u32>,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    mesh_pipeline: wgpu::RenderPipeline,
    photo_pipeline: wgpu::RenderPipeline,
    snow_pipeline: wgpu::RenderPipeline,

    sphere: GpuMesh,
    cube: GpuMesh,
    quad: GpuMesh,
    star: GpuMesh,

    instances: DynamicBuffer,
    instance_scratch: Vec<InstanceRaw>,
    snow: DynamicBuffer,
    snow_scratch: Vec<SnowInstance>,

    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    placeholder: wgpu::BindGroup,
    /// `None` means the panel shows the placeholder.
    photo_textures: HashMap<PhotoId, Option<wgpu::BindGroup>>,
    synced_generation: Option<u64>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let uniforms = SceneUniforms::new(Mat4::IDENTITY, Vec3::X, Vec3::Y);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Photo Bind Group Layout"),
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Photo Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mesh_layout = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            },
        ];

        let mesh_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "Mesh",
                source: shaders::MESH_SHADER,
                bind_group_layouts: &[&uniform_bind_group_layout],
                buffers: &mesh_layout,
                format: config.format,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );

        let photo_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "Photo",
                source: shaders::PHOTO_SHADER,
                bind_group_layouts: &[&uniform_bind_group_layout, &texture_layout],
                buffers: &mesh_layout,
                format: config.format,
                blend: wgpu::BlendState::REPLACE,
                depth_write: true,
            },
        );

        let snow_pipeline = create_pipeline(
            &device,
            PipelineSpec {
                label: "Snow",
                source: shaders::SNOW_SHADER,
                bind_group_layouts: &[&uniform_bind_group_layout],
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SnowInstance>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &SNOW_ATTRIBUTES,
                }],
                format: config.format,
                blend: wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::One,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent::OVER,
                },
                depth_write: false,
            },
        );

        let sphere = GpuMesh::new(&device, &Mesh::uv_sphere(0.5, 24, 24), "Sphere");
        let cube = GpuMesh::new(&device, &Mesh::cuboid(Vec3::ONE), "Cube");
        let quad = GpuMesh::new(&device, &Mesh::quad(IMAGE_SIZE, IMAGE_SIZE), "Quad");
        let star = GpuMesh::new(
            &device,
            &Mesh::star(5, STAR_OUTER_RADIUS, STAR_INNER_RADIUS, STAR_DEPTH),
            "Star",
        );

        let instances = DynamicBuffer::new(
            &device,
            (1024 * std::mem::size_of::<InstanceRaw>()) as u64,
            "Instance Buffer",
        );
        let snow = DynamicBuffer::new(
            &device,
            (4096 * std::mem::size_of::<SnowInstance>()) as u64,
            "Snow Buffer",
        );

        let placeholder_pixels = PhotoTexture::placeholder();
        let placeholder = create_photo_bind_group(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            &placeholder_pixels,
            "Placeholder",
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            uniform_buffer,
            uniform_bind_group,
            mesh_pipeline,
            photo_pipeline,
            snow_pipeline,
            sphere,
            cube,
            quad,
            star,
            instances,
            instance_scratch: Vec::new(),
            snow,
            snow_scratch: Vec::new(),
            texture_layout,
            sampler,
            placeholder,
            photo_textures: HashMap::new(),
            synced_generation: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Upload textures for new photos and drop those no longer shown.
    fn sync_photos(&mut self, scene: &TreeScene) {
        if self.synced_generation == Some(scene.photo_generation()) {
            return;
        }
        self.photo_textures
            .retain(|id, _| scene.photos().iter().any(|p| p.id() == *id));

        for panel in scene.photos() {
            if self.photo_textures.contains_key(&panel.id()) {
                continue;
            }
            let bind_group = match panel.texture() {
                PanelTexture::Loaded(texture) => Some(create_photo_bind_group(
                    &self.device,
                    &self.queue,
                    &self.texture_layout,
                    &self.sampler,
                    texture,
                    &panel.photo().label(),
                )),
                PanelTexture::Placeholder => None,
                // Picked up on the generation bump when it arrives.
                PanelTexture::Loading => continue,
            };
            self.photo_textures.insert(panel.id(), bind_group);
        }
        self.synced_generation = Some(scene.photo_generation());
    }

    /// Fill the instance scratch buffer and return the draw batches, plus
    /// the instance range of the photo images.
    fn build_batches(&mut self, scene: &TreeScene) -> (Vec<Batch>, Range<u32>) {
        let group = scene.group_transform();
        let out = &mut self.instance_scratch;
        out.clear();
        let mut batches = Vec::new();

        for set in scene.sets() {
            let start = out.len();
            scene.write_instances(set.kind(), out);
            push_batch(&mut batches, mesh_for(set.kind()), start, out.len());
        }

        let start = out.len();
        out.extend(scene.photos().iter().map(|panel| {
            let model = photo_frame_matrix(group, panel.pose()) * Mat4::from_scale(FRAME_SIZE);
            InstanceRaw::new(model, Palette::PHOTO_FRAME)
        }));
        push_batch(&mut batches, MeshId::Cube, start, out.len());

        let start = out.len();
        let pose = scene.topper().pose();
        let model = group * Mat4::from_rotation_translation(pose.rotation, pose.position);
        out.push(InstanceRaw::new(model, Palette::GOLD_STAR));
        push_batch(&mut batches, MeshId::Star, start, out.len());

        // Photo images last; drawn one by one with their own textures.
        let start = out.len() as u32;
        out.extend(scene.photos().iter().map(|panel| {
            InstanceRaw::new(photo_image_matrix(group, panel.pose()), Vec3::ONE)
        }));
        let images = start..out.len() as u32;

        (batches, images)
    }

    fn mesh(&self, id: MeshId) -> &GpuMesh {
        match id {
            MeshId::Sphere => &self.sphere,
            MeshId::Cube => &self.cube,
            MeshId::Quad => &self.quad,
            MeshId::Star => &self.star,
        }
    }

    pub fn render(&mut self, scene: &TreeScene, camera: &Camera) -> Result<(), wgpu::SurfaceError> {
        self.sync_photos(scene);

        let (right, up) = camera.basis();
        let uniforms = SceneUniforms::new(camera.view_proj(self.aspect()), right, up);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let (batches, images) = self.build_batches(scene);
        self.instances.write(
            &self.device,
            &self.queue,
            bytemuck::cast_slice(&self.instance_scratch),
        );

        self.snow_scratch.clear();
        scene.snow().write_instances(&mut self.snow_scratch);
        self.snow
            .write(&self.device, &self.queue, bytemuck::cast_slice(&self.snow_scratch));
        let flakes = self.snow_scratch.len() as u32;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let void = Palette::VOID;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: void.x as f64,
                            g: void.y as f64,
                            b: void.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instances.buffer.slice(..));

            render_pass.set_pipeline(&self.mesh_pipeline);
            for batch in &batches {
                let mesh = self.mesh(batch.mesh);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
            }

            if !images.is_empty() {
                render_pass.set_pipeline(&self.photo_pipeline);
                let quad = self.mesh(MeshId::Quad);
                render_pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
                render_pass.set_index_buffer(quad.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                for (panel, instance) in scene.photos().iter().zip(images) {
                    let bind_group = self
                        .photo_textures
                        .get(&panel.id())
                        .and_then(Option::as_ref)
                        .unwrap_or(&self.placeholder);
                    render_pass.set_bind_group(1, bind_group, &[]);
                    render_pass.draw_indexed(0..quad.index_count, 0, instance..instance + 1);
                }
            }

            if flakes > 0 {
                render_pass.set_pipeline(&self.snow_pipeline);
                render_pass.set_vertex_buffer(0, self.snow.buffer.slice(..));
                render_pass.draw(0..6, 0..flakes);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn push_batch(batches: &mut Vec<Batch>, mesh: MeshId, start: usize, end: usize) {
    if end > start {
        batches.push(Batch {
            mesh,
            instances: start as u32..end as u32,
        });
    }
}

struct PipelineSpec<'a> {
    label: &'a str,
    source: &'a str,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{} Shader", desc.label)),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", desc.label)),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", desc.label)),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: desc.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_photo_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    pixels: &PhotoTexture,
    label: &str,
) -> wgpu::BindGroup {
    let size = wgpu::Extent3d {
        width: pixels.width,
        height: pixels.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: PHOTO_FORMAT,
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
        &pixels.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(pixels.width * 4),
            rows_per_image: Some(pixels.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_mesh_for_kind() {
        assert_eq!(mesh_for(ParticleKind::GreenApple), MeshId::Sphere);
        assert_eq!(mesh_for(ParticleKind::RedApple), MeshId::Sphere);
        assert_eq!(mesh_for(ParticleKind::Peel), MeshId::Cube);
    }

    #[test]
    fn test_image_sits_in_front_of_frame() {
        let pose = Pose::new(Vec3::new(2.0, 1.0, 0.0), Quat::from_rotation_y(0.7));
        let frame = photo_frame_matrix(Mat4::IDENTITY, pose);
        let image = photo_image_matrix(Mat4::IDENTITY, pose);
        let frame_centre = frame.transform_point3(Vec3::ZERO);
        let image_centre = image.transform_point3(Vec3::ZERO);
        let offset = pose.rotation.inverse() * (image_centre - frame_centre);
        assert!((offset - IMAGE_OFFSET).length() < 1e-5);
        // Image fits inside the frame face.
        assert!(IMAGE_SIZE * 0.5 + IMAGE_OFFSET.y <= FRAME_SIZE.y * 0.5);
        assert!(IMAGE_OFFSET.z > FRAME_SIZE.z * 0.5);
    }

    #[test]
    fn test_placeholder_is_dark_grey() {
        let texture = PhotoTexture::placeholder();
        assert_eq!(texture.data, vec![0x33, 0x33, 0x33, 0xFF]);
    }

    #[test]
    fn test_instance_layout_matches_struct() {
        let attributes: u64 = INSTANCE_ATTRIBUTES.iter().map(|a| a.format.size()).sum();
        assert_eq!(attributes, std::mem::size_of::<InstanceRaw>() as u64);
        let last = INSTANCE_ATTRIBUTES[INSTANCE_ATTRIBUTES.len() - 1];
        assert_eq!(last.offset + last.format.size(), attributes);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<SnowInstance>(), 16);
    }
}
