use std::sync::{Arc, Mutex};

use instant::Instant;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use app_core::{ParticleField, Phase, PhaseController, ACCENT_COUNT, PARTICLE_COUNT};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glam::{Mat4, Vec3};

const CAMERA_EYE: Vec3 = Vec3::new(0.0, 1.0, 12.0);
const CAMERA_FOVY: f32 = 35.0 * std::f32::consts::PI / 180.0;

// Mean-absolute-sample to 0-255 amplitude scaling; breath on a typical
// laptop microphone lands well above the trigger threshold at this gain.
const AMPLITUDE_GAIN: f32 = 512.0;

// Candle flame marker shown while the candles are lit
const CANDLE_POS: Vec3 = Vec3::new(0.0, 1.8, 0.0);
const CANDLE_SCALE: f32 = 0.15;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    view_right: [f32; 4],
    view_up: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    pos: [f32; 3],
    scale: f32,
    color: [f32; 4],
}

/// Simulation state advanced once per rendered frame.
struct Scene {
    controller: PhaseController,
    field: ParticleField,
    start: Instant,
    amplitude: Arc<Mutex<Option<u8>>>,
}

impl Scene {
    fn new(amplitude: Arc<Mutex<Option<u8>>>) -> Self {
        Self {
            controller: PhaseController::new(),
            field: ParticleField::new(PARTICLE_COUNT, ACCENT_COUNT, None),
            start: Instant::now(),
            amplitude,
        }
    }

    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Tick the state machine and the particle field, then emit the
    /// instance list for this frame.
    fn step(&mut self, instances: &mut Vec<InstanceData>) {
        let now_ms = self.now_ms();
        let time_sec = (now_ms / 1000.0) as f32;
        let amplitude = *self.amplitude.lock().unwrap();
        let out = self.controller.tick(now_ms, amplitude);
        self.field.advance(out.phase, out.progress, time_sec);

        instances.clear();
        let (sin_y, cos_y) = self.field.rotation_y().sin_cos();
        let material = self.field.material_color();
        let opacity = self.field.opacity();
        let size = self.field.point_size();
        for (pos, color) in self
            .field
            .positions()
            .iter()
            .zip(self.field.colors().iter())
        {
            // whole-field yaw applied here; the core keeps raw positions
            let rotated = Vec3::new(
                pos.x * cos_y + pos.z * sin_y,
                pos.y,
                -pos.x * sin_y + pos.z * cos_y,
            );
            instances.push(InstanceData {
                pos: rotated.to_array(),
                scale: size,
                color: [
                    color[0] * material[0],
                    color[1] * material[1],
                    color[2] * material[2],
                    opacity,
                ],
            });
        }

        // accent markers sit outside the rotating field
        for m in self.field.accents() {
            if m.scale() < 0.01 {
                continue;
            }
            let c = m.color();
            let glow = 0.5 + m.intensity() * 0.25;
            instances.push(InstanceData {
                pos: m.position().to_array(),
                scale: m.scale() * 0.1,
                color: [c[0] * glow, c[1] * glow, c[2] * glow, 0.9],
            });
        }

        // candle flame while lit, fading out during the blow
        let flame = match out.phase {
            Phase::CandlesLit => Some(1.0),
            Phase::BlowOut if out.progress < 0.2 => Some(1.0 - out.progress),
            _ => None,
        };
        if let Some(strength) = flame {
            instances.push(InstanceData {
                pos: CANDLE_POS.to_array(),
                scale: CANDLE_SCALE,
                color: [1.0 * strength, 0.84 * strength, 0.0, 1.0],
            });
        }
    }
}

struct GpuState<'w> {
    window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    instance_vb: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    instances: Vec<InstanceData>,
}

impl<'w> GpuState<'w> {
    async fn new(window: &'w winit::window::Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shader"),
            source: wgpu::ShaderSource::Wgsl(app_core::SCENE_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Quad vertices for two triangles
        let quad_vertices: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        // particles + accents + candle flame
        let max_instances = PARTICLE_COUNT + ACCENT_COUNT + 1;
        let instance_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_vb"),
            size: (std::mem::size_of::<InstanceData>() * max_instances) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bgl"),
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
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            // slot 0: quad corners
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // slot 1: instance data
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32,
                        offset: 12,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: 16,
                        shader_location: 3,
                    },
                ],
            },
        ];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    // premultiplied additive-style accumulation
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::OVER,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            quad_vb,
            instance_vb,
            bind_group,
            width: size.width,
            height: size.height,
            instances: Vec::with_capacity(max_instances),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.width = new_size.width;
        self.height = new_size.height;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn uniforms(&self) -> Uniforms {
        let aspect = self.width as f32 / self.height.max(1) as f32;
        let proj = Mat4::perspective_rh(CAMERA_FOVY, aspect, 0.1, 200.0);
        let view = Mat4::look_at_rh(CAMERA_EYE, Vec3::ZERO, Vec3::Y);
        let fwd = (Vec3::ZERO - CAMERA_EYE).normalize();
        let right = fwd.cross(Vec3::Y).normalize();
        let up = right.cross(fwd);
        Uniforms {
            view_proj: (proj * view).to_cols_array_2d(),
            view_right: [right.x, right.y, right.z, 0.0],
            view_up: [up.x, up.y, up.z, 0.0],
        }
    }

    fn render(&mut self, scene: &mut Scene) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms()));

        let mut instances = std::mem::take(&mut self.instances);
        scene.step(&mut instances);
        self.queue
            .write_buffer(&self.instance_vb, 0, bytemuck::cast_slice(&instances));
        let instance_count = instances.len() as u32;
        self.instances = instances;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.005,
                            g: 0.005,
                            b: 0.01,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
            rpass.set_vertex_buffer(1, self.instance_vb.slice(..));
            rpass.draw(0..6, 0..instance_count);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let amplitude: Arc<Mutex<Option<u8>>> = Arc::new(Mutex::new(None));
    // Keep the stream alive for the process duration; a missing mic just
    // leaves the amplitude permanently absent (keyboard still works).
    let _mic_stream = start_mic_capture(Arc::clone(&amplitude));
    if _mic_stream.is_none() {
        log::warn!("microphone unavailable; use Space to trigger transitions");
    }

    let mut scene = Scene::new(amplitude);

    let event_loop = EventLoop::new().expect("event loop");
    let window = WindowBuilder::new()
        .with_title("wish-17")
        .build(&event_loop)
        .expect("window");

    let mut state = pollster::block_on(GpuState::new(&window)).expect("gpu");

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => state.resize(size),
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => elwt.exit(),
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(code),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    },
                ..
            } => match code {
                KeyCode::Enter => scene.controller.begin(scene.now_ms()),
                KeyCode::Space => scene.controller.trigger(scene.now_ms()),
                KeyCode::Escape => elwt.exit(),
                _ => {}
            },
            Event::AboutToWait => match state.render(&mut scene) {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            },
            _ => {}
        })
        .unwrap();
}

// ---------------- Microphone capture (cpal) ----------------

fn start_mic_capture(shared: Arc<Mutex<Option<u8>>>) -> Option<cpal::Stream> {
    let host = cpal::default_host();
    let device = host.default_input_device()?;
    let config = device.default_input_config().ok()?;
    log::info!(
        "mic capture: {} @ {} Hz",
        device.name().unwrap_or_else(|_| "unknown".into()),
        config.sample_rate().0
    );

    let err_fn = |err| log::error!("mic stream error: {err}");

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_mic_stream_f32(
            &device,
            &config.into(),
            Arc::clone(&shared),
            err_fn,
        )
        .ok()?,
        cpal::SampleFormat::I16 => build_mic_stream_i16(
            &device,
            &config.into(),
            Arc::clone(&shared),
            err_fn,
        )
        .ok()?,
        cpal::SampleFormat::U16 => build_mic_stream_u16(
            &device,
            &config.into(),
            Arc::clone(&shared),
            err_fn,
        )
        .ok()?,
        _ => return None,
    };

    stream.play().ok()?;
    Some(stream)
}

fn publish_amplitude(shared: &Mutex<Option<u8>>, mean_abs: f32) {
    let level = (mean_abs * AMPLITUDE_GAIN).min(255.0) as u8;
    *shared.lock().unwrap() = Some(level);
}

fn build_mic_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Mutex<Option<u8>>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_input_stream(
        config,
        move |data: &[f32], _| {
            let sum: f32 = data.iter().map(|s| s.abs()).sum();
            publish_amplitude(&shared, sum / data.len().max(1) as f32);
        },
        err_fn,
        None,
    )
}

fn build_mic_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Mutex<Option<u8>>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_input_stream(
        config,
        move |data: &[i16], _| {
            let sum: f32 = data
                .iter()
                .map(|s| (*s as f32 / i16::MAX as f32).abs())
                .sum();
            publish_amplitude(&shared, sum / data.len().max(1) as f32);
        },
        err_fn,
        None,
    )
}

fn build_mic_stream_u16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Mutex<Option<u8>>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_input_stream(
        config,
        move |data: &[u16], _| {
            let sum: f32 = data
                .iter()
                .map(|s| (*s as f32 / u16::MAX as f32 * 2.0 - 1.0).abs())
                .sum();
            publish_amplitude(&shared, sum / data.len().max(1) as f32);
        },
        err_fn,
        None,
    )
}
