// ============================================================================
// app.rs
// Application state and winit event-loop handler: owns the GPU surface, the
// bundled arena, the viewer and the per-frame tick/render cycle.
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{EulerRot, Mat4, Quat, Vec3};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes},
};

use crate::config::VizConfig;
use crate::gamepad::GamepadInput;
use crate::input::{InputEvent, InputQueue, KeyBindings};
use crate::renderer::{HudRenderer, Instance, MeshKind, SceneInstances, SceneRenderer};
use crate::sim::demo::{self, DemoArena};
use crate::sim::{Simulation, Team};
use crate::viewer::{FrameSnapshot, Viewer, ViewerOptions};

// Entity colors, RGBA.
const ARENA_COLOR: [f32; 4] = [0.35, 0.35, 0.35, 1.0];
const BALL_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const BLUE_COLOR: [f32; 4] = [0.0, 0.4, 0.8, 1.0];
const ORANGE_COLOR: [f32; 4] = [1.0, 0.2, 0.1, 1.0];
const EDGE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const SUPERSONIC_EDGE_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const PAD_COLOR: [f32; 4] = [0.9, 0.8, 0.2, 1.0];
const SHADOW_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// At most this many viewer ticks per frame before dropping the backlog, so
/// a long stall does not trigger a catch-up spiral.
const MAX_TICKS_PER_FRAME: u32 = 4;

// ======================== Application ========================

pub struct App {
    state: Option<AppState>,
    options: RunOptions,
}

/// Startup flags, parsed from the command line.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub config_path: PathBuf,
    /// Read controls from the first connected gamepad instead of the keyboard.
    pub gamepad: bool,
    /// Cars spawned in the bundled arena.
    pub car_count: usize,
    /// Whether the viewer advances the simulation itself.
    pub step_arena: bool,
    /// Whether synthesized controls are written into the controlled car.
    pub overwrite_controls: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("rocketviz.toml"),
            gamepad: false,
            car_count: 2,
            step_arena: true,
            overwrite_controls: true,
        }
    }
}

struct AppState {
    // GPU
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    // Window
    window: Arc<Window>,

    // Rendering
    renderer: SceneRenderer,
    hud: HudRenderer,
    instances: SceneInstances,

    // Simulation & control flow
    sim: DemoArena,
    viewer: Viewer,
    bindings: KeyBindings,
    input_queue: InputQueue,
    gamepad: Option<GamepadInput>,
    snapshot: Option<FrameSnapshot>,

    // Timing
    tick_interval: Duration,
    tick_accum: Duration,
    last_redraw: Instant,
    fps: f32,
}

impl App {
    pub fn new(options: RunOptions) -> Self {
        Self {
            state: None,
            options,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title("rocketviz")
            .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 720u32));

        let window = Arc::new(event_loop.create_window(window_attrs).unwrap());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let (device, queue, surface_config) =
            pollster::block_on(init_gpu(&instance, &surface, &window));

        surface.configure(&device, &surface_config);

        let config = VizConfig::load_or_default(&self.options.config_path);
        let bindings = match KeyBindings::from_table(&config.input) {
            Ok(bindings) => bindings,
            Err(err) => {
                log::warn!("Invalid key bindings ({err}), using defaults");
                KeyBindings::from_table(&VizConfig::default().input)
                    .expect("built-in bindings must parse")
            }
        };

        let tick_rate = config.sim.tick_rate.max(1);
        let tick_skip = config.sim.tick_skip.max(1);
        let sim = DemoArena::new(self.options.car_count, tick_rate);
        let viewer = Viewer::new(
            &config,
            ViewerOptions {
                tick_skip,
                step_arena: self.options.step_arena,
                overwrite_controls: self.options.overwrite_controls,
            },
        );

        let gamepad = if self.options.gamepad {
            match GamepadInput::new() {
                Ok(pad) => Some(pad),
                Err(err) => {
                    log::warn!("Gamepad unavailable ({err}), falling back to keyboard");
                    None
                }
            }
        } else {
            None
        };

        let renderer = SceneRenderer::new(
            &device,
            surface_config.format,
            surface_config.width,
            surface_config.height,
            demo::BALL_RADIUS,
        );
        let hud = HudRenderer::new(&device, &queue, surface_config.format);

        log::info!(
            "rocketviz initialized: {} cars, tick rate {} Hz, tick skip {}",
            self.options.car_count,
            tick_rate,
            tick_skip
        );

        self.state = Some(AppState {
            device,
            queue,
            surface,
            surface_config,
            window: window.clone(),
            renderer,
            hud,
            instances: SceneInstances::default(),
            sim,
            viewer,
            bindings,
            input_queue: InputQueue::default(),
            gamepad,
            snapshot: None,
            tick_interval: Duration::from_secs_f64(tick_skip as f64 / tick_rate as f64),
            tick_accum: Duration::ZERO,
            last_redraw: Instant::now(),
            fps: 0.0,
        });

        // Initial redraw — required on macOS with winit 0.30
        window.request_redraw();
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Focused(false) => {
                state.input_queue.push(InputEvent::FocusLost);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                // OS key auto-repeat would re-fire discrete actions.
                if event.repeat {
                    return;
                }
                if let Key::Named(NamedKey::Escape) = event.logical_key {
                    if event.state.is_pressed() {
                        event_loop.exit();
                    }
                    return;
                }
                if let Some(intent) = state.bindings.intent_for(&event.logical_key) {
                    let input = if event.state.is_pressed() {
                        InputEvent::Pressed(intent)
                    } else {
                        InputEvent::Released(intent)
                    };
                    state.input_queue.push(input);
                }
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    state.surface_config.width = new_size.width;
                    state.surface_config.height = new_size.height;
                    state.surface.configure(&state.device, &state.surface_config);
                    state
                        .renderer
                        .resize(&state.device, new_size.width, new_size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                redraw(state);
            }

            _ => {}
        }
    }
}

// ======================== GPU Initialization ========================

async fn init_gpu(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
    window: &Window,
) -> (wgpu::Device, wgpu::Queue, wgpu::SurfaceConfiguration) {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .expect(
            "Failed to find a suitable GPU adapter.\n\
             rocketviz requires a GPU with Vulkan, Metal, or DX12 support.",
        );

    log::info!("GPU: {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("rocketviz_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .expect("Failed to create device");

    let size = window.inner_size();
    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .copied()
        .unwrap_or(surface_caps.formats[0]);

    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: surface_caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    (device, queue, surface_config)
}

// ======================== Frame Rendering ========================

fn redraw(state: &mut AppState) {
    // FPS (exponential moving average)
    let now = Instant::now();
    let dt = now.duration_since(state.last_redraw);
    state.last_redraw = now;
    state.fps = state.fps * 0.95 + (1.0 / dt.as_secs_f32().max(0.0001)) * 0.05;

    // Viewer ticks at a fixed cadence; the queue is drained on the first
    // tick of the frame so later catch-up ticks see no stale events.
    state.tick_accum += dt;
    let mut ticks_run = 0;
    while state.tick_accum >= state.tick_interval && ticks_run < MAX_TICKS_PER_FRAME {
        state.tick_accum -= state.tick_interval;
        run_tick(state, ticks_run == 0);
        ticks_run += 1;
    }
    if ticks_run == MAX_TICKS_PER_FRAME {
        state.tick_accum = Duration::ZERO;
    }
    if state.snapshot.is_none() {
        run_tick(state, true);
    }

    let Some(snapshot) = state.snapshot.clone() else {
        return;
    };

    build_instances(&mut state.instances, &snapshot, &state.sim);

    let win_w = state.surface_config.width;
    let win_h = state.surface_config.height;
    let aspect = win_w as f32 / win_h.max(1) as f32;
    state
        .renderer
        .upload_camera(&state.queue, state.viewer.camera.view_proj(aspect));

    let hud_text = build_hud_text(&snapshot, state.fps);
    state
        .hud
        .prepare(&state.device, &state.queue, &hud_text, win_w, win_h);

    let output = match state.surface.get_current_texture() {
        Ok(t) => t,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            state.surface.configure(&state.device, &state.surface_config);
            return;
        }
        Err(e) => {
            log::error!("Surface error: {:?}", e);
            return;
        }
    };

    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

    state.renderer.render(
        &state.queue,
        &mut encoder,
        &view,
        &state.instances,
        &state.hud,
    );

    state.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    state.hud.trim();

    state.window.request_redraw();
}

fn run_tick(state: &mut AppState, drain_queue: bool) {
    if let Some(pad) = &mut state.gamepad {
        pad.poll();
        state
            .viewer
            .apply_gamepad(pad.current(), pad.previous(), &mut state.sim);
    }
    let keyboard = state.gamepad.is_none();
    let events = if drain_queue {
        state.input_queue.drain()
    } else {
        Vec::new()
    };
    state.snapshot = Some(state.viewer.tick(&mut state.sim, events, keyboard));
}

// ======================== Scene Assembly ========================

/// Rebuild the per-kind instance lists from one frame snapshot.
fn build_instances(instances: &mut SceneInstances, snapshot: &FrameSnapshot, sim: &DemoArena) {
    instances.clear();

    instances.push(MeshKind::Arena, Instance::new(Mat4::IDENTITY, ARENA_COLOR));

    // Ball: solid body plus a spinning wire overlay and a ground shadow.
    let ball_pos = snapshot.ball.phys.pos;
    let ball_model =
        Mat4::from_translation(ball_pos) * Mat4::from_quat(snapshot.ball_rotation);
    instances.push(MeshKind::BallSolid, Instance::new(ball_model, BALL_COLOR));
    instances.push(MeshKind::BallWire, Instance::new(ball_model, EDGE_COLOR));
    instances.push(
        MeshKind::BallShadow,
        Instance::new(
            Mat4::from_translation(Vec3::new(ball_pos.x, ball_pos.y, 1.0)),
            SHADOW_COLOR,
        ),
    );

    // Active boost pads, drawn as square wire cylinders turned 45 degrees.
    let pad_spin = Mat4::from_rotation_z(45f32.to_radians());
    for (i, pad) in sim.boost_pads().iter().enumerate() {
        if !snapshot.pads_active.get(i).copied().unwrap_or(false) {
            continue;
        }
        let kind = if pad.is_big {
            MeshKind::PadBig
        } else {
            MeshKind::PadSmall
        };
        let model =
            Mat4::from_translation(Vec3::new(pad.pos.x, pad.pos.y, 0.0)) * pad_spin;
        instances.push(kind, Instance::new(model, PAD_COLOR));
    }

    for car in &snapshot.cars {
        let rotation = Quat::from_euler(
            EulerRot::ZYX,
            car.phys.angles.yaw,
            car.phys.angles.pitch,
            car.phys.angles.roll,
        );
        let frame = Mat4::from_translation(car.phys.pos)
            * Mat4::from_quat(rotation)
            * Mat4::from_translation(car.hitbox.offset);
        let body = frame * Mat4::from_scale(car.hitbox.size);
        // Edges slightly larger than the body so they win the depth test.
        let edges = frame * Mat4::from_scale(car.hitbox.size * 1.01);

        let body_color = match car.team {
            Team::Blue => BLUE_COLOR,
            Team::Orange => ORANGE_COLOR,
        };
        let edge_color = if car.is_supersonic {
            SUPERSONIC_EDGE_COLOR
        } else {
            EDGE_COLOR
        };
        instances.push(MeshKind::CarBody, Instance::new(body, body_color));
        instances.push(MeshKind::CarEdges, Instance::new(edges, edge_color));
    }
}

fn build_hud_text(snapshot: &FrameSnapshot, fps: f32) -> String {
    let cam_mode = if snapshot.target_cam { "target" } else { "follow" };

    match snapshot.cars.get(snapshot.car_index) {
        Some(car) => {
            let team = match car.team {
                Team::Blue => "BLUE",
                Team::Orange => "ORANGE",
            };
            let supersonic = if car.is_supersonic { "  SUPERSONIC" } else { "" };
            format!(
                "Car {}/{} [{}]  Boost: {:>3.0}{}\n\
                 Cam: {} (T toggle, Y cycle, C switch car)  FPS: {:.0}",
                snapshot.car_index + 1,
                snapshot.cars.len(),
                team,
                car.boost,
                supersonic,
                cam_mode,
                fps
            )
        }
        None => format!("Spectating ball  Cam: {}  FPS: {:.0}", cam_mode, fps),
    }
}
