// ============================================================================
// viewer.rs
// The frame updater: drains queued input events, synthesizes the control
// vector, writes it into the simulation, optionally advances the simulation,
// reads entity state back into a FrameSnapshot and updates the camera.
// GPU-free so the whole control flow is unit-testable.
// ============================================================================

use glam::{Quat, Vec3};

use crate::camera::CameraState;
use crate::config::VizConfig;
use crate::controls::{self, CarControls};
use crate::gamepad::GamepadSnapshot;
use crate::input::{InputEvent, Intent, PressedKeys};
use crate::sim::{BallState, CarState, Simulation};

/// Runtime options mirroring the viewer's startup flags.
#[derive(Clone, Copy, Debug)]
pub struct ViewerOptions {
    /// Sub-steps to advance the simulation per viewer tick.
    pub tick_skip: u32,
    /// Whether the viewer owns stepping (standalone mode) or an external
    /// driver advances the simulation.
    pub step_arena: bool,
    /// Whether the synthesized controls overwrite the controlled car's slot.
    pub overwrite_controls: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            tick_skip: 2,
            step_arena: true,
            overwrite_controls: true,
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    pub ball: BallState,
    /// Accumulated ball orientation, integrated from angular velocity.
    pub ball_rotation: Quat,
    pub cars: Vec<CarState>,
    pub pads_active: Vec<bool>,
    pub car_index: usize,
    pub target_cam: bool,
}

/// Per-session viewer state: input, controls, camera, controlled car.
pub struct Viewer {
    pub pressed: PressedKeys,
    pub controls: CarControls,
    pub camera: CameraState,
    pub car_index: usize,
    options: ViewerOptions,
    ball_rotation: Quat,
}

impl Viewer {
    pub fn new(config: &VizConfig, options: ViewerOptions) -> Self {
        Self {
            pressed: PressedKeys::default(),
            controls: CarControls::NEUTRAL,
            camera: CameraState::from_config(&config.camera),
            car_index: 0,
            options,
            ball_rotation: Quat::IDENTITY,
        }
    }

    pub fn options(&self) -> ViewerOptions {
        self.options
    }

    /// Number of camera-target candidates: every car plus the ball, minus
    /// the controlled car. With no cars the ball is the only candidate.
    pub fn target_count(&self, car_count: usize) -> usize {
        if car_count == 0 {
            1
        } else {
            car_count
        }
    }

    /// Apply one queued input event. Discrete actions fire on press;
    /// everything else just updates the pressed map.
    pub fn handle_event(&mut self, event: InputEvent, sim: &mut dyn Simulation) {
        match event {
            InputEvent::FocusLost => {
                self.pressed.reset();
                self.controls = CarControls::NEUTRAL;
            }
            InputEvent::Pressed(intent) => match intent {
                Intent::SwitchCar => self.switch_car(sim),
                Intent::TargetCam => self.camera.toggle_target_cam(),
                Intent::CycleTargets => {
                    let candidates = self.target_count(sim.car_count());
                    self.camera.cycle_target(candidates);
                }
                _ => self.pressed.set(intent, true),
            },
            InputEvent::Released(intent) => self.pressed.set(intent, false),
        }
    }

    /// Advance to the next car. When controls are being overwritten the car
    /// being left gets a neutral control vector first, so it does not keep
    /// driving on stale input.
    pub fn switch_car(&mut self, sim: &mut dyn Simulation) {
        let car_count = sim.car_count();
        if car_count == 0 {
            return;
        }
        if self.options.overwrite_controls {
            sim.set_car_controls(self.car_index, CarControls::NEUTRAL);
        }
        self.car_index = (self.car_index + 1) % car_count;
    }

    /// Translate a gamepad snapshot pair into controls plus the rising-edge
    /// discrete actions (Y: target cam, Start: cycle targets, Back: switch).
    pub fn apply_gamepad(
        &mut self,
        current: GamepadSnapshot,
        previous: GamepadSnapshot,
        sim: &mut dyn Simulation,
    ) {
        self.controls = controls::from_gamepad(&current);
        if current.y && !previous.y {
            self.camera.toggle_target_cam();
        }
        if current.start && !previous.start {
            let candidates = self.target_count(sim.car_count());
            self.camera.cycle_target(candidates);
        }
        if current.back && !previous.back {
            self.switch_car(sim);
        }
    }

    /// Run one viewer tick: process `events`, synthesize controls from the
    /// pressed map (unless a gamepad already installed them via
    /// `apply_gamepad`), push controls into the simulation, step it, and
    /// read back the frame snapshot.
    pub fn tick<I>(&mut self, sim: &mut dyn Simulation, events: I, keyboard: bool) -> FrameSnapshot
    where
        I: IntoIterator<Item = InputEvent>,
    {
        for event in events {
            self.handle_event(event, sim);
        }
        if keyboard {
            self.controls = controls::from_pressed(&self.pressed);
        }

        if self.options.overwrite_controls && sim.car_count() > 0 {
            sim.set_car_controls(self.car_index, self.controls);
        }
        if self.options.step_arena {
            sim.step(self.options.tick_skip);
        }

        let snapshot = self.read_back(sim);
        self.update_camera(&snapshot);
        snapshot
    }

    fn read_back(&mut self, sim: &dyn Simulation) -> FrameSnapshot {
        let ball = sim.ball();

        // Integrate ball spin: axis-angle over the ticks just simulated.
        let ang_vel = ball.phys.ang_vel;
        let rate = ang_vel.length();
        if rate > 1e-6 {
            let angle = rate * self.options.tick_skip as f32 / sim.tick_rate();
            let spin = Quat::from_axis_angle(ang_vel / rate, angle);
            self.ball_rotation = (spin * self.ball_rotation).normalize();
        }

        let car_count = sim.car_count();
        if car_count > 0 {
            self.car_index %= car_count;
        }

        let cars: Vec<CarState> = (0..car_count).filter_map(|i| sim.car(i)).collect();
        let pads_active = (0..sim.boost_pads().len())
            .map(|i| sim.pad_is_active(i))
            .collect();

        FrameSnapshot {
            ball,
            ball_rotation: self.ball_rotation,
            cars,
            pads_active,
            car_index: self.car_index,
            target_cam: self.camera.target_cam,
        }
    }

    fn update_camera(&mut self, snapshot: &FrameSnapshot) {
        if snapshot.cars.is_empty() {
            // Nothing to drive; orbit the ball.
            self.camera.center = snapshot.ball.phys.pos + Vec3::new(0.0, 0.0, self.camera.height);
            if self.camera.target_cam {
                let target = snapshot.ball.phys.pos;
                self.camera.track_target(target);
            }
            return;
        }

        let car = &snapshot.cars[self.car_index.min(snapshot.cars.len() - 1)];
        self.camera.center = car.phys.pos + Vec3::new(0.0, 0.0, self.camera.height);

        if self.camera.target_cam {
            let target = self.target_position(snapshot);
            self.camera.track_target(target);
        } else {
            self.camera.follow_velocity(car.phys.vel);
        }
    }

    /// Resolve the tracked target: all cars except the controlled one, then
    /// the ball, indexed modulo the candidate count.
    fn target_position(&self, snapshot: &FrameSnapshot) -> Vec3 {
        let mut candidates: Vec<Vec3> = snapshot
            .cars
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.car_index)
            .map(|(_, car)| car.phys.pos)
            .collect();
        candidates.push(snapshot.ball.phys.pos);
        candidates[self.camera.target_index % candidates.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::demo::DemoArena;

    fn viewer() -> Viewer {
        Viewer::new(&VizConfig::default(), ViewerOptions::default())
    }

    #[test]
    fn focus_loss_resets_pressed_keys_and_controls() {
        let mut sim = DemoArena::new(2, 120);
        let mut viewer = viewer();

        viewer.handle_event(InputEvent::Pressed(Intent::Forward), &mut sim);
        viewer.handle_event(InputEvent::Pressed(Intent::Boost), &mut sim);
        viewer.tick(&mut sim, [], true);
        assert!(!viewer.controls.is_neutral());

        viewer.handle_event(InputEvent::FocusLost, &mut sim);
        assert!(!viewer.pressed.any_pressed());
        assert!(viewer.controls.is_neutral());
    }

    #[test]
    fn switch_car_neutralizes_the_abandoned_slot() {
        let mut sim = DemoArena::new(3, 120);
        let mut viewer = viewer();

        viewer.handle_event(InputEvent::Pressed(Intent::Forward), &mut sim);
        viewer.tick(&mut sim, [], true);
        assert_eq!(sim.car_controls(0).throttle, 1.0);

        viewer.handle_event(InputEvent::Pressed(Intent::SwitchCar), &mut sim);
        assert_eq!(viewer.car_index, 1);
        assert!(sim.car_controls(0).is_neutral());
    }

    #[test]
    fn switch_car_without_overwrite_leaves_the_slot_alone() {
        let mut sim = DemoArena::new(2, 120);
        let mut viewer = Viewer::new(
            &VizConfig::default(),
            ViewerOptions {
                overwrite_controls: false,
                ..ViewerOptions::default()
            },
        );
        sim.set_car_controls(
            0,
            CarControls {
                throttle: 1.0,
                ..CarControls::NEUTRAL
            },
        );
        viewer.switch_car(&mut sim);
        assert_eq!(sim.car_controls(0).throttle, 1.0);
    }

    #[test]
    fn switch_car_wraps_modulo_car_count() {
        let mut sim = DemoArena::new(2, 120);
        let mut viewer = viewer();
        viewer.switch_car(&mut sim);
        viewer.switch_car(&mut sim);
        assert_eq!(viewer.car_index, 0);
    }

    #[test]
    fn target_count_excludes_controlled_car_but_includes_ball() {
        let viewer = viewer();
        assert_eq!(viewer.target_count(3), 3); // 2 other cars + ball
        assert_eq!(viewer.target_count(0), 1); // just the ball
    }

    #[test]
    fn tick_without_step_leaves_simulation_untouched() {
        let mut sim = DemoArena::new(1, 120);
        let mut viewer = Viewer::new(
            &VizConfig::default(),
            ViewerOptions {
                step_arena: false,
                ..ViewerOptions::default()
            },
        );
        viewer.tick(&mut sim, [], true);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn tick_advances_by_tick_skip() {
        let mut sim = DemoArena::new(1, 120);
        let mut viewer = viewer();
        viewer.tick(&mut sim, [], true);
        assert_eq!(sim.tick_count(), viewer.options().tick_skip as u64);
    }

    #[test]
    fn snapshot_reports_all_entities() {
        let mut sim = DemoArena::new(4, 120);
        let mut viewer = viewer();
        let snapshot = viewer.tick(&mut sim, [], true);
        assert_eq!(snapshot.cars.len(), 4);
        assert_eq!(snapshot.pads_active.len(), 34);
    }

    #[test]
    fn gamepad_edges_fire_discrete_actions_once() {
        let mut sim = DemoArena::new(2, 120);
        let mut viewer = viewer();

        let pressed = GamepadSnapshot {
            y: true,
            ..GamepadSnapshot::default()
        };
        let idle = GamepadSnapshot::default();

        viewer.apply_gamepad(pressed, idle, &mut sim);
        assert!(viewer.camera.target_cam);
        // Held button must not re-toggle.
        viewer.apply_gamepad(pressed, pressed, &mut sim);
        assert!(viewer.camera.target_cam);
    }

    #[test]
    fn ball_rotation_accumulates_while_spinning() {
        let mut sim = DemoArena::new(0, 120);
        let mut viewer = viewer();
        let first = viewer.tick(&mut sim, [], true).ball_rotation;
        let second = viewer.tick(&mut sim, [], true).ball_rotation;
        assert!(first != Quat::IDENTITY);
        assert!(second != first);
    }
}
