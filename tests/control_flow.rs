// ============================================================================
// control_flow.rs
// End-to-end tests over the public API: queued input events through control
// synthesis, simulation stepping and camera state, without a window or GPU.
// ============================================================================

use rocketviz::config::VizConfig;
use rocketviz::controls::CarControls;
use rocketviz::input::{InputEvent, InputQueue, Intent, KeyBindings};
use rocketviz::sim::demo::DemoArena;
use rocketviz::sim::Simulation;
use rocketviz::viewer::{Viewer, ViewerOptions};

fn viewer_with(options: ViewerOptions) -> Viewer {
    Viewer::new(&VizConfig::default(), options)
}

fn default_viewer() -> Viewer {
    viewer_with(ViewerOptions::default())
}

#[test]
fn held_forward_key_drives_the_controlled_car() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();
    let start = sim.car(0).unwrap().phys.pos;

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Forward)], true);
    // Key stays held; later ticks drain an empty queue.
    for _ in 0..120 {
        viewer.tick(&mut sim, [], true);
    }

    let car = sim.car(0).unwrap();
    assert_eq!(sim.car_controls(0).throttle, 1.0);
    assert!(
        car.phys.pos.distance(start) > 100.0,
        "car should have moved under throttle, got {:?} from {:?}",
        car.phys.pos,
        start
    );
}

#[test]
fn press_and_release_in_one_tick_ends_neutral() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();

    let events = [
        InputEvent::Pressed(Intent::Forward),
        InputEvent::Released(Intent::Forward),
    ];
    viewer.tick(&mut sim, events, true);
    assert!(sim.car_controls(0).is_neutral());
}

#[test]
fn opposing_keys_cancel_out() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();

    let events = [
        InputEvent::Pressed(Intent::Left),
        InputEvent::Pressed(Intent::Right),
    ];
    viewer.tick(&mut sim, events, true);
    let controls = sim.car_controls(0);
    assert_eq!(controls.steer, 0.0);
    assert_eq!(controls.yaw, 0.0);
}

#[test]
fn pitch_opposes_throttle_for_keyboard_input() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Forward)], true);
    let controls = sim.car_controls(0);
    assert_eq!(controls.throttle, 1.0);
    assert_eq!(controls.pitch, -1.0);
}

#[test]
fn boost_drains_while_held() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();
    let start_boost = sim.car(0).unwrap().boost;

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Boost)], true);
    for _ in 0..30 {
        viewer.tick(&mut sim, [], true);
    }
    assert!(sim.car(0).unwrap().boost < start_boost);
}

#[test]
fn switching_cars_moves_control_to_the_next_slot() {
    let mut sim = DemoArena::new(2, 120);
    let mut viewer = default_viewer();

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Forward)], true);
    assert_eq!(sim.car_controls(0).throttle, 1.0);

    // Switch while the key is still held: slot 0 is neutralized, slot 1
    // picks up the live controls on the same tick.
    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::SwitchCar)], true);
    assert!(sim.car_controls(0).is_neutral());
    assert_eq!(sim.car_controls(1).throttle, 1.0);
}

#[test]
fn spectate_mode_never_writes_controls() {
    let mut sim = DemoArena::new(2, 120);
    let mut viewer = viewer_with(ViewerOptions {
        overwrite_controls: false,
        ..ViewerOptions::default()
    });
    sim.set_car_controls(
        0,
        CarControls {
            steer: -1.0,
            ..CarControls::NEUTRAL
        },
    );

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Forward)], true);
    viewer.tick(&mut sim, [], true);

    let controls = sim.car_controls(0);
    assert_eq!(controls.steer, -1.0);
    assert_eq!(controls.throttle, 0.0);
}

#[test]
fn externally_stepped_simulation_is_not_advanced_by_the_viewer() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = viewer_with(ViewerOptions {
        step_arena: false,
        ..ViewerOptions::default()
    });

    viewer.tick(&mut sim, [], true);
    assert_eq!(sim.tick_count(), 0);

    // An external driver steps; the next frame reads the new state.
    sim.step(8);
    let snapshot = viewer.tick(&mut sim, [], true);
    assert_eq!(sim.tick_count(), 8);
    assert_eq!(snapshot.cars.len(), 1);
}

#[test]
fn focus_loss_stops_a_held_key() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Forward)], true);
    assert_eq!(sim.car_controls(0).throttle, 1.0);

    viewer.tick(&mut sim, [InputEvent::FocusLost], true);
    assert!(sim.car_controls(0).is_neutral());
}

#[test]
fn target_cam_toggle_is_reflected_in_the_snapshot() {
    let mut sim = DemoArena::new(2, 120);
    let mut viewer = default_viewer();

    let snapshot = viewer.tick(&mut sim, [InputEvent::Pressed(Intent::TargetCam)], true);
    assert!(snapshot.target_cam);
    let snapshot = viewer.tick(&mut sim, [InputEvent::Pressed(Intent::TargetCam)], true);
    assert!(!snapshot.target_cam);
}

#[test]
fn cycling_targets_wraps_around_the_candidates() {
    let mut sim = DemoArena::new(3, 120);
    let mut viewer = default_viewer();

    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::TargetCam)], true);
    // 2 other cars + ball = 3 candidates.
    for _ in 0..3 {
        viewer.tick(&mut sim, [InputEvent::Pressed(Intent::CycleTargets)], true);
    }
    assert_eq!(viewer.camera.target_index, 0);
}

#[test]
fn velocity_follow_keeps_heading_below_the_deadband() {
    let mut sim = DemoArena::new(1, 120);
    let mut viewer = default_viewer();
    viewer.camera.azimuth = 1.25;

    // Car sits still at kickoff, so the heading must not snap to zero.
    viewer.tick(&mut sim, [], true);
    assert_eq!(viewer.camera.azimuth, 1.25);
}

#[test]
fn queue_drains_once_per_tick() {
    let mut queue = InputQueue::default();
    queue.push(InputEvent::Pressed(Intent::Jump));
    queue.push(InputEvent::Released(Intent::Jump));

    let drained = queue.drain();
    assert_eq!(drained.len(), 2);
    assert!(queue.is_empty());
    assert!(queue.drain().is_empty());
}

#[test]
fn configured_bindings_feed_the_viewer() {
    use winit::keyboard::Key;

    let mut config = VizConfig::default();
    config.input.insert("k".into(), "JUMP".into());
    let bindings = KeyBindings::from_table(&config.input).unwrap();

    let key = Key::Character("k".into());
    assert_eq!(bindings.intent_for(&key), Some(Intent::Jump));

    let mut sim = DemoArena::new(1, 120);
    let mut viewer = Viewer::new(&config, ViewerOptions::default());
    viewer.tick(&mut sim, [InputEvent::Pressed(Intent::Jump)], true);
    assert!(sim.car_controls(0).jump);
}
