// ============================================================================
// sim/mod.rs
// The seam to the physics engine: plain state snapshots and the query/command
// trait the viewer drives. The engine itself is a black box; anything that
// can answer these queries can be visualized.
// ============================================================================

pub mod demo;

use glam::Vec3;

use crate::controls::CarControls;

/// Which net a car defends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Team {
    Blue,
    Orange,
}

/// Euler orientation in radians: yaw about Z, pitch about Y, roll about X.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Angles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Rigid-body state common to the ball and cars.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhysState {
    pub pos: Vec3,
    pub vel: Vec3,
    pub ang_vel: Vec3,
    pub angles: Angles,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallState {
    pub phys: PhysState,
    pub radius: f32,
}

/// Hitbox extents and the offset of its center from the car origin, both in
/// the car's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hitbox {
    pub size: Vec3,
    pub offset: Vec3,
}

impl Hitbox {
    /// The Octane hitbox, the sensible default for a demo car.
    pub const OCTANE: Self = Self {
        size: Vec3::new(118.01, 84.2, 36.16),
        offset: Vec3::new(13.88, 0.0, 20.75),
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarState {
    pub phys: PhysState,
    pub team: Team,
    pub boost: f32,
    pub is_supersonic: bool,
    pub hitbox: Hitbox,
}

/// Static boost pad placement; the live active flag is queried separately.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostPad {
    pub pos: Vec3,
    pub is_big: bool,
}

/// Query/command surface of the external physics engine.
pub trait Simulation {
    /// Simulation ticks per second.
    fn tick_rate(&self) -> f32;

    /// Ticks simulated so far.
    fn tick_count(&self) -> u64;

    fn ball(&self) -> BallState;

    fn car_count(&self) -> usize;

    /// Snapshot of car `index`, or None past the end.
    fn car(&self, index: usize) -> Option<CarState>;

    fn boost_pads(&self) -> &[BoostPad];

    /// Whether pad `index` is currently active (not on pickup cooldown).
    fn pad_is_active(&self, index: usize) -> bool;

    /// Install the control vector consumed by car `index` each tick.
    fn set_car_controls(&mut self, index: usize, controls: CarControls);

    /// Read back the control vector last installed for car `index`.
    fn car_controls(&self, index: usize) -> CarControls;

    /// Advance the simulation by `ticks` sub-steps.
    fn step(&mut self, ticks: u32);
}
