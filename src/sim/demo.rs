// ============================================================================
// sim/demo.rs
// DemoArena: a deliberately dumb kinematic stand-in for the real physics
// engine so the viewer runs standalone and the frame loop is testable.
// Ball under gravity with wall bounces, cars integrating throttle/steer on
// the ground plane, boost drain and pad pickup cooldowns. No suspension, no
// ball-car impulses, no aerial control.
// ============================================================================

use glam::Vec3;
use rand::Rng;

use super::{Angles, BallState, BoostPad, CarState, Hitbox, PhysState, Simulation, Team};
use crate::controls::CarControls;

// Soccar field extents, arena units.
const SIDE_WALL_X: f32 = 4096.0;
const BACK_WALL_Y: f32 = 5120.0;
const CEILING_Z: f32 = 2044.0;
const GRAVITY: f32 = 650.0;

pub const BALL_RADIUS: f32 = 91.25;
const BALL_RESTITUTION: f32 = 0.6;

const CAR_REST_Z: f32 = 17.0;
const THROTTLE_ACCEL: f32 = 1600.0;
const BOOST_ACCEL: f32 = 991.667;
const COAST_DECEL: f32 = 525.0;
const MAX_DRIVE_SPEED: f32 = 1410.0;
const MAX_BOOST_SPEED: f32 = 2300.0;
const SUPERSONIC_SPEED: f32 = 2200.0;
const STEER_RATE: f32 = 2.5;
const BOOST_DRAIN_PER_SEC: f32 = 33.3;
const KICKOFF_BOOST: f32 = 33.33;

const PAD_COOLDOWN_BIG: f32 = 10.0;
const PAD_COOLDOWN_SMALL: f32 = 4.0;
const PAD_RADIUS_BIG: f32 = 208.0;
const PAD_RADIUS_SMALL: f32 = 144.0;
const PAD_HEIGHT: f32 = 168.0;
const PAD_BOOST_SMALL: f32 = 12.0;

const BIG_PAD_XY: [(f32, f32); 6] = [
    (3584.0, 0.0),
    (-3584.0, 0.0),
    (3072.0, 4096.0),
    (3072.0, -4096.0),
    (-3072.0, 4096.0),
    (-3072.0, -4096.0),
];

// The y < 0 half plus the two midfield pads; mirrored across y for the rest.
const SMALL_PAD_XY_HALF: [(f32, f32); 13] = [
    (0.0, -4240.0),
    (-1792.0, -4184.0),
    (1792.0, -4184.0),
    (-940.0, -3308.0),
    (940.0, -3308.0),
    (0.0, -2816.0),
    (-3584.0, -2484.0),
    (3584.0, -2484.0),
    (-1788.0, -2300.0),
    (1788.0, -2300.0),
    (-2048.0, -1036.0),
    (0.0, -1024.0),
    (2048.0, -1036.0),
];

const SMALL_PAD_XY_MID: [(f32, f32); 2] = [(-1024.0, 0.0), (1024.0, 0.0)];

const KICKOFF_SPOTS: [(f32, f32, f32); 5] = [
    // (x, y, yaw) for the blue half; orange mirrors.
    (-2048.0, -2560.0, 0.25 * std::f32::consts::PI),
    (2048.0, -2560.0, 0.75 * std::f32::consts::PI),
    (-256.0, -3840.0, 0.5 * std::f32::consts::PI),
    (256.0, -3840.0, 0.5 * std::f32::consts::PI),
    (0.0, -4608.0, 0.5 * std::f32::consts::PI),
];

struct DemoCar {
    phys: PhysState,
    team: Team,
    boost: f32,
    speed: f32,
    controls: CarControls,
}

struct DemoPad {
    config: BoostPad,
    cooldown: f32,
}

/// Kinematic arena implementing the `Simulation` seam.
pub struct DemoArena {
    tick_rate: f32,
    tick_count: u64,
    ball: PhysState,
    cars: Vec<DemoCar>,
    pads: Vec<DemoPad>,
    pad_configs: Vec<BoostPad>,
}

impl DemoArena {
    pub fn new(car_count: usize, tick_rate: u32) -> Self {
        let mut rng = rand::thread_rng();

        let mut ball = PhysState {
            pos: Vec3::new(0.0, 0.0, BALL_RADIUS),
            ..PhysState::default()
        };
        // Send the ball off in a random direction so there is motion to watch.
        let heading: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed: f32 = rng.gen_range(600.0..1300.0);
        ball.vel = Vec3::new(heading.cos() * speed, heading.sin() * speed, 420.0);
        ball.ang_vel = Vec3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
        );

        let cars = (0..car_count)
            .map(|i| {
                let team = if i % 2 == 0 { Team::Blue } else { Team::Orange };
                let (x, y, yaw) = KICKOFF_SPOTS[(i / 2) % KICKOFF_SPOTS.len()];
                let mirror = if team == Team::Blue { 1.0 } else { -1.0 };
                DemoCar {
                    phys: PhysState {
                        pos: Vec3::new(x * mirror, y * mirror, CAR_REST_Z),
                        angles: Angles {
                            yaw: if team == Team::Blue {
                                yaw
                            } else {
                                yaw - std::f32::consts::PI
                            },
                            ..Angles::default()
                        },
                        ..PhysState::default()
                    },
                    team,
                    boost: KICKOFF_BOOST,
                    speed: 0.0,
                    controls: CarControls::NEUTRAL,
                }
            })
            .collect();

        let mut pad_configs = Vec::with_capacity(34);
        for (x, y) in BIG_PAD_XY {
            pad_configs.push(BoostPad {
                pos: Vec3::new(x, y, 73.0),
                is_big: true,
            });
        }
        for (x, y) in SMALL_PAD_XY_HALF {
            pad_configs.push(BoostPad {
                pos: Vec3::new(x, y, 70.0),
                is_big: false,
            });
            pad_configs.push(BoostPad {
                pos: Vec3::new(-x, -y, 70.0),
                is_big: false,
            });
        }
        for (x, y) in SMALL_PAD_XY_MID {
            pad_configs.push(BoostPad {
                pos: Vec3::new(x, y, 70.0),
                is_big: false,
            });
        }

        let pads = pad_configs
            .iter()
            .map(|&config| DemoPad {
                config,
                cooldown: 0.0,
            })
            .collect();

        Self {
            tick_rate: tick_rate.max(1) as f32,
            tick_count: 0,
            ball,
            cars,
            pads,
            pad_configs,
        }
    }

    fn step_ball(&mut self, dt: f32) {
        self.ball.vel.z -= GRAVITY * dt;
        self.ball.pos += self.ball.vel * dt;

        let bounds = Vec3::new(
            SIDE_WALL_X - BALL_RADIUS,
            BACK_WALL_Y - BALL_RADIUS,
            CEILING_Z - BALL_RADIUS,
        );
        for axis in 0..3 {
            let lo = if axis == 2 { BALL_RADIUS } else { -bounds[axis] };
            let hi = bounds[axis];
            if self.ball.pos[axis] < lo {
                self.ball.pos[axis] = lo;
                self.ball.vel[axis] = -self.ball.vel[axis] * BALL_RESTITUTION;
            } else if self.ball.pos[axis] > hi {
                self.ball.pos[axis] = hi;
                self.ball.vel[axis] = -self.ball.vel[axis] * BALL_RESTITUTION;
            }
        }
    }

    fn step_car(car: &mut DemoCar, dt: f32) {
        let controls = car.controls;
        let boosting = controls.boost && car.boost > 0.0;

        let mut accel = controls.throttle * THROTTLE_ACCEL;
        if boosting {
            accel += BOOST_ACCEL;
            car.boost = (car.boost - BOOST_DRAIN_PER_SEC * dt).max(0.0);
        }
        if controls.throttle == 0.0 && !boosting {
            // Coast toward rest instead of holding speed forever.
            let decel = COAST_DECEL * dt;
            car.speed -= car.speed.clamp(-decel, decel);
        }
        if !boosting && car.speed.abs() >= MAX_DRIVE_SPEED && accel.signum() == car.speed.signum() {
            // Throttle alone cannot push past drive speed.
            accel = 0.0;
        }

        car.speed += accel * dt;
        if boosting {
            car.speed = car.speed.clamp(-MAX_BOOST_SPEED, MAX_BOOST_SPEED);
        } else if car.speed.abs() > MAX_DRIVE_SPEED {
            // Bleed off speed gained while boosting.
            let excess = car.speed.abs() - MAX_DRIVE_SPEED;
            car.speed -= car.speed.signum() * excess.min(COAST_DECEL * dt);
        }

        // Steering authority scales with speed; handbrake loosens the rear.
        let speed_factor = (car.speed / MAX_DRIVE_SPEED).clamp(-1.0, 1.0);
        let handbrake_factor = if controls.handbrake { 1.5 } else { 1.0 };
        car.phys.angles.yaw -= controls.steer * STEER_RATE * speed_factor * handbrake_factor * dt;

        let (sin_yaw, cos_yaw) = car.phys.angles.yaw.sin_cos();
        car.phys.vel = Vec3::new(cos_yaw * car.speed, sin_yaw * car.speed, 0.0);
        car.phys.pos += car.phys.vel * dt;
        car.phys.pos.x = car.phys.pos.x.clamp(-SIDE_WALL_X + 60.0, SIDE_WALL_X - 60.0);
        car.phys.pos.y = car.phys.pos.y.clamp(-BACK_WALL_Y + 60.0, BACK_WALL_Y - 60.0);
        car.phys.pos.z = CAR_REST_Z;
        car.phys.ang_vel = Vec3::ZERO;
    }

    fn step_pads(&mut self, dt: f32) {
        for pad in &mut self.pads {
            if pad.cooldown > 0.0 {
                pad.cooldown = (pad.cooldown - dt).max(0.0);
                continue;
            }
            let (radius, cooldown) = if pad.config.is_big {
                (PAD_RADIUS_BIG, PAD_COOLDOWN_BIG)
            } else {
                (PAD_RADIUS_SMALL, PAD_COOLDOWN_SMALL)
            };
            for car in &mut self.cars {
                let rel = car.phys.pos - pad.config.pos;
                let in_cylinder =
                    rel.x * rel.x + rel.y * rel.y <= radius * radius && car.phys.pos.z <= PAD_HEIGHT;
                if in_cylinder && car.boost < 100.0 {
                    car.boost = if pad.config.is_big {
                        100.0
                    } else {
                        (car.boost + PAD_BOOST_SMALL).min(100.0)
                    };
                    pad.cooldown = cooldown;
                    break;
                }
            }
        }
    }
}

impl Simulation for DemoArena {
    fn tick_rate(&self) -> f32 {
        self.tick_rate
    }

    fn tick_count(&self) -> u64 {
        self.tick_count
    }

    fn ball(&self) -> BallState {
        BallState {
            phys: self.ball,
            radius: BALL_RADIUS,
        }
    }

    fn car_count(&self) -> usize {
        self.cars.len()
    }

    fn car(&self, index: usize) -> Option<CarState> {
        self.cars.get(index).map(|car| CarState {
            phys: car.phys,
            team: car.team,
            boost: car.boost,
            is_supersonic: car.speed.abs() >= SUPERSONIC_SPEED,
            hitbox: Hitbox::OCTANE,
        })
    }

    fn boost_pads(&self) -> &[BoostPad] {
        &self.pad_configs
    }

    fn pad_is_active(&self, index: usize) -> bool {
        self.pads.get(index).map_or(true, |pad| pad.cooldown <= 0.0)
    }

    fn set_car_controls(&mut self, index: usize, controls: CarControls) {
        if let Some(car) = self.cars.get_mut(index) {
            car.controls = controls.clamped();
        }
    }

    fn car_controls(&self, index: usize) -> CarControls {
        self.cars
            .get(index)
            .map_or(CarControls::NEUTRAL, |car| car.controls)
    }

    fn step(&mut self, ticks: u32) {
        let dt = 1.0 / self.tick_rate;
        for _ in 0..ticks {
            self.step_ball(dt);
            for car in &mut self.cars {
                Self::step_car(car, dt);
            }
            self.step_pads(dt);
            self.tick_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_advances_tick_count() {
        let mut arena = DemoArena::new(2, 120);
        arena.step(2);
        assert_eq!(arena.tick_count(), 2);
    }

    #[test]
    fn controls_round_trip_through_the_slot() {
        let mut arena = DemoArena::new(1, 120);
        let controls = CarControls {
            throttle: 1.0,
            boost: true,
            ..CarControls::NEUTRAL
        };
        arena.set_car_controls(0, controls);
        assert_eq!(arena.car_controls(0), controls);
    }

    #[test]
    fn installed_controls_are_clamped() {
        let mut arena = DemoArena::new(1, 120);
        arena.set_car_controls(
            0,
            CarControls {
                throttle: 5.0,
                steer: -3.0,
                ..CarControls::NEUTRAL
            },
        );
        let stored = arena.car_controls(0);
        assert_eq!(stored.throttle, 1.0);
        assert_eq!(stored.steer, -1.0);
    }

    #[test]
    fn ball_stays_inside_the_arena() {
        let mut arena = DemoArena::new(0, 120);
        arena.step(120 * 30);
        let pos = arena.ball().phys.pos;
        assert!(pos.x.abs() <= SIDE_WALL_X - BALL_RADIUS + 1.0);
        assert!(pos.y.abs() <= BACK_WALL_Y - BALL_RADIUS + 1.0);
        assert!(pos.z >= BALL_RADIUS - 1.0 && pos.z <= CEILING_Z);
    }

    #[test]
    fn throttle_moves_the_car_forward() {
        let mut arena = DemoArena::new(1, 120);
        let start = arena.car(0).unwrap().phys.pos;
        arena.set_car_controls(
            0,
            CarControls {
                throttle: 1.0,
                ..CarControls::NEUTRAL
            },
        );
        arena.step(120);
        let end = arena.car(0).unwrap().phys.pos;
        assert!((end - start).length() > 100.0);
    }

    #[test]
    fn boosting_drains_boost_and_goes_supersonic() {
        let mut arena = DemoArena::new(1, 120);
        arena.set_car_controls(
            0,
            CarControls {
                throttle: 1.0,
                boost: true,
                ..CarControls::NEUTRAL
            },
        );
        arena.step(120);
        let car = arena.car(0).unwrap();
        assert!(car.boost < KICKOFF_BOOST);
        assert!(car.is_supersonic);
    }

    #[test]
    fn standard_soccar_pad_layout() {
        let arena = DemoArena::new(0, 120);
        let pads = arena.boost_pads();
        assert_eq!(pads.len(), 34);
        assert_eq!(pads.iter().filter(|p| p.is_big).count(), 6);
        for (i, _) in pads.iter().enumerate() {
            assert!(arena.pad_is_active(i));
        }
    }

    #[test]
    fn pad_pickup_deactivates_and_respawns() {
        let mut arena = DemoArena::new(1, 120);
        // Park the car on the first big pad.
        let pad_pos = arena.boost_pads()[0].pos;
        arena.cars[0].phys.pos = Vec3::new(pad_pos.x, pad_pos.y, CAR_REST_Z);
        arena.cars[0].boost = 0.0;
        arena.step(1);
        assert!(!arena.pad_is_active(0));
        assert_eq!(arena.car(0).unwrap().boost, 100.0);

        // Move the car away and wait out the cooldown.
        arena.cars[0].phys.pos = Vec3::new(0.0, 0.0, CAR_REST_Z);
        arena.step((PAD_COOLDOWN_BIG * 120.0) as u32 + 2);
        assert!(arena.pad_is_active(0));
    }
}
