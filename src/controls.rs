// ============================================================================
// controls.rs
// The per-vehicle control vector and the pure synthesis functions that build
// it from keyboard intent state or a gamepad snapshot.
// ============================================================================

use crate::gamepad::GamepadSnapshot;
use crate::input::{Intent, PressedKeys};

/// The fixed control vector written into a simulated vehicle each tick.
/// Axis fields are clamped to [-1, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarControls {
    pub throttle: f32,
    pub steer: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub jump: bool,
    pub boost: bool,
    pub handbrake: bool,
}

impl Default for CarControls {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl CarControls {
    pub const NEUTRAL: Self = Self {
        throttle: 0.0,
        steer: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
        jump: false,
        boost: false,
        handbrake: false,
    };

    /// Clamp every axis into [-1, 1].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.throttle = self.throttle.clamp(-1.0, 1.0);
        self.steer = self.steer.clamp(-1.0, 1.0);
        self.pitch = self.pitch.clamp(-1.0, 1.0);
        self.yaw = self.yaw.clamp(-1.0, 1.0);
        self.roll = self.roll.clamp(-1.0, 1.0);
        self
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

fn digital_axis(keys: &PressedKeys, positive: Intent, negative: Intent) -> f32 {
    (keys.is_pressed(positive) as i8 - keys.is_pressed(negative) as i8) as f32
}

/// Synthesize controls from digital key state. Each axis is the difference
/// of two opposing booleans, so it lands on exactly -1, 0 or 1. Pitch mirrors
/// the throttle axis and yaw mirrors steer, matching in-air key behavior.
pub fn from_pressed(keys: &PressedKeys) -> CarControls {
    let throttle = digital_axis(keys, Intent::Forward, Intent::Backward);
    let steer = digital_axis(keys, Intent::Right, Intent::Left);
    let roll = digital_axis(keys, Intent::RollRight, Intent::RollLeft);

    CarControls {
        throttle,
        steer,
        pitch: -throttle,
        yaw: steer,
        roll,
        jump: keys.is_pressed(Intent::Jump),
        boost: keys.is_pressed(Intent::Boost),
        handbrake: keys.is_pressed(Intent::Powerslide),
    }
}

/// Synthesize controls from analog gamepad state. Stick and trigger values
/// pass through, clamped to [-1, 1]; bumpers act as a digital roll axis.
pub fn from_gamepad(pad: &GamepadSnapshot) -> CarControls {
    let throttle = pad.right_trigger - pad.left_trigger;
    let roll = (pad.right_bumper as i8 - pad.left_bumper as i8) as f32;

    CarControls {
        throttle,
        steer: pad.left_x,
        pitch: -pad.left_y,
        yaw: pad.left_x,
        roll,
        jump: pad.a,
        boost: pad.b,
        handbrake: pad.x,
    }
    .clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_covers_all_forward_backward_combinations() {
        for (forward, backward, expected) in [
            (false, false, 0.0),
            (true, false, 1.0),
            (false, true, -1.0),
            (true, true, 0.0),
        ] {
            let mut keys = PressedKeys::default();
            keys.set(Intent::Forward, forward);
            keys.set(Intent::Backward, backward);
            let controls = from_pressed(&keys);
            assert_eq!(controls.throttle, expected);
            assert_eq!(controls.pitch, -expected);
        }
    }

    #[test]
    fn steer_and_yaw_share_the_axis() {
        let mut keys = PressedKeys::default();
        keys.set(Intent::Right, true);
        let controls = from_pressed(&keys);
        assert_eq!(controls.steer, 1.0);
        assert_eq!(controls.yaw, 1.0);

        keys.set(Intent::Left, true);
        let controls = from_pressed(&keys);
        assert_eq!(controls.steer, 0.0);
    }

    #[test]
    fn roll_axis_from_opposing_keys() {
        let mut keys = PressedKeys::default();
        keys.set(Intent::RollLeft, true);
        assert_eq!(from_pressed(&keys).roll, -1.0);
        keys.set(Intent::RollRight, true);
        assert_eq!(from_pressed(&keys).roll, 0.0);
    }

    #[test]
    fn buttons_pass_through() {
        let mut keys = PressedKeys::default();
        keys.set(Intent::Jump, true);
        keys.set(Intent::Boost, true);
        keys.set(Intent::Powerslide, true);
        let controls = from_pressed(&keys);
        assert!(controls.jump && controls.boost && controls.handbrake);
    }

    #[test]
    fn neutral_keys_give_neutral_controls() {
        assert!(from_pressed(&PressedKeys::default()).is_neutral());
    }

    #[test]
    fn gamepad_axes_are_clamped() {
        let pad = GamepadSnapshot {
            left_x: 1.7,
            left_y: -2.0,
            right_trigger: 1.0,
            left_trigger: 0.0,
            ..GamepadSnapshot::default()
        };
        let controls = from_gamepad(&pad);
        assert_eq!(controls.steer, 1.0);
        assert_eq!(controls.pitch, 1.0);
        assert_eq!(controls.throttle, 1.0);
    }

    #[test]
    fn trigger_pair_maps_to_throttle() {
        let pad = GamepadSnapshot {
            left_trigger: 0.25,
            right_trigger: 0.75,
            ..GamepadSnapshot::default()
        };
        assert!((from_gamepad(&pad).throttle - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bumpers_form_the_roll_axis() {
        let pad = GamepadSnapshot {
            left_bumper: true,
            ..GamepadSnapshot::default()
        };
        assert_eq!(from_gamepad(&pad).roll, -1.0);
    }
}
