// ============================================================================
// gamepad.rs
// Gamepad polling via gilrs. Each tick produces a fixed snapshot of the
// sticks, triggers and buttons; the frame updater derives controls and
// rising-edge actions from the current/previous snapshot pair.
// ============================================================================

use gilrs::{Axis, Button, Gilrs};

/// One frame of gamepad state, independent of the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub left_x: f32,
    pub left_y: f32,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub start: bool,
    pub back: bool,
}

/// Owns the gilrs context and the last two snapshots.
pub struct GamepadInput {
    gilrs: Gilrs,
    current: GamepadSnapshot,
    previous: GamepadSnapshot,
}

impl GamepadInput {
    pub fn new() -> Result<Self, String> {
        let gilrs = Gilrs::new().map_err(|err| format!("gamepad init failed: {err}"))?;
        for (_, pad) in gilrs.gamepads() {
            log::info!("Gamepad connected: {}", pad.name());
        }
        Ok(Self {
            gilrs,
            current: GamepadSnapshot::default(),
            previous: GamepadSnapshot::default(),
        })
    }

    /// Drain pending gilrs events and refresh the snapshot from the first
    /// connected gamepad. With no gamepad attached everything reads neutral.
    pub fn poll(&mut self) -> GamepadSnapshot {
        while self.gilrs.next_event().is_some() {}

        self.previous = self.current;
        self.current = match self.gilrs.gamepads().next() {
            Some((_, pad)) => GamepadSnapshot {
                left_x: pad.value(Axis::LeftStickX),
                left_y: pad.value(Axis::LeftStickY),
                left_trigger: pad
                    .button_data(Button::LeftTrigger2)
                    .map_or(0.0, |d| d.value()),
                right_trigger: pad
                    .button_data(Button::RightTrigger2)
                    .map_or(0.0, |d| d.value()),
                a: pad.is_pressed(Button::South),
                b: pad.is_pressed(Button::East),
                x: pad.is_pressed(Button::West),
                y: pad.is_pressed(Button::North),
                left_bumper: pad.is_pressed(Button::LeftTrigger),
                right_bumper: pad.is_pressed(Button::RightTrigger),
                start: pad.is_pressed(Button::Start),
                back: pad.is_pressed(Button::Select),
            },
            None => GamepadSnapshot::default(),
        };
        self.current
    }

    pub fn current(&self) -> GamepadSnapshot {
        self.current
    }

    pub fn previous(&self) -> GamepadSnapshot {
        self.previous
    }
}
