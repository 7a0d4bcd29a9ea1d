// ============================================================================
// input.rs
// Control intents, the key-binding table built once at startup, per-intent
// pressed state, and the input event queue drained by the frame updater.
// ============================================================================

use std::collections::HashMap;

use winit::keyboard::{Key, NamedKey};

/// Named control intents a key or button can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    Forward,
    Backward,
    Left,
    Right,
    RollLeft,
    RollRight,
    Jump,
    Boost,
    Powerslide,
    SwitchCar,
    TargetCam,
    CycleTargets,
}

impl Intent {
    pub const COUNT: usize = 12;

    pub const ALL: [Intent; Intent::COUNT] = [
        Intent::Forward,
        Intent::Backward,
        Intent::Left,
        Intent::Right,
        Intent::RollLeft,
        Intent::RollRight,
        Intent::Jump,
        Intent::Boost,
        Intent::Powerslide,
        Intent::SwitchCar,
        Intent::TargetCam,
        Intent::CycleTargets,
    ];

    /// Parse the intent name used in the config binding table.
    pub fn from_name(name: &str) -> Option<Intent> {
        Some(match name {
            "FORWARD" => Intent::Forward,
            "BACKWARD" => Intent::Backward,
            "LEFT" => Intent::Left,
            "RIGHT" => Intent::Right,
            "ROLL_LEFT" => Intent::RollLeft,
            "ROLL_RIGHT" => Intent::RollRight,
            "JUMP" => Intent::Jump,
            "BOOST" => Intent::Boost,
            "POWERSLIDE" => Intent::Powerslide,
            "SWITCH_CAR" => Intent::SwitchCar,
            "TARGET_CAM" => Intent::TargetCam,
            "CYCLE_TARGETS" => Intent::CycleTargets,
            _ => return None,
        })
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&i| i == self).unwrap_or(0)
    }
}

/// Immutable key-name to intent mapping, owned by the input layer.
/// Built once from the config table; no ambient global lookup.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<String, Intent>,
}

impl KeyBindings {
    /// Build bindings from a config table of key name -> intent name.
    /// Key names are matched case-insensitively. An unknown intent name is
    /// a configuration error; unknown keys at runtime are simply unbound.
    pub fn from_table(table: &HashMap<String, String>) -> Result<Self, String> {
        let mut map = HashMap::with_capacity(table.len());
        for (key, intent_name) in table {
            let intent = Intent::from_name(intent_name)
                .ok_or_else(|| format!("unknown intent '{intent_name}' bound to key '{key}'"))?;
            map.insert(key.to_lowercase(), intent);
        }
        Ok(Self { map })
    }

    /// Look up the intent bound to a winit logical key, if any.
    pub fn intent_for(&self, key: &Key) -> Option<Intent> {
        let name = key_name(key)?;
        self.map.get(&name).copied()
    }
}

/// Stable lowercase name for a logical key, or None for keys we never bind.
fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(c) => Some(c.to_lowercase()),
        Key::Named(named) => {
            let name = match named {
                NamedKey::Space => "space",
                NamedKey::Shift => "shift",
                NamedKey::Control => "control",
                NamedKey::Alt => "alt",
                NamedKey::Tab => "tab",
                NamedKey::Enter => "enter",
                NamedKey::Backspace => "backspace",
                NamedKey::ArrowUp => "up",
                NamedKey::ArrowDown => "down",
                NamedKey::ArrowLeft => "left",
                NamedKey::ArrowRight => "right",
                _ => return None,
            };
            Some(name.to_string())
        }
        _ => None,
    }
}

/// Pressed/released state for every intent.
#[derive(Debug, Default, Clone)]
pub struct PressedKeys {
    flags: [bool; Intent::COUNT],
}

impl PressedKeys {
    pub fn set(&mut self, intent: Intent, pressed: bool) {
        self.flags[intent.index()] = pressed;
    }

    pub fn is_pressed(&self, intent: Intent) -> bool {
        self.flags[intent.index()]
    }

    /// Release everything, e.g. on focus loss.
    pub fn reset(&mut self) {
        self.flags = [false; Intent::COUNT];
    }

    pub fn any_pressed(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }
}

/// An input event forwarded from the window callbacks into the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Pressed(Intent),
    Released(Intent),
    FocusLost,
}

/// Queue filled by window callbacks and drained synchronously each tick.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
