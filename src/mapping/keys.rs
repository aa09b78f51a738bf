//! Key and axis codes understood by the engine, and the button table.

use crate::controller::touch_controls::ButtonKind;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Keycodes for non-printable keys are scancodes with this bit set.
const SCANCODE_MASK: i32 = 1 << 30;

const fn scancode_to_keycode(scancode: i32) -> i32 {
    scancode | SCANCODE_MASK
}

/// Keys the touch controls can emit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKey {
    Tab,
    Escape,
    Space,
    LeftBracket,
    RightBracket,
    /// Flashlight
    F,
    /// Quick save
    F5,
    /// Quick load
    F9,
    /// Attack
    RightCtrl,
}

impl EngineKey {
    /// Engine keycode for this key.
    pub const fn keycode(self) -> i32 {
        match self {
            EngineKey::Tab => 9,
            EngineKey::Escape => 27,
            EngineKey::Space => 32,
            EngineKey::LeftBracket => 91,
            EngineKey::RightBracket => 93,
            EngineKey::F => 102,
            EngineKey::F5 => scancode_to_keycode(62),
            EngineKey::F9 => scancode_to_keycode(66),
            EngineKey::RightCtrl => scancode_to_keycode(228),
        }
    }
}

impl Display for EngineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKey::Tab => write!(f, "Tab"),
            EngineKey::Escape => write!(f, "Escape"),
            EngineKey::Space => write!(f, "Space"),
            EngineKey::LeftBracket => write!(f, "["),
            EngineKey::RightBracket => write!(f, "]"),
            EngineKey::F => write!(f, "F"),
            EngineKey::F5 => write!(f, "F5"),
            EngineKey::F9 => write!(f, "F9"),
            EngineKey::RightCtrl => write!(f, "Right Ctrl"),
        }
    }
}

/// Analog controller axes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerAxis {
    LeftX,
    /// Forward/back movement
    LeftY,
    /// Turning
    RightX,
    RightY,
}

impl ControllerAxis {
    pub const fn index(self) -> u8 {
        match self {
            ControllerAxis::LeftX => 0,
            ControllerAxis::LeftY => 1,
            ControllerAxis::RightX => 2,
            ControllerAxis::RightY => 3,
        }
    }
}

/// What a touch button does when pressed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Press on touch down, release on touch up
    Key(EngineKey),
    /// One wheel step on touch down, nothing on release
    Wheel(i32),
    /// Shows or hides the secondary button stack
    ToggleStack,
}

/// Button table for the in-game controls.
pub const fn action_for(kind: ButtonKind) -> ButtonAction {
    match kind {
        ButtonKind::Fire => ButtonAction::Key(EngineKey::RightCtrl),
        ButtonKind::Jump => ButtonAction::Key(EngineKey::Space),
        ButtonKind::Escape => ButtonAction::Key(EngineKey::Escape),
        ButtonKind::QuickSave => ButtonAction::Key(EngineKey::F5),
        ButtonKind::QuickLoad => ButtonAction::Key(EngineKey::F9),
        ButtonKind::Flashlight => ButtonAction::Key(EngineKey::F),
        ButtonKind::Pda => ButtonAction::Key(EngineKey::Tab),
        ButtonKind::PrevWeapon => ButtonAction::Key(EngineKey::LeftBracket),
        ButtonKind::NextWeapon => ButtonAction::Wheel(1),
        ButtonKind::Expand => ButtonAction::ToggleStack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_keys_use_ascii() {
        assert_eq!(EngineKey::Space.keycode(), b' ' as i32);
        assert_eq!(EngineKey::F.keycode(), b'f' as i32);
        assert_eq!(EngineKey::LeftBracket.keycode(), b'[' as i32);
    }

    #[test]
    fn function_keys_are_masked_scancodes() {
        assert_eq!(EngineKey::F5.keycode(), 0x4000_003E);
        assert_eq!(EngineKey::F9.keycode(), 0x4000_0042);
        assert_eq!(EngineKey::RightCtrl.keycode(), 0x4000_00E4);
    }

    #[test]
    fn button_table() {
        assert_eq!(
            action_for(ButtonKind::Fire),
            ButtonAction::Key(EngineKey::RightCtrl)
        );
        assert_eq!(action_for(ButtonKind::NextWeapon), ButtonAction::Wheel(1));
        assert_eq!(action_for(ButtonKind::Expand), ButtonAction::ToggleStack);
    }
}
