//! Translation of touch input into engine input events.
//!
//! Touch buttons map 1:1 onto key presses and releases, the joystick's axis
//! output maps onto analog controller axes. The resulting [`EngineEvent`]s
//! are pushed into a channel drained by whatever forwards them to the engine.
//!
//! ```text
//! TouchControls ──► EngineBridge ──► mpsc<EngineEvent> ──► engine
//!  (buttons, joystick)  (keys, axes)
//! ```

pub mod engine_bridge;
pub mod error;
pub mod keys;

pub use engine_bridge::EngineBridge;
pub use error::MappingError;
pub use keys::{action_for, ButtonAction, ControllerAxis, EngineKey};

/// Input event delivered to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Key press or release
    Key { key: EngineKey, pressed: bool },

    /// Absolute analog axis position
    Axis { axis: ControllerAxis, value: i16 },

    /// Mouse wheel step, positive is away from the user
    MouseWheel { y: i32 },
}
