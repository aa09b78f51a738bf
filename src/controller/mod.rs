//! Touch input subsystem
//!
//! 1. [`joystick`] - Virtual joystick geometry and reporting
//! 2. [`touch_controls`] - Screen layout and per-touch routing
//! 3. [`controller_handle`] - Task that owns the controls and consumes touches
//!
//! # Architecture
//!
//! ```text
//! Touches ──► ControllerHandle ──► TouchControls ──► EngineBridge ──► EngineEvent
//!             (mpsc<TouchEvent>)   (joystick, buttons)
//! ```
//!
//! All control state is owned by a single task, so handlers run one event at
//! a time without locking.

pub mod controller_handle;
pub mod joystick;
pub mod touch_controls;

pub use controller_handle::{ControllerError, ControllerHandle};
pub use joystick::{JoystickError, JoystickListener, JoystickSettings, JoystickView, Tint};
pub use touch_controls::{ButtonKind, TouchButton, TouchControls, TouchEvent, TouchId};
