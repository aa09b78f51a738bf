//! Touch shell for a console-driven game engine.
//!
//! Turns raw multi-touch input into engine key and axis events through an
//! on-screen joystick and button set, and starts the engine with arguments
//! chosen in the menus.

pub mod config;
pub mod controller;
pub mod geometry;
pub mod launch;
pub mod mapping;
pub mod touch_script;
