//! VR hand-controller input
//!
//! Selects a controller provider for the build target and exposes the
//! controller state through [`ControllerInput`].

pub mod config;
pub mod controller;
pub mod input;

pub use config::ControllerInputConfig;
pub use input::ControllerInput;
