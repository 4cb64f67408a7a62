//! Capability interface implemented by every controller provider.

use crate::controller::emulator::EmulatorConnectionMode;
use crate::controller::state::ControllerState;
use std::fmt::{self, Display};

/// The interchangeable provider implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Development-time provider driven by an emulator link
    Emulator,

    /// Provider backed by the native platform shim
    NativeShim,

    /// Inert fallback
    Dummy,
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Emulator => write!(f, "Emulator"),
            ProviderKind::NativeShim => write!(f, "NativeShim"),
            ProviderKind::Dummy => write!(f, "Dummy"),
        }
    }
}

/// Supplies controller input state to the owning input system
///
/// Providers never fail outward: problems with the underlying device or
/// library are reported through the connection state and API status of the
/// snapshot they fill in.
pub trait ControllerProvider: Send {
    /// Which implementation this is
    fn kind(&self) -> ProviderKind;

    /// Whether `battery_level` / `battery_charging` carry real data
    fn supports_battery_status(&self) -> bool;

    /// Writes the current controller state into `out`
    ///
    /// `out` holds the previous frame, which providers use to derive
    /// single-frame edges.
    fn read_state(&mut self, out: &mut ControllerState);

    /// The owner is pausing; stop consuming the device
    fn on_pause(&mut self);

    /// The owner resumed after a pause
    fn on_resume(&mut self);

    /// Connection mode the provider was configured with, for emulator providers
    fn emulator_connection_mode(&self) -> Option<EmulatorConnectionMode> {
        None
    }
}
