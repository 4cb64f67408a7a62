//! Controller subsystem for VR hand-controller input
//!
//! Every platform supplies controller state through the same
//! [`ControllerProvider`] interface:
//!
//! 1. [`emulator`] - editor builds, input from an emulator link
//! 2. [`shim`] - mobile builds, input from the native platform shim
//! 3. [`dummy`] - inert fallback when neither is available
//!
//! [`factory`] picks one of them for the current build target.
//!
//! # Architecture
//!
//! ```text
//! ControllerInput ──► ProviderFactory ──► Box<dyn ControllerProvider>
//!   (owner)            (once, at init)      (owned by ControllerInput)
//! ```

pub mod dummy;
pub mod emulator;
pub mod factory;
pub mod provider;
pub mod shim;
pub mod state;

pub use dummy::DummyControllerProvider;
pub use emulator::{EmulatorConnectionMode, EmulatorControllerProvider};
pub use factory::{create_controller_provider, BuildTarget, ProviderFactory};
pub use provider::{ControllerProvider, ProviderKind};
pub use shim::{NativeShimControllerProvider, ShimLoader};
pub use state::{ConnectionState, ControllerButton, ControllerState};
