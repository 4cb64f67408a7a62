//! Provider selection
//!
//! Picks the controller provider for the build target:
//!
//! | Target        | Provider                                            |
//! |---------------|-----------------------------------------------------|
//! | `Editor`      | emulator, with the owner's connection mode          |
//! | `Mobile`      | native shim if it loads, otherwise dummy + warning  |
//! | `Unsupported` | dummy + warning                                     |
//!
//! The target is fixed at compile time ([`BuildTarget::CURRENT`]); the shim
//! probe is the only runtime decision. The result is always a usable
//! provider.

use crate::config::ControllerInputConfig;
use crate::controller::dummy::DummyControllerProvider;
use crate::controller::emulator::{EmulatorControllerProvider, GamepadSettings};
use crate::controller::provider::ControllerProvider;
use crate::controller::shim::{NativeShimControllerProvider, ShimLoader};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTarget {
    /// Desktop editor build (`editor` feature)
    Editor,
    /// Mobile platform build (Android)
    Mobile,
    /// Anything else
    Unsupported,
}

impl BuildTarget {
    #[cfg(feature = "editor")]
    pub const CURRENT: BuildTarget = BuildTarget::Editor;

    #[cfg(all(not(feature = "editor"), target_os = "android"))]
    pub const CURRENT: BuildTarget = BuildTarget::Mobile;

    #[cfg(all(not(feature = "editor"), not(target_os = "android")))]
    pub const CURRENT: BuildTarget = BuildTarget::Unsupported;
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTarget::Editor => write!(f, "Editor"),
            BuildTarget::Mobile => write!(f, "Mobile"),
            BuildTarget::Unsupported => write!(f, "Unsupported"),
        }
    }
}

pub struct ProviderFactory {
    target: BuildTarget,
    shim_loader: Box<dyn ShimLoader>,
}

impl ProviderFactory {
    pub fn new(target: BuildTarget, shim_loader: Box<dyn ShimLoader>) -> Self {
        Self {
            target,
            shim_loader,
        }
    }

    /// Factory for the target this crate was compiled for
    pub fn for_current_build(owner: &ControllerInputConfig) -> Self {
        Self::new(BuildTarget::CURRENT, platform_shim_loader(owner))
    }

    pub fn target(&self) -> BuildTarget {
        self.target
    }

    /// Creates the provider for `owner`. Never fails; the dummy provider is
    /// the fallback for every unsupported case.
    pub fn create(&self, owner: &ControllerInputConfig) -> Box<dyn ControllerProvider> {
        match self.target {
            BuildTarget::Editor => {
                info!(
                    "Editor build, using emulator controller provider ({})",
                    owner.emulator_connection_mode
                );
                Box::new(EmulatorControllerProvider::new(
                    owner.emulator_connection_mode,
                    GamepadSettings::new(owner.stick_deadzone),
                ))
            }
            BuildTarget::Mobile => match self.shim_loader.load() {
                Ok(shim) => {
                    info!("Native controller shim available");
                    Box::new(NativeShimControllerProvider::new(shim))
                }
                Err(e) => {
                    warn!(
                        "Native controller shim not found ({}), creating dummy controller provider",
                        e
                    );
                    Box::new(DummyControllerProvider::new())
                }
            },
            BuildTarget::Unsupported => {
                warn!("No controller support on this platform");
                Box::new(DummyControllerProvider::new())
            }
        }
    }
}

impl fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Provider appropriate for the current build target
pub fn create_controller_provider(owner: &ControllerInputConfig) -> Box<dyn ControllerProvider> {
    ProviderFactory::for_current_build(owner).create(owner)
}

#[cfg(target_os = "android")]
fn platform_shim_loader(owner: &ControllerInputConfig) -> Box<dyn ShimLoader> {
    Box::new(crate::controller::shim::DynamicShimLoader::new(
        owner.shim_library.clone(),
    ))
}

#[cfg(not(target_os = "android"))]
fn platform_shim_loader(_owner: &ControllerInputConfig) -> Box<dyn ShimLoader> {
    Box::new(crate::controller::shim::NoShimLoader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::emulator::EmulatorConnectionMode;
    use crate::controller::provider::ProviderKind;
    use crate::controller::shim::NoShimLoader;

    fn config(mode: EmulatorConnectionMode) -> ControllerInputConfig {
        ControllerInputConfig {
            emulator_connection_mode: mode,
            ..Default::default()
        }
    }

    #[test]
    fn editor_target_carries_connection_mode() {
        let factory = ProviderFactory::new(BuildTarget::Editor, Box::new(NoShimLoader));
        for mode in [
            EmulatorConnectionMode::Off,
            EmulatorConnectionMode::Usb,
            EmulatorConnectionMode::Wifi,
        ] {
            let provider = factory.create(&config(mode));
            assert_eq!(provider.kind(), ProviderKind::Emulator);
            assert_eq!(provider.emulator_connection_mode(), Some(mode));
        }
    }

    #[test]
    fn unsupported_target_falls_back_to_dummy() {
        let factory = ProviderFactory::new(BuildTarget::Unsupported, Box::new(NoShimLoader));
        let provider = factory.create(&ControllerInputConfig::default());
        assert_eq!(provider.kind(), ProviderKind::Dummy);
        assert_eq!(provider.emulator_connection_mode(), None);
    }

    #[test]
    fn mobile_without_shim_falls_back_to_dummy() {
        let factory = ProviderFactory::new(BuildTarget::Mobile, Box::new(NoShimLoader));
        let provider = factory.create(&ControllerInputConfig::default());
        assert_eq!(provider.kind(), ProviderKind::Dummy);
    }

    #[cfg(not(any(feature = "editor", target_os = "android")))]
    #[test]
    fn host_build_is_unsupported() {
        assert_eq!(BuildTarget::CURRENT, BuildTarget::Unsupported);
        let provider = create_controller_provider(&ControllerInputConfig::default());
        assert_eq!(provider.kind(), ProviderKind::Dummy);
    }

    #[cfg(feature = "editor")]
    #[test]
    fn editor_build_selects_emulator() {
        assert_eq!(BuildTarget::CURRENT, BuildTarget::Editor);
        let provider = create_controller_provider(&config(EmulatorConnectionMode::Off));
        assert_eq!(provider.kind(), ProviderKind::Emulator);
    }
}
