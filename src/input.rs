//! Controller input owner
//!
//! [`ControllerInput`] is the object the rest of an application talks to.
//! It creates its provider exactly once, owns it for its whole lifetime and
//! drops it together with itself. Call [`ControllerInput::update`] once per
//! frame, then read the accessors.

use crate::config::ControllerInputConfig;
use crate::controller::factory::{create_controller_provider, ProviderFactory};
use crate::controller::provider::{ControllerProvider, ProviderKind};
use crate::controller::state::{
    ApiStatus, ButtonState, ConnectionState, ControllerButton, ControllerState, Quaternion, Vec2,
};
use tracing::{debug, info};

pub struct ControllerInput {
    config: ControllerInputConfig,
    provider: Box<dyn ControllerProvider>,
    state: ControllerState,
    paused: bool,
}

impl ControllerInput {
    /// Owner with the provider for the current build target
    pub fn new(config: ControllerInputConfig) -> Self {
        let provider = create_controller_provider(&config);
        Self::from_provider(config, provider)
    }

    pub fn with_factory(config: ControllerInputConfig, factory: &ProviderFactory) -> Self {
        let provider = factory.create(&config);
        Self::from_provider(config, provider)
    }

    fn from_provider(config: ControllerInputConfig, provider: Box<dyn ControllerProvider>) -> Self {
        info!("Controller input using {} provider", provider.kind());
        Self {
            config,
            provider,
            state: ControllerState::default(),
            paused: false,
        }
    }

    /// Reads a fresh state from the provider
    pub fn update(&mut self) -> &ControllerState {
        let previous = self.state.connection_state;
        self.provider.read_state(&mut self.state);
        if previous != self.state.connection_state {
            info!(
                "Controller connection state: {} -> {}",
                previous, self.state.connection_state
            );
        }
        &self.state
    }

    pub fn pause(&mut self) {
        if !self.paused {
            debug!("Pausing controller input");
            self.paused = true;
            self.provider.on_pause();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            debug!("Resuming controller input");
            self.paused = false;
            self.provider.on_resume();
        }
    }

    pub fn config(&self) -> &ControllerInputConfig {
        &self.config
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn supports_battery_status(&self) -> bool {
        self.provider.supports_battery_status()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.connection_state
    }

    pub fn api_status(&self) -> ApiStatus {
        self.state.api_status
    }

    pub fn orientation(&self) -> Quaternion {
        self.state.orientation
    }

    pub fn is_touching(&self) -> bool {
        self.state.is_touching
    }

    pub fn touch_pos(&self) -> Vec2 {
        self.state.touch_pos
    }

    pub fn button(&self, button: ControllerButton) -> ButtonState {
        self.state.button(button)
    }

    pub fn recentered(&self) -> bool {
        self.state.recentered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::emulator::EmulatorConnectionMode;
    use crate::controller::factory::BuildTarget;
    use crate::controller::shim::{NativeShim, ShimControllerState, ShimError, ShimLoader};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingShim {
        pauses: Arc<AtomicUsize>,
    }

    impl NativeShim for CountingShim {
        fn read_state(&mut self, out: &mut ShimControllerState) -> Result<(), ShimError> {
            *out = ShimControllerState {
                connection_state: 3,
                buttons: crate::controller::shim::SHIM_BUTTON_CLICK,
                ..Default::default()
            };
            Ok(())
        }

        fn pause(&mut self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn resume(&mut self) {}
    }

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        pauses: Arc<AtomicUsize>,
    }

    impl ShimLoader for CountingLoader {
        fn load(&self) -> Result<Box<dyn NativeShim>, ShimError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingShim {
                pauses: self.pauses.clone(),
            }))
        }
    }

    fn mobile_input() -> (ControllerInput, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let pauses = Arc::new(AtomicUsize::new(0));
        let factory = ProviderFactory::new(
            BuildTarget::Mobile,
            Box::new(CountingLoader {
                loads: loads.clone(),
                pauses: pauses.clone(),
            }),
        );
        let input = ControllerInput::with_factory(ControllerInputConfig::default(), &factory);
        (input, loads, pauses)
    }

    #[test]
    fn creates_exactly_one_provider() {
        let (mut input, loads, _pauses) = mobile_input();
        input.update();
        input.update();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(input.provider_kind(), ProviderKind::NativeShim);
        assert!(input.supports_battery_status());
    }

    #[test]
    fn update_exposes_provider_state() {
        let (mut input, _loads, _pauses) = mobile_input();
        assert_eq!(input.connection_state(), ConnectionState::Disconnected);

        input.update();
        assert_eq!(input.connection_state(), ConnectionState::Connected);
        assert!(input.button(ControllerButton::Click).down);

        input.update();
        assert!(input.button(ControllerButton::Click).pressed);
        assert!(!input.button(ControllerButton::Click).down);
    }

    #[test]
    fn repeated_pause_reaches_provider_once() {
        let (mut input, _loads, pauses) = mobile_input();
        input.pause();
        input.pause();
        input.resume();
        input.pause();
        assert_eq!(pauses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn editor_owner_passes_its_connection_mode() {
        let factory = ProviderFactory::new(
            BuildTarget::Editor,
            Box::new(crate::controller::shim::NoShimLoader),
        );
        let config = ControllerInputConfig {
            emulator_connection_mode: EmulatorConnectionMode::Off,
            ..Default::default()
        };
        let mut input = ControllerInput::with_factory(config, &factory);

        assert_eq!(input.provider_kind(), ProviderKind::Emulator);
        input.update();
        assert_eq!(input.connection_state(), ConnectionState::Disconnected);
        assert_eq!(input.api_status(), ApiStatus::Ok);
    }

    #[test]
    fn unsupported_owner_reports_unsupported_api() {
        let factory = ProviderFactory::new(
            BuildTarget::Unsupported,
            Box::new(crate::controller::shim::NoShimLoader),
        );
        let mut input = ControllerInput::with_factory(ControllerInputConfig::default(), &factory);
        input.update();
        assert_eq!(input.api_status(), ApiStatus::Unsupported);
        assert!(!input.is_touching());
    }
}
