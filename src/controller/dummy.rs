use crate::controller::provider::{ControllerProvider, ProviderKind};
use crate::controller::state::{ApiStatus, ConnectionState, ControllerState};
use tracing::debug;

/// Provider used when no controller support exists on this platform.
///
/// Always reports a disconnected controller with an unsupported API.
#[derive(Debug, Default)]
pub struct DummyControllerProvider;

impl DummyControllerProvider {
    pub fn new() -> Self {
        debug!("Creating dummy controller provider");
        Self
    }
}

impl ControllerProvider for DummyControllerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dummy
    }

    fn supports_battery_status(&self) -> bool {
        false
    }

    fn read_state(&mut self, out: &mut ControllerState) {
        out.reset();
        out.connection_state = ConnectionState::Disconnected;
        out.api_status = ApiStatus::Unsupported;
    }

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::state::{Quaternion, RawInput};

    #[test]
    fn reports_unsupported_and_disconnected() {
        let mut provider = DummyControllerProvider::new();
        let mut state = ControllerState::default();
        state.apply_input(&RawInput {
            click: true,
            ..Default::default()
        });
        state.connection_state = ConnectionState::Connected;

        provider.read_state(&mut state);

        assert_eq!(state.connection_state, ConnectionState::Disconnected);
        assert_eq!(state.api_status, ApiStatus::Unsupported);
        assert_eq!(state.orientation, Quaternion::IDENTITY);
        assert!(!state.click_button.pressed);
        assert!(!provider.supports_battery_status());
    }
}
