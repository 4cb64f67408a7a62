//! Emulator controller provider
//!
//! Used in editor builds. Controller input comes from an emulator link
//! instead of real hardware; the owner's [`EmulatorConnectionMode`] decides
//! whether that link is opened at all.
//!
//! ```text
//! EmulatorSource ──[EmulatorEvent]──► EmulatorControllerProvider ──► ControllerState
//! (host gamepad)     (drained per frame)
//! ```
//!
//! The source is opened lazily on the first read so constructing the
//! provider never touches a device.

pub mod gamepad;

use crate::controller::provider::{ControllerProvider, ProviderKind};
use crate::controller::state::{
    ApiStatus, ConnectionState, ControllerButton, ControllerState, Quaternion, RawInput, Vec2,
    Vec3,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

pub use gamepad::{GamepadSettings, GamepadSource};

/// How the editor reaches the controller emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulatorConnectionMode {
    /// Emulator disabled
    Off,
    /// Companion device attached by cable
    #[default]
    Usb,
    /// Companion device on the wireless link
    Wifi,
}

impl fmt::Display for EmulatorConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorConnectionMode::Off => write!(f, "off"),
            EmulatorConnectionMode::Usb => write!(f, "usb"),
            EmulatorConnectionMode::Wifi => write!(f, "wifi"),
        }
    }
}

/// Input delivered by an emulator link
#[derive(Debug, Clone, PartialEq)]
pub enum EmulatorEvent {
    LinkUp,
    LinkDown,
    Orientation(Quaternion),
    Gyro(Vec3),
    Accel(Vec3),
    /// New touch position, or `None` when the finger left the touchpad
    Touch(Option<Vec2>),
    Button {
        button: ControllerButton,
        pressed: bool,
    },
    Recenter,
}

#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    #[error("Failed to initialize emulator link: {0}")]
    InitializationError(String),
}

/// Non-blocking event source behind the emulator provider
pub trait EmulatorSource: Send {
    /// Next pending event, `None` once the queue is drained for this frame
    fn poll_event(&mut self) -> Option<EmulatorEvent>;
}

type SourceOpener = Box<dyn FnMut() -> Result<Box<dyn EmulatorSource>, EmulatorError> + Send>;

pub struct EmulatorControllerProvider {
    mode: EmulatorConnectionMode,
    opener: SourceOpener,
    source: Option<Box<dyn EmulatorSource>>,
    open_error: Option<String>,
    linked: bool,
    paused: bool,
    input: RawInput,
}

impl fmt::Debug for EmulatorControllerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatorControllerProvider")
            .field("mode", &self.mode)
            .field("source_open", &self.source.is_some())
            .field("open_error", &self.open_error)
            .field("linked", &self.linked)
            .field("paused", &self.paused)
            .finish()
    }
}

impl EmulatorControllerProvider {
    /// Provider reading a host gamepad once the link is needed
    pub fn new(mode: EmulatorConnectionMode, settings: GamepadSettings) -> Self {
        Self::with_source_opener(mode, move || {
            GamepadSource::open(settings.clone()).map(|s| Box::new(s) as Box<dyn EmulatorSource>)
        })
    }

    /// Provider reading from a caller-supplied source
    pub fn with_source_opener<F>(mode: EmulatorConnectionMode, opener: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn EmulatorSource>, EmulatorError> + Send + 'static,
    {
        info!("Creating emulator controller provider, connection mode: {}", mode);
        Self {
            mode,
            opener: Box::new(opener),
            source: None,
            open_error: None,
            linked: false,
            paused: false,
            input: RawInput::default(),
        }
    }

    pub fn connection_mode(&self) -> EmulatorConnectionMode {
        self.mode
    }

    fn ensure_source(&mut self) {
        if self.source.is_some() || self.open_error.is_some() {
            return;
        }
        match (self.opener)() {
            Ok(source) => {
                info!("Emulator link opened over {}", self.mode);
                self.source = Some(source);
            }
            Err(e) => {
                error!("Failed to open emulator link over {}: {}", self.mode, e);
                self.open_error = Some(e.to_string());
            }
        }
    }

    fn handle_event(&mut self, event: EmulatorEvent) {
        debug!("Emulator event: {:?}", event);
        match event {
            EmulatorEvent::LinkUp => {
                info!("Emulator controller connected");
                self.linked = true;
            }
            EmulatorEvent::LinkDown => {
                warn!("Emulator controller disconnected");
                self.linked = false;
                self.input = RawInput::default();
            }
            EmulatorEvent::Orientation(q) => self.input.orientation = q,
            EmulatorEvent::Gyro(g) => self.input.gyro = g,
            EmulatorEvent::Accel(a) => self.input.accel = a,
            EmulatorEvent::Touch(pos) => self.input.touch = pos,
            EmulatorEvent::Button { button, pressed } => match button {
                ControllerButton::Click => self.input.click = pressed,
                ControllerButton::App => self.input.app = pressed,
                ControllerButton::Home => self.input.home = pressed,
            },
            EmulatorEvent::Recenter => {
                self.input.recentered = true;
                self.input.orientation = Quaternion::IDENTITY;
            }
        }
    }
}

impl ControllerProvider for EmulatorControllerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Emulator
    }

    fn supports_battery_status(&self) -> bool {
        false
    }

    fn read_state(&mut self, out: &mut ControllerState) {
        if self.mode == EmulatorConnectionMode::Off {
            out.reset();
            return;
        }

        if self.paused {
            out.clear_transients();
            return;
        }

        self.ensure_source();
        if let Some(details) = &self.open_error {
            out.reset();
            out.connection_state = ConnectionState::Error;
            out.api_status = ApiStatus::Unavailable;
            out.error_details = Some(details.clone());
            return;
        }

        self.input.recentered = false;
        while let Some(event) = self.source.as_mut().and_then(|s| s.poll_event()) {
            self.handle_event(event);
        }

        if self.linked {
            out.connection_state = ConnectionState::Connected;
            out.api_status = ApiStatus::Ok;
            out.error_details = None;
            out.apply_input(&self.input);
        } else {
            out.reset();
            out.connection_state = ConnectionState::Connecting;
        }
    }

    fn on_pause(&mut self) {
        debug!("Emulator provider paused");
        self.paused = true;
    }

    fn on_resume(&mut self) {
        debug!("Emulator provider resumed");
        self.paused = false;
        // a failed link gets another attempt after resume
        self.open_error = None;
    }

    fn emulator_connection_mode(&self) -> Option<EmulatorConnectionMode> {
        Some(self.mode)
    }
}
