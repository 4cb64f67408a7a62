//! Controller state snapshot shared by every provider
//!
//! A provider fills a [`ControllerState`] once per frame. Button and touch
//! edges (`down`/`up`) are only true for the single frame in which the
//! transition happened; [`ControllerState::apply_input`] derives them from
//! the previous frame so every provider reports edges the same way.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rotation quaternion, `w` last
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds a rotation from yaw (around Y) and pitch (around X), in radians.
    /// Yaw is applied first.
    pub fn from_yaw_pitch(yaw: f32, pitch: f32) -> Self {
        let (sy, cy) = (yaw * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        Self {
            x: cy * sp,
            y: sy * cp,
            z: -sy * sp,
            w: cy * cp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Scanning,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Scanning => write!(f, "Scanning"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Error => write!(f, "Error"),
        }
    }
}

/// Status of the underlying controller API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiStatus {
    #[default]
    Ok,
    Unsupported,
    NotAuthorized,
    Unavailable,
    ServiceObsolete,
    ClientObsolete,
    Malfunction,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatteryLevel {
    #[default]
    Unknown,
    CriticalLow,
    Low,
    Medium,
    AlmostFull,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerButton {
    Click,
    App,
    Home,
}

/// Per-button state for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub down: bool,
    pub up: bool,
}

impl ButtonState {
    fn advance(&mut self, pressed: bool) {
        self.down = pressed && !self.pressed;
        self.up = !pressed && self.pressed;
        self.pressed = pressed;
    }

    fn clear_edges(&mut self) {
        self.down = false;
        self.up = false;
    }
}

/// Level readings a provider collected for one frame, before edge derivation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawInput {
    pub orientation: Quaternion,
    pub gyro: Vec3,
    pub accel: Vec3,
    pub touch: Option<Vec2>,
    pub click: bool,
    pub app: bool,
    pub home: bool,
    pub recentered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    pub connection_state: ConnectionState,
    pub api_status: ApiStatus,

    pub orientation: Quaternion,
    pub gyro: Vec3,
    pub accel: Vec3,

    pub is_touching: bool,
    pub touch_pos: Vec2,
    pub touch_down: bool,
    pub touch_up: bool,

    pub click_button: ButtonState,
    pub app_button: ButtonState,
    pub home_button: ButtonState,

    pub recentered: bool,

    pub battery_level: BatteryLevel,
    pub battery_charging: bool,

    pub error_details: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            connection_state: ConnectionState::Disconnected,
            api_status: ApiStatus::Ok,
            orientation: Quaternion::IDENTITY,
            gyro: Vec3::default(),
            accel: Vec3::default(),
            is_touching: false,
            touch_pos: Vec2::default(),
            touch_down: false,
            touch_up: false,
            click_button: ButtonState::default(),
            app_button: ButtonState::default(),
            home_button: ButtonState::default(),
            recentered: false,
            battery_level: BatteryLevel::Unknown,
            battery_charging: false,
            error_details: None,
            timestamp: Local::now(),
        }
    }
}

impl ControllerState {
    pub fn button(&self, button: ControllerButton) -> ButtonState {
        match button {
            ControllerButton::Click => self.click_button,
            ControllerButton::App => self.app_button,
            ControllerButton::Home => self.home_button,
        }
    }

    /// Applies this frame's readings, deriving down/up edges against the
    /// previous frame held in `self`.
    pub fn apply_input(&mut self, input: &RawInput) {
        self.orientation = input.orientation;
        self.gyro = input.gyro;
        self.accel = input.accel;

        let touching = input.touch.is_some();
        self.touch_down = touching && !self.is_touching;
        self.touch_up = !touching && self.is_touching;
        self.is_touching = touching;
        if let Some(pos) = input.touch {
            self.touch_pos = pos;
        }

        self.click_button.advance(input.click);
        self.app_button.advance(input.app);
        self.home_button.advance(input.home);
        self.recentered = input.recentered;
        self.timestamp = Local::now();
    }

    /// Drops all single-frame flags while keeping the level readings.
    pub fn clear_transients(&mut self) {
        self.touch_down = false;
        self.touch_up = false;
        self.click_button.clear_edges();
        self.app_button.clear_edges();
        self.home_button.clear_edges();
        self.recentered = false;
    }

    /// Resets the snapshot to "no controller", keeping only the timestamp fresh.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
