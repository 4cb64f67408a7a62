//! Native platform shim provider
//!
//! On mobile builds controller data comes from a native shim library that
//! bridges the platform controller API. [`ShimLoader`] is the availability
//! probe: a successful load means the shim is present. The provider converts
//! the shim's C-layout snapshot into [`ControllerState`].

#[cfg(any(target_os = "android", target_os = "linux"))]
mod dynamic;

#[cfg(any(target_os = "android", target_os = "linux"))]
pub use dynamic::DynamicShimLoader;

use crate::controller::provider::{ControllerProvider, ProviderKind};
use crate::controller::state::{
    ApiStatus, BatteryLevel, ConnectionState, ControllerState, Quaternion, RawInput, Vec2, Vec3,
};
use tracing::{debug, error, info};

/// Library the shim is loaded from when nothing else is configured
pub const DEFAULT_SHIM_LIBRARY: &str = "libgvrunity.so";

pub const SHIM_BUTTON_CLICK: u32 = 1 << 0;
pub const SHIM_BUTTON_HOME: u32 = 1 << 1;
pub const SHIM_BUTTON_APP: u32 = 1 << 2;

/// Controller snapshot as laid out by the shim's C ABI
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShimControllerState {
    pub connection_state: i32,
    pub api_status: i32,
    pub orientation: [f32; 4],
    pub gyro: [f32; 3],
    pub accel: [f32; 3],
    pub is_touching: u8,
    pub touch_pos: [f32; 2],
    pub buttons: u32,
    pub recentered: u8,
    pub battery_level: i32,
    pub battery_charging: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    #[error("Shim library not found: {0}")]
    LibraryNotFound(String),

    #[error("Shim symbol missing: {0}")]
    MissingSymbol(String),

    #[error("Shim call failed with code {0}")]
    CallFailed(i32),
}

/// Bridge to the native controller API
pub trait NativeShim: Send {
    fn read_state(&mut self, out: &mut ShimControllerState) -> Result<(), ShimError>;

    fn pause(&mut self);

    fn resume(&mut self);
}

/// Availability probe and constructor for the native shim
pub trait ShimLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn NativeShim>, ShimError>;
}

/// Loader for platforms that never ship a shim
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShimLoader;

impl ShimLoader for NoShimLoader {
    fn load(&self) -> Result<Box<dyn NativeShim>, ShimError> {
        Err(ShimError::LibraryNotFound(
            "no native shim on this platform".to_string(),
        ))
    }
}

pub struct NativeShimControllerProvider {
    shim: Box<dyn NativeShim>,
    raw: ShimControllerState,
}

impl NativeShimControllerProvider {
    pub fn new(shim: Box<dyn NativeShim>) -> Self {
        info!("Creating native shim controller provider");
        Self {
            shim,
            raw: ShimControllerState::default(),
        }
    }
}

impl ControllerProvider for NativeShimControllerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NativeShim
    }

    fn supports_battery_status(&self) -> bool {
        true
    }

    fn read_state(&mut self, out: &mut ControllerState) {
        if let Err(e) = self.shim.read_state(&mut self.raw) {
            error!("Native shim read failed: {}", e);
            out.reset();
            out.connection_state = ConnectionState::Error;
            out.api_status = ApiStatus::Error;
            out.error_details = Some(e.to_string());
            return;
        }

        let connection_state = connection_state_from_raw(self.raw.connection_state);
        let connected = connection_state == ConnectionState::Connected;
        if !connected {
            debug!("Shim reports controller {}", connection_state);
            out.reset();
        }

        out.connection_state = connection_state;
        out.api_status = api_status_from_raw(self.raw.api_status);
        out.battery_level = battery_level_from_raw(self.raw.battery_level);
        out.battery_charging = self.raw.battery_charging != 0;
        out.error_details = None;

        if connected {
            out.apply_input(&raw_input(&self.raw));
        }
    }

    fn on_pause(&mut self) {
        debug!("Pausing native shim");
        self.shim.pause();
    }

    fn on_resume(&mut self) {
        debug!("Resuming native shim");
        self.shim.resume();
    }
}

fn raw_input(raw: &ShimControllerState) -> RawInput {
    let [x, y, z, w] = raw.orientation;
    RawInput {
        orientation: Quaternion { x, y, z, w },
        gyro: Vec3 {
            x: raw.gyro[0],
            y: raw.gyro[1],
            z: raw.gyro[2],
        },
        accel: Vec3 {
            x: raw.accel[0],
            y: raw.accel[1],
            z: raw.accel[2],
        },
        touch: (raw.is_touching != 0).then_some(Vec2 {
            x: raw.touch_pos[0],
            y: raw.touch_pos[1],
        }),
        click: raw.buttons & SHIM_BUTTON_CLICK != 0,
        app: raw.buttons & SHIM_BUTTON_APP != 0,
        home: raw.buttons & SHIM_BUTTON_HOME != 0,
        recentered: raw.recentered != 0,
    }
}

fn connection_state_from_raw(value: i32) -> ConnectionState {
    match value {
        0 => ConnectionState::Disconnected,
        1 => ConnectionState::Scanning,
        2 => ConnectionState::Connecting,
        3 => ConnectionState::Connected,
        _ => ConnectionState::Error,
    }
}

fn api_status_from_raw(value: i32) -> ApiStatus {
    match value {
        0 => ApiStatus::Ok,
        1 => ApiStatus::Unsupported,
        2 => ApiStatus::NotAuthorized,
        3 => ApiStatus::Unavailable,
        4 => ApiStatus::ServiceObsolete,
        5 => ApiStatus::ClientObsolete,
        6 => ApiStatus::Malfunction,
        _ => ApiStatus::Error,
    }
}

fn battery_level_from_raw(value: i32) -> BatteryLevel {
    match value {
        1 => BatteryLevel::CriticalLow,
        2 => BatteryLevel::Low,
        3 => BatteryLevel::Medium,
        4 => BatteryLevel::AlmostFull,
        5 => BatteryLevel::Full,
        _ => BatteryLevel::Unknown,
    }
}
