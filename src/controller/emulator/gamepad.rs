//! Host gamepad as emulator link
//!
//! Reads a gamepad through gilrs and turns its input into [`EmulatorEvent`]s:
//!
//! - left stick: controller orientation (yaw / pitch)
//! - right stick: touchpad position, touching outside the deadzone
//! - South / East / Mode: click / app / home button
//! - Start: recenter
//!
//! The link is a two-state machine. While `Searching` it waits for a gamepad
//! to show up; once `Linked` it only forwards events of that gamepad and
//! falls back to `Searching` when the gamepad disconnects.

use super::{EmulatorError, EmulatorEvent, EmulatorSource};
use crate::controller::state::{ControllerButton, Quaternion, Vec2};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

/// Maximum yaw reached at full left-stick deflection, in radians
const MAX_YAW: f32 = std::f32::consts::FRAC_PI_2;
/// Maximum pitch reached at full left-stick deflection, in radians
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_3;

/// Largest accepted stick deadzone; above it the stick has no usable travel
pub const MAX_STICK_DEADZONE: f32 = 0.95;

#[derive(Clone, Debug)]
pub struct GamepadSettings {
    pub stick_deadzone: f32,
}

impl Default for GamepadSettings {
    fn default() -> Self {
        Self {
            stick_deadzone: 0.05,
        }
    }
}

impl GamepadSettings {
    /// Settings with the deadzone clamped to `0.0..=MAX_STICK_DEADZONE`
    pub fn new(stick_deadzone: f32) -> Self {
        let clamped = if stick_deadzone.is_nan() {
            Self::default().stick_deadzone
        } else {
            stick_deadzone.clamp(0.0, MAX_STICK_DEADZONE)
        };
        if clamped != stick_deadzone {
            warn!(
                "Stick deadzone {} out of range, using {}",
                stick_deadzone, clamped
            );
        }
        Self {
            stick_deadzone: clamped,
        }
    }
}

/// Last stick values after deadzone
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StickState {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
}

#[state]
#[derive(Debug, Clone)]
pub enum LinkState {
    Searching,
    Linked,
}

#[machine]
#[derive(Debug)]
pub struct GamepadLink<S: LinkState> {
    gilrs: Gilrs,

    // Gamepad the link is bound to
    active_gamepad: Option<GamepadId>,

    settings: GamepadSettings,

    sticks: StickState,
}

impl GamepadLink<Searching> {
    pub fn create(settings: GamepadSettings) -> Result<Self, EmulatorError> {
        info!("Initializing gilrs for emulator link");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(EmulatorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, settings, StickState::default()))
    }

    /// Binds to the first connected gamepad, or hands the link back if
    /// there is none yet
    pub fn try_link(mut self) -> Result<GamepadLink<Linked>, Self> {
        // pump pending events so gilrs refreshes its gamepad list
        while self.gilrs.next_event().is_some() {}

        let found = self
            .gilrs
            .gamepads()
            .find(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| (id, gamepad.name().to_string()));

        match found {
            Some((id, name)) => {
                info!("Emulator link bound to gamepad: {} ({})", name, id);
                self.active_gamepad = Some(id);
                self.sticks = StickState::default();
                Ok(self.transition())
            }
            None => Err(self),
        }
    }
}

impl GamepadLink<Linked> {
    /// Next converted event of the bound gamepad, `None` when drained
    pub fn next_event(&mut self) -> Option<EmulatorEvent> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if self.active_gamepad != Some(id) {
                debug!("Skipping event from unbound gamepad: {:?}", id);
                continue;
            }
            let deadzone = self.settings.stick_deadzone;
            if let Some(converted) = convert_gilrs_event(event, &mut self.sticks, deadzone) {
                return Some(converted);
            }
        }
        None
    }

    pub fn unlink(mut self) -> GamepadLink<Searching> {
        self.active_gamepad = None;
        self.transition()
    }
}

enum LinkPhase {
    Searching(GamepadLink<Searching>),
    Linked(GamepadLink<Linked>),
}

/// [`EmulatorSource`] over a host gamepad
pub struct GamepadSource {
    phase: Option<LinkPhase>,
}

impl GamepadSource {
    pub fn open(settings: GamepadSettings) -> Result<Self, EmulatorError> {
        let link = GamepadLink::create(settings)?;
        Ok(Self {
            phase: Some(LinkPhase::Searching(link)),
        })
    }
}

impl EmulatorSource for GamepadSource {
    fn poll_event(&mut self) -> Option<EmulatorEvent> {
        match self.phase.take()? {
            LinkPhase::Searching(link) => match link.try_link() {
                Ok(linked) => {
                    self.phase = Some(LinkPhase::Linked(linked));
                    Some(EmulatorEvent::LinkUp)
                }
                Err(link) => {
                    self.phase = Some(LinkPhase::Searching(link));
                    None
                }
            },
            LinkPhase::Linked(mut link) => {
                let event = link.next_event();
                self.phase = Some(if event == Some(EmulatorEvent::LinkDown) {
                    LinkPhase::Searching(link.unlink())
                } else {
                    LinkPhase::Linked(link)
                });
                event
            }
        }
    }
}

/// Converts one gilrs event of the bound gamepad, updating the stick state
fn convert_gilrs_event(
    event: EventType,
    sticks: &mut StickState,
    deadzone: f32,
) -> Option<EmulatorEvent> {
    match event {
        EventType::AxisChanged(axis, value, _) => convert_axis(axis, value, sticks, deadzone),
        EventType::ButtonPressed(button, _) => convert_button(button, true),
        EventType::ButtonReleased(button, _) => convert_button(button, false),
        EventType::Disconnected => {
            warn!("Emulator gamepad disconnected");
            Some(EmulatorEvent::LinkDown)
        }
        _ => None,
    }
}

fn convert_axis(
    axis: Axis,
    value: f32,
    sticks: &mut StickState,
    deadzone: f32,
) -> Option<EmulatorEvent> {
    let value = apply_deadzone(value, deadzone);
    match axis {
        Axis::LeftStickX => {
            sticks.left_x = value;
            Some(orientation(sticks))
        }
        Axis::LeftStickY => {
            sticks.left_y = value;
            Some(orientation(sticks))
        }
        Axis::RightStickX => {
            sticks.right_x = value;
            Some(EmulatorEvent::Touch(touch_position(sticks.right_x, sticks.right_y)))
        }
        Axis::RightStickY => {
            sticks.right_y = value;
            Some(EmulatorEvent::Touch(touch_position(sticks.right_x, sticks.right_y)))
        }
        _ => {
            debug!("Ignoring unsupported axis: {:?}", axis);
            None
        }
    }
}

fn convert_button(button: Button, pressed: bool) -> Option<EmulatorEvent> {
    match button {
        Button::Start if pressed => Some(EmulatorEvent::Recenter),
        _ => map_button(button).map(|button| EmulatorEvent::Button { button, pressed }),
    }
}

fn orientation(sticks: &StickState) -> EmulatorEvent {
    EmulatorEvent::Orientation(Quaternion::from_yaw_pitch(
        -sticks.left_x * MAX_YAW,
        sticks.left_y * MAX_PITCH,
    ))
}

fn map_button(button: Button) -> Option<ControllerButton> {
    match button {
        Button::South => Some(ControllerButton::Click),
        Button::East => Some(ControllerButton::App),
        Button::Mode => Some(ControllerButton::Home),
        _ => None,
    }
}

// Stick space (-1..=1, y up) to touchpad space (0..=1, origin top-left)
fn touch_position(x: f32, y: f32) -> Option<Vec2> {
    if x == 0.0 && y == 0.0 {
        None
    } else {
        Some(Vec2 {
            x: (x + 1.0) / 2.0,
            y: (1.0 - y) / 2.0,
        })
    }
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if deadzone >= 1.0 || value.abs() < deadzone {
        0.0
    } else {
        // rescale to the range outside the deadzone
        value.signum() * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadzone_zeroes_small_values() {
        assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(-0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.05), -1.0);
    }

    #[test]
    fn centered_stick_is_not_touching() {
        assert_eq!(touch_position(0.0, 0.0), None);
    }

    #[test]
    fn stick_corners_map_to_touchpad_corners() {
        assert_eq!(touch_position(-1.0, 1.0), Some(Vec2 { x: 0.0, y: 0.0 }));
        assert_eq!(touch_position(1.0, -1.0), Some(Vec2 { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn full_deadzone_never_produces_nan() {
        assert_eq!(apply_deadzone(1.0, 1.0), 0.0);

        let mut sticks = StickState::default();
        match convert_axis(Axis::LeftStickX, 1.0, &mut sticks, 1.0) {
            Some(EmulatorEvent::Orientation(q)) => {
                assert!(!q.x.is_nan() && !q.y.is_nan() && !q.z.is_nan() && !q.w.is_nan());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn settings_clamp_deadzone() {
        assert_eq!(GamepadSettings::new(0.1).stick_deadzone, 0.1);
        assert_eq!(GamepadSettings::new(1.0).stick_deadzone, MAX_STICK_DEADZONE);
        assert_eq!(GamepadSettings::new(-0.2).stick_deadzone, 0.0);
        assert_eq!(
            GamepadSettings::new(f32::NAN).stick_deadzone,
            GamepadSettings::default().stick_deadzone
        );
    }

    #[test]
    fn left_stick_drives_orientation() {
        let mut sticks = StickState::default();

        let yaw = convert_axis(Axis::LeftStickX, 1.0, &mut sticks, 0.05);
        assert_eq!(
            yaw,
            Some(EmulatorEvent::Orientation(Quaternion::from_yaw_pitch(
                -MAX_YAW, 0.0
            )))
        );

        let both = convert_axis(Axis::LeftStickY, -1.0, &mut sticks, 0.05);
        assert_eq!(
            both,
            Some(EmulatorEvent::Orientation(Quaternion::from_yaw_pitch(
                -MAX_YAW, -MAX_PITCH
            )))
        );
        assert_eq!(sticks.left_x, 1.0);
        assert_eq!(sticks.left_y, -1.0);
    }

    #[test]
    fn right_stick_drives_touch_and_release() {
        let mut sticks = StickState::default();

        assert_eq!(
            convert_axis(Axis::RightStickX, 1.0, &mut sticks, 0.05),
            Some(EmulatorEvent::Touch(Some(Vec2 { x: 1.0, y: 0.5 })))
        );
        assert_eq!(
            convert_axis(Axis::RightStickY, 1.0, &mut sticks, 0.05),
            Some(EmulatorEvent::Touch(Some(Vec2 { x: 1.0, y: 0.0 })))
        );

        convert_axis(Axis::RightStickX, 0.0, &mut sticks, 0.05);
        assert_eq!(
            convert_axis(Axis::RightStickY, 0.01, &mut sticks, 0.05),
            Some(EmulatorEvent::Touch(None))
        );
    }

    #[test]
    fn other_axes_are_ignored() {
        let mut sticks = StickState::default();
        assert_eq!(convert_axis(Axis::LeftZ, 1.0, &mut sticks, 0.05), None);
        assert_eq!(sticks, StickState::default());
    }

    #[test]
    fn start_press_recenters() {
        assert_eq!(convert_button(Button::Start, true), Some(EmulatorEvent::Recenter));
        assert_eq!(convert_button(Button::Start, false), None);
    }

    #[test]
    fn vr_buttons_report_press_and_release() {
        assert_eq!(
            convert_button(Button::South, true),
            Some(EmulatorEvent::Button {
                button: ControllerButton::Click,
                pressed: true,
            })
        );
        assert_eq!(
            convert_button(Button::East, false),
            Some(EmulatorEvent::Button {
                button: ControllerButton::App,
                pressed: false,
            })
        );
        assert_eq!(convert_button(Button::North, true), None);
    }

    #[test]
    fn disconnect_drops_the_link() {
        let mut sticks = StickState::default();
        assert_eq!(
            convert_gilrs_event(EventType::Disconnected, &mut sticks, 0.05),
            Some(EmulatorEvent::LinkDown)
        );
        assert_eq!(convert_gilrs_event(EventType::Connected, &mut sticks, 0.05), None);
    }

    #[test]
    fn only_vr_buttons_are_mapped() {
        assert_eq!(map_button(Button::South), Some(ControllerButton::Click));
        assert_eq!(map_button(Button::Mode), Some(ControllerButton::Home));
        assert_eq!(map_button(Button::North), None);
    }
}
