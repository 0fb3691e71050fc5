/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Input event sources backed by the Linux event devices.
use core::fmt;
use std::io;

use ::evdev::{AbsoluteAxisType, Device, Key, RelativeAxisType};

#[allow(unused_imports)]
use log::{warn, info, debug, trace};

use joyport::input::{DeviceKind, DeviceLost, EventNormalizer, EventSource, InputEvent, RawEvent, Role};
use joyport::input::normalize::*;
use joyport::registry::Capabilities;

/// The buttons that can be used as mouse or fire buttons.
pub const BUTTON_CODES: [u16;6] = [BTN_LEFT, BTN_RIGHT, BTN_TRIGGER, BTN_THUMB, BTN_SOUTH, BTN_EAST];
/// The buttons of a directional pad.
pub const DPAD_CODES: [u16;4] = [BTN_DPAD_UP, BTN_DPAD_DOWN, BTN_DPAD_LEFT, BTN_DPAD_RIGHT];
/// Touchpads, touchscreens and tablets report absolute positions with these tools.
pub const TOUCH_CODES: [u16;3] = [BTN_TOOL_PEN, BTN_TOOL_FINGER, BTN_TOUCH];

const BTN_TOOL_PEN:    u16 = 0x140;
const BTN_TOOL_FINGER: u16 = 0x145;
const BTN_TOUCH:       u16 = 0x14a;

/// Reads an event device and normalizes its events.
pub struct EvdevSource {
    role: Role,
    name: String,
    device: Device,
    normalizer: EventNormalizer,
}

/// Returns the capabilities of the event `device` relevant to the emulation.
pub fn capabilities(device: &Device) -> Capabilities {
    let rel_xy = device.supported_relative_axes().map_or(false, |rel| {
        rel.contains(RelativeAxisType::REL_X) && rel.contains(RelativeAxisType::REL_Y)
    });
    let keys = device.supported_keys();
    let abs = device.supported_absolute_axes();
    classify(rel_xy,
        |code| keys.map_or(false, |keys| keys.contains(Key::new(code))),
        |code| abs.map_or(false, |abs| abs.contains(AbsoluteAxisType(code))))
}

/// Determines the capabilities from the reported relative axes, keys and absolute axes.
///
/// The absolute X and Y axes of a device with a touch tool are positions, not a stick,
/// so they don't make the device a joystick.
pub fn classify<K, A>(rel_xy: bool, has_key: K, has_abs: A) -> Capabilities
    where K: Fn(u16) -> bool, A: Fn(u16) -> bool
{
    let mut caps = Capabilities::empty();
    caps.set(Capabilities::RELATIVE_AXES, rel_xy);
    caps.set(Capabilities::BUTTONS, BUTTON_CODES.iter().any(|&code| has_key(code)));
    let touch = TOUCH_CODES.iter().any(|&code| has_key(code));
    let stick = !touch && has_abs(ABS_X) && has_abs(ABS_Y);
    let hat = has_abs(ABS_HAT0X) && has_abs(ABS_HAT0Y);
    let dpad = DPAD_CODES.iter().all(|&code| has_key(code));
    caps.set(Capabilities::DIRECTIONAL_AXES, stick || hat || dpad);
    caps
}

impl fmt::Debug for EvdevSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvdevSource")
         .field("role", &self.role)
         .field("name", &self.name)
         .field("normalizer", &self.normalizer)
         .finish()
    }
}

impl EvdevSource {
    /// Creates the source of events for a device in the given `role`.
    ///
    /// The ranges of the directional axes of a joystick are queried from the device.
    pub fn new(role: Role, name: String, device: Device, mouse_speed: f32) -> Self {
        let mut normalizer = EventNormalizer::new(role.kind(), mouse_speed);
        if role.kind() == DeviceKind::Joystick {
            match (device.supported_absolute_axes(), device.get_abs_state()) {
                (Some(supported), Ok(state)) => {
                    for &code in DIRECTIONAL_AXES.iter() {
                        if supported.contains(AbsoluteAxisType(code)) {
                            let info = &state[usize::from(code)];
                            debug!("{}: axis {:#04x} range {}..={}", name, code, info.minimum, info.maximum);
                            normalizer.set_axis_range(code, info.minimum, info.maximum);
                        }
                    }
                }
                (Some(_), Err(err)) => warn!("{}: can't read the axis ranges: {}", name, err),
                (None, _) => {}
            }
        }
        EvdevSource { role, name, device, normalizer }
    }
}

impl EventSource for EvdevSource {
    fn role(&self) -> Role {
        self.role
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_events(&mut self, events: &mut Vec<InputEvent>) -> Result<(), DeviceLost> {
        loop {
            match self.device.fetch_events() {
                Ok(raw_events) => {
                    for ev in raw_events {
                        let raw = RawEvent::new(ev.event_type().0, ev.code(), ev.value());
                        self.normalizer.normalize(raw, events);
                    }
                    return Ok(())
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(DeviceLost::new(self.name.clone(), Some(err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(rel_xy: bool, keys: &[u16], axes: &[u16]) -> Capabilities {
        classify(rel_xy, |code| keys.contains(&code), |code| axes.contains(&code))
    }

    #[test]
    fn devices_are_classified() {
        let mouse = caps(true, &[BTN_LEFT, BTN_RIGHT], &[]);
        assert_eq!(mouse.kind(), Some(DeviceKind::Mouse));
        let gamepad = caps(false, &[BTN_SOUTH, BTN_EAST], &[ABS_X, ABS_Y, ABS_HAT0X, ABS_HAT0Y]);
        assert_eq!(gamepad.kind(), Some(DeviceKind::Joystick));
        let stick = caps(false, &[BTN_TRIGGER, BTN_THUMB], &[ABS_X, ABS_Y]);
        assert_eq!(stick.kind(), Some(DeviceKind::Joystick));
        let dpad = caps(false, &[BTN_SOUTH, BTN_DPAD_UP, BTN_DPAD_DOWN, BTN_DPAD_LEFT, BTN_DPAD_RIGHT], &[]);
        assert_eq!(dpad.kind(), Some(DeviceKind::Joystick));
        let keyboard = caps(false, &[], &[]);
        assert_eq!(keyboard.kind(), None);
    }

    #[test]
    fn touchpads_are_not_joysticks() {
        let touchpad = caps(false, &[BTN_LEFT, BTN_TOUCH, BTN_TOOL_FINGER], &[ABS_X, ABS_Y]);
        assert!(!touchpad.contains(Capabilities::DIRECTIONAL_AXES));
        assert_eq!(touchpad.kind(), None);
        let tablet = caps(false, &[BTN_LEFT, BTN_TOOL_PEN], &[ABS_X, ABS_Y]);
        assert_eq!(tablet.kind(), None);
        // a touchpad that also reports relative motion is still a mouse
        let pointer = caps(true, &[BTN_LEFT, BTN_TOUCH], &[ABS_X, ABS_Y]);
        assert_eq!(pointer.kind(), Some(DeviceKind::Mouse));
    }
}
