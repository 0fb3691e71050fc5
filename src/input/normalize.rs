/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Reduces raw Linux input events to the [InputEvent] alphabet.
#[allow(unused_imports)]
use log::{debug, trace};

use super::{Button, DeviceKind, Direction, InputEvent};

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT:  u16 = 0x00;
pub const SYN_DROPPED: u16 = 0x03;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;

pub const ABS_X:     u16 = 0x00;
pub const ABS_Y:     u16 = 0x01;
pub const ABS_HAT0X: u16 = 0x10;
pub const ABS_HAT0Y: u16 = 0x11;

pub const BTN_LEFT:       u16 = 0x110;
pub const BTN_RIGHT:      u16 = 0x111;
pub const BTN_TRIGGER:    u16 = 0x120;
pub const BTN_THUMB:      u16 = 0x121;
pub const BTN_SOUTH:      u16 = 0x130;
pub const BTN_EAST:       u16 = 0x131;
pub const BTN_DPAD_UP:    u16 = 0x220;
pub const BTN_DPAD_DOWN:  u16 = 0x221;
pub const BTN_DPAD_LEFT:  u16 = 0x222;
pub const BTN_DPAD_RIGHT: u16 = 0x223;

/// The codes of the absolute axes translated to directions.
pub const DIRECTIONAL_AXES: [u16;4] = [ABS_X, ABS_Y, ABS_HAT0X, ABS_HAT0Y];

const STICK_RANGE: (i32, i32) = (-32768, 32767);
const HAT_RANGE: (i32, i32) = (-1, 1);

/// A raw input event as read from a Linux event device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32
}

/// Converts a stream of [RawEvent]s of a single device into [InputEvent]s.
///
/// * Relative motion is being accumulated until the end of an event report and emitted
///   as a single [InputEvent::Motion] multiplied by the mouse speed.
/// * Absolute axes are translated to direction switches, only the changes are emitted.
/// * Events not relevant to the device kind are discarded.
#[derive(Clone, Debug)]
pub struct EventNormalizer {
    kind: DeviceKind,
    speed: f32,
    rel: (i32, i32),
    residue: (f32, f32),
    axes: [AxisState;4],
}

#[derive(Clone, Copy, Debug)]
struct AxisState {
    min: i32,
    max: i32,
    position: i8,
}

impl RawEvent {
    #[inline]
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        RawEvent { kind, code, value }
    }
}

impl AxisState {
    fn new((min, max): (i32, i32)) -> Self {
        AxisState { min, max, position: 0 }
    }
    /// Returns -1, 0 or 1: the value is in the outer quarter of the range on either side or in the middle.
    fn position_of(&self, value: i32) -> i8 {
        let (min, max) = (i64::from(self.min), i64::from(self.max));
        let value = i64::from(value);
        // compare doubled values to stay in integers
        let centre2 = min + max;
        let quarter2 = (max - min) / 2;
        let value2 = value * 2;
        if value2 < centre2 - quarter2 {
            -1
        }
        else if value2 > centre2 + quarter2 {
            1
        }
        else {
            0
        }
    }
}

impl EventNormalizer {
    /// Creates a normalizer for a device of the given `kind`.
    ///
    /// `speed` is the multiplier of the relative motion.
    pub fn new(kind: DeviceKind, speed: f32) -> Self {
        EventNormalizer {
            kind,
            speed,
            rel: (0, 0),
            residue: (0.0, 0.0),
            axes: [AxisState::new(STICK_RANGE), AxisState::new(STICK_RANGE),
                   AxisState::new(HAT_RANGE), AxisState::new(HAT_RANGE)],
        }
    }
    /// Returns the kind of the device.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }
    /// Sets the range of values reported by an absolute axis.
    ///
    /// Codes of axes not in [DIRECTIONAL_AXES] and empty ranges are being ignored.
    pub fn set_axis_range(&mut self, code: u16, min: i32, max: i32) {
        if min >= max {
            return
        }
        if let Some(axis) = axis_slot(code).map(|n| &mut self.axes[n]) {
            axis.min = min;
            axis.max = max;
        }
    }
    /// Processes a single raw event appending the resulting normalized events to `events`.
    pub fn normalize<E: Extend<InputEvent>>(&mut self, raw: RawEvent, events: &mut E) {
        match (raw.kind, self.kind) {
            (EV_SYN, _) => self.synchronize(raw.code, events),
            (EV_REL, DeviceKind::Mouse) => self.relative(raw.code, raw.value),
            (EV_KEY, _) => self.key(raw.code, raw.value, events),
            (EV_ABS, DeviceKind::Joystick) => self.absolute(raw.code, raw.value, events),
            _ => {}
        }
    }

    fn synchronize<E: Extend<InputEvent>>(&mut self, code: u16, events: &mut E) {
        match code {
            SYN_REPORT => {
                let (dx, dy) = core::mem::take(&mut self.rel);
                if dx == 0 && dy == 0 {
                    return
                }
                let (dx, dy) = (self.scale_x(dx), self.scale_y(dy));
                if dx != 0 || dy != 0 {
                    events.extend(Some(InputEvent::Motion { dx, dy }));
                }
            }
            SYN_DROPPED => {
                debug!("input events dropped by the kernel");
                self.rel = (0, 0);
            }
            _ => {}
        }
    }

    fn relative(&mut self, code: u16, value: i32) {
        match code {
            REL_X => self.rel.0 = self.rel.0.saturating_add(value),
            REL_Y => self.rel.1 = self.rel.1.saturating_add(value),
            _ => {}
        }
    }

    fn key<E: Extend<InputEvent>>(&mut self, code: u16, value: i32, events: &mut E) {
        // 2 is an autorepeat
        let pressed = match value {
            0 => false,
            1 => true,
            _ => return
        };
        let event = match (self.kind, code) {
            (DeviceKind::Mouse, BTN_LEFT) => InputEvent::Button { button: Button::Primary, pressed },
            (DeviceKind::Mouse, BTN_RIGHT) => InputEvent::Button { button: Button::Secondary, pressed },
            (DeviceKind::Joystick, BTN_TRIGGER)|
            (DeviceKind::Joystick, BTN_SOUTH) => InputEvent::Button { button: Button::Primary, pressed },
            (DeviceKind::Joystick, BTN_THUMB)|
            (DeviceKind::Joystick, BTN_EAST) => InputEvent::Button { button: Button::Secondary, pressed },
            (DeviceKind::Joystick, BTN_DPAD_UP) => InputEvent::Direction { direction: Direction::Up, pressed },
            (DeviceKind::Joystick, BTN_DPAD_DOWN) => InputEvent::Direction { direction: Direction::Down, pressed },
            (DeviceKind::Joystick, BTN_DPAD_LEFT) => InputEvent::Direction { direction: Direction::Left, pressed },
            (DeviceKind::Joystick, BTN_DPAD_RIGHT) => InputEvent::Direction { direction: Direction::Right, pressed },
            _ => return
        };
        events.extend(Some(event));
    }

    fn absolute<E: Extend<InputEvent>>(&mut self, code: u16, value: i32, events: &mut E) {
        let slot = match axis_slot(code) {
            Some(slot) => slot,
            None => return
        };
        let (negative, positive) = match code {
            ABS_X|ABS_HAT0X => (Direction::Left, Direction::Right),
            _ => (Direction::Up, Direction::Down)
        };
        let axis = &mut self.axes[slot];
        let position = axis.position_of(value);
        let previous = core::mem::replace(&mut axis.position, position);
        if previous == position {
            return
        }
        trace!("axis 0x{:02x}: {} -> {}", code, previous, position);
        let direction_of = |pos: i8| if pos < 0 { negative } else { positive };
        if previous != 0 {
            events.extend(Some(InputEvent::Direction { direction: direction_of(previous), pressed: false }));
        }
        if position != 0 {
            events.extend(Some(InputEvent::Direction { direction: direction_of(position), pressed: true }));
        }
    }

    fn scale_x(&mut self, delta: i32) -> i32 {
        scale(delta, self.speed, &mut self.residue.0)
    }

    fn scale_y(&mut self, delta: i32) -> i32 {
        scale(delta, self.speed, &mut self.residue.1)
    }
}

fn axis_slot(code: u16) -> Option<usize> {
    DIRECTIONAL_AXES.iter().position(|&c| c == code)
}

/// Multiplies `delta` by `speed` carrying the fractional part over to the next call.
fn scale(delta: i32, speed: f32, residue: &mut f32) -> i32 {
    if delta == 0 {
        return 0
    }
    let scaled = delta as f32 * speed + *residue;
    let whole = scaled.trunc();
    *residue = scaled - whole;
    whole as i32
}
