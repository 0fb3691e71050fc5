/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The quadrature mouse: pending motion awaiting emission and two buttons.
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::port::PortLines;

bitflags! {
    /// Flags for mouse buttons.
    /// * Bit = 1 button is pressed.
    /// * Bit = 0 button is released.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    pub struct MouseButtons: u8 {
        const LEFT  = 0b01;
        const RIGHT = 0b10;
    }
}

/// Motion not yet emitted as quadrature steps, in device units.
///
/// * Horizontal values increase from left to right.
/// * Vertical values increase from top to bottom (towards the user).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct MouseMotion {
    pub x: i32,
    pub y: i32
}

/// The state of a mouse port.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct MouseState {
    pub pending: MouseMotion,
    pub buttons: MouseButtons,
}

/// Determines which port lines carry which quadrature signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub enum MousePinout {
    /// Amiga: V on pin 1, H on pin 2, VQ on pin 3, HQ on pin 4.
    Amiga,
    /// Atari ST: XB on pin 1, XA on pin 2, YA on pin 3, YB on pin 4.
    AtariSt,
}

impl MouseMotion {
    /// Adds the relative movement to the pending motion, each axis saturating at `±max_pending`.
    ///
    /// Motion exceeding the limit is dropped.
    pub fn accumulate(&mut self, dx: i32, dy: i32, max_pending: i32) {
        self.x = clamped_add(self.x, dx, max_pending);
        self.y = clamped_add(self.y, dy, max_pending);
    }
    /// Returns `true` if there is no pending motion.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl From<(i32, i32)> for MouseMotion {
    fn from((x, y): (i32, i32)) -> Self {
        MouseMotion { x, y }
    }
}

impl MouseState {
    /// Presses or releases mouse buttons.
    #[inline]
    pub fn set_buttons(&mut self, buttons: MouseButtons, pressed: bool) {
        self.buttons.set(buttons, pressed);
    }
    /// Returns the button lines that should be asserted.
    pub fn button_lines(&self) -> PortLines {
        let mut lines = PortLines::empty();
        lines.set(PortLines::FIRE1, self.buttons.intersects(MouseButtons::LEFT));
        lines.set(PortLines::FIRE2, self.buttons.intersects(MouseButtons::RIGHT));
        lines
    }
}

impl Default for MousePinout {
    fn default() -> Self {
        MousePinout::Amiga
    }
}

impl From<MousePinout> for &str {
    fn from(pinout: MousePinout) -> Self {
        match pinout {
            MousePinout::Amiga   => "Amiga",
            MousePinout::AtariSt => "Atari ST",
        }
    }
}

impl fmt::Display for MousePinout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(<&str>::from(*self))
    }
}

impl FromStr for MousePinout {
    type Err = &'static str;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case("amiga") {
            Ok(MousePinout::Amiga)
        }
        else if name.eq_ignore_ascii_case("atari") || name.eq_ignore_ascii_case("atarist")
                || name.eq_ignore_ascii_case("atari st") || name.eq_ignore_ascii_case("st") {
            Ok(MousePinout::AtariSt)
        }
        else {
            Err("Unknown mouse pinout: select one of: amiga, atari")
        }
    }
}

#[inline(always)]
fn clamped_add(prev: i32, delta: i32, max_pending: i32) -> i32 {
    prev.saturating_add(delta).max(-max_pending).min(max_pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_accumulates() {
        let mut motion = MouseMotion::default();
        assert!(motion.is_idle());
        motion.accumulate(10, -3, 100);
        motion.accumulate(5, -4, 100);
        assert_eq!(motion, MouseMotion::from((15, -7)));
        assert!(!motion.is_idle());
    }

    #[test]
    fn motion_saturates_at_limit() {
        let mut motion = MouseMotion::default();
        motion.accumulate(100, -100, 100);
        assert_eq!(motion, MouseMotion { x: 100, y: -100 });
        motion.accumulate(1, -1, 100);
        assert_eq!(motion, MouseMotion { x: 100, y: -100 });
        motion.accumulate(i32::MAX, i32::MIN, 100);
        assert_eq!(motion, MouseMotion { x: 100, y: -100 });
        // the opposite direction still reduces it
        motion.accumulate(-30, 40, 100);
        assert_eq!(motion, MouseMotion { x: 70, y: -60 });
    }

    #[test]
    fn mouse_buttons_work() {
        let mut mouse = MouseState::default();
        assert_eq!(mouse.button_lines(), PortLines::empty());
        mouse.set_buttons(MouseButtons::LEFT, true);
        assert_eq!(mouse.button_lines(), PortLines::FIRE1);
        mouse.set_buttons(MouseButtons::RIGHT, true);
        mouse.set_buttons(MouseButtons::LEFT, false);
        assert_eq!(mouse.button_lines(), PortLines::FIRE2);
    }

    #[test]
    fn mouse_pinout_parses() {
        assert_eq!("Amiga".parse::<MousePinout>(), Ok(MousePinout::Amiga));
        assert_eq!("atari".parse::<MousePinout>(), Ok(MousePinout::AtariSt));
        assert_eq!("ST".parse::<MousePinout>(), Ok(MousePinout::AtariSt));
        assert!("c64".parse::<MousePinout>().is_err());
        assert_eq!(MousePinout::AtariSt.to_string(), "Atari ST");
        assert_eq!(MousePinout::default(), MousePinout::Amiga);
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn mouse_state_serde_works() {
        let mut mouse = MouseState::default();
        mouse.pending.accumulate(-12, 7, 512);
        mouse.set_buttons(MouseButtons::RIGHT, true);
        let json = serde_json::to_string(&mouse).unwrap();
        let restored: MouseState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, mouse);
    }
}
