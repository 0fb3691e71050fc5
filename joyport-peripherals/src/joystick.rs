/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The digital joystick: four direction switches and up to two fire buttons.
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::port::PortLines;

bitflags! {
    /// Flags for reading and writing the current stick direction.
    /// * Bit = 1 a direction is active.
    /// * Bit = 0 a direction is inactive.
    #[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    pub struct Directions: u8 {
        const UP    = 0b0001;
        const RIGHT = 0b0010;
        const DOWN  = 0b0100;
        const LEFT  = 0b1000;
    }
}

bitflags! {
    /// Flags for fire buttons.
    /// * Bit = 1 button is pressed.
    /// * Bit = 0 button is released.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    pub struct FireButtons: u8 {
        const FIRE1 = 0b01;
        const FIRE2 = 0b10;
    }
}

/// The level state of a joystick port.
///
/// There is no history, only the current positions of the switches are kept.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct JoystickState {
    directions: Directions,
    fire: FireButtons,
}

impl Directions {
    /// Returns the directions opposite to the given ones.
    pub fn opposite(self) -> Directions {
        let mut opp = Directions::empty();
        opp.set(Directions::DOWN, self.contains(Directions::UP));
        opp.set(Directions::UP, self.contains(Directions::DOWN));
        opp.set(Directions::LEFT, self.contains(Directions::RIGHT));
        opp.set(Directions::RIGHT, self.contains(Directions::LEFT));
        opp
    }
}

impl JoystickState {
    /// Presses or releases a direction switch.
    ///
    /// Pressing a direction releases the opposite one, so the most recent
    /// of two opposing directions wins.
    pub fn set_direction(&mut self, dir: Directions, pressed: bool) {
        if pressed {
            self.directions.remove(dir.opposite());
            self.directions.insert(dir);
        }
        else {
            self.directions.remove(dir);
        }
    }
    /// Press or release a "fire" button.
    #[inline]
    pub fn fire(&mut self, btn: FireButtons, pressed: bool) {
        self.fire.set(btn, pressed);
    }
    /// Returns the current stick direction.
    #[inline]
    pub fn directions(&self) -> Directions {
        self.directions
    }
    /// Returns the fire buttons being pressed.
    #[inline]
    pub fn fire_buttons(&self) -> FireButtons {
        self.fire
    }
    /// Returns `true` if a joystick is in the center (neutral) position.
    #[inline]
    pub fn is_center(&self) -> bool {
        self.directions.is_empty()
    }
    /// Returns the port lines that should be asserted.
    pub fn lines(&self) -> PortLines {
        let dir = self.directions;
        let mut lines = PortLines::empty();
        lines.set(PortLines::UP, dir.intersects(Directions::UP));
        lines.set(PortLines::DOWN, dir.intersects(Directions::DOWN));
        lines.set(PortLines::LEFT, dir.intersects(Directions::LEFT));
        lines.set(PortLines::RIGHT, dir.intersects(Directions::RIGHT));
        lines.set(PortLines::FIRE1, self.fire.intersects(FireButtons::FIRE1));
        lines.set(PortLines::FIRE2, self.fire.intersects(FireButtons::FIRE2));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn joystick_works() {
        let mut joy = JoystickState::default();
        assert!(joy.is_center());
        assert_eq!(joy.lines(), PortLines::empty());
        joy.set_direction(Directions::UP, true);
        joy.set_direction(Directions::LEFT, true);
        joy.fire(FireButtons::FIRE1, true);
        assert_eq!(joy.directions(), Directions::UP|Directions::LEFT);
        assert_eq!(joy.lines(), PortLines::UP|PortLines::LEFT|PortLines::FIRE1);
        joy.set_direction(Directions::UP, false);
        joy.fire(FireButtons::FIRE1, false);
        joy.fire(FireButtons::FIRE2, true);
        assert_eq!(joy.lines(), PortLines::LEFT|PortLines::FIRE2);
        assert_eq!(joy.fire_buttons(), FireButtons::FIRE2);
    }

    #[test]
    fn last_direction_wins() {
        let mut joy = JoystickState::default();
        joy.set_direction(Directions::UP, true);
        joy.set_direction(Directions::DOWN, true);
        assert_eq!(joy.directions(), Directions::DOWN);
        joy.set_direction(Directions::RIGHT, true);
        joy.set_direction(Directions::LEFT, true);
        assert_eq!(joy.directions(), Directions::DOWN|Directions::LEFT);
        // releasing the overridden direction leaves the winner intact
        joy.set_direction(Directions::RIGHT, false);
        joy.set_direction(Directions::UP, false);
        assert_eq!(joy.directions(), Directions::DOWN|Directions::LEFT);
    }

    #[test]
    fn opposing_directions_are_exclusive() {
        let dirs = [Directions::UP, Directions::RIGHT, Directions::DOWN, Directions::LEFT];
        let mut rng = SmallRng::seed_from_u64(0x10e_5717c);
        let mut joy = JoystickState::default();
        for _ in 0..10_000 {
            let dir = *dirs.choose(&mut rng).unwrap();
            let pressed = rng.gen_bool(0.7);
            joy.set_direction(dir, pressed);
            let cur = joy.directions();
            assert!(!cur.contains(Directions::UP|Directions::DOWN));
            assert!(!cur.contains(Directions::LEFT|Directions::RIGHT));
            if pressed {
                assert!(cur.contains(dir));
            }
            else {
                assert!(!cur.contains(dir));
            }
        }
    }

    #[test]
    fn opposite_works() {
        assert_eq!(Directions::UP.opposite(), Directions::DOWN);
        assert_eq!(Directions::LEFT.opposite(), Directions::RIGHT);
        assert_eq!((Directions::UP|Directions::RIGHT).opposite(), Directions::DOWN|Directions::LEFT);
        assert_eq!(Directions::empty().opposite(), Directions::empty());
    }
}
