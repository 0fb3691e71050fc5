/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The electrical state of a single port.
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use joyport_core::gpio::{Level, Pin, PortLine, PortNumber};

bitflags! {
    /// Flags of the port lines being driven low.
    /// * Bit = 1 a line is asserted (pulled to ground).
    /// * Bit = 0 a line is released.
    ///
    /// The bit order follows [PortLine].
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    pub struct PortLines: u8 {
        const UP    = 0b00_0001;
        const DOWN  = 0b00_0010;
        const LEFT  = 0b00_0100;
        const RIGHT = 0b00_1000;
        const FIRE1 = 0b01_0000;
        const FIRE2 = 0b10_0000;
    }
}

impl From<PortLine> for PortLines {
    fn from(line: PortLine) -> Self {
        PortLines::from_bits_truncate(1 << line.bit())
    }
}

impl PortLines {
    /// Returns the level of the given `line`.
    #[inline]
    pub fn level(self, line: PortLine) -> Level {
        if self.contains(line.into()) {
            Level::Low
        }
        else {
            Level::High
        }
    }
    /// Returns an iterator of levels of all the lines of the given `port`.
    pub fn levels(self, port: PortNumber) -> impl Iterator<Item=(Pin, Level)> {
        PortLine::ALL.iter().map(move |&line| (Pin::new(port, line), self.level(line)))
    }
}
