/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The GPIO capability used to drive the emulated port lines.
use core::convert::TryFrom;
use core::fmt;
use core::str::FromStr;
use std::error;

#[allow(unused_imports)]
use log::{warn, debug, trace};

/// An electrical level of a single pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High
}

/// One of the two emulated ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PortNumber {
    One = 1,
    Two = 2
}

/// A signal line of a DB9 port.
///
/// Joystick directions share their lines with the mouse quadrature signals,
/// which lines carry which signal depends on the wiring of the emulated mouse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortLine {
    Up,
    Down,
    Left,
    Right,
    Fire1,
    Fire2
}

/// A single physical pin: a line of one of the ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin {
    pub port: PortNumber,
    pub line: PortLine
}

/// An error returned by a [PinDriver] when the underlying bus transaction has failed.
#[derive(Debug)]
pub struct BusError {
    description: String,
    source: Option<Box<dyn error::Error + Send + Sync + 'static>>
}

/// An interface to the hardware driving the port pins.
pub trait PinDriver {
    /// Sets the given pins to the given levels.
    ///
    /// Pins not present in `pins` retain their previous levels.
    fn write_pins(&mut self, pins: &[(Pin, Level)]) -> Result<(), BusError>;
}

/// The pin driver that can be used as a placeholder when no hardware is attached.
///
/// Writes are only being logged.
#[derive(Clone, Copy, Default, Debug)]
pub struct NullPinDriver;

/// A pin driver that records every successful write.
///
/// The driver can be instructed to fail a number of the upcoming writes.
#[derive(Clone, Default, Debug)]
pub struct RecordingPinDriver {
    /// All successful writes in the order they were made.
    pub writes: Vec<Vec<(Pin, Level)>>,
    /// The number of calls to [PinDriver::write_pins] including the failed ones.
    pub attempts: usize,
    fail_next: u32
}

impl PortNumber {
    pub const ALL: [PortNumber;2] = [PortNumber::One, PortNumber::Two];

    /// Returns the other port.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            PortNumber::One => PortNumber::Two,
            PortNumber::Two => PortNumber::One,
        }
    }
    /// Returns the zero based index of the port.
    #[inline]
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for PortNumber {
    type Error = &'static str;

    fn try_from(num: u8) -> Result<Self, Self::Error> {
        match num {
            1 => Ok(PortNumber::One),
            2 => Ok(PortNumber::Two),
            _ => Err("port number must be either 1 or 2")
        }
    }
}

impl From<PortNumber> for u8 {
    fn from(port: PortNumber) -> u8 {
        port as u8
    }
}

impl FromStr for PortNumber {
    type Err = &'static str;

    fn from_str(num: &str) -> Result<Self, Self::Err> {
        match num.trim() {
            "1" => Ok(PortNumber::One),
            "2" => Ok(PortNumber::Two),
            _ => Err("port number must be either 1 or 2")
        }
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port {}", *self as u8)
    }
}

impl PortLine {
    pub const ALL: [PortLine;6] = [PortLine::Up, PortLine::Down, PortLine::Left,
                                   PortLine::Right, PortLine::Fire1, PortLine::Fire2];

    /// Returns the DB9 connector pin number of the line.
    pub fn db9_pin(self) -> u8 {
        match self {
            PortLine::Up    => 1,
            PortLine::Down  => 2,
            PortLine::Left  => 3,
            PortLine::Right => 4,
            PortLine::Fire1 => 6,
            PortLine::Fire2 => 9,
        }
    }
    /// Returns the bit position of the line in a port register.
    #[inline]
    pub fn bit(self) -> u8 {
        self as u8
    }
}

impl Pin {
    #[inline]
    pub fn new(port: PortNumber, line: PortLine) -> Self {
        Pin { port, line }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pin {} ({:?})", self.port, self.line.db9_pin(), self.line)
    }
}

impl BusError {
    /// Creates a new error from a message.
    pub fn new<S: Into<String>>(description: S) -> Self {
        BusError { description: description.into(), source: None }
    }
    /// Creates a new error from a message and the error that caused it.
    pub fn with_source<S, E>(description: S, source: E) -> Self
        where S: Into<String>,
              E: error::Error + Send + Sync + 'static
    {
        BusError { description: description.into(), source: Some(Box::new(source)) }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.source.as_ref() {
            Some(source) => write!(f, "{}: {}", self.description, source),
            None => f.write_str(&self.description)
        }
    }
}

impl error::Error for BusError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn error::Error + 'static))
    }
}

impl<D: PinDriver + ?Sized> PinDriver for Box<D> {
    #[inline]
    fn write_pins(&mut self, pins: &[(Pin, Level)]) -> Result<(), BusError> {
        (**self).write_pins(pins)
    }
}

impl PinDriver for NullPinDriver {
    fn write_pins(&mut self, pins: &[(Pin, Level)]) -> Result<(), BusError> {
        if log::log_enabled!(log::Level::Trace) {
            let low = pins.iter().filter(|(_, level)| *level == Level::Low).count();
            trace!("pins: {} written, {} low", pins.len(), low);
        }
        Ok(())
    }
}

impl RecordingPinDriver {
    pub fn new() -> Self {
        Self::default()
    }
    /// Makes the next `count` writes fail with a [BusError].
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }
    /// Returns the level of the `pin` after all the recorded writes or `None` if the pin
    /// has never been written.
    pub fn level(&self, pin: Pin) -> Option<Level> {
        self.writes.iter().rev()
            .flat_map(|write| write.iter().rev())
            .find(|(p, _)| *p == pin)
            .map(|&(_, level)| level)
    }
    /// Returns the levels of the `pin` in every recorded write that included it.
    pub fn history(&self, pin: Pin) -> Vec<Level> {
        self.writes.iter()
            .filter_map(|write| write.iter().find(|(p, _)| *p == pin))
            .map(|&(_, level)| level)
            .collect()
    }
}

impl PinDriver for RecordingPinDriver {
    fn write_pins(&mut self, pins: &[(Pin, Level)]) -> Result<(), BusError> {
        self.attempts += 1;
        if self.fail_next != 0 {
            self.fail_next -= 1;
            return Err(BusError::new("simulated bus failure"))
        }
        self.writes.push(pins.to_vec());
        Ok(())
    }
}
