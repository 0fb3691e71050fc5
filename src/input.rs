/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The normalized input alphabet and the interface of input event sources.
use core::fmt;
use std::error;
use std::io;

pub mod normalize;

pub use normalize::{EventNormalizer, RawEvent};

/// The logical role of an input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Mouse,
    Joystick1,
    Joystick2
}

/// The kind of an input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Mouse,
    Joystick
}

/// A button of an emulated device.
///
/// The primary button is the left mouse button or the first fire button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Primary,
    Secondary
}

/// A joystick direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

/// A normalized input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// A relative motion in device units.
    Motion { dx: i32, dy: i32 },
    Button { button: Button, pressed: bool },
    Direction { direction: Direction, pressed: bool },
}

/// An error signalling that an input device has disappeared.
#[derive(Debug)]
pub struct DeviceLost {
    pub device: String,
    pub source: Option<io::Error>
}

/// A source of normalized input events, owning an open input device.
pub trait EventSource: Send {
    /// Returns the role of the device.
    fn role(&self) -> Role;
    /// Returns a human readable name of the device.
    fn name(&self) -> &str;
    /// Blocks until at least one event is available and appends the events read to `events`.
    ///
    /// Returns an error when the device is gone. No more events can be read after that.
    fn read_events(&mut self, events: &mut Vec<InputEvent>) -> Result<(), DeviceLost>;
}

impl Role {
    pub const ALL: [Role;3] = [Role::Mouse, Role::Joystick1, Role::Joystick2];

    /// Returns the kind of a device for the role.
    #[inline]
    pub fn kind(self) -> DeviceKind {
        match self {
            Role::Mouse => DeviceKind::Mouse,
            Role::Joystick1|Role::Joystick2 => DeviceKind::Joystick
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Mouse => "mouse",
            Role::Joystick1 => "joystick #1",
            Role::Joystick2 => "joystick #2",
        })
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::Mouse => "mouse",
            DeviceKind::Joystick => "joystick",
        })
    }
}

impl DeviceLost {
    pub fn new<S: Into<String>>(device: S, source: Option<io::Error>) -> Self {
        DeviceLost { device: device.into(), source }
    }
}

impl fmt::Display for DeviceLost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.source.as_ref() {
            Some(e) => write!(f, "input device {} lost: {}", self.device, e),
            None => write!(f, "input device {} lost", self.device)
        }
    }
}

impl error::Error for DeviceLost {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn error::Error + 'static))
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    #[inline]
    fn role(&self) -> Role {
        (**self).role()
    }
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }
    #[inline]
    fn read_events(&mut self, events: &mut Vec<InputEvent>) -> Result<(), DeviceLost> {
        (**self).read_events(events)
    }
}
