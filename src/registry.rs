/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The contract of the input device registry: classification and selection of input devices.
use core::fmt;
use std::error;
use std::io;

#[allow(unused_imports)]
use log::{warn, info, debug};

use crate::config::DeviceOverrides;
use crate::input::{DeviceKind, EventSource, Role};

bitflags! {
    /// Flags of the input device capabilities relevant to the emulation.
    #[derive(Default, Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Capabilities: u8 {
        /// Reports relative X and Y motion.
        const RELATIVE_AXES    = 0b001;
        /// Has at least one button usable as a mouse or fire button.
        const BUTTONS          = 0b010;
        /// Has a stick, a hat switch or a directional pad.
        const DIRECTIONAL_AXES = 0b100;
    }
}

/// An input device found by a scan, not yet assigned to a role.
#[derive(Debug)]
pub struct Candidate<D> {
    /// The device number, as in `/dev/input/event{N}`.
    pub number: u32,
    pub name: String,
    pub capabilities: Capabilities,
    pub device: D,
}

/// The candidates selected for emulation.
#[derive(Debug)]
pub struct Selection<D> {
    pub mouse: Option<Candidate<D>>,
    /// At most two joysticks, the first one is joystick #1.
    pub joysticks: Vec<Candidate<D>>,
}

/// The opened input devices selected for emulation.
#[derive(Default)]
pub struct DeviceSet {
    pub mouse: Option<Box<dyn EventSource>>,
    pub joysticks: Vec<Box<dyn EventSource>>,
}

/// An error returned from a scan for input devices.
#[derive(Debug)]
pub enum ScanError {
    /// No input devices were found at all.
    NoDevices,
    /// The input devices could not be enumerated or opened.
    Access(io::Error),
}

impl Capabilities {
    /// Returns the kind of a device with these capabilities or `None` if it's not usable.
    pub fn kind(self) -> Option<DeviceKind> {
        if self.contains(Capabilities::RELATIVE_AXES|Capabilities::BUTTONS) {
            Some(DeviceKind::Mouse)
        }
        else if self.contains(Capabilities::DIRECTIONAL_AXES|Capabilities::BUTTONS) {
            Some(DeviceKind::Joystick)
        }
        else {
            None
        }
    }
}

impl<D> Candidate<D> {
    #[inline]
    pub fn kind(&self) -> Option<DeviceKind> {
        self.capabilities.kind()
    }
}

impl<D> Default for Selection<D> {
    fn default() -> Self {
        Selection { mouse: None, joysticks: Vec::new() }
    }
}

impl<D> Selection<D> {
    /// Returns `true` if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.mouse.is_none() && self.joysticks.is_empty()
    }
    /// Returns the candidates paired with their roles.
    pub fn into_roles(self) -> impl Iterator<Item=(Role, Candidate<D>)> {
        let mouse = self.mouse.map(|c| (Role::Mouse, c));
        let joys = [Role::Joystick1, Role::Joystick2].iter().copied().zip(self.joysticks);
        mouse.into_iter().chain(joys)
    }
}

/// Selects the mouse and up to two joysticks from the `candidates`.
///
/// The devices explicitly selected with `overrides` are taken first. The remaining roles are
/// filled with the first devices of a matching kind, in the ascending order of device numbers.
/// An explicitly selected device that is missing or of a wrong kind is ignored with a warning.
pub fn select_devices<D>(
        candidates: Vec<Candidate<D>>,
        overrides: &DeviceOverrides
    ) -> Selection<D>
{
    let mut pool: Vec<Option<Candidate<D>>> = candidates.into_iter().map(Some).collect();
    pool.sort_by_key(|c| c.as_ref().map(|c| c.number));

    let mut take_number = |number: Option<u32>, role: Role| -> Option<Candidate<D>> {
        let number = number?;
        let slot = pool.iter_mut().find(|c| matches!(c, Some(c) if c.number == number));
        match slot {
            Some(slot) => {
                if slot.as_ref().and_then(|c| c.kind()) == Some(role.kind()) {
                    slot.take()
                }
                else {
                    warn!("input device #{} can't be used as a {}", number, role);
                    None
                }
            }
            None => {
                warn!("input device #{} selected for {} not found", number, role);
                None
            }
        }
    };

    let mouse = take_number(overrides.mouse, Role::Mouse);
    let joystick1 = take_number(overrides.joystick1, Role::Joystick1);
    let joystick2 = take_number(overrides.joystick2, Role::Joystick2);

    let mut take_first = |kind: DeviceKind| -> Option<Candidate<D>> {
        pool.iter_mut()
            .find(|c| c.as_ref().and_then(|c| c.kind()) == Some(kind))
            .and_then(Option::take)
    };

    let mouse = mouse.or_else(|| take_first(DeviceKind::Mouse));
    let joystick1 = joystick1.or_else(|| take_first(DeviceKind::Joystick));
    let joystick2 = joystick2.or_else(|| take_first(DeviceKind::Joystick));

    let joysticks = joystick1.into_iter().chain(joystick2).collect();
    Selection { mouse, joysticks }
}

impl DeviceSet {
    /// Returns `true` if a mouse is available.
    pub fn has_mouse(&self) -> bool {
        self.mouse.is_some()
    }
    /// Returns `true` if at least one joystick is available.
    pub fn has_joystick(&self) -> bool {
        !self.joysticks.is_empty()
    }
    /// Returns `true` if there are no devices to emulate.
    pub fn is_empty(&self) -> bool {
        !self.has_mouse() && !self.has_joystick()
    }
    /// Returns all the sources.
    pub fn into_sources(self) -> Vec<Box<dyn EventSource>> {
        self.mouse.into_iter().chain(self.joysticks).collect()
    }
}

impl fmt::Debug for DeviceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSet")
         .field("mouse", &self.mouse.as_ref().map(|s| s.name()))
         .field("joysticks", &self.joysticks.iter().map(|s| s.name()).collect::<Vec<_>>())
         .finish()
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanError::NoDevices => f.write_str("no input devices found"),
            ScanError::Access(e) => write!(f, "can't access input devices: {}", e)
        }
    }
}

impl error::Error for ScanError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ScanError::NoDevices => None,
            ScanError::Access(e) => Some(e)
        }
    }
}

impl From<io::Error> for ScanError {
    fn from(error: io::Error) -> Self {
        ScanError::Access(error)
    }
}
