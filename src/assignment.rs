/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Assignment of the device roles to the physical ports.
#[allow(unused_imports)]
use log::{warn, info};

use crate::config::{ConfigError, EmulatorConfig};
use crate::gpio::PortNumber;
use crate::input::Role;

/// Maps the device roles to ports. Fixed after startup.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct PortAssignment {
    pub mouse: Option<PortNumber>,
    pub joystick1: Option<PortNumber>,
    pub joystick2: Option<PortNumber>,
}

impl PortAssignment {
    /// Resolves the ports of the connected devices.
    ///
    /// * The mouse goes to the configured mouse port.
    /// * The first joystick goes to the configured joystick port.
    /// * The second joystick goes to the other port if it's not taken by the mouse.
    ///
    /// Returns an error if both the mouse and the first joystick are connected and
    /// configured for the same port.
    pub fn resolve(
            config: &EmulatorConfig,
            has_mouse: bool,
            joystick_count: usize
        ) -> Result<Self, ConfigError>
    {
        let mouse = if has_mouse { Some(config.mouse_port) } else { None };
        let joystick1 = if joystick_count > 0 { Some(config.joystick_port) } else { None };
        if mouse.is_some() && mouse == joystick1 {
            return Err(ConfigError::PortConflict(config.mouse_port))
        }
        let mut joystick2 = None;
        if joystick_count > 1 {
            let other = config.joystick_port.other();
            if mouse == Some(other) {
                warn!("no free port for {}, the device will be ignored", Role::Joystick2);
            }
            else {
                joystick2 = Some(other);
            }
        }
        Ok(PortAssignment { mouse, joystick1, joystick2 })
    }
    /// Returns the port assigned to the `role`.
    pub fn port_of(&self, role: Role) -> Option<PortNumber> {
        match role {
            Role::Mouse => self.mouse,
            Role::Joystick1 => self.joystick1,
            Role::Joystick2 => self.joystick2,
        }
    }
    /// Returns `true` if no role has a port.
    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|&role| self.port_of(role).is_none())
    }
    /// Logs the assignment.
    pub fn log(&self) {
        for &role in Role::ALL.iter() {
            if let Some(port) = self.port_of(role) {
                info!("emulating {} on {}", role, port);
            }
        }
    }
}
