/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The emulator configuration, built once at startup.
use core::fmt;
use core::time::Duration;
use std::error;

use crate::gpio::PortNumber;
use crate::peripherals::mouse::MousePinout;

/// The default I2C bus number of the I/O expander.
pub const DEFAULT_I2C_BUS: u8 = 1;
/// The default I2C address of the I/O expander.
pub const DEFAULT_I2C_ADDRESS: u16 = 0x20;
/// The default multiplier of the relative mouse motion.
pub const DEFAULT_MOUSE_SPEED: f32 = 1.3;
/// The default period of the port I/O cycle.
pub const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_millis(4);
/// The default maximum number of quadrature transitions per axis in a single cycle.
pub const DEFAULT_MAX_STEPS_PER_CYCLE: u16 = 8;
/// The default limit of the pending mouse motion per axis.
pub const DEFAULT_MAX_PENDING: i32 = 512;
/// The default number of consecutive failed bus cycles after which the emulation stops.
pub const DEFAULT_BUS_FAILURE_LIMIT: u32 = 3;
/// The default time the input poll loop waits for an event before checking for shutdown.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(50);
/// The default delay between starting the port I/O loop and the input poll loop.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(1);

/// Explicitly selected input device numbers, as in `/dev/input/event{N}`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct DeviceOverrides {
    pub mouse: Option<u32>,
    pub joystick1: Option<u32>,
    pub joystick2: Option<u32>,
}

/// The immutable configuration of the emulator.
#[derive(Clone, Debug, PartialEq)]
pub struct EmulatorConfig {
    /// The I2C bus number of the I/O expander.
    pub i2c_bus: u8,
    /// The 7-bit I2C address of the I/O expander.
    pub i2c_address: u16,
    /// The port the mouse is connected to.
    pub mouse_port: PortNumber,
    /// The port the first joystick is connected to.
    pub joystick_port: PortNumber,
    pub devices: DeviceOverrides,
    /// The multiplier of the relative mouse motion.
    pub mouse_speed: f32,
    pub mouse_pinout: MousePinout,
    pub cycle_period: Duration,
    pub max_steps_per_cycle: u16,
    pub max_pending: i32,
    pub bus_failure_limit: u32,
    pub poll_timeout: Duration,
    pub startup_delay: Duration,
}

/// An error returned when the configuration is invalid.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The mouse and the first joystick were both assigned to the same port.
    PortConflict(PortNumber),
    /// A configuration value is out of its range.
    InvalidValue { name: &'static str, reason: &'static str },
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            i2c_bus: DEFAULT_I2C_BUS,
            i2c_address: DEFAULT_I2C_ADDRESS,
            mouse_port: PortNumber::One,
            joystick_port: PortNumber::Two,
            devices: DeviceOverrides::default(),
            mouse_speed: DEFAULT_MOUSE_SPEED,
            mouse_pinout: MousePinout::default(),
            cycle_period: DEFAULT_CYCLE_PERIOD,
            max_steps_per_cycle: DEFAULT_MAX_STEPS_PER_CYCLE,
            max_pending: DEFAULT_MAX_PENDING,
            bus_failure_limit: DEFAULT_BUS_FAILURE_LIMIT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            startup_delay: DEFAULT_STARTUP_DELAY,
        }
    }
}

impl EmulatorConfig {
    /// Checks if all the values are within their ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(name: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::InvalidValue { name, reason })
        }
        if !(0x03..=0x77).contains(&self.i2c_address) {
            return invalid("i2c_address", "must be a 7-bit address between 0x03 and 0x77")
        }
        if !self.mouse_speed.is_finite() || self.mouse_speed <= 0.0 {
            return invalid("mouse_speed", "must be a positive number")
        }
        if self.cycle_period == Duration::from_secs(0) {
            return invalid("cycle_period", "must not be zero")
        }
        if self.max_steps_per_cycle == 0 {
            return invalid("max_steps_per_cycle", "must be at least 1")
        }
        if self.max_pending < 1 {
            return invalid("max_pending", "must be at least 1")
        }
        if self.bus_failure_limit == 0 {
            return invalid("bus_failure_limit", "must be at least 1")
        }
        if self.poll_timeout == Duration::from_secs(0) {
            return invalid("poll_timeout", "must not be zero")
        }
        Ok(())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::PortConflict(port) => {
                write!(f, "the mouse and the joystick can't be both connected to {}", port)
            }
            ConfigError::InvalidValue { name, reason } => {
                write!(f, "invalid {}: {}", name, reason)
            }
        }
    }
}

impl error::Error for ConfigError {}
