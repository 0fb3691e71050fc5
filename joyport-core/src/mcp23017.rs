/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! A [PinDriver] for the MCP23017 16-bit I/O expander.
//!
//! Requires "mcp23017" feature to be enabled.
//!
//! Bank A of the expander drives port 1 and bank B drives port 2, the line bits are
//! ordered as in [PortLine]. The lines of the emulated ports are open-collector: a low
//! level is produced by turning a pin into an output with its latch cleared, a high level
//! by turning the pin back into an input so the host computer's pull-up can take over.
use std::error;

use i2cdev::core::I2CDevice;
#[cfg(target_os = "linux")]
use i2cdev::linux::LinuxI2CDevice;

#[allow(unused_imports)]
use log::{warn, info, debug};

use crate::gpio::{BusError, Level, Pin, PinDriver, PortLine};

/// The default 7-bit address of the expander with A0-A2 tied low.
pub const DEFAULT_ADDRESS: u16 = 0x20;

// Register addresses with IOCON.BANK = 0, A and B registers are interleaved.
const IODIRA: u8 = 0x00;
const IOCON:  u8 = 0x0a;
const GPPUA:  u8 = 0x0c;
const OLATA:  u8 = 0x14;

/// IOCON: sequential addressing enabled, BANK = 0.
const IOCON_INIT: u8 = 0x00;

const PORT_LINES_MASK: u8 = 0b0011_1111;

/// The MCP23017 expander attached to an I2C device.
#[derive(Debug)]
pub struct Mcp23017<D: I2CDevice> {
    device: D,
    iodir: [u8;2],
}

#[cfg(target_os = "linux")]
impl Mcp23017<LinuxI2CDevice> {
    /// Opens `/dev/i2c-{bus}` and initializes the expander found at `address`.
    pub fn open(bus: u8, address: u16) -> Result<Self, BusError> {
        let path = format!("/dev/i2c-{}", bus);
        let device = LinuxI2CDevice::new(&path, address)
                     .map_err(|e| BusError::with_source(
                        format!("can't open I2C device {} at 0x{:02x}", path, address), e))?;
        info!("I/O expander at {} address 0x{:02x}", path, address);
        Mcp23017::new(device)
    }
}

impl<D> Mcp23017<D>
    where D: I2CDevice,
          D::Error: error::Error + Send + Sync + 'static
{
    /// Initializes the expander with all port lines released.
    pub fn new(device: D) -> Result<Self, BusError> {
        let mut mcp = Mcp23017 { device, iodir: [!0, !0] };
        mcp.write(&[IOCON, IOCON_INIT])?;
        mcp.write(&[GPPUA, 0, 0])?;
        mcp.write(&[OLATA, 0, 0])?;
        mcp.write_iodir()?;
        debug!("I/O expander initialized");
        Ok(mcp)
    }
    /// Releases all lines of both ports.
    pub fn release_all(&mut self) -> Result<(), BusError> {
        self.iodir = [!0, !0];
        self.write_iodir()
    }
    /// Returns a reference to the underlying I2C device.
    pub fn device(&self) -> &D {
        &self.device
    }
    /// Returns a mutable reference to the underlying I2C device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
    /// Returns the current direction registers: a bit cleared means the line is being driven low.
    pub fn direction_registers(&self) -> [u8;2] {
        self.iodir
    }

    fn write_iodir(&mut self) -> Result<(), BusError> {
        let [a, b] = self.iodir;
        self.write(&[IODIRA, a, b])
    }

    fn write(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.device.write(data)
                   .map_err(|e| BusError::with_source(
                        format!("I2C write to register 0x{:02x} failed", data[0]), e))
    }
}

impl<D> PinDriver for Mcp23017<D>
    where D: I2CDevice,
          D::Error: error::Error + Send + Sync + 'static
{
    fn write_pins(&mut self, pins: &[(Pin, Level)]) -> Result<(), BusError> {
        for &(Pin { port, line }, level) in pins {
            let reg = &mut self.iodir[port.index()];
            let mask = line_mask(line);
            match level {
                Level::Low => *reg &= !mask,
                Level::High => *reg |= mask,
            }
        }
        self.write_iodir()
    }
}

impl<D: I2CDevice> Drop for Mcp23017<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.write(&[IODIRA, !0, !0]) {
            warn!("failed to release port lines: {}", e);
        }
    }
}

#[inline]
fn line_mask(line: PortLine) -> u8 {
    (1 << line.bit()) & PORT_LINES_MASK
}

#[cfg(test)]
mod tests {
    use super::*;
    use i2cdev::mock::MockI2CDevice;
    use crate::gpio::PortNumber;

    #[test]
    fn mcp23017_drives_lines() {
        let mut mcp = Mcp23017::new(MockI2CDevice::new()).unwrap();
        assert_eq!(mcp.direction_registers(), [0xff, 0xff]);
        assert_eq!(mcp.device_mut().smbus_read_byte_data(IOCON).unwrap(), IOCON_INIT);
        assert_eq!(mcp.device_mut().smbus_read_byte_data(IODIRA).unwrap(), 0xff);
        assert_eq!(mcp.device_mut().smbus_read_byte_data(IODIRA + 1).unwrap(), 0xff);

        mcp.write_pins(&[
            (Pin::new(PortNumber::One, PortLine::Up), Level::Low),
            (Pin::new(PortNumber::One, PortLine::Fire1), Level::Low),
            (Pin::new(PortNumber::Two, PortLine::Fire2), Level::Low),
            (Pin::new(PortNumber::Two, PortLine::Down), Level::High),
        ]).unwrap();
        assert_eq!(mcp.direction_registers(), [0b1110_1110, 0b1101_1111]);
        assert_eq!(mcp.device_mut().smbus_read_byte_data(IODIRA).unwrap(), 0b1110_1110);
        assert_eq!(mcp.device_mut().smbus_read_byte_data(IODIRA + 1).unwrap(), 0b1101_1111);

        mcp.write_pins(&[(Pin::new(PortNumber::One, PortLine::Up), Level::High)]).unwrap();
        assert_eq!(mcp.direction_registers(), [0b1110_1111, 0b1101_1111]);

        mcp.release_all().unwrap();
        assert_eq!(mcp.device_mut().smbus_read_byte_data(IODIRA).unwrap(), 0xff);
    }
}
