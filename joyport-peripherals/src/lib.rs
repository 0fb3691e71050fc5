//! Emulator components of the joystick and mouse signals of a DB9 port.
#[macro_use]
extern crate bitflags;

pub mod joystick;
pub mod mouse;
pub mod port;
pub mod quadrature;

pub use joyport_core::gpio::{Level, Pin, PortLine, PortNumber};
