/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    JOYPORT is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    JOYPORT is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
/*! # JOYPORT

Emulation of the joystick and mouse ports of the home computers of the old days with modern
input devices.

The events of USB or Bluetooth mice and gamepads are translated to the levels of the lines of
DB9 ports: four directions and two fire buttons of a joystick or quadrature signals and two
buttons of a mouse. The lines are driven through a GPIO expander.

Two loops run concurrently:

* The input poll loop reads the normalized events from the input devices and applies them to
  the [state::PortStateModel].
* The port I/O loop, on a fixed cadence, takes a snapshot of the state, encodes the pending mouse
  motion into quadrature steps and writes the levels with a [gpio::PinDriver].

Use [emulator::Emulator] to run both loops.

```no_run
use joyport::{assignment::PortAssignment, config::EmulatorConfig, emulator::Emulator};
use joyport::gpio::NullPinDriver;
use joyport::registry::DeviceSet;

# fn open_devices() -> DeviceSet { DeviceSet::default() }
let config = EmulatorConfig::default();
let devices = open_devices();
let assignment = PortAssignment::resolve(&config, devices.has_mouse(), devices.joysticks.len())?;
let emulator = Emulator::start(&config, assignment, devices, NullPinDriver)?;
let reason = emulator.wait();
std::process::exit(if reason.is_fatal() { 1 } else { 0 });
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
#[macro_use]
extern crate bitflags;

pub use joyport_core::{clock, gpio};
pub use joyport_peripherals as peripherals;

pub mod assignment;
pub mod config;
pub mod emulator;
pub mod input;
pub mod poll;
pub mod port_io;
pub mod registry;
pub mod shutdown;
pub mod state;

pub use assignment::PortAssignment;
pub use config::EmulatorConfig;
pub use emulator::{Emulator, StartupError};
pub use shutdown::{ExitReason, ShutdownSignal};
