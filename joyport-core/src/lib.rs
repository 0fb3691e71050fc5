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
//! The core components of the JOYPORT emulator.
pub mod clock;
pub mod gpio;

#[cfg(feature = "mcp23017")]
pub mod mcp23017;
