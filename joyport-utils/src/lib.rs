//! Various helper utilities for running the JOYPORT emulator on Linux.
#[cfg(feature = "evdev")]
pub mod evdev;
pub mod scan;

#[cfg(feature = "evdev")]
pub use self::scan::scan;
