/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Cooperative termination of the emulation loops.
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::gpio::BusError;

/// A flag shared by all the loops, checked at each iteration boundary.
#[derive(Clone, Default, Debug)]
pub struct ShutdownSignal(Arc<AtomicBool>);

/// The reason the emulation has stopped.
#[derive(Debug)]
pub enum ExitReason {
    /// The shutdown was requested with [ShutdownSignal::request].
    Requested,
    /// All the input devices are gone.
    InputExhausted,
    /// Too many consecutive port I/O cycles have failed.
    BusFailure(BusError),
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }
    /// Asks all the loops observing this signal to stop.
    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Release)
    }
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl ExitReason {
    /// Returns `true` if the emulation stopped because of a failure.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExitReason::Requested)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitReason::Requested => f.write_str("shutdown requested"),
            ExitReason::InputExhausted => f.write_str("all input devices are gone"),
            ExitReason::BusFailure(e) => write!(f, "port I/O failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_signal_is_shared() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_requested());
        signal.request();
        assert!(other.is_requested());
        assert!(!ExitReason::Requested.is_fatal());
        assert!(ExitReason::InputExhausted.is_fatal());
        assert!(ExitReason::BusFailure(BusError::new("nack")).is_fatal());
    }
}
