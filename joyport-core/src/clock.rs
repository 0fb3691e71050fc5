/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Pacing of the port I/O cycles.
use core::time::Duration;
use std::thread;
use std::time::Instant;

/// Keeps a loop running at a fixed cycle period by sleeping until each cycle's deadline.
///
/// Deadlines advance by whole periods, so a cycle finishing early doesn't shift the
/// following ones. An overrun cycle restarts the cadence from the moment it was noticed.
#[derive(Clone, Debug)]
pub struct CycleTimer {
    deadline: Instant,
    period: Duration,
}

impl CycleTimer {
    /// Creates a timer with the first cycle starting now.
    pub fn new(period: Duration) -> Self {
        CycleTimer { deadline: Instant::now() + period, period }
    }
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }
    /// Returns the time at which the current cycle ends.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
    /// Starts the current cycle now.
    pub fn restart(&mut self) {
        self.deadline = Instant::now() + self.period;
    }
    /// Sleeps until the end of the current cycle.
    ///
    /// Returns `Err(missed)` without sleeping when the deadline has already passed,
    /// `missed` being the number of whole cycles the loop has fallen behind.
    pub fn wait_cycle_end(&mut self) -> Result<(), u32> {
        let now = Instant::now();
        match self.deadline.checked_duration_since(now) {
            Some(remaining) => {
                thread::sleep(remaining);
                self.deadline += self.period;
                Ok(())
            }
            None => {
                let late = now.duration_since(self.deadline).as_nanos();
                let missed = 1 + late / self.period.as_nanos().max(1);
                self.deadline = now + self.period;
                Err(missed.min(u32::MAX as u128) as u32)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_keep_their_cadence() {
        let period = Duration::from_millis(5);
        let mut timer = CycleTimer::new(period);
        let start = Instant::now();
        let first = timer.deadline();
        for _ in 0..4 {
            assert_eq!(timer.wait_cycle_end(), Ok(()));
        }
        assert_eq!(timer.deadline(), first + period * 4);
        assert!(start.elapsed() >= period * 3);
    }

    #[test]
    fn overrun_cycles_are_reported() {
        let period = Duration::from_millis(2);
        let mut timer = CycleTimer::new(period);
        thread::sleep(Duration::from_millis(7));
        match timer.wait_cycle_end() {
            Err(missed) => assert!(missed >= 3, "missed: {}", missed),
            Ok(()) => panic!("the cycle should be overrun")
        }
        assert!(timer.deadline() > Instant::now() - period);
        timer.restart();
        assert_eq!(timer.wait_cycle_end(), Ok(()));
    }
}
