/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The fixed cadence loop driving the port state onto the pins.
use std::sync::Arc;

use arrayvec::ArrayVec;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::assignment::PortAssignment;
use crate::clock::CycleTimer;
use crate::config::EmulatorConfig;
use crate::gpio::{BusError, Level, Pin, PinDriver};
use crate::peripherals::{
    mouse::MousePinout,
    quadrature::{QuadratureEncoder, QuadratureFrame, Steps}
};
use crate::shutdown::{ExitReason, ShutdownSignal};
use crate::state::{PortStateModel, PortStateSnapshot};

/// The levels of the lines of the mouse and both joysticks, when all of them are assigned.
pub type PinLevels = ArrayVec<(Pin, Level), 18>;

/// The outcome of a successful port I/O cycle.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// The quadrature steps emitted in the cycle.
    pub steps: Steps,
    /// The number of pin writes made.
    pub writes: u32,
}

/// Reads the port state model on a fixed cadence and writes the port lines with a [PinDriver].
///
/// Owns the phases of the mouse quadrature signals. Pending motion is taken out of the model
/// at most `max_steps_per_cycle` steps per axis each cycle and every single step is written
/// as a separate frame, so the receiving hardware can count all of them.
pub struct PortIo<D> {
    assignment: PortAssignment,
    pinout: MousePinout,
    state: Arc<PortStateModel>,
    encoder: QuadratureEncoder,
    driver: D,
    timer: CycleTimer,
    failures: u32,
    failure_limit: u32,
    frames: Vec<QuadratureFrame>,
}

impl<D: PinDriver> PortIo<D> {
    pub fn new(
            config: &EmulatorConfig,
            assignment: PortAssignment,
            state: Arc<PortStateModel>,
            driver: D
        ) -> Self
    {
        let encoder = QuadratureEncoder::new(config.max_steps_per_cycle.max(1));
        let frames = Vec::with_capacity(encoder.max_steps().into());
        PortIo {
            assignment,
            pinout: config.mouse_pinout,
            state,
            encoder,
            driver,
            timer: CycleTimer::new(config.cycle_period),
            failures: 0,
            failure_limit: config.bus_failure_limit.max(1),
            frames
        }
    }
    /// Performs a single cycle: snapshot, encode and write.
    ///
    /// At least one write is made each cycle, even if the mouse is idle, so the lines follow
    /// the joysticks and the buttons. On failure the remaining writes of the cycle are skipped,
    /// the quadrature phases are not rolled back.
    pub fn cycle(&mut self) -> Result<CycleReport, BusError> {
        let snapshot = self.state.snapshot();
        let encoder = &self.encoder;
        let steps = self.state.drain_motion(|pending| encoder.take_steps(pending));
        self.frames.clear();
        self.encoder.emit(steps, &mut self.frames);
        if self.frames.is_empty() {
            self.frames.push(self.encoder.frame());
        }
        let mut writes = 0;
        for &frame in self.frames.iter() {
            let pins = self.pin_levels(&snapshot, frame);
            if let Err(err) = self.driver.write_pins(&pins) {
                self.failures = self.failures.saturating_add(1);
                return Err(err)
            }
            writes += 1;
        }
        if self.failures != 0 {
            debug!("port I/O recovered after {} failed cycle(s)", self.failures);
            self.failures = 0;
        }
        Ok(CycleReport { steps, writes })
    }
    /// Runs the cycles until the `shutdown` is requested or the bus fails too many times in a row.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> ExitReason {
        info!("port I/O started, cycle period: {:?}", self.timer.period());
        self.timer.restart();
        while !shutdown.is_requested() {
            if let Err(err) = self.cycle() {
                if self.failures >= self.failure_limit {
                    error!("port I/O failed {} times in a row: {}", self.failures, err);
                    return ExitReason::BusFailure(err)
                }
                warn!("port I/O cycle skipped: {}", err);
            }
            if let Err(missed) = self.timer.wait_cycle_end() {
                debug!("port I/O lagging, {} cycle(s) missed", missed);
            }
        }
        info!("port I/O stopped");
        ExitReason::Requested
    }
    /// Returns the levels of the lines of the assigned ports for the given quadrature `frame`.
    pub fn pin_levels(&self, snapshot: &PortStateSnapshot, frame: QuadratureFrame) -> PinLevels {
        let mut pins = PinLevels::new();
        if let Some(port) = self.assignment.mouse {
            let lines = frame.lines(self.pinout) | snapshot.mouse.button_lines();
            pins.extend(lines.levels(port));
        }
        let joysticks = [self.assignment.joystick1, self.assignment.joystick2];
        for (port, joy) in joysticks.iter().zip(snapshot.joysticks.iter()) {
            if let Some(port) = *port {
                pins.extend(joy.lines().levels(port));
            }
        }
        pins
    }
    /// Returns the number of consecutive failed cycles.
    #[inline]
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }
    #[inline]
    pub fn encoder(&self) -> &QuadratureEncoder {
        &self.encoder
    }
    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }
    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
    pub fn into_driver(self) -> D {
        self.driver
    }
}
