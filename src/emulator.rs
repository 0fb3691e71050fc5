/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Running both emulation loops.
use core::fmt;
use std::error;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

#[allow(unused_imports)]
use log::{error, warn, info, debug};

use crate::assignment::PortAssignment;
use crate::config::{ConfigError, EmulatorConfig};
use crate::gpio::{BusError, PinDriver};
use crate::poll::{InputHub, InputPoller};
use crate::port_io::PortIo;
use crate::registry::{DeviceSet, ScanError};
use crate::shutdown::{ExitReason, ShutdownSignal};
use crate::state::PortStateModel;

/// The running emulation: the port I/O thread and the input poll thread sharing the port state.
#[derive(Debug)]
pub struct Emulator {
    shutdown: ShutdownSignal,
    state: Arc<PortStateModel>,
    exits: Receiver<ExitReason>,
    threads: Vec<JoinHandle<()>>,
}

/// An error that prevents the emulation from being started.
#[derive(Debug)]
pub enum StartupError {
    Scan(ScanError),
    /// None of the input devices can be assigned to a port.
    NoUsableDevices,
    Config(ConfigError),
    Bus(BusError),
    /// A thread could not be created.
    Spawn(io::Error),
}

impl Emulator {
    /// Starts the emulation of the `devices` on the ports with the given `assignment`.
    ///
    /// The port I/O loop is started first, so the pins are in a defined state before any input
    /// is accepted. The input poll loop follows after the configured startup delay.
    /// The devices without an assigned port are closed.
    pub fn start<D>(
            config: &EmulatorConfig,
            assignment: PortAssignment,
            devices: DeviceSet,
            driver: D
        ) -> Result<Self, StartupError>
        where D: PinDriver + Send + 'static
    {
        Emulator::start_with_signal(config, assignment, devices, driver, ShutdownSignal::new())
    }
    /// Starts the emulation like [Emulator::start], stopping it when the given `shutdown`
    /// signal is requested, also during the startup.
    ///
    /// The `driver` is dropped by the port I/O thread after its last cycle.
    pub fn start_with_signal<D>(
            config: &EmulatorConfig,
            assignment: PortAssignment,
            devices: DeviceSet,
            driver: D,
            shutdown: ShutdownSignal
        ) -> Result<Self, StartupError>
        where D: PinDriver + Send + 'static
    {
        let sources: Vec<_> = devices.into_sources().into_iter()
            .filter(|source| {
                let assigned = assignment.port_of(source.role()).is_some();
                if !assigned {
                    warn!("{} ({}) has no port, ignoring", source.role(), source.name());
                }
                assigned
            })
            .collect();
        if sources.is_empty() {
            return Err(StartupError::NoUsableDevices)
        }
        assignment.log();

        let state = Arc::new(PortStateModel::new(config.max_pending));
        let (exit_tx, exits) = channel();

        let mut port_io = PortIo::new(config, assignment, Arc::clone(&state), driver);
        let port_thread = spawn_loop("port I/O", exit_tx.clone(), shutdown.clone(),
                                     move |shutdown| port_io.run(shutdown))?;
        let mut emulator = Emulator { shutdown, state, exits, threads: vec![port_thread] };

        thread::sleep(config.startup_delay);

        let hub = match InputHub::spawn(sources) {
            Ok(hub) => hub,
            Err(err) => {
                emulator.stop();
                return Err(StartupError::Spawn(err))
            }
        };
        let mut poller = InputPoller::new(hub, Arc::clone(&emulator.state), config.poll_timeout);
        match spawn_loop("input poll", exit_tx, emulator.shutdown.clone(),
                         move |shutdown| poller.run(shutdown))
        {
            Ok(poll_thread) => emulator.threads.push(poll_thread),
            Err(err) => {
                emulator.stop();
                return Err(err)
            }
        }
        info!("emulation started");
        Ok(emulator)
    }
    /// Blocks until any of the loops stops, then stops the other one and returns the reason
    /// the first one has stopped for.
    pub fn wait(mut self) -> ExitReason {
        let reason = self.exits.recv().unwrap_or_else(|_| {
            ExitReason::BusFailure(BusError::new("the emulation threads have panicked"))
        });
        if reason.is_fatal() {
            error!("emulation stopped: {}", reason);
        }
        else {
            info!("emulation stopped: {}", reason);
        }
        self.stop();
        reason
    }
    /// Requests both loops to stop. The shutdown completes within one period of each loop.
    pub fn shutdown(&self) {
        self.shutdown.request()
    }
    /// Returns a signal that can be used to stop the emulation from elsewhere.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }
    /// Returns the shared port state.
    pub fn state(&self) -> &Arc<PortStateModel> {
        &self.state
    }

    fn stop(&mut self) {
        self.shutdown.request();
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or_default().to_string();
            if handle.join().is_err() {
                error!("{} thread has panicked", name);
            }
        }
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_loop<F>(
        name: &str,
        exit_tx: Sender<ExitReason>,
        shutdown: ShutdownSignal,
        run: F
    ) -> Result<JoinHandle<()>, StartupError>
    where F: FnOnce(&ShutdownSignal) -> ExitReason + Send + 'static
{
    thread::Builder::new().name(name.into()).spawn(move || {
        let reason = run(&shutdown);
        // another loop may have already finished the emulation
        exit_tx.send(reason).ok();
    })
    .map_err(StartupError::Spawn)
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StartupError::Scan(e) => write!(f, "{}", e),
            StartupError::NoUsableDevices => f.write_str("no usable mouse or joystick"),
            StartupError::Config(e) => write!(f, "invalid configuration: {}", e),
            StartupError::Bus(e) => write!(f, "can't initialize the port driver: {}", e),
            StartupError::Spawn(e) => write!(f, "can't start a thread: {}", e),
        }
    }
}

impl error::Error for StartupError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            StartupError::Scan(e) => Some(e),
            StartupError::NoUsableDevices => None,
            StartupError::Config(e) => Some(e),
            StartupError::Bus(e) => Some(e),
            StartupError::Spawn(e) => Some(e),
        }
    }
}

impl From<ScanError> for StartupError {
    fn from(error: ScanError) -> Self {
        StartupError::Scan(error)
    }
}

impl From<ConfigError> for StartupError {
    fn from(error: ConfigError) -> Self {
        StartupError::Config(error)
    }
}

impl From<BusError> for StartupError {
    fn from(error: BusError) -> Self {
        StartupError::Bus(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::gpio::{Level, NullPinDriver, Pin, PortNumber};
    use crate::input::{DeviceLost, EventSource, InputEvent, Role};

    // a device that never reports anything until its end
    struct SilentSource(Role, Duration);

    impl EventSource for SilentSource {
        fn role(&self) -> Role {
            self.0
        }
        fn name(&self) -> &str {
            "silent"
        }
        fn read_events(&mut self, _events: &mut Vec<InputEvent>) -> Result<(), DeviceLost> {
            thread::sleep(self.1);
            Err(DeviceLost::new("silent", None))
        }
    }

    fn config() -> EmulatorConfig {
        EmulatorConfig { startup_delay: Duration::from_millis(1), ..EmulatorConfig::default() }
    }

    #[test]
    fn unassigned_devices_are_not_usable() {
        let devices = DeviceSet {
            mouse: None,
            joysticks: vec![Box::new(SilentSource(Role::Joystick1, Duration::from_secs(60)))]
        };
        let res = Emulator::start(&config(), PortAssignment::default(), devices, NullPinDriver);
        assert!(matches!(res, Err(StartupError::NoUsableDevices)));
    }

    #[test]
    fn emulator_stops_on_request() {
        let config = config();
        let devices = DeviceSet {
            mouse: Some(Box::new(SilentSource(Role::Mouse, Duration::from_secs(60)))),
            joysticks: Vec::new()
        };
        let assignment = PortAssignment::resolve(&config, true, 0).unwrap();
        assert_eq!(assignment.mouse, Some(PortNumber::One));
        let emulator = Emulator::start(&config, assignment, devices, NullPinDriver).unwrap();
        emulator.shutdown();
        assert!(matches!(emulator.wait(), ExitReason::Requested));
    }

    #[test]
    fn emulator_stops_without_input() {
        let config = config();
        let devices = DeviceSet {
            mouse: None,
            joysticks: vec![Box::new(SilentSource(Role::Joystick1, Duration::from_millis(10)))]
        };
        let assignment = PortAssignment::resolve(&config, false, 1).unwrap();
        let emulator = Emulator::start(&config, assignment, devices, NullPinDriver).unwrap();
        let reason = emulator.wait();
        assert!(matches!(reason, ExitReason::InputExhausted));
        assert!(reason.is_fatal());
    }

    // raises the flag when the port I/O thread lets go of it
    struct FlagDriver(Arc<AtomicBool>);

    impl PinDriver for FlagDriver {
        fn write_pins(&mut self, _pins: &[(Pin, Level)]) -> Result<(), BusError> {
            Ok(())
        }
    }

    impl Drop for FlagDriver {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn external_signal_stops_emulation() {
        let config = config();
        let devices = DeviceSet {
            mouse: Some(Box::new(SilentSource(Role::Mouse, Duration::from_secs(60)))),
            joysticks: Vec::new()
        };
        let assignment = PortAssignment::resolve(&config, true, 0).unwrap();
        let released = Arc::new(AtomicBool::new(false));
        let shutdown = ShutdownSignal::new();
        let emulator = Emulator::start_with_signal(&config, assignment, devices,
                                                   FlagDriver(Arc::clone(&released)),
                                                   shutdown.clone()).unwrap();
        assert!(!emulator.shutdown_signal().is_requested());
        shutdown.request();
        assert!(matches!(emulator.wait(), ExitReason::Requested));
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn signal_requested_during_startup() {
        let config = config();
        let devices = DeviceSet {
            mouse: None,
            joysticks: vec![Box::new(SilentSource(Role::Joystick1, Duration::from_secs(60)))]
        };
        let assignment = PortAssignment::resolve(&config, false, 1).unwrap();
        let shutdown = ShutdownSignal::new();
        shutdown.request();
        let emulator = Emulator::start_with_signal(&config, assignment, devices, NullPinDriver,
                                                   shutdown).unwrap();
        assert!(matches!(emulator.wait(), ExitReason::Requested));
    }
}
