/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The input poll loop applying the normalized events to the port state model.
use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::thread;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::input::{DeviceLost, EventSource, InputEvent, Role};
use crate::shutdown::{ExitReason, ShutdownSignal};
use crate::state::PortStateModel;

/// The number of events that can be queued by the readers before they block.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// A message from a device reader.
pub type HubMessage = (Role, Result<InputEvent, DeviceLost>);

/// Multiplexes the events from all the input devices into a single queue.
///
/// Each device is read by its own thread. A reader ends after its device is lost or
/// when the hub is gone.
#[derive(Debug)]
pub struct InputHub {
    rx: Receiver<HubMessage>,
    devices: usize,
}

/// The result of a single [InputPoller::poll].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    /// No event arrived in time.
    Idle,
    /// An event from a device in the given role was applied.
    Applied(Role),
    /// A device in the given role was lost, some devices are still alive.
    Lost(Role),
    /// All the devices are lost.
    Exhausted,
}

/// Reads the events from an [InputHub] and applies them to the port state model.
#[derive(Debug)]
pub struct InputPoller {
    hub: InputHub,
    state: Arc<PortStateModel>,
    poll_timeout: Duration,
    live: usize,
}

impl InputHub {
    /// Starts a reader thread for each of the `sources`.
    pub fn spawn<I>(sources: I) -> io::Result<Self>
        where I: IntoIterator<Item=Box<dyn EventSource>>
    {
        let (tx, rx) = sync_channel::<HubMessage>(EVENT_QUEUE_CAPACITY);
        let mut devices = 0;
        for source in sources {
            let tx = tx.clone();
            let name = format!("input {}", source.role());
            debug!("reading {} from {}", source.role(), source.name());
            thread::Builder::new().name(name).spawn(move || read_source(source, tx))?;
            devices += 1;
        }
        Ok(InputHub { rx, devices })
    }
    /// Returns the number of devices the readers were started for.
    #[inline]
    pub fn devices(&self) -> usize {
        self.devices
    }
}

fn read_source(mut source: Box<dyn EventSource>, tx: SyncSender<HubMessage>) {
    let role = source.role();
    let mut events = Vec::new();
    loop {
        events.clear();
        match source.read_events(&mut events) {
            Ok(()) => {
                for event in events.drain(..) {
                    if tx.send((role, Ok(event))).is_err() {
                        return
                    }
                }
            }
            Err(lost) => {
                tx.send((role, Err(lost))).ok();
                return
            }
        }
    }
}

impl InputPoller {
    pub fn new(hub: InputHub, state: Arc<PortStateModel>, poll_timeout: Duration) -> Self {
        let live = hub.devices;
        InputPoller { hub, state, poll_timeout, live }
    }
    /// Waits up to `timeout` for the next event and applies it.
    pub fn poll(&mut self, timeout: Duration) -> PollState {
        if self.live == 0 {
            return PollState::Exhausted
        }
        match self.hub.rx.recv_timeout(timeout) {
            Ok((role, Ok(event))) => {
                trace!("{}: {:?}", role, event);
                self.state.apply(role, event);
                PollState::Applied(role)
            }
            Ok((role, Err(lost))) => {
                warn!("{}: {}", role, lost);
                self.state.release(role);
                self.live -= 1;
                if self.live == 0 {
                    PollState::Exhausted
                }
                else {
                    PollState::Lost(role)
                }
            }
            Err(RecvTimeoutError::Timeout) => PollState::Idle,
            Err(RecvTimeoutError::Disconnected) => {
                self.live = 0;
                PollState::Exhausted
            }
        }
    }
    /// Polls the events until the `shutdown` is requested or all the devices are lost.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> ExitReason {
        info!("input polling started, {} device(s)", self.live);
        while !shutdown.is_requested() {
            if let PollState::Exhausted = self.poll(self.poll_timeout) {
                error!("no input devices left");
                return ExitReason::InputExhausted
            }
        }
        info!("input polling stopped");
        ExitReason::Requested
    }
    /// Returns the number of devices still delivering events.
    #[inline]
    pub fn live_devices(&self) -> usize {
        self.live
    }
}
