/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The state of the emulated ports shared between the input and the port I/O loops.
//!
//! The input poll loop is the only writer, the port I/O loop takes snapshots and drains
//! the pending mouse motion. Each port record is guarded separately.
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

#[allow(unused_imports)]
use log::{debug, trace};

use crate::input::{Button, Direction, InputEvent, Role};
use crate::peripherals::{
    joystick::{Directions, FireButtons, JoystickState},
    mouse::{MouseButtons, MouseMotion, MouseState}
};

/// The thread-safe model of the emulated ports.
#[derive(Debug)]
pub struct PortStateModel {
    mouse: Mutex<MouseState>,
    joysticks: [Mutex<JoystickState>;2],
    max_pending: i32,
}

/// An independent copy of the state of all ports.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct PortStateSnapshot {
    pub mouse: MouseState,
    pub joysticks: [JoystickState;2],
}

impl PortStateSnapshot {
    /// Returns the state of the joystick in the given `role` or `None` if `role` is not a joystick.
    pub fn joystick(&self, role: Role) -> Option<&JoystickState> {
        joystick_index(role).map(|n| &self.joysticks[n])
    }
}

impl PortStateModel {
    /// Creates the model with the pending mouse motion limited to `±max_pending` on each axis.
    pub fn new(max_pending: i32) -> Self {
        PortStateModel {
            mouse: Mutex::default(),
            joysticks: Default::default(),
            max_pending: max_pending.max(1)
        }
    }
    /// Applies a normalized event from a device in the given `role`.
    pub fn apply(&self, role: Role, event: InputEvent) {
        match event {
            InputEvent::Motion { dx, dy } => self.apply_motion(role, dx, dy),
            InputEvent::Button { button, pressed } => self.apply_button(role, button, pressed),
            InputEvent::Direction { direction, pressed } => self.apply_direction(role, direction, pressed),
        }
    }
    /// Adds the relative motion to the pending mouse motion.
    ///
    /// Motion beyond the limit is dropped. Ignored unless `role` is the mouse.
    pub fn apply_motion(&self, role: Role, dx: i32, dy: i32) {
        if role != Role::Mouse {
            return
        }
        let mut mouse = lock(&self.mouse);
        mouse.pending.accumulate(dx, dy, self.max_pending);
        trace!("mouse pending: {:?}", mouse.pending);
    }
    /// Presses or releases a button of the device in the given `role`.
    pub fn apply_button(&self, role: Role, button: Button, pressed: bool) {
        match joystick_index(role) {
            Some(n) => {
                let fire = match button {
                    Button::Primary => FireButtons::FIRE1,
                    Button::Secondary => FireButtons::FIRE2,
                };
                lock(&self.joysticks[n]).fire(fire, pressed);
            }
            None => {
                let buttons = match button {
                    Button::Primary => MouseButtons::LEFT,
                    Button::Secondary => MouseButtons::RIGHT,
                };
                lock(&self.mouse).set_buttons(buttons, pressed);
            }
        }
        trace!("{} {:?} button: {}", role, button, pressed);
    }
    /// Presses or releases a direction of the joystick in the given `role`.
    ///
    /// Pressing a direction releases the opposite one. Ignored for the mouse.
    pub fn apply_direction(&self, role: Role, direction: Direction, pressed: bool) {
        if let Some(n) = joystick_index(role) {
            let dir = match direction {
                Direction::Up => Directions::UP,
                Direction::Down => Directions::DOWN,
                Direction::Left => Directions::LEFT,
                Direction::Right => Directions::RIGHT,
            };
            let mut joy = lock(&self.joysticks[n]);
            joy.set_direction(dir, pressed);
            trace!("{} directions: {:?}", role, joy.directions());
        }
    }
    /// Releases every line held by the device in the given `role`.
    ///
    /// A joystick returns to the center with its fire buttons released, the mouse
    /// releases its buttons and discards the pending motion.
    pub fn release(&self, role: Role) {
        match joystick_index(role) {
            Some(n) => *lock(&self.joysticks[n]) = JoystickState::default(),
            None => *lock(&self.mouse) = MouseState::default(),
        }
        debug!("{} released", role);
    }
    /// Returns a copy of the state of all ports.
    pub fn snapshot(&self) -> PortStateSnapshot {
        let mouse = *lock(&self.mouse);
        let joysticks = [*lock(&self.joysticks[0]), *lock(&self.joysticks[1])];
        PortStateSnapshot { mouse, joysticks }
    }
    /// Runs `f` on the pending mouse motion while holding the mouse record.
    pub(crate) fn drain_motion<R, F: FnOnce(&mut MouseMotion) -> R>(&self, f: F) -> R {
        f(&mut lock(&self.mouse).pending)
    }
}

impl Default for PortStateModel {
    fn default() -> Self {
        PortStateModel::new(crate::config::DEFAULT_MAX_PENDING)
    }
}

fn joystick_index(role: Role) -> Option<usize> {
    match role {
        Role::Mouse => None,
        Role::Joystick1 => Some(0),
        Role::Joystick2 => Some(1),
    }
}

// The records are plain data, a panic while holding one can't leave it half updated in a harmful way.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use crate::peripherals::port::PortLines;

    #[test]
    fn motion_is_clamped() {
        let model = PortStateModel::new(100);
        model.apply_motion(Role::Mouse, 60, -60);
        model.apply_motion(Role::Mouse, 60, -60);
        assert_eq!(model.snapshot().mouse.pending, MouseMotion { x: 100, y: -100 });
        model.apply_motion(Role::Mouse, 1, -1);
        assert_eq!(model.snapshot().mouse.pending, MouseMotion { x: 100, y: -100 });
        model.apply_motion(Role::Mouse, -1, 1);
        assert_eq!(model.snapshot().mouse.pending, MouseMotion { x: 99, y: -99 });
        // not a mouse
        model.apply_motion(Role::Joystick1, -50, 50);
        assert_eq!(model.snapshot().mouse.pending, MouseMotion { x: 99, y: -99 });
    }

    #[test]
    fn events_are_routed_by_role() {
        let model = PortStateModel::default();
        model.apply(Role::Mouse, InputEvent::Button { button: Button::Secondary, pressed: true });
        model.apply(Role::Joystick1, InputEvent::Button { button: Button::Primary, pressed: true });
        model.apply(Role::Joystick2, InputEvent::Direction { direction: Direction::Left, pressed: true });
        model.apply(Role::Mouse, InputEvent::Direction { direction: Direction::Up, pressed: true });
        model.apply(Role::Mouse, InputEvent::Motion { dx: 3, dy: 4 });
        let snap = model.snapshot();
        assert_eq!(snap.mouse.buttons, MouseButtons::RIGHT);
        assert_eq!(snap.mouse.pending, MouseMotion { x: 3, y: 4 });
        assert_eq!(snap.joysticks[0].lines(), PortLines::FIRE1);
        assert_eq!(snap.joystick(Role::Joystick2).unwrap().lines(), PortLines::LEFT);
        assert!(snap.joystick(Role::Mouse).is_none());
    }

    #[test]
    fn down_overrides_up() {
        let model = PortStateModel::default();
        model.apply_direction(Role::Joystick1, Direction::Up, true);
        model.apply_direction(Role::Joystick1, Direction::Down, true);
        let dirs = model.snapshot().joysticks[0].directions();
        assert_eq!(dirs, Directions::DOWN);
    }

    #[test]
    fn drain_takes_pending_motion() {
        let model = PortStateModel::default();
        model.apply_motion(Role::Mouse, 10, -4);
        let taken = model.drain_motion(|m| core::mem::take(m));
        assert_eq!(taken, MouseMotion { x: 10, y: -4 });
        assert!(model.snapshot().mouse.pending.is_idle());
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn snapshot_serializes() {
        let model = PortStateModel::default();
        model.apply_motion(Role::Mouse, 7, -3);
        model.apply_direction(Role::Joystick2, Direction::Right, true);
        let snap = model.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: PortStateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn release_clears_one_record() {
        let model = PortStateModel::default();
        model.apply_motion(Role::Mouse, 30, -4);
        model.apply_button(Role::Mouse, Button::Secondary, true);
        model.apply_direction(Role::Joystick1, Direction::Left, true);
        model.apply_button(Role::Joystick1, Button::Primary, true);
        model.apply_direction(Role::Joystick2, Direction::Up, true);

        model.release(Role::Joystick1);
        let snap = model.snapshot();
        assert!(snap.joysticks[0].lines().is_empty());
        assert_eq!(snap.joysticks[1].directions(), Directions::UP);
        assert_eq!(snap.mouse.pending, MouseMotion { x: 30, y: -4 });

        model.release(Role::Mouse);
        let snap = model.snapshot();
        assert_eq!(snap.mouse, MouseState::default());
        assert_eq!(snap.joysticks[1].directions(), Directions::UP);
    }

    #[test]
    fn snapshots_are_consistent() {
        let model = Arc::new(PortStateModel::new(i32::MAX));
        let writer = {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                for _ in 0..100_000 {
                    model.apply_motion(Role::Mouse, 1, -1);
                }
            })
        };
        let mut last = 0;
        while !writer.is_finished() {
            let pending = model.snapshot().mouse.pending;
            assert_eq!(pending.x, -pending.y);
            assert!(pending.x >= last);
            last = pending.x;
        }
        writer.join().unwrap();
        assert_eq!(model.snapshot().mouse.pending, MouseMotion { x: 100_000, y: -100_000 });
    }
}
