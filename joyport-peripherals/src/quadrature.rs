/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! The quadrature encoder converting pending mouse motion into the signals of a mechanical mouse.
//!
//! Each axis of a mechanical mouse produces two square waves shifted by a quarter of the period.
//! Read together the two signals form a 2-bit Gray code which walks through the sequence:
//!
//! ```text
//!   forward:  00 -> 01 -> 11 -> 10 -> 00
//!   backward: 00 -> 10 -> 11 -> 01 -> 00
//! ```
//!
//! The receiving hardware counts one unit of motion for every transition. The encoder emits at most
//! [QuadratureEncoder::max_steps] transitions per axis in each cycle, keeping the rest of the
//! motion pending for the following cycles.
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::mouse::{MouseMotion, MousePinout};
use crate::port::PortLines;

/// The quadrature codes in the forward order, indexed by a phase.
pub const GRAY_SEQUENCE: [u8;4] = [0b00, 0b01, 0b11, 0b10];

/// The position of a single axis in the [GRAY_SEQUENCE].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct QuadraturePhase(u8);

/// The number of steps to be emitted in a single cycle for each axis, signed with the direction of motion.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Steps {
    pub x: i32,
    pub y: i32
}

/// The 2-bit quadrature codes of both axes at a single moment.
///
/// Bit 0 of each code is the leading (in-phase) signal, bit 1 the quadrature one.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
pub struct QuadratureFrame {
    pub x: u8,
    pub y: u8
}

/// Tracks the phases of both axes and emits the quadrature frames.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "snapshot", serde(rename_all = "camelCase"))]
pub struct QuadratureEncoder {
    pub phase_x: QuadraturePhase,
    pub phase_y: QuadraturePhase,
    max_steps: u16,
}

impl QuadraturePhase {
    /// Returns the current 2-bit code.
    #[inline]
    pub fn code(self) -> u8 {
        GRAY_SEQUENCE[self.0 as usize]
    }
    /// Returns the index in the [GRAY_SEQUENCE].
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }
    /// Moves one position forward or backward through the sequence.
    #[inline]
    pub fn advance(&mut self, forward: bool) {
        self.0 = if forward {
            self.0.wrapping_add(1)
        }
        else {
            self.0.wrapping_sub(1)
        } & 3;
    }
}

impl Steps {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x == 0 && self.y == 0
    }
    /// Returns the number of frames needed to emit the steps.
    #[inline]
    pub fn frames(&self) -> u32 {
        self.x.unsigned_abs().max(self.y.unsigned_abs())
    }
}

impl QuadratureFrame {
    /// Returns the port lines that should be asserted for the frame.
    ///
    /// A signal of 1 leaves a line released while a signal of 0 pulls it low.
    pub fn lines(self, pinout: MousePinout) -> PortLines {
        let (x0, x1, y0, y1) = match pinout {
            MousePinout::Amiga   => (PortLines::DOWN, PortLines::RIGHT, PortLines::UP, PortLines::LEFT),
            MousePinout::AtariSt => (PortLines::DOWN, PortLines::UP, PortLines::LEFT, PortLines::RIGHT),
        };
        let mut lines = PortLines::empty();
        lines.set(x0, self.x & 0b01 == 0);
        lines.set(x1, self.x & 0b10 == 0);
        lines.set(y0, self.y & 0b01 == 0);
        lines.set(y1, self.y & 0b10 == 0);
        lines
    }
}

impl QuadratureEncoder {
    /// Creates the encoder emitting at most `max_steps` transitions per axis in each cycle.
    ///
    /// # Panics
    /// Panics if `max_steps` is 0.
    pub fn new(max_steps: u16) -> Self {
        assert_ne!(max_steps, 0, "max_steps must be greater than 0");
        QuadratureEncoder {
            phase_x: QuadraturePhase::default(),
            phase_y: QuadraturePhase::default(),
            max_steps
        }
    }
    /// The maximum number of transitions emitted per axis in a single cycle.
    #[inline]
    pub fn max_steps(&self) -> u16 {
        self.max_steps
    }
    /// Returns the codes of the current phases.
    #[inline]
    pub fn frame(&self) -> QuadratureFrame {
        QuadratureFrame { x: self.phase_x.code(), y: self.phase_y.code() }
    }
    /// Takes the steps to be emitted in this cycle out of the `pending` motion.
    ///
    /// For each axis `min(|pending|, max_steps)` steps are taken, the remainder is left pending.
    pub fn take_steps(&self, pending: &mut MouseMotion) -> Steps {
        let max = i32::from(self.max_steps);
        let x = pending.x.max(-max).min(max);
        let y = pending.y.max(-max).min(max);
        pending.x -= x;
        pending.y -= y;
        Steps { x, y }
    }
    /// Advances the phases by the given `steps`, one position at a time, pushing a frame
    /// after each advance to `frames`.
    ///
    /// Both axes advance together while both have steps left, so exactly `steps.frames()`
    /// frames are pushed. Zero steps push nothing and leave the phases unchanged.
    pub fn emit<E: Extend<QuadratureFrame>>(&mut self, steps: Steps, frames: &mut E) {
        let (count_x, count_y) = (steps.x.unsigned_abs(), steps.y.unsigned_abs());
        let (fwd_x, fwd_y) = (steps.x > 0, steps.y > 0);
        for n in 0..steps.frames() {
            if n < count_x {
                self.phase_x.advance(fwd_x);
            }
            if n < count_y {
                self.phase_y.advance(fwd_y);
            }
            frames.extend(Some(self.frame()));
        }
    }
}

impl Default for QuadratureEncoder {
    fn default() -> Self {
        QuadratureEncoder::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    /// Decodes the direction of a single transition: 1, -1 or 0 when there is no change.
    fn decode(prev: u8, next: u8) -> i32 {
        let pi = GRAY_SEQUENCE.iter().position(|&c| c == prev).unwrap() as i32;
        let ni = GRAY_SEQUENCE.iter().position(|&c| c == next).unwrap() as i32;
        match (ni - pi).rem_euclid(4) {
            0 => 0,
            1 => 1,
            3 => -1,
            _ => panic!("a skipped quadrature state: {:02b} -> {:02b}", prev, next)
        }
    }

    fn run_cycle(enc: &mut QuadratureEncoder, pending: &mut MouseMotion) -> Vec<QuadratureFrame> {
        let steps = enc.take_steps(pending);
        let mut frames = Vec::new();
        enc.emit(steps, &mut frames);
        frames
    }

    #[test]
    fn gray_sequence_works() {
        let mut phase = QuadraturePhase::default();
        let mut codes = Vec::new();
        for _ in 0..5 {
            codes.push(phase.code());
            phase.advance(true);
        }
        assert_eq!(codes, [0b00, 0b01, 0b11, 0b10, 0b00]);
        codes.clear();
        for _ in 0..5 {
            codes.push(phase.code());
            phase.advance(false);
        }
        assert_eq!(codes, [0b01, 0b00, 0b10, 0b11, 0b01]);
    }

    #[test]
    fn steps_are_capped_per_cycle() {
        let enc = QuadratureEncoder::new(10);
        let mut pending = MouseMotion { x: 50, y: -3 };
        assert_eq!(enc.take_steps(&mut pending), Steps { x: 10, y: -3 });
        assert_eq!(pending, MouseMotion { x: 40, y: 0 });
        let mut pending = MouseMotion { x: -7, y: -25 };
        assert_eq!(enc.take_steps(&mut pending), Steps { x: -7, y: -10 });
        assert_eq!(pending, MouseMotion { x: 0, y: -15 });
    }

    #[test]
    fn pending_motion_drains_over_cycles() {
        let mut enc = QuadratureEncoder::new(10);
        let mut pending = MouseMotion { x: 50, y: 0 };
        let mut prev = enc.frame();
        for cycle in 1..=5 {
            let frames = run_cycle(&mut enc, &mut pending);
            assert_eq!(frames.len(), 10);
            for frame in frames {
                assert_eq!(decode(prev.x, frame.x), 1);
                assert_eq!(decode(prev.y, frame.y), 0);
                prev = frame;
            }
            assert_eq!(pending.x, 50 - cycle * 10);
        }
        assert!(pending.is_idle());
        assert!(run_cycle(&mut enc, &mut pending).is_empty());
    }

    #[test]
    fn idle_mouse_holds_phase() {
        let mut enc = QuadratureEncoder::new(4);
        let mut pending = MouseMotion { x: 3, y: -2 };
        run_cycle(&mut enc, &mut pending);
        let frame = enc.frame();
        let (px, py) = (enc.phase_x, enc.phase_y);
        for _ in 0..100 {
            assert!(run_cycle(&mut enc, &mut pending).is_empty());
        }
        assert_eq!(enc.frame(), frame);
        assert_eq!((enc.phase_x, enc.phase_y), (px, py));
    }

    #[test]
    fn transitions_match_displacement() {
        const MAX_PENDING: i32 = 200;
        let mut rng = SmallRng::seed_from_u64(0x9a_d_c0de);
        for _ in 0..200 {
            let max_steps = rng.gen_range(1..=16u16);
            let mut enc = QuadratureEncoder::new(max_steps);
            let mut pending = MouseMotion::default();
            let mut sum = (0i32, 0i32);
            for _ in 0..rng.gen_range(1..20) {
                let (dx, dy) = (rng.gen_range(-40..=40), rng.gen_range(-40..=40));
                // keep the sum inside the clamp so nothing is dropped
                if (sum.0 + dx).abs() > MAX_PENDING || (sum.1 + dy).abs() > MAX_PENDING {
                    continue
                }
                sum.0 += dx;
                sum.1 += dy;
                pending.accumulate(dx, dy, MAX_PENDING);
            }
            let mut prev = enc.frame();
            let (mut moved_x, mut moved_y) = (0, 0);
            let (mut count_x, mut count_y) = (0, 0);
            let cycles = MAX_PENDING / i32::from(max_steps) + 1;
            for _ in 0..cycles {
                for frame in run_cycle(&mut enc, &mut pending) {
                    let (tx, ty) = (decode(prev.x, frame.x), decode(prev.y, frame.y));
                    moved_x += tx;
                    moved_y += ty;
                    count_x += tx.abs();
                    count_y += ty.abs();
                    prev = frame;
                }
            }
            assert!(pending.is_idle());
            assert_eq!((moved_x, moved_y), sum);
            assert_eq!((count_x, count_y), (sum.0.abs(), sum.1.abs()));
        }
    }

    #[test]
    fn clamped_motion_emits_clamp() {
        let mut enc = QuadratureEncoder::new(8);
        let mut pending = MouseMotion::default();
        pending.accumulate(-1000, 0, 64);
        pending.accumulate(-1000, 0, 64);
        let mut transitions = 0;
        let mut prev = enc.frame();
        for _ in 0..20 {
            for frame in run_cycle(&mut enc, &mut pending) {
                assert_eq!(decode(prev.x, frame.x), -1);
                transitions += 1;
                prev = frame;
            }
        }
        assert_eq!(transitions, 64);
    }

    #[test]
    fn frame_lines_work() {
        let idle = QuadratureFrame { x: 0b11, y: 0b11 };
        assert_eq!(idle.lines(MousePinout::Amiga), PortLines::empty());
        assert_eq!(idle.lines(MousePinout::AtariSt), PortLines::empty());
        let low = QuadratureFrame::default();
        let all = PortLines::UP|PortLines::DOWN|PortLines::LEFT|PortLines::RIGHT;
        assert_eq!(low.lines(MousePinout::Amiga), all);
        assert_eq!(low.lines(MousePinout::AtariSt), all);
        let frame = QuadratureFrame { x: 0b10, y: 0b01 };
        // Amiga: H=pin2 low, HQ=pin4 high, V=pin1 high, VQ=pin3 low
        assert_eq!(frame.lines(MousePinout::Amiga), PortLines::DOWN|PortLines::LEFT);
        // Atari ST: XA=pin2 low, XB=pin1 high, YA=pin3 high, YB=pin4 low
        assert_eq!(frame.lines(MousePinout::AtariSt), PortLines::DOWN|PortLines::RIGHT);
    }
}
