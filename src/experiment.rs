// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The frame loop. It knows nothing about windows or GPUs: every frame it
//! gets a [`FrameInput`] and answers with a [`FrameStep`].

use crate::input::FrameInput;
use crate::options::{ExperimentOptions, InputMode};
use crate::serial::LatestValue;
use crate::utils::wrap_phase;
use web_time::{Duration, Instant};

/// Phase and orientation of the grating.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GratingState {
    /// Phase in cycles, always in `[0, 1)`.
    pub phase: f64,
    /// Orientation in degrees, clockwise. Not wrapped.
    pub orientation: f64,
}

impl GratingState {
    pub fn advance_phase(&mut self, delta: f64) {
        self.phase = wrap_phase(self.phase + delta);
    }

    pub fn set_phase(&mut self, phase: f64) {
        self.phase = wrap_phase(phase);
    }

    pub fn rotate(&mut self, degrees: f64) {
        self.orientation += degrees;
    }
}

/// Where the phase comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Relative pointer motion, accumulated.
    Pointer,
    /// Absolute: the last trackball value times the gain.
    Trackball(LatestValue),
}

impl InputSource {
    pub fn mode(&self) -> InputMode {
        match self {
            InputSource::Pointer => InputMode::Pointer,
            InputSource::Trackball(_) => InputMode::Trackball,
        }
    }
}

/// What the caller should do after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStep {
    /// Draw the grating in this state and present the frame.
    Draw(GratingState),
    /// A quit key was pressed; nothing is drawn for this frame.
    Quit,
    /// All frames have been shown.
    Finished,
}

pub struct FrameLoop {
    source: InputSource,
    gain: f64,
    wheel_gain_deg: f64,
    n_frames: u32,
    frame: u32,
    state: GratingState,
}

impl FrameLoop {
    pub fn new(options: &ExperimentOptions, source: InputSource) -> Self {
        Self {
            gain: options.gain_for(source.mode()),
            source,
            wheel_gain_deg: options.wheel_gain_deg,
            n_frames: options.n_frames,
            frame: 0,
            state: GratingState::default(),
        }
    }

    /// Runs one frame: quit check, rotation from the wheel, then the phase
    /// update for the active input source.
    pub fn step(&mut self, input: &FrameInput) -> FrameStep {
        if self.frame >= self.n_frames {
            return FrameStep::Finished;
        }

        if input.quit_requested {
            return FrameStep::Quit;
        }

        self.state.rotate(input.wheel_dy * self.wheel_gain_deg);

        match &self.source {
            InputSource::Pointer => self.state.advance_phase(input.pointer_dx * self.gain),
            InputSource::Trackball(latest) => self.state.set_phase(latest.get() * self.gain),
        }

        self.frame += 1;
        log::trace!(
            "frame {}: phase {:.4}, orientation {:.1}",
            self.frame,
            self.state.phase,
            self.state.orientation
        );

        FrameStep::Draw(self.state)
    }

    pub fn state(&self) -> GratingState {
        self.state
    }

    /// Number of frames drawn so far.
    pub fn frames_shown(&self) -> u32 {
        self.frame
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

/// Keeps track of frame durations and reports frames that took noticeably
/// longer than usual, which usually means a missed refresh.
#[derive(Debug, Default)]
pub struct FrameTimer {
    last: Option<Instant>,
    count: u32,
    total: Duration,
    longest: Duration,
    slow_frames: u32,
}

impl FrameTimer {
    /// Frames before durations are judged, so the average can settle.
    const WARMUP_FRAMES: u32 = 10;
    const SLOW_FACTOR: f64 = 1.5;

    pub fn new() -> Self {
        Self::default()
    }

    /// Call right after a frame has been presented.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last {
            self.record(now.duration_since(last));
        }
        self.last = Some(now);
    }

    pub fn record(&mut self, duration: Duration) {
        if self.count >= Self::WARMUP_FRAMES {
            let mean = self.mean();
            if duration.as_secs_f64() > mean.as_secs_f64() * Self::SLOW_FACTOR {
                self.slow_frames += 1;
                log::debug!(
                    "Slow frame: {:.2} ms (mean {:.2} ms)",
                    duration.as_secs_f64() * 1000.0,
                    mean.as_secs_f64() * 1000.0
                );
            }
        }

        self.count += 1;
        self.total += duration;
        self.longest = self.longest.max(duration);
    }

    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count
        }
    }

    pub fn longest(&self) -> Duration {
        self.longest
    }

    pub fn slow_frames(&self) -> u32 {
        self.slow_frames
    }

    pub fn log_summary(&self, frames_shown: u32) {
        log::info!(
            "{} frames shown, mean frame time {:.2} ms, longest {:.2} ms, {} slow frames",
            frames_shown,
            self.mean().as_secs_f64() * 1000.0,
            self.longest.as_secs_f64() * 1000.0,
            self.slow_frames
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer_loop(n_frames: u32) -> FrameLoop {
        let options = ExperimentOptions {
            n_frames,
            ..ExperimentOptions::default()
        };
        FrameLoop::new(&options, InputSource::Pointer)
    }

    fn moved(dx: f64) -> FrameInput {
        FrameInput {
            pointer_dx: dx,
            ..FrameInput::default()
        }
    }

    fn phase_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(1.0);
        d.min(1.0 - d)
    }

    #[test]
    fn pointer_motion_advances_phase_by_gain() {
        let mut frame_loop = pointer_loop(100);
        let mut expected = 0.0;

        for dx in [0.1, -0.03, 0.5, 1.7, -2.25, 0.0] {
            let before = frame_loop.state().phase;
            let FrameStep::Draw(state) = frame_loop.step(&moved(dx)) else {
                panic!("expected a frame to be drawn");
            };
            expected += dx * 2.5;

            assert!(phase_distance(state.phase - before, dx * 2.5) < 1e-9);
            assert!(phase_distance(state.phase, expected) < 1e-9);
            assert!((0.0..1.0).contains(&state.phase));
        }
    }

    #[test]
    fn wheel_rotates_cumulatively() {
        let mut frame_loop = pointer_loop(100);
        let wheel = |dy| FrameInput {
            wheel_dy: dy,
            ..FrameInput::default()
        };

        frame_loop.step(&wheel(2.0));
        assert_eq!(frame_loop.state().orientation, 10.0);
        frame_loop.step(&wheel(0.0));
        assert_eq!(frame_loop.state().orientation, 10.0);
        frame_loop.step(&wheel(-1.0));
        assert_eq!(frame_loop.state().orientation, 5.0);
        for _ in 0..80 {
            frame_loop.step(&wheel(1.0));
        }
        // no wrapping
        assert_eq!(frame_loop.state().orientation, 405.0);
    }

    #[test]
    fn quit_stops_before_anything_changes() {
        let mut frame_loop = pointer_loop(100);
        frame_loop.step(&moved(0.1));
        let before = frame_loop.state();

        let input = FrameInput {
            pointer_dx: 0.3,
            wheel_dy: 4.0,
            pointer_dy: 0.0,
            quit_requested: true,
        };
        assert_eq!(frame_loop.step(&input), FrameStep::Quit);
        assert_eq!(frame_loop.state(), before);
        assert_eq!(frame_loop.frames_shown(), 1);
    }

    #[test]
    fn stops_after_frame_budget() {
        let mut frame_loop = pointer_loop(20_000);
        let mut drawn = 0;
        loop {
            match frame_loop.step(&moved(0.01)) {
                FrameStep::Draw(_) => drawn += 1,
                FrameStep::Finished => break,
                FrameStep::Quit => unreachable!(),
            }
        }
        assert_eq!(drawn, 20_000);
        assert_eq!(frame_loop.frames_shown(), 20_000);
        assert_eq!(frame_loop.step(&moved(0.01)), FrameStep::Finished);
    }

    #[test]
    fn trackball_sets_absolute_phase() {
        let options = ExperimentOptions {
            input_mode: InputMode::Trackball,
            ..ExperimentOptions::default()
        };
        let latest = LatestValue::default();
        let mut frame_loop = FrameLoop::new(&options, InputSource::Trackball(latest.clone()));
        assert_eq!(frame_loop.source().mode(), InputMode::Trackball);

        latest.set(30.0);
        // pointer motion is ignored in trackball mode
        frame_loop.step(&moved(0.4));
        assert!((frame_loop.state().phase - 0.5).abs() < 1e-12);

        // same value twice gives the same phase, not twice the advance
        frame_loop.step(&moved(0.0));
        assert!((frame_loop.state().phase - 0.5).abs() < 1e-12);

        latest.set(75.0);
        frame_loop.step(&FrameInput::default());
        assert!((frame_loop.state().phase - 0.25).abs() < 1e-12);

        latest.set(-15.0);
        frame_loop.step(&FrameInput::default());
        assert!((frame_loop.state().phase - 0.75).abs() < 1e-12);
    }

    #[test]
    fn gain_is_taken_from_the_source() {
        let options = ExperimentOptions::default();
        assert_eq!(FrameLoop::new(&options, InputSource::Pointer).gain(), 2.5);
        let trackball = FrameLoop::new(&options, InputSource::Trackball(LatestValue::default()));
        assert!((trackball.gain() - 1.0 / 60.0).abs() < 1e-15);
    }

    #[test]
    fn gain_follows_the_source_not_the_configured_mode() {
        let options = ExperimentOptions {
            input_mode: InputMode::Pointer,
            pointer_gain: 4.0,
            trackball_gain: 0.25,
            ..ExperimentOptions::default()
        };
        let trackball = FrameLoop::new(&options, InputSource::Trackball(LatestValue::default()));
        assert_eq!(trackball.gain(), options.gain_for(InputMode::Trackball));
        assert_eq!(trackball.gain(), 0.25);
    }

    #[test]
    fn timer_counts_slow_frames_after_warmup() {
        let mut timer = FrameTimer::new();
        for _ in 0..20 {
            timer.record(Duration::from_millis(16));
        }
        timer.record(Duration::from_millis(33));
        timer.record(Duration::from_millis(17));

        assert_eq!(timer.slow_frames(), 1);
        assert_eq!(timer.longest(), Duration::from_millis(33));
        assert!(timer.mean() > Duration::from_millis(16));
    }

    #[test]
    fn timer_starts_empty() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.mean(), Duration::ZERO);
        timer.tick();
        assert_eq!(timer.mean(), Duration::ZERO);
    }
}
