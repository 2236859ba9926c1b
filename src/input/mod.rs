// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-frame input. Winit delivers events one by one; the [`InputCollector`]
//! sums them up until the frame loop takes a [`FrameInput`], which also
//! throws away everything else that happened since the last frame.

pub use winit::event::VirtualKeyCode as Key;
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};

/// Scroll deltas reported in pixels (touchpads) are converted to wheel clicks
/// with this many pixels per click.
pub const PIXELS_PER_WHEEL_LINE: f64 = 20.0;

/// Keys that end the experiment immediately.
pub const QUIT_KEYS: [Key; 2] = [Key::Escape, Key::Q];

pub fn is_quit_key(key: Key) -> bool {
    QUIT_KEYS.contains(&key)
}

/// Everything the frame loop needs to know about input since the last frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Horizontal pointer motion in normalised window units (positive is right).
    pub pointer_dx: f64,
    /// Vertical pointer motion in normalised window units (positive is up).
    pub pointer_dy: f64,
    /// Wheel motion in clicks (positive is away from the user).
    pub wheel_dy: f64,
    /// A quit key was pressed or the window was closed.
    pub quit_requested: bool,
}

/// Accumulates winit events between frames.
///
/// Pointer motion is taken from raw device events so that it keeps working
/// when the (hidden) cursor hits the edge of the window. The window size is
/// needed to express it in normalised units, where the window spans -1..1.
#[derive(Debug, Clone)]
pub struct InputCollector {
    window_size: (u32, u32),
    pending: FrameInput,
}

impl InputCollector {
    pub fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_size: (window_width, window_height),
            pending: FrameInput::default(),
        }
    }

    pub fn set_window_size(&mut self, window_width: u32, window_height: u32) {
        self.window_size = (window_width, window_height);
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent<'_>) {
        match event {
            WindowEvent::KeyboardInput { input, .. } => {
                if input.state == ElementState::Pressed {
                    if let Some(key) = input.virtual_keycode {
                        self.key_pressed(key);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.wheel_scrolled(*delta),
            WindowEvent::CloseRequested => self.request_quit(),
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.pointer_moved(*dx, *dy);
        }
    }

    pub fn key_pressed(&mut self, key: Key) {
        if is_quit_key(key) {
            log::debug!("Quit key {:?} pressed", key);
            self.request_quit();
        }
    }

    /// Adds raw pointer motion given in pixels (y pointing down, as reported
    /// by the OS).
    pub fn pointer_moved(&mut self, dx_px: f64, dy_px: f64) {
        let (width, height) = self.window_size;
        if width == 0 || height == 0 {
            // minimised
            return;
        }
        self.pending.pointer_dx += dx_px / (width as f64 / 2.0);
        self.pending.pointer_dy -= dy_px / (height as f64 / 2.0);
    }

    pub fn wheel_scrolled(&mut self, delta: MouseScrollDelta) {
        self.pending.wheel_dy += match delta {
            MouseScrollDelta::LineDelta(_, y) => y as f64,
            MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_WHEEL_LINE,
        };
    }

    pub fn request_quit(&mut self) {
        self.pending.quit_requested = true;
    }

    /// Returns the input gathered since the last call and starts over.
    pub fn take(&mut self) -> FrameInput {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn escape_and_q_quit() {
        assert!(is_quit_key(Key::Escape));
        assert!(is_quit_key(Key::Q));
        assert!(!is_quit_key(Key::Space));
        assert!(!is_quit_key(Key::W));
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut collector = InputCollector::new(1500, 1000);
        collector.key_pressed(Key::A);
        collector.key_pressed(Key::Return);
        assert_eq!(collector.take(), FrameInput::default());

        collector.key_pressed(Key::Q);
        assert!(collector.take().quit_requested);
    }

    #[test]
    fn pointer_motion_is_normalised_to_window_size() {
        let mut collector = InputCollector::new(1500, 1000);
        collector.pointer_moved(750.0, 0.0);
        collector.pointer_moved(-375.0, 250.0);

        let input = collector.take();
        assert!((input.pointer_dx - 0.5).abs() < 1e-12);
        assert!((input.pointer_dy + 0.5).abs() < 1e-12);
    }

    #[test]
    fn wheel_lines_and_pixels_accumulate() {
        let mut collector = InputCollector::new(1500, 1000);
        collector.wheel_scrolled(MouseScrollDelta::LineDelta(0.0, 1.0));
        collector.wheel_scrolled(MouseScrollDelta::LineDelta(3.0, 1.0));
        collector.wheel_scrolled(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0,
            -PIXELS_PER_WHEEL_LINE,
        )));

        assert_eq!(collector.take().wheel_dy, 1.0);
    }

    #[test]
    fn take_clears_pending_input() {
        let mut collector = InputCollector::new(1500, 1000);
        collector.pointer_moved(10.0, 10.0);
        collector.wheel_scrolled(MouseScrollDelta::LineDelta(0.0, 2.0));
        collector.request_quit();

        let first = collector.take();
        assert!(first.quit_requested);
        assert_eq!(collector.take(), FrameInput::default());
    }

    #[test]
    fn motion_while_minimised_is_dropped() {
        let mut collector = InputCollector::new(1500, 1000);
        collector.set_window_size(0, 0);
        collector.pointer_moved(100.0, 100.0);
        assert_eq!(collector.take().pointer_dx, 0.0);
    }

    #[test]
    fn raw_motion_events_are_collected() {
        let mut collector = InputCollector::new(200, 100);
        collector.handle_device_event(&DeviceEvent::MouseMotion { delta: (50.0, 0.0) });
        collector.handle_device_event(&DeviceEvent::Added);
        assert!((collector.take().pointer_dx - 0.5).abs() < 1e-12);
    }

    #[test]
    fn closing_the_window_quits() {
        let mut collector = InputCollector::new(1500, 1000);
        collector.handle_window_event(&WindowEvent::CloseRequested);
        assert!(collector.take().quit_requested);
    }
}
