// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Where the grating phase comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Relative mouse motion advances the phase every frame.
    Pointer,
    /// The last value received from the trackball sets the phase.
    Trackball,
}

/// Options for the serial connection to the trackball.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialOptions {
    /// Device path (e.g. `COM8` or `/dev/ttyACM0`).
    pub path: String,

    /// Baud rate of the connection.
    pub baud_rate: u32,

    /// Read timeout in milliseconds. This is also how long the reader thread
    /// may take to notice that it has been asked to stop.
    pub timeout_ms: u64,

    /// Fall back to a dummy port that never produces data if the device
    /// cannot be opened. Only useful when testing without hardware.
    pub allow_dummy: bool,
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self {
            path: default_serial_path().to_owned(),
            baud_rate: 115_200,
            timeout_ms: 100,
            allow_dummy: false,
        }
    }
}

#[cfg(target_os = "windows")]
fn default_serial_path() -> &'static str {
    "COM8"
}

#[cfg(not(target_os = "windows"))]
fn default_serial_path() -> &'static str {
    "/dev/ttyACM0"
}

/// Everything the experiment needs to know. The defaults are the standard
/// session: mouse input, 20 000 frames, a 1500x1000 window.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentOptions {
    /// Mouse or trackball.
    pub input_mode: InputMode,

    /// Maximum number of frames to show.
    pub n_frames: u32,

    /// Window size in physical pixels.
    pub window_size: (u32, u32),

    /// Show window decorations.
    pub allow_gui: bool,

    pub serial: SerialOptions,

    /// Phase change (cycles) per normalised unit of horizontal mouse motion.
    pub pointer_gain: f64,

    /// Phase (cycles) per trackball unit.
    pub trackball_gain: f64,

    /// Orientation change (degrees) per wheel click.
    pub wheel_gain_deg: f64,

    /// Size of the grating patch in normalised window units.
    pub patch_size: (f64, f64),

    /// Spatial frequency in cycles per normalised unit.
    pub spatial_frequency: f64,

    /// Grating colour in signed (-1..1) RGB.
    pub grating_color: [f64; 3],

    /// Window background in signed (-1..1) RGB.
    pub background_color: [f64; 3],
}

impl Default for ExperimentOptions {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Pointer,
            n_frames: 20_000,
            window_size: (1500, 1000),
            allow_gui: true,
            serial: SerialOptions::default(),
            pointer_gain: 2.5,
            trackball_gain: 1.0 / 60.0,
            wheel_gain_deg: 5.0,
            patch_size: (1.0, 1.0),
            spatial_frequency: 3.0,
            grating_color: [-1.0, -1.0, 0.0],
            background_color: [0.0, 0.0, 0.0],
        }
    }
}

impl ExperimentOptions {
    /// The gain applied to input from `mode`.
    pub fn gain_for(&self, mode: InputMode) -> f64 {
        match mode {
            InputMode::Pointer => self.pointer_gain,
            InputMode::Trackball => self.trackball_gain,
        }
    }

    /// Number of grating cycles across the width of the patch.
    pub fn cycles_per_patch(&self) -> f64 {
        self.spatial_frequency * self.patch_size.0
    }

    /// Size of the patch in pixels for a window of the given size.
    /// Normalised units span -1..1, so one unit is half the window.
    pub fn patch_size_px(&self, window_width: u32, window_height: u32) -> (f64, f64) {
        (
            self.patch_size.0 * window_width as f64 / 2.0,
            self.patch_size.1 * window_height as f64 / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_standard_session() {
        let options = ExperimentOptions::default();
        assert_eq!(options.input_mode, InputMode::Pointer);
        assert_eq!(options.n_frames, 20_000);
        assert_eq!(options.window_size, (1500, 1000));
        assert!(options.allow_gui);
        assert_eq!(options.serial.baud_rate, 115_200);
        assert_eq!(options.wheel_gain_deg, 5.0);
    }

    #[test]
    fn gain_follows_input_mode() {
        let options = ExperimentOptions {
            pointer_gain: 3.0,
            trackball_gain: 0.5,
            ..ExperimentOptions::default()
        };
        assert_eq!(options.gain_for(InputMode::Pointer), 3.0);
        assert_eq!(options.gain_for(InputMode::Trackball), 0.5);
    }

    #[test]
    fn patch_covers_half_the_window() {
        let options = ExperimentOptions::default();
        assert_eq!(options.patch_size_px(1500, 1000), (750.0, 500.0));
        assert_eq!(options.cycles_per_patch(), 3.0);
    }
}
