// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A rotating sine grating whose phase follows either the mouse or a
//! trackball connected over a serial port.
//!
//! The frame loop ([`experiment::FrameLoop`]) is independent of the window
//! and the GPU; [`app::run`] wires it to a winit window and a wgpu surface.

pub mod app;
pub mod errors;
pub mod experiment;
pub mod input;
pub mod options;
pub mod serial;
pub mod utils;
pub mod visual;

pub use errors::GratingsError;
pub use experiment::{FrameLoop, FrameStep, GratingState, InputSource};
pub use input::{FrameInput, InputCollector};
pub use options::{ExperimentOptions, InputMode, SerialOptions};
pub use serial::{LatestValue, SerialPort, TrackballReader};
