// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GratingsError {
    // file and stream errors
    #[error("{0}")]
    IOError(#[from] std::io::Error),

    // serial port errors
    #[error("{0}")]
    SerialPortError(#[from] serialport::Error),

    // trackball data errors
    #[error("Could not parse trackball line {line:?}: {reason}")]
    ParseError { line: String, reason: String },

    // window and gpu errors
    #[error("{0}")]
    WindowError(#[from] winit::error::OsError),
    #[error("No graphics adapter compatible with the window surface was found")]
    NoAdapterError,
    #[error("{0}")]
    DeviceError(#[from] wgpu::RequestDeviceError),
    #[error("{0}")]
    CreateSurfaceError(#[from] wgpu::CreateSurfaceError),
    #[error("{0}")]
    SurfaceError(#[from] wgpu::SurfaceError),

    // custom errors
    #[error("{0}")]
    CustomError(String),
}

impl GratingsError {
    /// The surface was lost or no longer matches the window and has to be
    /// configured again before the next frame.
    pub fn surface_needs_reconfigure(&self) -> bool {
        matches!(
            self,
            GratingsError::SurfaceError(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)
        )
    }

    /// Rendering cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GratingsError::SurfaceError(wgpu::SurfaceError::OutOfMemory)
        )
    }
}
