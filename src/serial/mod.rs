// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
use crate::errors::GratingsError;
use crate::options::SerialOptions;
use std::io::{self, Read};
use std::time::Duration;

mod trackball;

pub use trackball::{
    decode_windows_1252, parse_trackball_line, read_trackball_lines, LatestValue, ReadSummary,
    TrackballReader,
};

/// A serial port. Wraps a backend serial port.
pub enum SerialPort {
    RealSerialPort(Box<dyn serialport::SerialPort>),
    DummySerialPort { timeout: Duration },
}

impl SerialPort {
    /// Opens the serial port at `path`.
    pub fn open(
        path: impl Into<String>,
        baudrate: u32,
        timeout_ms: u64,
    ) -> Result<Self, GratingsError> {
        let path = path.into();

        let backend = serialport::new(&path, baudrate)
            .timeout(Duration::from_millis(timeout_ms))
            .open()?;

        log::info!("Opened serial port {} at {} baud", path, baudrate);
        Ok(SerialPort::RealSerialPort(backend))
    }

    /// Opens a serial port or falls back to a dummy serial port if the serial port could not be opened.
    /// This is useful for debugging on a machine that does not have the trackball attached.
    ///
    /// The dummy port never produces any data, so the grating will not move in trackball mode.
    pub fn open_or_dummy(
        path: impl Into<String>,
        baudrate: u32,
        timeout_ms: u64,
    ) -> Self {
        let path = path.into();

        match Self::open(path.as_str(), baudrate, timeout_ms) {
            Ok(port) => port,
            Err(e) => {
                log::warn!("Serial port {} could not be opened ({}) - using dummy serial port instead", path, e);
                Self::open_dummy(timeout_ms)
            }
        }
    }

    /// Opens the port described by `options`, honouring `allow_dummy`.
    pub fn from_options(options: &SerialOptions) -> Result<Self, GratingsError> {
        if options.allow_dummy {
            Ok(Self::open_or_dummy(
                options.path.as_str(),
                options.baud_rate,
                options.timeout_ms,
            ))
        } else {
            Self::open(options.path.as_str(), options.baud_rate, options.timeout_ms)
        }
    }

    /// Creates a dummy serial port.
    pub fn open_dummy(timeout_ms: u64) -> Self {
        SerialPort::DummySerialPort {
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, SerialPort::DummySerialPort { .. })
    }

    /// Discards everything the device sent before this call.
    pub fn clear_input(&mut self) -> Result<(), GratingsError> {
        match self {
            SerialPort::RealSerialPort(backend) => {
                backend.clear(serialport::ClearBuffer::Input)?;
                Ok(())
            }
            SerialPort::DummySerialPort { .. } => Ok(()),
        }
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SerialPort::RealSerialPort(backend) => backend.read(buf),
            SerialPort::DummySerialPort { timeout } => {
                // behave like a real port on which nothing arrives
                std::thread::sleep(*timeout);
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "dummy serial port never receives data",
                ))
            }
        }
    }
}

/// Names of the serial ports available on this machine.
pub fn available_ports() -> Result<Vec<String>, GratingsError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
