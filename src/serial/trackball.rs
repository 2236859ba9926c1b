// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading the trackball. The device sends one decimal number per line; a
//! background thread keeps the most recent one in a [`LatestValue`].

use crate::errors::GratingsError;
use crate::utils::AtomicExt;
use atomic_float::AtomicF64;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

/// The last value received from the trackball, shared between the reader
/// thread and the frame loop. Last write wins and readers may see a value
/// that is one line old, which is all the frame loop needs.
#[derive(Clone)]
pub struct LatestValue(Arc<AtomicF64>);

impl LatestValue {
    pub fn new(initial: f64) -> Self {
        Self(Arc::new(AtomicF64::new(initial)))
    }

    pub fn get(&self) -> f64 {
        self.0.load_relaxed()
    }

    pub fn set(&self, value: f64) {
        self.0.store_relaxed(value);
    }
}

impl Default for LatestValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for LatestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LatestValue").field(&self.get()).finish()
    }
}

// 0x80..=0x9F; the rest of the code page coincides with Latin-1
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Decodes Windows-1252 text. Returns the first byte that has no mapping
/// in the code page as the error.
pub fn decode_windows_1252(bytes: &[u8]) -> Result<String, u8> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => WINDOWS_1252_HIGH[(b - 0x80) as usize].ok_or(b),
            _ => Ok(b as char),
        })
        .collect()
}

/// Parses one line sent by the trackball.
///
/// Returns `Ok(None)` for lines that carry no value (empty or whitespace
/// only). A trailing decimal point is accepted (`"12."` is `12.0`).
pub fn parse_trackball_line(line: &[u8]) -> Result<Option<f64>, GratingsError> {
    let text = decode_windows_1252(line).map_err(|byte| GratingsError::ParseError {
        line: String::from_utf8_lossy(line).into_owned(),
        reason: format!("byte 0x{:02X} is not valid Windows-1252", byte),
    })?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(value) => Err(GratingsError::ParseError {
            line: trimmed.to_owned(),
            reason: format!("{} is not a finite number", value),
        }),
        Err(e) => Err(GratingsError::ParseError {
            line: trimmed.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// What a reader saw before it stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    pub lines: u64,
    pub values: u64,
    pub malformed: u64,
}

impl ReadSummary {
    fn handle_line(&mut self, line: &[u8], latest: &LatestValue) {
        self.lines += 1;
        match parse_trackball_line(line) {
            Ok(Some(value)) => {
                latest.set(value);
                self.values += 1;
            }
            Ok(None) => {}
            Err(e) => {
                self.malformed += 1;
                log::warn!("{} - keeping last value {}", e, latest.get());
            }
        }
    }
}

impl fmt::Display for ReadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} values, {} malformed",
            self.lines, self.values, self.malformed
        )
    }
}

/// Reads lines from `source` until end of stream, an I/O error, or until
/// `stop` is raised, storing every value that parses into `latest`.
///
/// Malformed lines are logged and skipped so the last good value stays in
/// place. Timeouts are not errors; they only give the loop a chance to look
/// at `stop`.
pub fn read_trackball_lines<R: Read>(
    source: R,
    latest: &LatestValue,
    stop: &AtomicBool,
) -> io::Result<ReadSummary> {
    let mut reader = BufReader::new(source);
    let mut summary = ReadSummary::default();
    // bytes of a line survive a timeout in the middle of it
    let mut line = Vec::new();

    while !stop.load_relaxed() {
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                if !line.is_empty() {
                    summary.handle_line(&line, latest);
                }
                log::debug!("Trackball stream ended");
                break;
            }
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    summary.handle_line(&line, latest);
                    line.clear();
                }
            }
            Err(e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

/// A background thread running [`read_trackball_lines`]. The thread is
/// stopped and joined by [`TrackballReader::stop`] or on drop.
pub struct TrackballReader {
    stop: Arc<AtomicBool>,
    latest: LatestValue,
    handle: Option<JoinHandle<io::Result<ReadSummary>>>,
}

impl TrackballReader {
    pub fn spawn<R>(source: R, latest: LatestValue) -> Result<Self, GratingsError>
    where
        R: Read + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = stop.clone();
        let thread_latest = latest.clone();
        let handle = std::thread::Builder::new()
            .name("trackball-reader".to_owned())
            .spawn(move || {
                let result = read_trackball_lines(source, &thread_latest, &thread_stop);
                match &result {
                    Ok(summary) => log::info!("Trackball reader finished ({})", summary),
                    Err(e) => log::error!(
                        "Trackball reader stopped: {} - the grating stays at {}",
                        e,
                        thread_latest.get()
                    ),
                }
                result
            })?;

        Ok(Self {
            stop,
            latest,
            handle: Some(handle),
        })
    }

    /// Handle to the value the reader writes to.
    pub fn latest(&self) -> LatestValue {
        self.latest.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Asks the thread to stop and waits for it. Input that has not been
    /// read yet is dropped. Returns `None` if the reader ended with an error.
    pub fn stop(mut self) -> Option<ReadSummary> {
        self.stop.store_relaxed(true);
        self.wait()
    }

    /// Waits for the stream to end on its own, without asking the thread to
    /// stop. Blocks forever on a source that never ends.
    pub fn join(mut self) -> Option<ReadSummary> {
        self.wait()
    }

    fn wait(&mut self) -> Option<ReadSummary> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(Ok(summary)) => Some(summary),
            Ok(Err(_)) => None,
            Err(_) => {
                log::error!("Trackball reader thread panicked");
                None
            }
        }
    }
}

impl Drop for TrackballReader {
    fn drop(&mut self) {
        self.stop.store_relaxed(true);
        self.wait();
    }
}
