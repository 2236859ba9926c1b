// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
use clap::Parser;
use trackball_gratings::options::{ExperimentOptions, InputMode};
use trackball_gratings::{app, serial};

/// Rotating grating stimulus driven by the mouse or a serial trackball.
///
/// Move the mouse (or the trackball) to shift the grating, scroll to rotate
/// it. Escape or Q quits.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Read the grating phase from the trackball instead of the mouse
    #[arg(long)]
    trackball: bool,

    /// Serial port of the trackball
    #[arg(long)]
    port: Option<String>,

    /// Baud rate of the trackball connection
    #[arg(long)]
    baud: Option<u32>,

    /// Use a dummy port that never sends data if the trackball cannot be opened
    #[arg(long)]
    dummy_serial: bool,

    /// Maximum number of frames to show
    #[arg(long)]
    frames: Option<u32>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Hide window decorations
    #[arg(long)]
    no_gui: bool,

    /// List the available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

impl Args {
    fn into_options(self) -> ExperimentOptions {
        let mut options = ExperimentOptions::default();

        if self.trackball {
            options.input_mode = InputMode::Trackball;
        }
        if let Some(port) = self.port {
            options.serial.path = port;
        }
        if let Some(baud) = self.baud {
            options.serial.baud_rate = baud;
        }
        options.serial.allow_dummy = self.dummy_serial;
        if let Some(frames) = self.frames {
            options.n_frames = frames;
        }
        options.window_size = (
            self.width.unwrap_or(options.window_size.0),
            self.height.unwrap_or(options.window_size.1),
        );
        options.allow_gui = !self.no_gui;

        options
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_ports {
        for port in serial::available_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    app::run(args.into_options())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_gives_default_options() {
        let args = Args::parse_from(["trackball-gratings"]);
        assert_eq!(args.into_options(), ExperimentOptions::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "trackball-gratings",
            "--trackball",
            "--port",
            "COM3",
            "--frames",
            "10",
            "--width",
            "800",
            "--no-gui",
        ]);
        let options = args.into_options();

        assert_eq!(options.input_mode, InputMode::Trackball);
        assert_eq!(options.serial.path, "COM3");
        assert_eq!(options.serial.baud_rate, 115_200);
        assert_eq!(options.n_frames, 10);
        assert_eq!(options.window_size, (800, 1000));
        assert!(!options.allow_gui);
    }
}
