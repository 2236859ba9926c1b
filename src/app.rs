// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
use crate::errors::GratingsError;
use crate::experiment::{FrameLoop, FrameStep, FrameTimer, InputSource};
use crate::input::InputCollector;
use crate::options::{ExperimentOptions, InputMode};
use crate::serial::{LatestValue, SerialPort, TrackballReader};
use crate::visual::grating::GratingStimulus;
use crate::visual::window::{create_window, GpuState};
use crate::visual::Color;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

/// Opens the trackball port and starts the reader thread.
pub fn start_trackball(
    options: &ExperimentOptions,
) -> Result<(InputSource, TrackballReader), GratingsError> {
    let mut port = SerialPort::from_options(&options.serial)?;
    // drop whatever the device sent before the experiment started
    port.clear_input()?;

    let latest = LatestValue::default();
    let reader = TrackballReader::spawn(port, latest.clone())?;
    Ok((InputSource::Trackball(latest), reader))
}

/// Runs the experiment. Only returns if setting up the window, the GPU, or
/// the serial port fails; otherwise the process exits when the event loop
/// ends.
pub fn run(options: ExperimentOptions) -> Result<(), GratingsError> {
    let event_loop = EventLoop::new();
    let window = create_window(&event_loop, &options)?;

    let mut gpu = pollster::block_on(GpuState::new(&window))?;
    let mut stimulus = GratingStimulus::new(&gpu.device, &gpu.config, &options);
    let background: wgpu::Color = Color::from_signed_rgb(options.background_color).into();

    let (source, mut reader) = match options.input_mode {
        InputMode::Pointer => (InputSource::Pointer, None),
        InputMode::Trackball => {
            let (source, reader) = start_trackball(&options)?;
            (source, Some(reader))
        }
    };

    let mut frame_loop = FrameLoop::new(&options, source);
    let mut collector = InputCollector::new(gpu.config.width, gpu.config.height);
    let mut timer = FrameTimer::new();
    let mut reader_lost = false;

    log::info!(
        "Starting {:?} mode with gain {:.4}, showing up to {} frames",
        frame_loop.source().mode(),
        frame_loop.gain(),
        options.n_frames
    );

    event_loop.run(move |event, _, control_flow| {
        // Have the closure take ownership of the window.
        // `event_loop.run` never returns, and the surface must not outlive it.
        let _ = &window;

        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                gpu.resize(size);
                collector.set_window_size(size.width, size.height);
            }
            Event::WindowEvent { event, .. } => collector.handle_window_event(&event),
            Event::DeviceEvent { event, .. } => collector.handle_device_event(&event),
            Event::MainEventsCleared => {
                if let Some(reader) = &reader {
                    if !reader_lost && !reader.is_running() {
                        log::warn!(
                            "Trackball reader is no longer running, the grating stays at the last value"
                        );
                        reader_lost = true;
                    }
                }

                let input = collector.take();
                match frame_loop.step(&input) {
                    FrameStep::Quit => {
                        log::info!("Quit requested after {} frames", frame_loop.frames_shown());
                        *control_flow = ControlFlow::Exit;
                    }
                    FrameStep::Finished => {
                        log::info!("All {} frames shown", frame_loop.frames_shown());
                        *control_flow = ControlFlow::Exit;
                    }
                    FrameStep::Draw(state) => {
                        stimulus.set_state(&state);
                        match gpu.render(&mut stimulus, background) {
                            Ok(()) => timer.tick(),
                            // skip this frame
                            Err(e) if e.surface_needs_reconfigure() => gpu.reconfigure(),
                            Err(e) if e.is_fatal() => {
                                log::error!("{}, stopping", e);
                                *control_flow = ControlFlow::Exit;
                            }
                            Err(e) => log::warn!("Dropped frame: {}", e),
                        }
                    }
                }
            }
            Event::LoopDestroyed => {
                if let Some(reader) = reader.take() {
                    if let Some(summary) = reader.stop() {
                        log::info!("Trackball: {}", summary);
                    }
                }
                timer.log_summary(frame_loop.frames_shown());
            }
            _ => {}
        }
    })
}
