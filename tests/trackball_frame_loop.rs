// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
use std::io::Cursor;
use trackball_gratings::experiment::{FrameLoop, FrameStep, InputSource};
use trackball_gratings::input::{FrameInput, InputCollector, Key};
use trackball_gratings::options::{ExperimentOptions, InputMode};
use trackball_gratings::serial::{LatestValue, TrackballReader};

fn trackball_options() -> ExperimentOptions {
    ExperimentOptions {
        input_mode: InputMode::Trackball,
        n_frames: 5,
        ..ExperimentOptions::default()
    }
}

#[test]
fn trackball_values_drive_the_phase() {
    let options = trackball_options();
    let latest = LatestValue::default();

    // a malformed line in the middle must not lose the value before it
    let reader = TrackballReader::spawn(
        Cursor::new(b"15\r\n???\r\n".to_vec()),
        latest.clone(),
    )
    .unwrap();
    let summary = reader.join().unwrap();
    assert_eq!(summary.values, 1);
    assert_eq!(summary.malformed, 1);

    let mut frame_loop = FrameLoop::new(&options, InputSource::Trackball(latest));
    match frame_loop.step(&FrameInput::default()) {
        FrameStep::Draw(state) => assert!((state.phase - 0.25).abs() < 1e-12),
        other => panic!("unexpected step {:?}", other),
    }
}

#[test]
fn collector_and_frame_loop_agree_on_quit() {
    let options = ExperimentOptions {
        n_frames: 100,
        ..ExperimentOptions::default()
    };
    let mut frame_loop = FrameLoop::new(&options, InputSource::Pointer);
    let mut collector = InputCollector::new(1500, 1000);

    // 75 px right is 0.1 normalised units, so 0.25 cycles at gain 2.5
    collector.pointer_moved(75.0, 0.0);
    match frame_loop.step(&collector.take()) {
        FrameStep::Draw(state) => assert!((state.phase - 0.25).abs() < 1e-12),
        other => panic!("unexpected step {:?}", other),
    }

    collector.pointer_moved(75.0, 0.0);
    collector.key_pressed(Key::Escape);
    assert_eq!(frame_loop.step(&collector.take()), FrameStep::Quit);
    assert!((frame_loop.state().phase - 0.25).abs() < 1e-12);
}

#[test]
fn trackball_run_ends_after_frame_budget() {
    let options = trackball_options();
    let latest = LatestValue::new(6.0);
    let mut frame_loop = FrameLoop::new(&options, InputSource::Trackball(latest.clone()));

    let mut drawn = 0;
    while let FrameStep::Draw(state) = frame_loop.step(&FrameInput::default()) {
        assert!((state.phase - 0.1).abs() < 1e-12);
        drawn += 1;
    }
    assert_eq!(drawn, 5);
}
