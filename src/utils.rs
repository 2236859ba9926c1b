// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub(crate) trait AtomicExt<T> {
    fn load_relaxed(&self) -> T;
    fn store_relaxed(&self, value: T);
}

impl AtomicExt<f64> for atomic_float::AtomicF64 {
    fn load_relaxed(&self) -> f64 {
        self.load(std::sync::atomic::Ordering::Relaxed)
    }

    fn store_relaxed(&self, value: f64) {
        self.store(value, std::sync::atomic::Ordering::Relaxed);
    }
}

impl AtomicExt<bool> for std::sync::atomic::AtomicBool {
    fn load_relaxed(&self) -> bool {
        self.load(std::sync::atomic::Ordering::Relaxed)
    }

    fn store_relaxed(&self, value: bool) {
        self.store(value, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Wraps a phase given in cycles into `[0, 1)`.
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
