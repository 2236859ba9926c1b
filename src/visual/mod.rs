// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
pub mod grating;
pub mod window;

use wgpu::{Queue, RenderPass, SurfaceConfiguration};

// Renderable trait should be implemented by all visual stimuli
// prepare() uploads whatever changed since the last frame, render() records
// the draw calls into the frame's render pass
pub trait Renderable {
    fn prepare(&mut self, queue: &Queue, config: &SurfaceConfiguration);
    fn render<'pass>(&'pass self, pass: &mut RenderPass<'pass>);
}

// enum to represent a color, channels in 0..1
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Color {
    RGB { r: f64, g: f64, b: f64 },
    RGBA { r: f64, g: f64, b: f64, a: f64 },
}

impl Color {
    /// Converts from the signed colour space used to specify stimuli, where
    /// -1 is black, 0 is mid-grey and 1 is full intensity.
    pub fn from_signed_rgb([r, g, b]: [f64; 3]) -> Self {
        let unsign = |c: f64| (c.clamp(-1.0, 1.0) + 1.0) / 2.0;
        Self::RGB {
            r: unsign(r),
            g: unsign(g),
            b: unsign(b),
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        match self {
            Color::RGB { r, g, b } => [r as f32, g as f32, b as f32, 1.0],
            Color::RGBA { r, g, b, a } => [r as f32, g as f32, b as f32, a as f32],
        }
    }
}

// allow for conversion to wgpu::Color
impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        match color {
            Color::RGB { r, g, b } => wgpu::Color { r, g, b, a: 1.0 },
            Color::RGBA { r, g, b, a } => wgpu::Color { r, g, b, a },
        }
    }
}
