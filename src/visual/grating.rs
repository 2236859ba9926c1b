// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
use crate::experiment::GratingState;
use crate::options::ExperimentOptions;
use crate::visual::Renderable;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use wgpu::util::DeviceExt;
use wgpu::{Device, Queue, RenderPass, SurfaceConfiguration, TextureFormat};

const GRATING_SHADER: &str = "
struct GratingUniforms {
    phase: f32,
    orientation: f32,
    cycles: f32,
    padding: f32,
    size: vec2<f32>,
    window_size: vec2<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> params: GratingUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[index];

    // rotate in pixels so the patch keeps its shape, clockwise for positive angles
    let px = corner * params.size;
    let theta = radians(params.orientation);
    let c = cos(theta);
    let s = sin(theta);
    let rotated = vec2<f32>(c * px.x + s * px.y, c * px.y - s * px.x);

    var out: VertexOutput;
    out.position = vec4<f32>(rotated / (params.window_size * 0.5), 0.0, 1.0);
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let two_pi = 6.283185307179586;
    let value = sin(two_pi * (params.cycles * in.uv.x + params.phase));
    // signed colour space: -1 black, 0 grey, 1 full intensity
    let shade = value * params.color.rgb;
    return vec4<f32>((shade + 1.0) * 0.5, params.color.a);
}
";

/// Uniform buffer contents. The layout matches `GratingUniforms` in the
/// shader (48 bytes, `vec2` fields 8-byte aligned, `color` 16-byte aligned).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GratingUniforms {
    /// Phase in cycles.
    pub phase: f32,
    /// Orientation in degrees.
    pub orientation: f32,
    /// Cycles across the width of the patch.
    pub cycles: f32,
    padding: f32,
    /// Patch size in pixels.
    pub size: [f32; 2],
    /// Window size in pixels.
    pub window_size: [f32; 2],
    /// Signed RGB colour plus alpha.
    pub color: [f32; 4],
}

impl GratingUniforms {
    pub fn new(
        options: &ExperimentOptions,
        state: &GratingState,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        let (width, height) = options.patch_size_px(window_width, window_height);
        let [r, g, b] = options.grating_color;

        Self {
            phase: state.phase as f32,
            // wrapped here, f32 loses precision on large angles
            orientation: state.orientation.rem_euclid(360.0) as f32,
            cycles: options.cycles_per_patch() as f32,
            padding: 0.0,
            size: [width as f32, height as f32],
            window_size: [window_width as f32, window_height as f32],
            color: [r as f32, g as f32, b as f32, 1.0],
        }
    }
}

/// A sine grating on a rectangular patch in the middle of the window.
pub struct GratingStimulus {
    options: ExperimentOptions,
    state: GratingState,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl GratingStimulus {
    pub fn new(device: &Device, config: &SurfaceConfiguration, options: &ExperimentOptions) -> Self {
        let state = GratingState::default();
        let uniforms = GratingUniforms::new(options, &state, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grating shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(GRATING_SHADER)),
        });

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grating uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("grating_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("grating_bind_group"),
        });

        let pipeline = create_pipeline(device, &shader, &bind_group_layout, config.format);

        Self {
            options: options.clone(),
            state,
            buffer,
            bind_group,
            pipeline,
        }
    }

    pub fn set_state(&mut self, state: &GratingState) {
        self.state = *state;
    }

    pub fn state(&self) -> GratingState {
        self.state
    }
}

fn create_pipeline(
    device: &Device,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: None,
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("grating pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(format.into())],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

impl Renderable for GratingStimulus {
    fn prepare(&mut self, queue: &Queue, config: &SurfaceConfiguration) {
        let uniforms = GratingUniforms::new(&self.options, &self.state, config.width, config.height);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    fn render<'pass>(&'pass self, pass: &mut RenderPass<'pass>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}
