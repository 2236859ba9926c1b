// Copyright (c) 2024 Marc Pabst
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
use crate::errors::GratingsError;
use crate::options::ExperimentOptions;
use crate::visual::Renderable;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

/// Creates the experiment window with the cursor hidden.
pub fn create_window(
    event_loop: &EventLoop<()>,
    options: &ExperimentOptions,
) -> Result<Window, GratingsError> {
    let (width, height) = options.window_size;
    let window = WindowBuilder::new()
        .with_title("trackball-gratings")
        .with_inner_size(PhysicalSize::new(width, height))
        .with_decorations(options.allow_gui)
        .build(event_loop)?;

    window.set_cursor_visible(false);
    Ok(window)
}

/// Picks a surface format that does not apply the sRGB transfer function, so
/// the values written by the shader reach the display unchanged.
pub fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

pub struct GpuState {
    // the wgpu instance
    pub instance: wgpu::Instance,
    // the wgpu adapter
    pub adapter: wgpu::Adapter,
    // the wgpu device
    pub device: wgpu::Device,
    // the wgpu queue
    pub queue: wgpu::Queue,
    // the wgpu surface
    pub surface: wgpu::Surface,
    // the wgpu surface configuration
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuState {
    /// Sets up wgpu for `window`. The window must outlive the returned state.
    pub async fn new(window: &Window) -> Result<Self, GratingsError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();

        // SAFETY: the window is kept alive next to the surface by the caller
        let surface = unsafe { instance.create_surface(window) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                // Request an adapter which can render to our surface
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(GratingsError::NoAdapterError)?;

        log::info!("Using graphics adapter {:?}", adapter.get_info().name);

        // Create the logical device and command queue
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    features: wgpu::Features::empty(),
                    // Make sure we use the texture resolution limits from the adapter, so we can support images the size of the swapchain.
                    limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await?;

        let swapchain_capabilities = surface.get_capabilities(&adapter);
        let swapchain_format = pick_surface_format(&swapchain_capabilities.formats).ok_or_else(
            || GratingsError::CustomError("The surface supports no texture formats".to_owned()),
        )?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: swapchain_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // presenting blocks until the next vertical blank
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: swapchain_capabilities.alpha_modes[0],
            view_formats: vec![],
        };

        surface.configure(&device, &config);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            config,
        })
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            // minimised, keep the old configuration
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.reconfigure();
    }

    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Clears the frame to `background`, draws `stimulus`, and presents.
    pub fn render(
        &mut self,
        stimulus: &mut impl Renderable,
        background: wgpu::Color,
    ) -> Result<(), GratingsError> {
        let frame = self.surface.get_current_texture()?;

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        stimulus.prepare(&self.queue, &self.config);

        {
            // render the stimulus
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            stimulus.render(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn prefers_linear_surface_formats() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Rgba8UnormSrgb));
        assert_eq!(pick_surface_format(&[]), None);
    }
}
