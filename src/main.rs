///
/// Enable debug logging: $env:RUST_LOG="debug"
///

mod renderer;

use log::*;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use renderer::{Renderer, RendererConfig};

fn main() {
    pretty_env_logger::init();
    info!("Creating renderer...");

    let mut config = RendererConfig::default();
    if let Ok(value) = std::env::var("VKQUAD_VALIDATION") {
        config.enable_validation = value == "1";
    }

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(config.app_name.as_str())
        .with_inner_size(LogicalSize::new(1024, 768))
        .build(&event_loop)
        .unwrap();

    let mut app = match Renderer::create(&window, config) {
        Ok(renderer) => Some(renderer),
        Err(error) => {
            error!("Failed to initialize renderer: {:#}", error);
            return;
        }
    };
    let mut minimized = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::MainEventsCleared if !minimized => {
                if let Some(renderer) = app.as_mut() {
                    if let Err(error) = renderer.render(&window) {
                        error!("Frame failed: {:#}", error);
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }

            Event::WindowEvent { event: WindowEvent::Resized(size), .. } => {
                if size.width == 0 || size.height == 0 {
                    minimized = true;
                } else {
                    minimized = false;
                    if let Some(renderer) = app.as_mut() {
                        renderer.mark_resized();
                    }
                }
            }

            Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                // Dropping the renderer waits for the device and releases
                // everything in reverse dependency order.
                app = None;
                *control_flow = ControlFlow::Exit;
            }

            _ => {}
        }
    });
}
