//! Orrery: an interactive solar-system demo with a free-fly camera,
//! orbiting bodies, a tree-lined launch site, and a rocket on the pad.

mod animation;
mod config;
mod pose;
mod scene;
mod state;

use anyhow::Result;
use state::DemoState;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

/// Application handler for winit.
struct App {
    state: Option<DemoState>,
}

impl App {
    fn new() -> Self {
        Self { state: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            let config = config::GameConfig::load();
            let mut window_attrs = Window::default_attributes()
                .with_title("Orrery")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    config.window_width,
                    config.window_height,
                ));
            if config.fullscreen {
                window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
            }

            let window = match event_loop.create_window(window_attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            let state = pollster::block_on(DemoState::new(window.clone(), config));
            match state {
                Ok(mut s) => {
                    s.grab_cursor(true);
                    self.state = Some(s);
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to initialize the demo: {:#}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) || !state.running {
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: DeviceId, event: DeviceEvent) {
        if let Some(state) = &mut self.state {
            state.handle_device_event(event);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════╗");
    println!("║                      Orrery                      ║");
    println!("╠══════════════════════════════════════════════════╣");
    println!("║  W/S        - Move forward / back                ║");
    println!("║  A/D        - Turn left / right                  ║");
    println!("║  Shift/Ctrl - Ascend / descend                   ║");
    println!("║  PgUp/PgDn  - Look up / down                     ║");
    println!("║  Mouse      - Look around                        ║");
    println!("║  F1         - Launch the rocket                  ║");
    println!("║  Escape     - Quit                               ║");
    println!("╚══════════════════════════════════════════════════╝");

    log::info!("Starting Orrery");

    let event_loop = EventLoop::new()?;
    // Poll continuously so redraws are not gated on new events arriving.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
