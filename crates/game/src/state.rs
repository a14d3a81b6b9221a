//! The scene orchestrator: owns every collaborator and renderable, runs the
//! per-frame tick, and dispatches the inventory in fixed order.

use crate::animation::AnimationDriver;
use crate::config::GameConfig;
use crate::pose::{MoveIntent, Pose};
use crate::scene::{self, SceneAsset, SceneNode, Technique, CLEAR_COLOR};
use anyhow::{bail, Result};
use engine_core::{compose, Time};
use glam::{Mat4, Vec3, Vec4};
use input::InputState;
use renderer::{Camera, DirectionalLight, FireParams, Renderer};
use std::sync::Arc;
use winit::event::{DeviceEvent, WindowEvent};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window};

/// Initial viewer position, standing on the ground plane looking at the
/// launch site.
const VIEWER_START: Vec3 = Vec3::new(0.0, -198.0, -200.0);

/// Everything the demo owns, acquired in order and dropped in reverse.
/// A failed `new` drops whatever was already built; there is no partial
/// success mode and no manual release path.
pub struct DemoState {
    time: Time,
    input: InputState,
    renderer: Renderer,
    camera: Camera,
    pose: Pose,
    light: DirectionalLight,
    animation: AnimationDriver,
    fire_params: FireParams,
    assets: Vec<SceneAsset>,
    nodes: Vec<SceneNode>,
    pub running: bool,
}

impl DemoState {
    /// Acquire all collaborators and assets. Any failure aborts startup.
    pub async fn new(window: Arc<Window>, config: GameConfig) -> Result<Self> {
        let time = Time::new();
        let input = InputState::new();
        let renderer = Renderer::new(window, config.vsync).await?;

        let mut camera = Camera {
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            ..Default::default()
        };
        camera.set_aspect(renderer.config.width, renderer.config.height);

        let pose = Pose::new(VIEWER_START, Vec3::ZERO, config.sensitivity);

        let light = DirectionalLight::new(
            Vec3::Z,
            Vec4::new(0.15, 0.15, 0.15, 1.0),
            Vec4::ONE,
            Vec4::ONE,
            64.0,
        );

        let animation = AnimationDriver::new();
        let fire_params = scene::fire_params();
        let (assets, nodes) = scene::load(&renderer, scene::blueprint()?)?;
        log::info!("scene ready: {} entries", nodes.len());

        Ok(Self {
            time,
            input,
            renderer,
            camera,
            pose,
            light,
            animation,
            fire_params,
            assets,
            nodes,
            running: true,
        })
    }

    /// One tick: clock, input, pose, animation, render. Returns `Ok(false)`
    /// when the session should end; any error also ends it.
    pub fn frame(&mut self) -> Result<bool> {
        self.time.update();

        if self.input.is_quit_pressed() {
            return Ok(false);
        }

        let delta_ms = self.time.delta_ms();

        let intent = MoveIntent {
            forward: self.input.is_forward_held(),
            backward: self.input.is_backward_held(),
            turn_left: self.input.is_turn_left_held(),
            turn_right: self.input.is_turn_right_held(),
            ascend: self.input.is_ascend_held(),
            descend: self.input.is_descend_held(),
            look_up: self.input.is_look_up_held(),
            look_down: self.input.is_look_down_held(),
            mouse_delta: self.input.mouse_delta(),
        };
        self.pose.update(delta_ms, &intent);
        self.camera.set_pose(self.pose.position, self.pose.rotation);

        self.animation.advance(delta_ms, self.input.is_launch_held());

        self.render()?;

        // Consume this frame's edges and mouse delta.
        self.input.begin_frame();
        Ok(true)
    }

    /// Dispatch the inventory in order inside one scene pass.
    fn render(&mut self) -> Result<()> {
        self.renderer.begin_scene(CLEAR_COLOR)?;

        let view = self.camera.view_matrix();
        let proj = self.camera.projection_matrix();
        let motion = self.animation.motion_state();

        for node in &self.nodes {
            let base = compose(&node.ops, &motion);
            let asset = &self.assets[node.asset];

            let worlds: Vec<Mat4> = match &node.placements {
                Some(placements) => placements
                    .iter()
                    .map(|offset| Mat4::from_translation(*offset) * base)
                    .collect(),
                None => vec![base],
            };

            for world in worlds {
                match (asset, node.technique) {
                    (SceneAsset::Plain(model), Technique::Textured) => {
                        self.renderer
                            .draw_textured(model, world, view, proj, node.blend)?;
                    }
                    (SceneAsset::Plain(model), Technique::Lit) => {
                        self.renderer.draw_lit(
                            model,
                            world,
                            view,
                            proj,
                            &self.light,
                            self.camera.position,
                            node.blend,
                        )?;
                    }
                    (SceneAsset::Bump(model), Technique::NormalMapped) => {
                        self.renderer.draw_normal_mapped(
                            model,
                            world,
                            view,
                            proj,
                            &self.light,
                            node.blend,
                        )?;
                    }
                    (SceneAsset::Fire(model), Technique::Fire) => {
                        self.renderer.draw_fire(
                            model,
                            world,
                            view,
                            proj,
                            &self.fire_params,
                            self.animation.scroll_time(),
                            node.blend,
                        )?;
                    }
                    _ => bail!(
                        "scene entry {} pairs technique {:?} with an incompatible asset",
                        node.name,
                        node.technique
                    ),
                }
            }
        }

        self.renderer.end_scene()?;
        Ok(())
    }

    /// Handle a window event. Returns true when the application should exit.
    pub fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => return true,
            WindowEvent::Resized(size) => {
                self.renderer.resize(size);
                self.camera
                    .set_aspect(self.renderer.config.width, self.renderer.config.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.input.process_keyboard(code, event.state);
                }
            }
            WindowEvent::Focused(focused) => {
                self.grab_cursor(focused);
            }
            WindowEvent::RedrawRequested => match self.frame() {
                Ok(true) => self.renderer.window.request_redraw(),
                Ok(false) => self.running = false,
                Err(e) => {
                    log::error!("frame failed: {e:#}");
                    self.running = false;
                }
            },
            _ => {}
        }
        false
    }

    /// Handle a device event (relative mouse motion).
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_motion(delta);
        }
    }

    /// Capture or release the cursor for mouse look.
    pub fn grab_cursor(&mut self, grab: bool) {
        let window = &self.renderer.window;
        if grab {
            if let Err(e) = window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
            {
                log::warn!("could not grab cursor: {e}");
            }
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.input.set_cursor_locked(grab);
    }
}
