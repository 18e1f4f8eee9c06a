//! Perspective camera and damped orbit controls.
//!
//! The camera always looks at a target point. [`OrbitController`] collects
//! pointer input as pending rotation, pan and dolly deltas and integrates them
//! in [`OrbitController::update`], which must run once per frame. With damping
//! enabled, every update applies a fraction of the pending deltas and keeps
//! the rest, so the camera glides to a stop after the pointer is released.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Point3, Rad, SquareMatrix, Vector3, Zero};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::config::{CameraConfig, ControlsConfig};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles, where `look_at` degenerates.
const POLAR_EPSILON: f32 = 0.000_001;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.position, config.target)
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_config(width: u32, height: u32, config: &CameraConfig) -> Self {
        Self::new(
            width,
            height,
            cgmath::Deg(config.fovy_degrees),
            config.znear,
            config.zfar,
        )
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, uniform: CameraUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    None,
    Rotate,
    Pan,
}

/// Rotate (left drag), pan (right drag) and dolly (wheel) around the camera
/// target.
#[derive(Debug)]
pub struct OrbitController {
    config: ControlsConfig,
    drag: Drag,
    last_cursor: Option<(f64, f64)>,
    /// Height of the pointer's coordinate space, pointer movement is measured against it.
    viewport_height: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    /// Pan input in pointer pixels, turned into world units on the next update.
    pending_pan: (f32, f32),
    pan_offset: Vector3<f32>,
}

impl OrbitController {
    pub fn new(config: ControlsConfig) -> Self {
        Self {
            config,
            drag: Drag::None,
            last_cursor: None,
            viewport_height: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pending_pan: (0.0, 0.0),
            pan_offset: Vector3::zero(),
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    /// Feed a window event. Returns whether the event was used.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let drag = match button {
                    MouseButton::Left => Drag::Rotate,
                    MouseButton::Right => Drag::Pan,
                    _ => return false,
                };
                match state {
                    ElementState::Pressed => self.drag = drag,
                    ElementState::Released if self.drag == drag => self.drag = Drag::None,
                    ElementState::Released => {}
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(position.x, position.y);
                self.drag != Drag::None
            }
            WindowEvent::CursorLeft { .. } => {
                self.drag = Drag::None;
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.wheel(scroll);
                true
            }
            _ => false,
        }
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_cursor {
            let dx = (x - last_x) as f32;
            let dy = (y - last_y) as f32;
            match self.drag {
                Drag::Rotate => {
                    let speed = 2.0 * PI * self.config.rotate_speed / self.viewport_height;
                    self.delta_theta -= dx * speed;
                    self.delta_phi -= dy * speed;
                }
                Drag::Pan => {
                    self.pending_pan.0 += dx * self.config.pan_speed;
                    self.pending_pan.1 += dy * self.config.pan_speed;
                }
                Drag::None => {}
            }
        }
        self.last_cursor = Some((x, y));
    }

    /// Positive scroll (wheel away from the user) moves towards the target.
    pub fn wheel(&mut self, scroll: f32) {
        let zoom_scale = 0.95_f32.powf(self.config.zoom_speed);
        if scroll > 0.0 {
            self.scale *= zoom_scale;
        } else if scroll < 0.0 {
            self.scale /= zoom_scale;
        }
    }

    /// Integrate pending input into `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection) -> bool {
        let before = camera.clone();
        self.apply_pending_pan(camera, projection);

        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let damping = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * damping;
        phi += self.delta_phi * damping;
        phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius *= self.scale;
        camera.target += self.pan_offset * damping;

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;

        if self.config.enable_damping {
            self.delta_theta *= 1.0 - damping;
            self.delta_phi *= 1.0 - damping;
            self.pan_offset *= 1.0 - damping;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        (camera.position - before.position).magnitude2() > f32::EPSILON
            || (camera.target - before.target).magnitude2() > f32::EPSILON
    }

    fn apply_pending_pan(&mut self, camera: &Camera, projection: &Projection) {
        let (dx, dy) = std::mem::take(&mut self.pending_pan);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        // Pointer pixels map to world units at the target's depth
        let target_distance =
            (camera.position - camera.target).magnitude() * (projection.fovy().0 / 2.0).tan();
        let world_per_pixel = 2.0 * target_distance / self.viewport_height;

        // The inverted view matrix holds the camera's right and up axes in its first two columns
        let Some(camera_to_world) = camera.calc_matrix().invert() else {
            return;
        };
        let right = camera_to_world.x.truncate();
        let up = camera_to_world.y.truncate();
        self.pan_offset += right * (-dx * world_per_pixel) + up * (dy * world_per_pixel);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Matrix;
    use winit::{dpi::PhysicalPosition, event::DeviceId};

    use super::*;

    fn device() -> DeviceId {
        // SAFETY: the id is only carried inside the event, never handed to the platform
        unsafe { DeviceId::dummy() }
    }

    fn view_direction(camera: &Camera) -> Vector3<f32> {
        -camera.calc_matrix().transpose().z.truncate()
    }

    fn setup() -> (Camera, Projection, OrbitController) {
        let camera = Camera::from_config(&CameraConfig::default());
        let projection = Projection::from_config(800, 600, &CameraConfig::default());
        let mut controls = OrbitController::new(ControlsConfig::default());
        controls.set_viewport_height(600.0);
        (camera, projection, controls)
    }

    fn drag(controls: &mut OrbitController, from: (f64, f64), to: (f64, f64)) {
        controls.drag = Drag::Rotate;
        controls.pointer_moved(from.0, from.1);
        controls.pointer_moved(to.0, to.1);
        controls.drag = Drag::None;
    }

    #[test]
    fn starts_looking_at_the_origin() {
        let (camera, ..) = setup();
        assert_eq!(camera.position, Point3::new(4.0, 2.0, 4.0));
        let dir = view_direction(&camera);
        let expected = (Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
        assert!((dir - expected).magnitude() < 1e-5);
    }

    #[test]
    fn input_without_update_does_not_move_the_camera() {
        let (camera, projection, mut controls) = setup();
        let before = camera.clone();
        drag(&mut controls, (100.0, 100.0), (300.0, 150.0));
        controls.wheel(1.0);
        assert_eq!(camera, before);

        let mut moved = camera.clone();
        assert!(controls.update(&mut moved, &projection));
        assert_ne!(moved, before);
    }

    #[test]
    fn damped_rotation_glides_and_decays() {
        let (mut camera, projection, mut controls) = setup();
        drag(&mut controls, (100.0, 100.0), (160.0, 100.0));

        let radius = (camera.position - camera.target).magnitude();
        let mut steps = Vec::new();
        for _ in 0..5 {
            let before = camera.position;
            assert!(controls.update(&mut camera, &projection));
            steps.push((camera.position - before).magnitude());
        }
        for pair in steps.windows(2) {
            assert!(pair[1] < pair[0], "{:?}", steps);
        }
        // Orbiting keeps the distance to the target
        assert!(((camera.position - camera.target).magnitude() - radius).abs() < 1e-4);
        // Height is unchanged by a horizontal drag
        assert!((camera.position.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn first_update_applies_damping_factor() {
        let (mut camera, projection, mut controls) = setup();
        // 2π * dx / height with dx = 300, height = 600 is half a turn
        drag(&mut controls, (0.0, 0.0), (300.0, 0.0));
        let theta_before = camera.position.x.atan2(camera.position.z);
        controls.update(&mut camera, &projection);
        let theta_after = camera.position.x.atan2(camera.position.z);
        assert!(((theta_before - theta_after) - PI * 0.05).abs() < 1e-4);
        assert!((controls.delta_theta + PI * 0.95).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_never_reaches_the_pole() {
        let (mut camera, projection, mut controls) = setup();
        for _ in 0..200 {
            drag(&mut controls, (0.0, 0.0), (0.0, 600.0));
            controls.update(&mut camera, &projection);
        }
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        assert!(offset.x.abs() + offset.z.abs() > 0.0);
        assert!(offset.y > 0.0 && offset.y <= radius);
        assert!(camera.position.x.is_finite() && camera.position.z.is_finite());
    }

    #[test]
    fn wheel_dollies_without_damping() {
        let (mut camera, projection, mut controls) = setup();
        let radius = (camera.position - camera.target).magnitude();
        controls.handle_window_event(&WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: winit::event::TouchPhase::Moved,
        });
        controls.update(&mut camera, &projection);
        let closer = (camera.position - camera.target).magnitude();
        assert!((closer - radius * 0.95).abs() < 1e-4);

        // The dolly is used up in one update
        controls.update(&mut camera, &projection);
        let settled = (camera.position - camera.target).magnitude();
        assert!((settled - closer).abs() < 1e-6);
    }

    #[test]
    fn right_drag_pans_the_target() {
        let (mut camera, projection, mut controls) = setup();
        controls.handle_window_event(&WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Right,
        });
        for x in [100.0, 150.0] {
            controls.handle_window_event(&WindowEvent::CursorMoved {
                device_id: device(),
                position: PhysicalPosition::new(x, 100.0),
            });
        }
        let offset_before = camera.position - camera.target;
        controls.update(&mut camera, &projection);
        assert!(camera.target != Point3::new(0.0, 0.0, 0.0));
        // Panning moves camera and target together
        assert!(((camera.position - camera.target) - offset_before).magnitude() < 1e-4);
    }
}
