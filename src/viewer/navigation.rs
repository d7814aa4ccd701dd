//! Orbit navigation controller and the lease used by marker sessions to
//! suspend it.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use super::camera::{ProjectionMode, ViewerCamera};
use super::Viewer;
use crate::constants::{MAX_ORBIT_ELEVATION, MAX_ZOOM, MIN_ZOOM};

/// Emitted when a navigation gesture begins (drag-to-orbit, pan, wheel).
#[derive(Message, Debug, Clone, Copy)]
pub struct NavigationStarted;

/// Emitted when a navigation gesture ends. Inertia may still move the camera.
#[derive(Message, Debug, Clone, Copy)]
pub struct NavigationEnded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Gesture {
    #[default]
    None,
    Orbit,
    Pan,
}

#[derive(Resource)]
pub struct NavigationController {
    /// When false the controller ignores input and any inertia is dropped
    pub enabled: bool,
    pub rotate_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_speed: f32,
    /// Fraction of orbit velocity lost per 60 Hz frame once released
    pub damping: f32,
    gesture: Gesture,
    orbit_velocity: Vec2,
    /// The current frame's button press was taken by another handler
    press_claimed: bool,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self {
            enabled: true,
            rotate_sensitivity: 0.005,
            pan_sensitivity: 0.0015,
            zoom_speed: 0.1,
            damping: 0.12,
            gesture: Gesture::None,
            orbit_velocity: Vec2::ZERO,
            press_claimed: false,
        }
    }
}

impl NavigationController {
    pub fn is_gesture_active(&self) -> bool {
        self.gesture != Gesture::None
    }

    /// Keep this frame's button press from starting a gesture.
    pub fn claim_press(&mut self) {
        self.press_claimed = true;
    }
}

/// Token held by a session that disabled navigation.
///
/// Releasing it restores the enabled flag to the value it had at acquisition.
/// The token is consumed by [`NavigationLease::release`], so every exit path
/// restores the flag exactly once.
#[must_use = "a dropped lease leaves navigation disabled"]
#[derive(Debug, PartialEq, Eq)]
pub struct NavigationLease {
    prior: bool,
}

impl NavigationLease {
    pub fn acquire(viewer: &mut impl Viewer) -> Self {
        let prior = viewer.navigation_enabled();
        viewer.set_navigation_enabled(false);
        Self { prior }
    }

    pub fn prior(&self) -> bool {
        self.prior
    }

    pub fn release(self, viewer: &mut impl Viewer) {
        viewer.set_navigation_enabled(self.prior);
    }
}

/// Rotate `camera` around its pivot by yaw (around world Y) and pitch (around
/// the camera's right axis). Pitch stops short of the poles.
pub fn orbit(camera: &mut ViewerCamera, yaw: f32, pitch: f32) {
    let offset = camera.position - camera.pivot;
    let distance = offset.length();
    if distance < 1e-6 {
        return;
    }

    let yawed = Quat::from_rotation_y(yaw) * offset;
    let right = Vec3::Y.cross(yawed).try_normalize().unwrap_or(Vec3::X);
    let pitched = Quat::from_axis_angle(right, pitch) * yawed;

    // Reject pitches that would cross the pole
    let elevation = (pitched.y / distance).clamp(-1.0, 1.0);
    let new_offset = if elevation.abs() > MAX_ORBIT_ELEVATION { yawed } else { pitched };
    camera.position = camera.pivot + new_offset;
}

/// Translate both camera and pivot in the view plane.
pub fn pan(camera: &mut ViewerCamera, delta: Vec2, sensitivity: f32) {
    let distance = (camera.position - camera.pivot).length().max(0.1);
    let forward = camera.forward();
    let right = forward.cross(camera.up()).normalize_or_zero();
    let up = right.cross(forward).normalize_or_zero();
    let scale = match camera.projection {
        ProjectionMode::Perspective => distance * sensitivity,
        ProjectionMode::Orthographic => sensitivity * 5.0 / camera.zoom.max(MIN_ZOOM),
    };
    let offset = (-right * delta.x + up * delta.y) * scale;
    camera.position += offset;
    camera.pivot += offset;
}

/// Dolly (perspective) or zoom (orthographic) by wheel `amount`.
pub fn zoom(camera: &mut ViewerCamera, amount: f32) {
    match camera.projection {
        ProjectionMode::Perspective => {
            let offset = camera.position - camera.pivot;
            let factor = (1.0 - amount).clamp(0.2, 5.0);
            let new_offset = offset * factor;
            if new_offset.length() > 0.05 {
                camera.position = camera.pivot + new_offset;
            }
        }
        ProjectionMode::Orthographic => {
            camera.zoom = (camera.zoom * (1.0 + amount)).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn orbit_navigation(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    time: Res<Time>,
    mut controller: ResMut<NavigationController>,
    mut camera_query: Query<&mut ViewerCamera>,
    mut contexts: EguiContexts,
    mut started: MessageWriter<NavigationStarted>,
    mut ended: MessageWriter<NavigationEnded>,
) {
    let motion: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y * controller.zoom_speed,
            MouseScrollUnit::Pixel => event.y * controller.zoom_speed * 0.01,
        })
        .sum();

    let press_claimed = std::mem::take(&mut controller.press_claimed);

    if !controller.enabled {
        if controller.is_gesture_active() {
            controller.gesture = Gesture::None;
            ended.write(NavigationEnded);
        }
        controller.orbit_velocity = Vec2::ZERO;
        return;
    }

    let Ok(mut camera) = camera_query.single_mut() else {
        return;
    };

    let over_ui = contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false);

    // Gesture start / end
    if controller.gesture == Gesture::None && !over_ui && !press_claimed {
        if mouse_button.just_pressed(MouseButton::Left) {
            controller.gesture = Gesture::Orbit;
            controller.orbit_velocity = Vec2::ZERO;
            started.write(NavigationStarted);
        } else if mouse_button.just_pressed(MouseButton::Middle) {
            controller.gesture = Gesture::Pan;
            started.write(NavigationStarted);
        }
    }
    let released = match controller.gesture {
        Gesture::Orbit => !mouse_button.pressed(MouseButton::Left),
        Gesture::Pan => !mouse_button.pressed(MouseButton::Middle),
        Gesture::None => false,
    };
    if released {
        controller.gesture = Gesture::None;
        ended.write(NavigationEnded);
    }

    match controller.gesture {
        Gesture::Orbit => {
            controller.orbit_velocity = -motion * controller.rotate_sensitivity;
            let velocity = controller.orbit_velocity;
            orbit(&mut camera, velocity.x, velocity.y);
        }
        Gesture::Pan => {
            let sensitivity = controller.pan_sensitivity;
            pan(&mut camera, motion, sensitivity);
        }
        Gesture::None => {
            // Inertia after an orbit release
            if controller.orbit_velocity.length_squared() > 1e-10 {
                let keep = (1.0 - controller.damping).powf(time.delta_secs() * 60.0);
                controller.orbit_velocity *= keep;
                let velocity = controller.orbit_velocity;
                orbit(&mut camera, velocity.x, velocity.y);
            } else {
                controller.orbit_velocity = Vec2::ZERO;
            }
        }
    }

    if scroll != 0.0 && !over_ui {
        zoom(&mut camera, scroll);
        if controller.gesture == Gesture::None {
            started.write(NavigationStarted);
            ended.write(NavigationEnded);
        }
    }
}
