//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration defaults that are used
//! in multiple places or would benefit from being named constants.

use bevy::math::Vec2;

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Pointer travel (in pixels) that turns a marker press into a drag
pub const DEFAULT_DRAG_THRESHOLD_PX: f32 = 4.0;

/// Duration of the animated viewpoint restore
pub const DEFAULT_FLY_DURATION_SECS: f32 = 0.55;

/// How long the camera must stay still before auto-hidden markers reappear
pub const DEFAULT_AUTO_HIDE_IDLE_SECS: f64 = 0.15;

/// Per-element tolerance when comparing camera world matrices between frames
pub const DEFAULT_AUTO_HIDE_EPSILON: f32 = 1e-4;

/// A mesh hit must be nearer than the anchor by at least this much to occlude it
pub const DEFAULT_OCCLUSION_EPSILON: f32 = 1e-3;

/// Screen radius of a marker handle (hit area and drawn circle)
pub const MARKER_HANDLE_RADIUS: f32 = 9.0;

/// Half-height of the orthographic frustum at zoom 1.0 (world units)
pub const ORTHO_HALF_HEIGHT: f32 = 5.0;

/// Largest |sin(elevation)| orbiting may reach. Above it `look_at` switches to
/// a horizontal up axis, so the two must agree.
pub const MAX_ORBIT_ELEVATION: f32 = 0.95;

/// Near clipping distance for the viewer camera
pub const CAMERA_NEAR: f32 = 0.05;

/// Far clipping distance for the viewer camera
pub const CAMERA_FAR: f32 = 2000.0;

/// Accepted perspective field of view range (radians)
pub const MIN_FOV: f32 = 0.017_453_3; // 1 degree
pub const MAX_FOV: f32 = 3.124_139_4; // 179 degrees

/// Accepted orthographic zoom range
pub const MIN_ZOOM: f32 = 0.01;
pub const MAX_ZOOM: f32 = 1000.0;

/// Size used to clamp a context menu before its real size has been measured
pub const CONTEXT_MENU_ESTIMATED_SIZE: Vec2 = Vec2::new(150.0, 96.0);
