//! Viewer camera state and the projection math shared by placement, visibility
//! and viewpoint restore.
//!
//! The [`ViewerCamera`] component is the source of truth for the camera; the
//! Bevy `Transform`, `Projection` and sub-view are derived from it once per frame
//! by [`sync_viewer_camera`].

use bevy::camera::SubCameraView;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use serde::{Deserialize, Serialize};

use crate::constants::{CAMERA_FAR, CAMERA_NEAR, MAX_ORBIT_ELEVATION, ORTHO_HALF_HEIGHT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectionMode::Perspective => "Perspective",
            ProjectionMode::Orthographic => "Orthographic",
        }
    }
}

/// A world point projected into the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Viewport pixels, origin top-left, y down
    pub screen: Vec2,
    /// Normalized device coordinates (z in `[0, 1]` between near and far)
    pub ndc: Vec3,
}

/// Orbit camera: a position looking at a pivot, with lens and view shift.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ViewerCamera {
    pub projection: ProjectionMode,
    pub position: Vec3,
    /// Orbit pivot, also the look-at target
    pub pivot: Vec3,
    /// Vertical field of view in radians (perspective only)
    pub fov: f32,
    /// Orthographic zoom factor (orthographic only)
    pub zoom: f32,
    /// Off-axis pan in viewport pixels, independent of the pivot
    pub view_shift: Vec2,
}

impl Default for ViewerCamera {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::Perspective,
            position: Vec3::new(0.0, 0.0, 5.0),
            pivot: Vec3::ZERO,
            fov: std::f32::consts::FRAC_PI_4,
            zoom: 1.0,
            view_shift: Vec2::ZERO,
        }
    }
}

impl ViewerCamera {
    /// Unit vector from the camera towards the pivot.
    pub fn forward(&self) -> Vec3 {
        (self.pivot - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// Up vector that does not flip when looking straight up or down.
    pub fn up(&self) -> Vec3 {
        stable_up_vector(self.forward())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.up())
    }

    /// Camera world matrix (inverse of the view matrix).
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    pub fn projection_matrix(&self, viewport: Vec2) -> Mat4 {
        let width = viewport.x.max(1.0);
        let height = viewport.y.max(1.0);
        let aspect = width / height;

        let lens = match self.projection {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov, aspect, CAMERA_NEAR, CAMERA_FAR)
            }
            ProjectionMode::Orthographic => {
                let half_h = ORTHO_HALF_HEIGHT / self.zoom.max(f32::EPSILON);
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, CAMERA_NEAR, CAMERA_FAR)
            }
        };

        // View shift moves the rendered image by whole viewport pixels
        let shift = Mat4::from_translation(Vec3::new(
            2.0 * self.view_shift.x / width,
            -2.0 * self.view_shift.y / height,
            0.0,
        ));
        shift * lens
    }

    pub fn view_projection(&self, viewport: Vec2) -> Mat4 {
        self.projection_matrix(viewport) * self.view_matrix()
    }

    /// Project a world point. Returns `None` when the point is at or behind the
    /// camera plane (perspective `w <= 0`).
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Projected> {
        let clip = self.view_projection(viewport) * world.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        );
        Some(Projected { screen, ndc })
    }

    /// Ray from the near plane through a viewport pixel.
    pub fn screen_ray(&self, screen: Vec2, viewport: Vec2) -> Option<Ray3d> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc_x = screen.x / viewport.x * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / viewport.y * 2.0;
        let inverse = self.view_projection(viewport).inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let direction = Dir3::new(far - near).ok()?;
        Some(Ray3d::new(near, direction))
    }

    /// Bevy transform equivalent of this camera's pose.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).looking_to(self.forward(), self.up())
    }

    /// Bevy projection equivalent of this camera's lens.
    pub fn bevy_projection(&self) -> Projection {
        match self.projection {
            ProjectionMode::Perspective => Projection::Perspective(PerspectiveProjection {
                fov: self.fov,
                near: CAMERA_NEAR,
                far: CAMERA_FAR,
                ..default()
            }),
            ProjectionMode::Orthographic => Projection::Orthographic(OrthographicProjection {
                // default_3d uses a fixed vertical extent of 2 units at scale 1
                scale: ORTHO_HALF_HEIGHT / self.zoom.max(f32::EPSILON),
                near: CAMERA_NEAR,
                far: CAMERA_FAR,
                ..OrthographicProjection::default_3d()
            }),
        }
    }
}

/// Compute a stable up vector for `look_at` that prevents camera flipping.
/// When the camera looks nearly straight up or down, a horizontal axis is
/// used instead of `Vec3::Y`.
pub fn stable_up_vector(forward: Vec3) -> Vec3 {
    if forward.y.abs() > MAX_ORBIT_ELEVATION {
        if forward.y < 0.0 { Vec3::NEG_Z } else { Vec3::Z }
    } else {
        Vec3::Y
    }
}

/// Copy [`ViewerCamera`] state onto the Bevy camera components.
pub fn sync_viewer_camera(
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut camera_query: Query<(&ViewerCamera, &mut Transform, &mut Projection, &mut Camera)>,
) {
    let window = window_query.single().ok();

    for (viewer_camera, mut transform, mut projection, mut camera) in camera_query.iter_mut() {
        let new_transform = viewer_camera.transform();
        if *transform != new_transform {
            *transform = new_transform;
        }

        let new_projection = viewer_camera.bevy_projection();
        let changed = match (&*projection, &new_projection) {
            (Projection::Perspective(a), Projection::Perspective(b)) => a.fov != b.fov,
            (Projection::Orthographic(a), Projection::Orthographic(b)) => a.scale != b.scale,
            _ => true,
        };
        if changed {
            *projection = new_projection;
        }

        let sub_view = window.and_then(|window| {
            if viewer_camera.view_shift == Vec2::ZERO {
                return None;
            }
            let full_size = UVec2::new(window.physical_width(), window.physical_height());
            if full_size.x == 0 || full_size.y == 0 {
                return None;
            }
            Some(SubCameraView {
                full_size,
                // The sub view's top-left moves opposite to the image shift
                offset: -viewer_camera.view_shift * window.scale_factor(),
                size: full_size,
            })
        });
        if camera.sub_camera_view != sub_view {
            camera.sub_camera_view = sub_view;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_pivot_projects_to_viewport_center() {
        let camera = ViewerCamera::default();
        let projected = camera.project(Vec3::ZERO, VIEWPORT).unwrap();
        assert!((projected.screen - VIEWPORT / 2.0).length() < 1e-3);
        assert!(projected.ndc.z > 0.0 && projected.ndc.z < 1.0);
    }

    #[test]
    fn test_point_behind_camera_does_not_project() {
        let camera = ViewerCamera::default();
        assert!(camera.project(Vec3::new(0.0, 0.0, 10.0), VIEWPORT).is_none());
    }

    #[test]
    fn test_view_shift_moves_image_in_pixels() {
        let mut camera = ViewerCamera::default();
        let before = camera.project(Vec3::new(1.0, 0.5, 0.0), VIEWPORT).unwrap();
        camera.view_shift = Vec2::new(30.0, -20.0);
        let after = camera.project(Vec3::new(1.0, 0.5, 0.0), VIEWPORT).unwrap();
        assert!((after.screen - before.screen - Vec2::new(30.0, -20.0)).length() < 1e-2);
    }

    #[test]
    fn test_screen_ray_passes_through_projected_point() {
        let mut camera = ViewerCamera {
            position: Vec3::new(3.0, 2.0, 4.0),
            view_shift: Vec2::new(12.0, 7.0),
            ..default()
        };
        for mode in [ProjectionMode::Perspective, ProjectionMode::Orthographic] {
            camera.projection = mode;
            let target = Vec3::new(0.5, -0.25, 0.3);
            let projected = camera.project(target, VIEWPORT).unwrap();
            let ray = camera.screen_ray(projected.screen, VIEWPORT).unwrap();
            let to_target = target - ray.origin;
            let along = to_target.dot(*ray.direction);
            let closest = ray.origin + *ray.direction * along;
            assert!((closest - target).length() < 1e-3, "{mode:?}");
        }
    }

    #[test]
    fn test_orthographic_zoom_scales_screen_offset() {
        let mut camera = ViewerCamera {
            projection: ProjectionMode::Orthographic,
            ..default()
        };
        let a = camera.project(Vec3::X, VIEWPORT).unwrap().screen.x - VIEWPORT.x / 2.0;
        camera.zoom = 2.0;
        let b = camera.project(Vec3::X, VIEWPORT).unwrap().screen.x - VIEWPORT.x / 2.0;
        assert!((b - 2.0 * a).abs() < 1e-3);
    }

    #[test]
    fn test_stable_up_near_poles() {
        assert_eq!(stable_up_vector(Vec3::NEG_Y), Vec3::NEG_Z);
        assert_eq!(stable_up_vector(Vec3::NEG_Z), Vec3::Y);
    }
}
