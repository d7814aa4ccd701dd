//! The viewer collaborator consumed by the marker subsystem.
//!
//! Markers never talk to Bevy's camera, scene graph or picking directly; they go
//! through the [`Viewer`] trait. [`SceneViewer`] implements it over the ECS and
//! `test_support::MockViewer` implements it over analytic geometry for tests.
//!
//! ## Module Structure
//!
//! - [`camera`] - Camera state, projection math, sync onto Bevy components
//! - [`section`] - Axis-aligned section planes
//! - [`navigation`] - Orbit controller, gesture messages, navigation lease
//! - [`model`] - Marker components for the model root and its meshes
//! - [`scene_viewer`] - `SystemParam` implementing [`Viewer`]

pub mod camera;
pub mod model;
pub mod navigation;
pub mod scene_viewer;
pub mod section;

#[cfg(test)]
pub mod test_support;

pub use camera::{ProjectionMode, ViewerCamera};
pub use model::{ModelMesh, ModelRoot, OverlayMesh};
pub use navigation::{NavigationController, NavigationEnded, NavigationLease, NavigationStarted};
pub use scene_viewer::SceneViewer;
pub use section::{SectionAxis, SectionPlane, SectionPlanes};

use bevy::prelude::*;

/// What a ray hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    /// Model surface geometry
    Mesh,
    /// Non-surface overlays such as edge lines
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Distance from the ray origin along the ray
    pub distance: f32,
    pub kind: HitKind,
}

/// Everything the marker subsystem needs from the host viewer.
///
/// Accessors return `None` when the collaborator is absent (no window, no
/// camera, no model loaded); callers treat that as a no-op.
pub trait Viewer {
    /// Viewport size in logical pixels.
    fn viewport_size(&self) -> Option<Vec2>;

    fn camera(&self) -> Option<ViewerCamera>;

    fn camera_mut(&mut self) -> Option<&mut ViewerCamera>;

    /// Model world transform, `None` when no model is loaded.
    fn model_transform(&self) -> Option<Transform>;

    /// Returns false when there is no model to move.
    fn set_model_transform(&mut self, transform: Transform) -> bool;

    fn section_planes(&self) -> SectionPlanes;

    fn set_section_plane(&mut self, axis: SectionAxis, plane: Option<SectionPlane>);

    /// All hits along `ray`, nearest first.
    fn cast_ray(&mut self, ray: Ray3d) -> Vec<RayHit>;

    fn navigation_enabled(&self) -> bool;

    fn set_navigation_enabled(&mut self, enabled: bool);

    /// Ray from the active camera through a viewport pixel.
    fn screen_ray(&self, screen: Vec2) -> Option<Ray3d> {
        let viewport = self.viewport_size()?;
        self.camera()?.screen_ray(screen, viewport)
    }

    /// Nearest model-surface point under a viewport pixel, skipping overlay
    /// hits and geometry removed by an enabled section plane.
    fn surface_point_at(&mut self, screen: Vec2, clip_epsilon: f32) -> Option<Vec3> {
        let ray = self.screen_ray(screen)?;
        let sections = self.section_planes();
        self.cast_ray(ray)
            .into_iter()
            .filter(|hit| hit.kind == HitKind::Mesh)
            .find(|hit| sections.clipping_axis(hit.point, clip_epsilon).is_none())
            .map(|hit| hit.point)
    }
}

/// Ordering of viewer systems within `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Host navigation input moves the camera
    Navigate,
    /// Camera state is copied onto the render camera
    Sync,
}

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavigationController>()
            .init_resource::<SectionPlanes>()
            .add_message::<NavigationStarted>()
            .add_message::<NavigationEnded>()
            .configure_sets(Update, ViewerSet::Navigate.before(ViewerSet::Sync))
            .add_systems(
                Update,
                (
                    navigation::orbit_navigation.in_set(ViewerSet::Navigate),
                    camera::sync_viewer_camera.in_set(ViewerSet::Sync),
                ),
            );
    }
}
