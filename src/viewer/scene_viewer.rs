//! [`Viewer`] implementation over the Bevy world.

use bevy::ecs::system::SystemParam;
use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::camera::ViewerCamera;
use super::model::{ModelMesh, ModelRoot, OverlayMesh};
use super::navigation::NavigationController;
use super::section::{SectionAxis, SectionPlane, SectionPlanes};
use super::{HitKind, RayHit, Viewer};
use crate::common::non_fatal;

/// Bundled window, camera, model, section-plane and picking access.
#[derive(SystemParam)]
pub struct SceneViewer<'w, 's> {
    window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    camera: Query<'w, 's, &'static mut ViewerCamera>,
    model: Query<'w, 's, &'static mut Transform, With<ModelRoot>>,
    sections: ResMut<'w, SectionPlanes>,
    navigation: ResMut<'w, NavigationController>,
    ray_cast: MeshRayCast<'w, 's>,
    model_meshes: Query<'w, 's, (), With<ModelMesh>>,
    overlay_meshes: Query<'w, 's, (), With<OverlayMesh>>,
}

impl SceneViewer<'_, '_> {
    /// Cursor position in logical viewport pixels, if inside the window.
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    /// Stop the press of this frame from reaching orbit navigation.
    pub fn claim_press(&mut self) {
        self.navigation.claim_press();
    }
}

impl Viewer for SceneViewer<'_, '_> {
    fn viewport_size(&self) -> Option<Vec2> {
        let window = self.window.single().ok()?;
        Some(Vec2::new(window.width(), window.height()))
    }

    fn camera(&self) -> Option<ViewerCamera> {
        self.camera.single().ok().copied()
    }

    fn camera_mut(&mut self) -> Option<&mut ViewerCamera> {
        non_fatal("viewer.camera_mut", self.camera.single_mut()).map(|camera| camera.into_inner())
    }

    fn model_transform(&self) -> Option<Transform> {
        self.model.single().ok().copied()
    }

    fn set_model_transform(&mut self, transform: Transform) -> bool {
        match self.model.single_mut() {
            Ok(mut current) => {
                *current = transform;
                true
            }
            Err(_) => false,
        }
    }

    fn section_planes(&self) -> SectionPlanes {
        *self.sections
    }

    fn set_section_plane(&mut self, axis: SectionAxis, plane: Option<SectionPlane>) {
        if self.sections.get(axis) != plane {
            self.sections.set(axis, plane);
        }
    }

    fn cast_ray(&mut self, ray: Ray3d) -> Vec<RayHit> {
        let Self {
            ray_cast,
            model_meshes,
            overlay_meshes,
            ..
        } = self;

        let filter = |entity: Entity| model_meshes.contains(entity) || overlay_meshes.contains(entity);
        let never_exit_early = |_: Entity| false;
        let settings = MeshRayCastSettings::default()
            .with_filter(&filter)
            .with_early_exit_test(&never_exit_early);

        ray_cast
            .cast_ray(ray, &settings)
            .iter()
            .map(|(entity, hit)| RayHit {
                point: hit.point,
                distance: hit.distance,
                kind: if model_meshes.contains(*entity) {
                    HitKind::Mesh
                } else {
                    HitKind::Overlay
                },
            })
            .collect()
    }

    fn navigation_enabled(&self) -> bool {
        self.navigation.enabled
    }

    fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation.enabled = enabled;
    }
}
