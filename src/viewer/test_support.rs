//! Analytic [`Viewer`] used by unit tests.

use bevy::prelude::*;

use super::camera::ViewerCamera;
use super::section::{SectionAxis, SectionPlane, SectionPlanes};
use super::{HitKind, RayHit, Viewer};

/// Which frame a test surface is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Moves with the model transform
    Model,
    /// Fixed in the world
    World,
}

#[derive(Debug, Clone, Copy)]
pub struct MockSurface {
    pub triangle: [Vec3; 3],
    pub kind: HitKind,
    pub space: Space,
}

pub struct MockViewer {
    pub viewport: Option<Vec2>,
    pub camera: Option<ViewerCamera>,
    pub model: Option<Transform>,
    pub sections: SectionPlanes,
    pub navigation_enabled: bool,
    pub surfaces: Vec<MockSurface>,
}

impl Default for MockViewer {
    fn default() -> Self {
        Self {
            viewport: Some(Vec2::new(800.0, 600.0)),
            camera: Some(ViewerCamera::default()),
            model: Some(Transform::IDENTITY),
            sections: SectionPlanes::default(),
            navigation_enabled: true,
            surfaces: Vec::new(),
        }
    }
}

impl MockViewer {
    /// Axis-aligned square facing +Z at depth `z`, `half` units wide.
    pub fn add_quad_z(&mut self, center: Vec3, half: f32, kind: HitKind, space: Space) {
        let a = center + Vec3::new(-half, -half, 0.0);
        let b = center + Vec3::new(half, -half, 0.0);
        let c = center + Vec3::new(half, half, 0.0);
        let d = center + Vec3::new(-half, half, 0.0);
        self.surfaces.push(MockSurface { triangle: [a, b, c], kind, space });
        self.surfaces.push(MockSurface { triangle: [a, c, d], kind, space });
    }

    /// The model's front face: a large square in the model's z = 0 plane.
    pub fn with_model_face() -> Self {
        let mut viewer = Self::default();
        viewer.add_quad_z(Vec3::ZERO, 4.0, HitKind::Mesh, Space::Model);
        viewer
    }

    /// A small model face that leaves the viewport corners empty.
    pub fn with_small_face() -> Self {
        let mut viewer = Self::default();
        viewer.add_quad_z(Vec3::ZERO, 0.5, HitKind::Mesh, Space::Model);
        viewer
    }

    /// Screen position of a world point under the current camera.
    pub fn screen_of(&self, world: Vec3) -> Vec2 {
        let camera = self.camera.expect("mock camera");
        let viewport = self.viewport.expect("mock viewport");
        camera.project(world, viewport).expect("point in front of camera").screen
    }
}

/// Möller–Trumbore ray/triangle intersection, returning the ray parameter.
fn intersect(ray: Ray3d, triangle: [Vec3; 3]) -> Option<f32> {
    let [v0, v1, v2] = triangle;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > 0.0).then_some(t)
}

impl Viewer for MockViewer {
    fn viewport_size(&self) -> Option<Vec2> {
        self.viewport
    }

    fn camera(&self) -> Option<ViewerCamera> {
        self.camera
    }

    fn camera_mut(&mut self) -> Option<&mut ViewerCamera> {
        self.camera.as_mut()
    }

    fn model_transform(&self) -> Option<Transform> {
        self.model
    }

    fn set_model_transform(&mut self, transform: Transform) -> bool {
        match self.model.as_mut() {
            Some(model) => {
                *model = transform;
                true
            }
            None => false,
        }
    }

    fn section_planes(&self) -> SectionPlanes {
        self.sections
    }

    fn set_section_plane(&mut self, axis: SectionAxis, plane: Option<SectionPlane>) {
        self.sections.set(axis, plane);
    }

    fn cast_ray(&mut self, ray: Ray3d) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .surfaces
            .iter()
            .filter_map(|surface| {
                let triangle = match surface.space {
                    Space::World => surface.triangle,
                    Space::Model => {
                        let model = self.model?;
                        surface.triangle.map(|v| model.transform_point(v))
                    }
                };
                intersect(ray, triangle).map(|t| RayHit {
                    point: ray.origin + *ray.direction * t,
                    distance: t,
                    kind: surface.kind,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn navigation_enabled(&self) -> bool {
        self.navigation_enabled
    }

    fn set_navigation_enabled(&mut self, enabled: bool) {
        self.navigation_enabled = enabled;
    }
}

#[test]
fn test_mock_ray_hits_model_face() {
    let mut viewer = MockViewer::with_model_face();
    let screen = viewer.screen_of(Vec3::new(1.0, 0.0, 0.0));
    let point = viewer.surface_point_at(screen, 1e-4).unwrap();
    assert!((point - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-3);
}

#[test]
fn test_mock_ray_follows_model_transform() {
    let mut viewer = MockViewer::with_model_face();
    viewer.model = Some(Transform::from_xyz(0.0, 0.0, -1.0));
    let screen = viewer.screen_of(Vec3::new(0.0, 0.0, -1.0));
    let point = viewer.surface_point_at(screen, 1e-4).unwrap();
    assert!((point.z + 1.0).abs() < 1e-3);
}
