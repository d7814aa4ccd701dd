//! Per-frame marker visibility.
//!
//! A marker is shown only when its anchor is inside the kept half-space of every
//! enabled section plane, in front of the camera, inside the view frustum and
//! not behind drawn model geometry.

use bevy::prelude::*;

use super::registry::{anchor_to_world, MarkerRegistry};
use crate::config::AppConfig;
use crate::viewer::{HitKind, SceneViewer, SectionAxis, SectionPlanes, Viewer};

/// Why a marker is not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenReason {
    GloballyHidden,
    NoModel,
    NoCamera,
    Clipped(SectionAxis),
    BehindCamera,
    OutsideFrustum,
    Occluded,
}

impl HiddenReason {
    pub fn description(&self) -> String {
        match self {
            HiddenReason::GloballyHidden => "markers hidden".to_string(),
            HiddenReason::NoModel => "no model".to_string(),
            HiddenReason::NoCamera => "no camera".to_string(),
            HiddenReason::Clipped(axis) => format!("cut by {} section", axis.display_name()),
            HiddenReason::BehindCamera => "behind camera".to_string(),
            HiddenReason::OutsideFrustum => "off screen".to_string(),
            HiddenReason::Occluded => "occluded".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerVisibility {
    pub world: Option<Vec3>,
    pub screen: Option<Vec2>,
    /// `None` when visible
    pub hidden: Option<HiddenReason>,
}

impl MarkerVisibility {
    fn hidden(world: Option<Vec3>, screen: Option<Vec2>, reason: HiddenReason) -> Self {
        Self {
            world,
            screen,
            hidden: Some(reason),
        }
    }
}

/// True when a mesh hit closer than `anchor_distance` (minus a depth margin)
/// lies on drawn geometry. Overlay hits never block.
fn is_occluded(
    viewer: &mut impl Viewer,
    screen: Vec2,
    world: Vec3,
    sections: &SectionPlanes,
    epsilon: f32,
) -> bool {
    let Some(ray) = viewer.screen_ray(screen) else {
        return false;
    };
    let anchor_distance = (world - ray.origin).dot(*ray.direction);
    let margin = epsilon * anchor_distance.abs().max(1.0);

    viewer
        .cast_ray(ray)
        .into_iter()
        .take_while(|hit| hit.distance < anchor_distance - margin)
        .any(|hit| {
            hit.kind == HitKind::Mesh && sections.clipping_axis(hit.point, epsilon).is_none()
        })
}

/// Visibility of one anchor under the viewer's current state.
pub fn compute_visibility(
    local_anchor: Vec3,
    globally_hidden: bool,
    viewer: &mut impl Viewer,
    occlusion_epsilon: f32,
) -> MarkerVisibility {
    let Some(model) = viewer.model_transform() else {
        return MarkerVisibility::hidden(None, None, HiddenReason::NoModel);
    };
    let world = anchor_to_world(&model, local_anchor);

    if globally_hidden {
        return MarkerVisibility::hidden(Some(world), None, HiddenReason::GloballyHidden);
    }

    let sections = viewer.section_planes();
    if let Some(axis) = sections.clipping_axis(world, occlusion_epsilon) {
        return MarkerVisibility::hidden(Some(world), None, HiddenReason::Clipped(axis));
    }

    let (Some(camera), Some(viewport)) = (viewer.camera(), viewer.viewport_size()) else {
        return MarkerVisibility::hidden(Some(world), None, HiddenReason::NoCamera);
    };
    let Some(projected) = camera.project(world, viewport) else {
        return MarkerVisibility::hidden(Some(world), None, HiddenReason::BehindCamera);
    };
    let screen = projected.screen;

    let ndc = projected.ndc;
    if ndc.z < 0.0 {
        return MarkerVisibility::hidden(Some(world), Some(screen), HiddenReason::BehindCamera);
    }
    if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z > 1.0 {
        return MarkerVisibility::hidden(Some(world), Some(screen), HiddenReason::OutsideFrustum);
    }

    if is_occluded(viewer, screen, world, &sections, occlusion_epsilon) {
        return MarkerVisibility::hidden(Some(world), Some(screen), HiddenReason::Occluded);
    }

    MarkerVisibility {
        world: Some(world),
        screen: Some(screen),
        hidden: None,
    }
}

impl MarkerRegistry {
    /// Recompute every marker's world position, screen position and visibility.
    pub fn refresh_visibility(&mut self, viewer: &mut impl Viewer, occlusion_epsilon: f32) {
        let hidden = self.markers_hidden();
        for marker in self.iter_mut() {
            let result = compute_visibility(marker.local_anchor(), hidden, viewer, occlusion_epsilon);
            marker.apply_visibility(result);
        }
    }
}

/// Runs after all camera, model and section-plane changes of the frame.
pub fn update_marker_visibility(
    mut registry: ResMut<MarkerRegistry>,
    mut viewer: SceneViewer,
    config: Res<AppConfig>,
) {
    if registry.is_empty() {
        return;
    }
    registry.refresh_visibility(&mut viewer, config.markers().occlusion_epsilon);
}
