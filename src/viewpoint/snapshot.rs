//! Viewpoint capture and instantaneous restore.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_FOV, MAX_ZOOM, MIN_FOV, MIN_ZOOM};
use crate::viewer::{ProjectionMode, SectionAxis, SectionPlane, Viewer, ViewerCamera};

/// Projection mode together with its lens parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Lens {
    /// Vertical field of view in radians
    Perspective { fov: f32 },
    Orthographic { zoom: f32 },
}

impl Lens {
    pub fn projection(&self) -> ProjectionMode {
        match self {
            Lens::Perspective { .. } => ProjectionMode::Perspective,
            Lens::Orthographic { .. } => ProjectionMode::Orthographic,
        }
    }

    pub fn of(camera: &ViewerCamera) -> Self {
        match camera.projection {
            ProjectionMode::Perspective => Lens::Perspective { fov: camera.fov },
            ProjectionMode::Orthographic => Lens::Orthographic { zoom: camera.zoom },
        }
    }
}

/// Serializable model world transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl From<&Transform> for ModelTransform {
    fn from(t: &Transform) -> Self {
        Self {
            translation: t.translation,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

impl From<ModelTransform> for Transform {
    fn from(t: ModelTransform) -> Self {
        Transform {
            translation: t.translation,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

/// One axis of section-plane state. `distance` is the plane's coordinate along
/// the axis, whichever way its normal points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionState {
    pub enabled: bool,
    pub distance: f32,
}

/// A complete, self-sufficient description of a view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewpointSnapshot {
    pub lens: Lens,
    pub camera_position: Vec3,
    pub pivot: Vec3,
    #[serde(default)]
    pub view_shift: Vec2,
    /// Absent when no model was loaded at capture time
    #[serde(default)]
    pub model: Option<ModelTransform>,
    #[serde(default)]
    pub sections: [SectionState; 3],
}

impl ViewpointSnapshot {
    pub fn projection(&self) -> ProjectionMode {
        self.lens.projection()
    }
}

/// A snapshot field that failed validation and was left at its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotField {
    CameraPosition,
    Pivot,
    Fov,
    Zoom,
    ViewShift,
    ModelTranslation,
    ModelRotation,
    ModelScale,
    Section(SectionAxis),
}

/// What a restore could not apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    /// No active camera; camera fields and section orientation were skipped
    pub missing_camera: bool,
    /// Snapshot carries a model transform but no model is loaded
    pub missing_model: bool,
    pub rejected: Vec<SnapshotField>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        !self.missing_camera && !self.missing_model && self.rejected.is_empty()
    }

    pub(crate) fn log(&self, context: &str) {
        if !self.rejected.is_empty() {
            warn!("{}: ignored invalid snapshot fields {:?}", context, self.rejected);
        }
        if self.missing_camera {
            debug!("{}: no active camera, camera state not restored", context);
        }
        if self.missing_model {
            debug!("{}: no model loaded, model transform not restored", context);
        }
    }
}

/// Read the current viewpoint. `None` when there is no active camera.
pub fn capture(viewer: &impl Viewer) -> Option<ViewpointSnapshot> {
    let camera = viewer.camera()?;
    let planes = viewer.section_planes();

    let sections = SectionAxis::ALL.map(|axis| match planes.get(axis) {
        Some(plane) => SectionState {
            enabled: true,
            distance: plane.axis_distance(axis).unwrap_or(-plane.constant),
        },
        None => SectionState::default(),
    });

    Some(ViewpointSnapshot {
        lens: Lens::of(&camera),
        camera_position: camera.position,
        pivot: camera.pivot,
        view_shift: camera.view_shift,
        model: viewer.model_transform().as_ref().map(ModelTransform::from),
        sections,
    })
}

fn finite_vec3(v: Vec3) -> Option<Vec3> {
    v.is_finite().then_some(v)
}

pub(crate) fn validated_fov(fov: f32) -> Option<f32> {
    (fov.is_finite() && fov > 0.0).then(|| fov.clamp(MIN_FOV, MAX_FOV))
}

pub(crate) fn validated_zoom(zoom: f32) -> Option<f32> {
    (zoom.is_finite() && zoom > 0.0).then(|| zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

/// Validated camera position and pivot; invalid fields fall back to `current`.
pub(crate) fn validated_pose(
    snapshot: &ViewpointSnapshot,
    current: &ViewerCamera,
    report: &mut RestoreReport,
) -> (Vec3, Vec3) {
    let pivot = finite_vec3(snapshot.pivot).unwrap_or_else(|| {
        report.rejected.push(SnapshotField::Pivot);
        current.pivot
    });
    let position = finite_vec3(snapshot.camera_position)
        .filter(|p| p.distance_squared(pivot) > 1e-12)
        .unwrap_or_else(|| {
            report.rejected.push(SnapshotField::CameraPosition);
            current.position
        });
    (position, pivot)
}

/// Validated lens value for the snapshot's projection, falling back to the
/// camera's current value for that projection.
pub(crate) fn validated_lens(
    snapshot: &ViewpointSnapshot,
    current: &ViewerCamera,
    report: &mut RestoreReport,
) -> f32 {
    match snapshot.lens {
        Lens::Perspective { fov } => validated_fov(fov).unwrap_or_else(|| {
            report.rejected.push(SnapshotField::Fov);
            current.fov
        }),
        Lens::Orthographic { zoom } => validated_zoom(zoom).unwrap_or_else(|| {
            report.rejected.push(SnapshotField::Zoom);
            current.zoom
        }),
    }
}

pub(crate) fn validated_view_shift(
    snapshot: &ViewpointSnapshot,
    current: &ViewerCamera,
    report: &mut RestoreReport,
) -> Vec2 {
    if snapshot.view_shift.is_finite() {
        snapshot.view_shift
    } else {
        report.rejected.push(SnapshotField::ViewShift);
        current.view_shift
    }
}

/// Apply the snapshot's model transform, field by field.
pub(crate) fn apply_model(
    snapshot: &ViewpointSnapshot,
    viewer: &mut impl Viewer,
    report: &mut RestoreReport,
) {
    let Some(target) = snapshot.model else {
        return;
    };
    let Some(mut transform) = viewer.model_transform() else {
        report.missing_model = true;
        return;
    };

    if target.translation.is_finite() {
        transform.translation = target.translation;
    } else {
        report.rejected.push(SnapshotField::ModelTranslation);
    }

    match target.rotation.is_finite().then(|| Vec4::from(target.rotation).try_normalize().map(Quat::from_vec4)).flatten() {
        Some(rotation) => transform.rotation = rotation,
        None => report.rejected.push(SnapshotField::ModelRotation),
    }

    let scale_ok = target.scale.is_finite() && target.scale.abs().min_element() > 1e-9;
    if scale_ok {
        transform.scale = target.scale;
    } else {
        report.rejected.push(SnapshotField::ModelScale);
    }

    viewer.set_model_transform(transform);
}

/// Apply per-axis section state. Plane orientation is derived from the
/// camera's current position, so this runs after the camera is final.
pub(crate) fn apply_sections(
    sections: &[SectionState; 3],
    viewer: &mut impl Viewer,
    report: &mut RestoreReport,
) {
    let Some(camera) = viewer.camera() else {
        report.missing_camera = true;
        return;
    };

    for axis in SectionAxis::ALL {
        let state = sections[axis.index()];
        if !state.enabled {
            viewer.set_section_plane(axis, None);
        } else if state.distance.is_finite() {
            let plane = SectionPlane::facing_away_from(axis, state.distance, camera.position);
            viewer.set_section_plane(axis, Some(plane));
        } else {
            report.rejected.push(SnapshotField::Section(axis));
        }
    }
}

/// Restore a snapshot immediately.
///
/// Order: projection, pivot and position, lens, model transform, view shift,
/// section planes. Each field is validated on its own; an invalid field keeps
/// its current value and is listed in the returned report.
pub fn restore(snapshot: &ViewpointSnapshot, viewer: &mut impl Viewer) -> RestoreReport {
    let mut report = RestoreReport::default();

    match viewer.camera_mut() {
        Some(camera) => {
            // Switching projection first; the lens written below belongs to it
            camera.projection = snapshot.projection();
            let current = *camera;
            let (position, pivot) = validated_pose(snapshot, &current, &mut report);
            camera.pivot = pivot;
            camera.position = position;
            let lens = validated_lens(snapshot, &current, &mut report);
            match camera.projection {
                ProjectionMode::Perspective => camera.fov = lens,
                ProjectionMode::Orthographic => camera.zoom = lens,
            }
        }
        None => report.missing_camera = true,
    }

    apply_model(snapshot, viewer, &mut report);

    if let Some(camera) = viewer.camera_mut() {
        let current = *camera;
        camera.view_shift = validated_view_shift(snapshot, &current, &mut report);
    }

    if !report.missing_camera {
        apply_sections(&snapshot.sections, viewer, &mut report);
    }

    report
}
