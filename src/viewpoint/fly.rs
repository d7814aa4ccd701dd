//! Animated viewpoint restore ("fly").
//!
//! The animation is a resumable per-frame step: [`FlyAnimation::step`] advances
//! it by the frame delta and applies the eased camera pose. Projection and model
//! transform switch at the start, section planes only on the final frame.

use bevy::prelude::*;

use super::snapshot::{
    apply_model, apply_sections, restore, validated_lens, validated_pose, validated_view_shift,
    RestoreReport, SectionState, ViewpointSnapshot,
};
use crate::viewer::{NavigationLease, ProjectionMode, SceneViewer, Viewer, ViewerCamera};

/// Camera values that are interpolated during a flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub pivot: Vec3,
    /// Field of view or zoom, whichever the projection uses
    pub lens: f32,
    pub view_shift: Vec2,
}

impl CameraPose {
    pub fn of(camera: &ViewerCamera) -> Self {
        Self {
            position: camera.position,
            pivot: camera.pivot,
            lens: match camera.projection {
                ProjectionMode::Perspective => camera.fov,
                ProjectionMode::Orthographic => camera.zoom,
            },
            view_shift: camera.view_shift,
        }
    }

    pub fn lerp(&self, target: &CameraPose, t: f32) -> Self {
        Self {
            position: self.position.lerp(target.position, t),
            pivot: self.pivot.lerp(target.pivot, t),
            lens: self.lens + (target.lens - self.lens) * t,
            view_shift: self.view_shift.lerp(target.view_shift, t),
        }
    }

    pub fn apply_to(&self, camera: &mut ViewerCamera) {
        camera.position = self.position;
        camera.pivot = self.pivot;
        match camera.projection {
            ProjectionMode::Perspective => camera.fov = self.lens,
            ProjectionMode::Orthographic => camera.zoom = self.lens,
        }
        camera.view_shift = self.view_shift;
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyStatus {
    Idle,
    Running,
    Finished,
}

#[derive(Debug)]
struct Flight {
    from: CameraPose,
    to: CameraPose,
    sections: [SectionState; 3],
    elapsed: f32,
    duration: f32,
    lease: NavigationLease,
}

/// The single in-flight viewpoint animation, if any.
#[derive(Resource, Default, Debug)]
pub struct FlyAnimation {
    flight: Option<Flight>,
}

impl FlyAnimation {
    pub fn is_active(&self) -> bool {
        self.flight.is_some()
    }

    /// Normalized progress of the current flight, if one is running.
    pub fn progress(&self) -> Option<f32> {
        self.flight
            .as_ref()
            .map(|f| (f.elapsed / f.duration).clamp(0.0, 1.0))
    }

    /// Begin flying to `snapshot`, cancelling any flight in progress.
    pub fn start(
        &mut self,
        snapshot: &ViewpointSnapshot,
        viewer: &mut impl Viewer,
        duration: f32,
    ) -> RestoreReport {
        self.cancel(viewer);

        if !(duration.is_finite() && duration > 0.0) {
            return restore(snapshot, viewer);
        }

        let mut report = RestoreReport::default();
        let Some(camera) = viewer.camera_mut() else {
            report.missing_camera = true;
            apply_model(snapshot, viewer, &mut report);
            return report;
        };

        // Destination scene is correct from the first frame; only the camera travels
        camera.projection = snapshot.projection();
        let current = *camera;
        apply_model(snapshot, viewer, &mut report);

        let (position, pivot) = validated_pose(snapshot, &current, &mut report);
        let to = CameraPose {
            position,
            pivot,
            lens: validated_lens(snapshot, &current, &mut report),
            view_shift: validated_view_shift(snapshot, &current, &mut report),
        };

        let lease = NavigationLease::acquire(viewer);
        debug!("Fly started ({:.2}s)", duration);
        self.flight = Some(Flight {
            from: CameraPose::of(&current),
            to,
            sections: snapshot.sections,
            elapsed: 0.0,
            duration,
            lease,
        });
        report
    }

    /// Advance by `delta` seconds.
    pub fn step(&mut self, delta: f32, viewer: &mut impl Viewer) -> FlyStatus {
        let Some(flight) = self.flight.as_mut() else {
            return FlyStatus::Idle;
        };

        flight.elapsed += delta.max(0.0);
        let t = (flight.elapsed / flight.duration).min(1.0);

        if t < 1.0 {
            let pose = flight.from.lerp(&flight.to, ease_out_cubic(t));
            if let Some(camera) = viewer.camera_mut() {
                pose.apply_to(camera);
            }
            return FlyStatus::Running;
        }

        let Some(flight) = self.flight.take() else {
            return FlyStatus::Idle;
        };
        // Exact target values, no residual interpolation error
        if let Some(camera) = viewer.camera_mut() {
            flight.to.apply_to(camera);
        }
        let mut report = RestoreReport::default();
        apply_sections(&flight.sections, viewer, &mut report);
        report.log("Fly");
        flight.lease.release(viewer);
        debug!("Fly finished");
        FlyStatus::Finished
    }

    /// Stop where the camera currently is and give navigation back.
    pub fn cancel(&mut self, viewer: &mut impl Viewer) {
        if let Some(flight) = self.flight.take() {
            flight.lease.release(viewer);
            debug!("Fly cancelled");
        }
    }
}

pub fn step_fly_animation(
    time: Res<Time>,
    mut fly: ResMut<FlyAnimation>,
    mut viewer: SceneViewer,
) {
    if !fly.is_active() {
        return;
    }
    fly.step(time.delta_secs(), &mut viewer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::test_support::MockViewer;
    use crate::viewer::SectionAxis;
    use crate::viewpoint::snapshot::{capture, Lens, ModelTransform};

    fn target_snapshot(viewer: &MockViewer) -> ViewpointSnapshot {
        let mut snapshot = capture(viewer).unwrap();
        snapshot.camera_position = Vec3::new(6.0, 2.0, 0.0);
        snapshot.pivot = Vec3::new(1.0, 0.0, 0.0);
        snapshot.lens = Lens::Perspective { fov: 1.0 };
        snapshot.view_shift = Vec2::new(20.0, 10.0);
        snapshot.model = Some(ModelTransform {
            translation: Vec3::new(0.0, 1.0, 0.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        });
        snapshot.sections[0] = SectionState { enabled: true, distance: 0.5 };
        snapshot
    }

    #[test]
    fn test_ease_out_cubic() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_fly_reaches_exact_target() {
        let mut viewer = MockViewer::default();
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();

        let report = fly.start(&snapshot, &mut viewer, 0.55);
        assert!(report.is_clean());
        assert!(fly.is_active());
        // Model switches immediately
        assert_eq!(viewer.model.unwrap().translation, Vec3::new(0.0, 1.0, 0.0));

        let mut status = FlyStatus::Running;
        let mut frames = 0;
        while status == FlyStatus::Running {
            status = fly.step(1.0 / 60.0, &mut viewer);
            frames += 1;
            assert!(frames < 100);
        }
        assert_eq!(status, FlyStatus::Finished);

        let camera = viewer.camera.unwrap();
        assert_eq!(camera.position, Vec3::new(6.0, 2.0, 0.0));
        assert_eq!(camera.pivot, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(camera.fov, 1.0);
        assert_eq!(camera.view_shift, Vec2::new(20.0, 10.0));
        assert_eq!(fly.step(0.1, &mut viewer), FlyStatus::Idle);
    }

    #[test]
    fn test_fly_is_eased() {
        let mut viewer = MockViewer::default();
        let start = viewer.camera.unwrap().position;
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();
        fly.start(&snapshot, &mut viewer, 1.0);

        fly.step(0.5, &mut viewer);
        let expected = start.lerp(snapshot.camera_position, 0.875);
        assert!((viewer.camera.unwrap().position - expected).length() < 1e-5);
    }

    #[test]
    fn test_sections_apply_only_on_final_frame() {
        let mut viewer = MockViewer::default();
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();
        fly.start(&snapshot, &mut viewer, 0.5);

        fly.step(0.25, &mut viewer);
        assert!(viewer.sections.get(SectionAxis::X).is_none());

        assert_eq!(fly.step(0.3, &mut viewer), FlyStatus::Finished);
        let plane = viewer.sections.get(SectionAxis::X).unwrap();
        assert_eq!(plane.axis_distance(SectionAxis::X), Some(0.5));
    }

    #[test]
    fn test_navigation_disabled_during_flight_and_restored() {
        let mut viewer = MockViewer::default();
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();

        fly.start(&snapshot, &mut viewer, 0.5);
        assert!(!viewer.navigation_enabled);
        fly.step(1.0, &mut viewer);
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_restart_cancels_previous_flight() {
        let mut viewer = MockViewer::default();
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();

        fly.start(&snapshot, &mut viewer, 0.5);
        fly.step(0.1, &mut viewer);
        // A second start must not capture "disabled" as the prior value
        fly.start(&snapshot, &mut viewer, 0.5);
        fly.step(1.0, &mut viewer);
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_cancel_restores_navigation() {
        let mut viewer = MockViewer::default();
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();
        fly.start(&snapshot, &mut viewer, 0.5);
        fly.cancel(&mut viewer);
        assert!(viewer.navigation_enabled);
        assert!(!fly.is_active());
        // Second cancel is a no-op
        fly.cancel(&mut viewer);
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_zero_duration_restores_instantly() {
        let mut viewer = MockViewer::default();
        let snapshot = target_snapshot(&viewer);
        let mut fly = FlyAnimation::default();
        fly.start(&snapshot, &mut viewer, 0.0);
        assert!(!fly.is_active());
        assert_eq!(viewer.camera.unwrap().position, Vec3::new(6.0, 2.0, 0.0));
        assert!(viewer.navigation_enabled);
    }
}
