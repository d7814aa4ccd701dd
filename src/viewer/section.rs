//! Axis-aligned section (clipping) planes.
//!
//! A plane keeps the half-space where `normal · p + constant >= 0`. Each of the
//! three world axes owns one slot; an empty slot is a disabled plane.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionAxis {
    X,
    Y,
    Z,
}

impl SectionAxis {
    pub const ALL: [SectionAxis; 3] = [SectionAxis::X, SectionAxis::Y, SectionAxis::Z];

    pub fn index(self) -> usize {
        match self {
            SectionAxis::X => 0,
            SectionAxis::Y => 1,
            SectionAxis::Z => 2,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            SectionAxis::X => Vec3::X,
            SectionAxis::Y => Vec3::Y,
            SectionAxis::Z => Vec3::Z,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SectionAxis::X => "X",
            SectionAxis::Y => "Y",
            SectionAxis::Z => "Z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPlane {
    pub normal: Vec3,
    pub constant: f32,
}

impl SectionPlane {
    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    /// Plane across `axis` at coordinate `distance`, oriented so that the side
    /// containing `camera_position` is the one cut away.
    pub fn facing_away_from(axis: SectionAxis, distance: f32, camera_position: Vec3) -> Self {
        let side = camera_position[axis.index()] - distance;
        let sign = if side > 0.0 { -1.0 } else { 1.0 };
        Self {
            normal: axis.unit() * sign,
            constant: -sign * distance,
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// True when `point` lies in the removed half-space by more than `epsilon`.
    pub fn clips(&self, point: Vec3, epsilon: f32) -> bool {
        self.signed_distance(point) < -epsilon
    }

    /// Coordinate along `axis` where the plane crosses it. Independent of which
    /// way the normal points. `None` if the plane is parallel to the axis.
    pub fn axis_distance(&self, axis: SectionAxis) -> Option<f32> {
        let component = self.normal[axis.index()];
        if component.abs() < 1e-6 {
            return None;
        }
        Some(-self.constant / component)
    }
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionPlanes {
    pub planes: [Option<SectionPlane>; 3],
}

impl SectionPlanes {
    pub fn get(&self, axis: SectionAxis) -> Option<SectionPlane> {
        self.planes[axis.index()]
    }

    pub fn set(&mut self, axis: SectionAxis, plane: Option<SectionPlane>) {
        self.planes[axis.index()] = plane;
    }

    /// First enabled plane that removes `point`, if any.
    pub fn clipping_axis(&self, point: Vec3, epsilon: f32) -> Option<SectionAxis> {
        SectionAxis::ALL
            .into_iter()
            .find(|axis| self.get(*axis).is_some_and(|plane| plane.clips(point, epsilon)))
    }

    pub fn any_enabled(&self) -> bool {
        self.planes.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_distance_ignores_orientation() {
        let forward = SectionPlane::new(Vec3::X, -2.0);
        let backward = SectionPlane::new(Vec3::NEG_X, 2.0);
        assert_eq!(forward.axis_distance(SectionAxis::X), Some(2.0));
        assert_eq!(backward.axis_distance(SectionAxis::X), Some(2.0));
        assert_eq!(forward.axis_distance(SectionAxis::Y), None);
    }

    #[test]
    fn test_facing_away_from_cuts_camera_side() {
        let camera = Vec3::new(0.0, 0.0, 5.0);
        let plane = SectionPlane::facing_away_from(SectionAxis::Z, 1.0, camera);
        assert!(plane.clips(camera, 0.0));
        assert!(plane.clips(Vec3::new(0.0, 0.0, 1.5), 0.0));
        assert!(!plane.clips(Vec3::ZERO, 0.0));
        assert_eq!(plane.axis_distance(SectionAxis::Z), Some(1.0));
    }

    #[test]
    fn test_clipping_axis() {
        let mut planes = SectionPlanes::default();
        assert!(!planes.any_enabled());
        planes.set(SectionAxis::Y, Some(SectionPlane::new(Vec3::NEG_Y, 0.5)));
        assert_eq!(planes.clipping_axis(Vec3::new(0.0, 1.0, 0.0), 1e-4), Some(SectionAxis::Y));
        assert_eq!(planes.clipping_axis(Vec3::ZERO, 1e-4), None);
    }
}
