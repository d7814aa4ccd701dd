//! Click-to-place session.
//!
//! `Idle -> Placing -> Idle`. While placing, orbit navigation is suspended
//! and a ghost indicator follows the pointer. A primary press on the model
//! creates the marker; a press that misses keeps the session open.

use bevy::prelude::*;

use super::registry::{MarkerId, MarkerRegistry};
use crate::viewer::{NavigationLease, Viewer};

#[derive(Debug)]
pub struct PlacementSession {
    lease: NavigationLease,
    /// Ghost position in viewport pixels, tracks the pointer 1:1
    pub ghost: Option<Vec2>,
}

#[derive(Resource, Debug, Default)]
pub enum PlacementState {
    #[default]
    Idle,
    Placing(PlacementSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRejected {
    EditingDisabled,
    AlreadyPlacing,
    MarkersHidden,
    /// A marker drag owns the pointer
    DragInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementOutcome {
    NotPlacing,
    /// Nothing under the pointer; still placing
    NoHit,
    Placed(MarkerId),
}

impl PlacementState {
    pub fn is_placing(&self) -> bool {
        matches!(self, PlacementState::Placing(_))
    }

    pub fn ghost(&self) -> Option<Vec2> {
        match self {
            PlacementState::Placing(session) => session.ghost,
            PlacementState::Idle => None,
        }
    }

    pub fn check_start(&self, registry: &MarkerRegistry) -> Result<(), PlacementRejected> {
        if !registry.editing_enabled() {
            return Err(PlacementRejected::EditingDisabled);
        }
        if self.is_placing() {
            return Err(PlacementRejected::AlreadyPlacing);
        }
        if registry.markers_hidden() {
            return Err(PlacementRejected::MarkersHidden);
        }
        Ok(())
    }

    /// Enter placing mode. A second call while already placing is a no-op.
    pub fn start(
        &mut self,
        registry: &MarkerRegistry,
        viewer: &mut impl Viewer,
        pointer: Option<Vec2>,
    ) -> Result<(), PlacementRejected> {
        self.check_start(registry)?;

        let lease = NavigationLease::acquire(viewer);
        *self = PlacementState::Placing(PlacementSession {
            lease,
            ghost: pointer,
        });
        info!("Placement started (next id {})", registry.next_id());
        Ok(())
    }

    pub fn pointer_moved(&mut self, screen: Vec2) {
        if let PlacementState::Placing(session) = self {
            session.ghost = Some(screen);
        }
    }

    /// Primary press while placing: ray cast into the model and create a marker.
    pub fn pointer_down(
        &mut self,
        screen: Vec2,
        registry: &mut MarkerRegistry,
        viewer: &mut impl Viewer,
        clip_epsilon: f32,
    ) -> PlacementOutcome {
        let PlacementState::Placing(session) = self else {
            return PlacementOutcome::NotPlacing;
        };
        session.ghost = Some(screen);

        let Some(id) = registry.place_at_screen(screen, viewer, clip_epsilon) else {
            return PlacementOutcome::NoHit;
        };
        self.finish(viewer);
        PlacementOutcome::Placed(id)
    }

    /// Leave placing mode without creating a marker. Returns false if idle.
    pub fn cancel(&mut self, viewer: &mut impl Viewer) -> bool {
        if self.finish(viewer) {
            info!("Placement cancelled");
            true
        } else {
            false
        }
    }

    fn finish(&mut self, viewer: &mut impl Viewer) -> bool {
        match std::mem::take(self) {
            PlacementState::Placing(session) => {
                session.lease.release(viewer);
                true
            }
            PlacementState::Idle => false,
        }
    }
}
