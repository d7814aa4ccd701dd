//! Click-versus-drag disambiguation for marker handles.

use bevy::prelude::*;

use super::events::DropTarget;
use super::registry::{MarkerId, MarkerRegistry};
use crate::common::PointerId;
use crate::viewer::{NavigationLease, Viewer};

/// How a press on a marker handle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Click(MarkerId),
    Drop {
        id: MarkerId,
        target: Option<DropTarget>,
        pointer: Vec2,
    },
}

/// Resolves what lies under a drop position.
pub trait DropTargetResolver {
    fn resolve(
        &self,
        screen: Vec2,
        dragged: &MarkerId,
        registry: &MarkerRegistry,
    ) -> Option<DropTarget>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropZone {
    pub name: String,
    pub rect: Rect,
}

/// Named screen rectangles registered by the host UI. Later zones are on top.
#[derive(Resource, Debug, Default)]
pub struct DropZones {
    zones: Vec<DropZone>,
}

impl DropZones {
    /// Add a zone, or move an existing one with the same name.
    pub fn register(&mut self, name: impl Into<String>, rect: Rect) {
        let name = name.into();
        self.zones.retain(|zone| zone.name != name);
        self.zones.push(DropZone { name, rect });
    }

    pub fn unregister(&mut self, name: &str) {
        self.zones.retain(|zone| zone.name != name);
    }

}

impl DropTargetResolver for DropZones {
    /// Topmost zone first, then another marker's handle.
    fn resolve(
        &self,
        screen: Vec2,
        dragged: &MarkerId,
        registry: &MarkerRegistry,
    ) -> Option<DropTarget> {
        self.zones
            .iter()
            .rev()
            .find(|zone| zone.rect.contains(screen))
            .map(|zone| DropTarget::Zone(zone.name.clone()))
            .or_else(|| {
                registry
                    .handle_at(screen, Some(dragged))
                    .cloned()
                    .map(DropTarget::Marker)
            })
    }
}

#[derive(Debug)]
pub struct DragSession {
    pub marker: MarkerId,
    pub pointer: PointerId,
    pub start: Vec2,
    pub current: Vec2,
    pub moved: bool,
    pub ghost_visible: bool,
    /// False when editing is off: the press can only end as a click
    draggable: bool,
    lease: NavigationLease,
}

#[derive(Resource, Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    Pressed(DragSession),
}

impl DragState {
    pub fn is_active(&self) -> bool {
        matches!(self, DragState::Pressed(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Pressed(session) => Some(session),
            DragState::Idle => None,
        }
    }

    /// Drag ghost position, once the pointer has moved past the threshold.
    pub fn ghost(&self) -> Option<(&MarkerId, Vec2)> {
        self.session()
            .filter(|session| session.ghost_visible)
            .map(|session| (&session.marker, session.current))
    }

    /// Primary press on a marker handle. Any previous session is ended first.
    pub fn begin(
        &mut self,
        marker: MarkerId,
        pointer: PointerId,
        screen: Vec2,
        draggable: bool,
        viewer: &mut impl Viewer,
    ) {
        self.abort(viewer);
        let lease = NavigationLease::acquire(viewer);
        debug!("Press on marker {}", marker);
        *self = DragState::Pressed(DragSession {
            marker,
            pointer,
            start: screen,
            current: screen,
            moved: false,
            ghost_visible: false,
            draggable,
            lease,
        });
    }

    /// Pointer motion. Returns the marker id the first time the drag threshold
    /// is exceeded.
    pub fn pointer_moved(
        &mut self,
        pointer: PointerId,
        screen: Vec2,
        threshold: f32,
    ) -> Option<MarkerId> {
        let DragState::Pressed(session) = self else {
            return None;
        };
        if session.pointer != pointer {
            return None;
        }
        session.current = screen;
        if session.moved || !session.draggable {
            return None;
        }
        if session.start.distance(screen) > threshold {
            session.moved = true;
            session.ghost_visible = true;
            info!("Drag started on marker {}", session.marker);
            return Some(session.marker.clone());
        }
        None
    }

    /// Pointer release or cancel. Navigation is restored on every path.
    pub fn finish(
        &mut self,
        pointer: PointerId,
        screen: Vec2,
        viewer: &mut impl Viewer,
        resolver: &dyn DropTargetResolver,
        registry: &MarkerRegistry,
    ) -> Option<DragOutcome> {
        match self {
            DragState::Pressed(session) if session.pointer == pointer => {}
            _ => return None,
        }
        let DragState::Pressed(session) = std::mem::take(self) else {
            return None;
        };
        session.lease.release(viewer);

        if !session.moved {
            return Some(DragOutcome::Click(session.marker));
        }
        let target = resolver.resolve(screen, &session.marker, registry);
        info!("Marker {} dropped on {:?}", session.marker, target);
        Some(DragOutcome::Drop {
            id: session.marker,
            target,
            pointer: screen,
        })
    }

    /// Editing was turned off mid-press. A press that has not moved can still
    /// end as a click; a drag already under way is aborted with no drop.
    pub fn restrict_to_click(&mut self, viewer: &mut impl Viewer) {
        let dragging = match self {
            DragState::Pressed(session) => {
                session.draggable = false;
                session.moved
            }
            DragState::Idle => return,
        };
        if dragging {
            self.abort(viewer);
        }
    }

    /// End the session with no outcome.
    pub fn abort(&mut self, viewer: &mut impl Viewer) {
        if let DragState::Pressed(session) = std::mem::take(self) {
            session.lease.release(viewer);
            debug!("Press on marker {} aborted", session.marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::test_support::MockViewer;

    const THRESHOLD: f32 = 4.0;

    fn press_move_release(offset: f32) -> (Option<DragOutcome>, Option<MarkerId>, MockViewer) {
        let mut viewer = MockViewer::default();
        let registry = MarkerRegistry::default();
        let zones = DropZones::default();
        let mut state = DragState::default();
        let start = Vec2::new(100.0, 100.0);
        let end = start + Vec2::new(offset, 0.0);

        state.begin(MarkerId::Numeric(1), PointerId::MOUSE, start, true, &mut viewer);
        assert!(!viewer.navigation_enabled);
        let started = state.pointer_moved(PointerId::MOUSE, end, THRESHOLD);
        let outcome = state.finish(PointerId::MOUSE, end, &mut viewer, &zones, &registry);
        (outcome, started, viewer)
    }

    #[test]
    fn test_below_threshold_is_click() {
        let (outcome, started, viewer) = press_move_release(THRESHOLD - 1.0);
        assert_eq!(outcome, Some(DragOutcome::Click(MarkerId::Numeric(1))));
        assert_eq!(started, None);
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_exact_threshold_is_click() {
        let (outcome, _, _) = press_move_release(THRESHOLD);
        assert_eq!(outcome, Some(DragOutcome::Click(MarkerId::Numeric(1))));
    }

    #[test]
    fn test_above_threshold_is_drop() {
        let (outcome, started, viewer) = press_move_release(THRESHOLD + 1.0);
        assert_eq!(started, Some(MarkerId::Numeric(1)));
        assert_eq!(
            outcome,
            Some(DragOutcome::Drop {
                id: MarkerId::Numeric(1),
                target: None,
                pointer: Vec2::new(105.0, 100.0),
            })
        );
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_returning_to_start_stays_a_drag() {
        let mut viewer = MockViewer::default();
        let registry = MarkerRegistry::default();
        let mut state = DragState::default();
        let start = Vec2::new(50.0, 50.0);

        state.begin(MarkerId::Numeric(2), PointerId::MOUSE, start, true, &mut viewer);
        state.pointer_moved(PointerId::MOUSE, start + Vec2::new(0.0, 20.0), THRESHOLD);
        assert!(state.ghost().is_some());
        assert_eq!(state.pointer_moved(PointerId::MOUSE, start, THRESHOLD), None);
        let outcome = state.finish(PointerId::MOUSE, start, &mut viewer, &DropZones::default(), &registry);
        assert!(matches!(outcome, Some(DragOutcome::Drop { .. })));
    }

    #[test]
    fn test_restrict_to_click_keeps_unmoved_press_as_click() {
        let mut viewer = MockViewer::default();
        let registry = MarkerRegistry::default();
        let mut state = DragState::default();

        state.begin(MarkerId::Numeric(4), PointerId::MOUSE, Vec2::ZERO, true, &mut viewer);
        state.restrict_to_click(&mut viewer);
        assert!(state.is_active());
        assert_eq!(state.pointer_moved(PointerId::MOUSE, Vec2::splat(50.0), THRESHOLD), None);
        let outcome = state.finish(PointerId::MOUSE, Vec2::splat(50.0), &mut viewer, &DropZones::default(), &registry);
        assert_eq!(outcome, Some(DragOutcome::Click(MarkerId::Numeric(4))));
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_restrict_to_click_aborts_running_drag() {
        let mut viewer = MockViewer::default();
        let mut state = DragState::default();

        state.begin(MarkerId::Numeric(5), PointerId::MOUSE, Vec2::ZERO, true, &mut viewer);
        state.pointer_moved(PointerId::MOUSE, Vec2::splat(50.0), THRESHOLD);
        state.restrict_to_click(&mut viewer);
        assert!(!state.is_active());
        assert!(viewer.navigation_enabled);
    }

    #[test]
    fn test_not_draggable_always_clicks() {
        let mut viewer = MockViewer::default();
        let registry = MarkerRegistry::default();
        let mut state = DragState::default();

        state.begin(MarkerId::Numeric(3), PointerId::MOUSE, Vec2::ZERO, false, &mut viewer);
        assert_eq!(state.pointer_moved(PointerId::MOUSE, Vec2::splat(50.0), THRESHOLD), None);
        let outcome = state.finish(PointerId::MOUSE, Vec2::splat(50.0), &mut viewer, &DropZones::default(), &registry);
        assert_eq!(outcome, Some(DragOutcome::Click(MarkerId::Numeric(3))));
    }

    #[test]
    fn test_other_pointer_is_ignored() {
        let mut viewer = MockViewer::default();
        let registry = MarkerRegistry::default();
        let mut state = DragState::default();

        state.begin(MarkerId::Numeric(1), PointerId::MOUSE, Vec2::ZERO, true, &mut viewer);
        assert_eq!(state.pointer_moved(PointerId(7), Vec2::splat(50.0), THRESHOLD), None);
        assert_eq!(
            state.finish(PointerId(7), Vec2::ZERO, &mut viewer, &DropZones::default(), &registry),
            None
        );
        assert!(state.is_active());
        assert!(!viewer.navigation_enabled);
    }

    #[test]
    fn test_drop_resolves_zone_before_marker() {
        let mut zones = DropZones::default();
        zones.register("trash", Rect::new(0.0, 0.0, 50.0, 50.0));
        zones.register("panel", Rect::new(40.0, 40.0, 200.0, 200.0));
        let registry = MarkerRegistry::default();
        let dragged = MarkerId::Numeric(1);

        assert_eq!(
            zones.resolve(Vec2::new(45.0, 45.0), &dragged, &registry),
            Some(DropTarget::Zone("panel".to_string()))
        );
        assert_eq!(
            zones.resolve(Vec2::new(10.0, 10.0), &dragged, &registry),
            Some(DropTarget::Zone("trash".to_string()))
        );
        assert_eq!(zones.resolve(Vec2::new(500.0, 500.0), &dragged, &registry), None);

        zones.unregister("trash");
        assert_eq!(zones.resolve(Vec2::new(10.0, 10.0), &dragged, &registry), None);
    }

    #[test]
    fn test_drop_on_other_marker_ignores_self() {
        let mut viewer = MockViewer::with_model_face();
        let mut registry = MarkerRegistry::default();
        registry.set_markers([
            crate::markers::MarkerData::new(Vec3::ZERO).with_id(1u64),
            crate::markers::MarkerData::new(Vec3::new(1.0, 0.0, 0.0)).with_id(2u64),
        ]);
        registry.refresh_visibility(&mut viewer, 1e-3);
        let zones = DropZones::default();

        let on_first = viewer.screen_of(Vec3::ZERO);
        assert_eq!(zones.resolve(on_first, &MarkerId::Numeric(1), &registry), None);
        let on_second = viewer.screen_of(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(
            zones.resolve(on_second, &MarkerId::Numeric(1), &registry),
            Some(DropTarget::Marker(MarkerId::Numeric(2)))
        );
    }

    #[test]
    fn test_begin_replaces_previous_session() {
        let mut viewer = MockViewer::default();
        let mut state = DragState::default();
        state.begin(MarkerId::Numeric(1), PointerId::MOUSE, Vec2::ZERO, true, &mut viewer);
        state.begin(MarkerId::Numeric(2), PointerId::MOUSE, Vec2::ZERO, true, &mut viewer);
        state.abort(&mut viewer);
        assert!(viewer.navigation_enabled);
        assert!(!state.is_active());
    }
}
