use super::*;
use crate::markers::drag::DropZones;
use crate::markers::events::DropTarget;
use crate::viewer::test_support::MockViewer;
use crate::viewpoint::capture;
use crate::viewpoint::fly::FlyStatus;

const MARKER_ANCHOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const EPS: f32 = 1e-3;

struct Harness {
    registry: MarkerRegistry,
    placement: PlacementState,
    drag: DragState,
    menu: ContextMenuState,
    fly: FlyAnimation,
    auto_hide: AutoHide,
    settings: MarkerSettings,
    zones: DropZones,
    viewer: MockViewer,
}

impl Harness {
    fn new() -> Self {
        Self {
            registry: MarkerRegistry::default(),
            placement: PlacementState::default(),
            drag: DragState::default(),
            menu: ContextMenuState::default(),
            fly: FlyAnimation::default(),
            auto_hide: AutoHide::default(),
            settings: MarkerSettings::default(),
            zones: DropZones::default(),
            viewer: MockViewer::with_model_face(),
        }
    }

    /// One marker (id 1) on the model face whose viewpoint looks from further back.
    fn with_marker() -> Self {
        let mut harness = Self::new();
        let mut snapshot = capture(&harness.viewer).unwrap();
        snapshot.camera_position = Vec3::new(0.0, 0.0, 8.0);
        harness
            .registry
            .set_markers([MarkerData::new(MARKER_ANCHOR).with_id(1u64).with_snapshot(snapshot)]);
        harness.refresh();
        harness
    }

    fn refresh(&mut self) {
        self.registry.refresh_visibility(&mut self.viewer, EPS);
    }

    fn parts(&mut self) -> (MarkerController<'_>, &mut MockViewer, &DropZones) {
        (
            MarkerController {
                registry: &mut self.registry,
                placement: &mut self.placement,
                drag: &mut self.drag,
                menu: &mut self.menu,
                fly: &mut self.fly,
                auto_hide: &mut self.auto_hide,
                settings: &self.settings,
            },
            &mut self.viewer,
            &self.zones,
        )
    }

    fn marker_screen(&self) -> Vec2 {
        self.viewer.screen_of(MARKER_ANCHOR)
    }

    fn down(&mut self, button: PointerButton, screen: Vec2) -> bool {
        let (mut controller, viewer, _) = self.parts();
        controller.pointer_down(button, PointerId::MOUSE, screen, viewer)
    }

    fn moved(&mut self, screen: Vec2) {
        let (mut controller, _, _) = self.parts();
        controller.pointer_moved(PointerId::MOUSE, screen);
    }

    fn up(&mut self, screen: Vec2) {
        let (mut controller, viewer, zones) = self.parts();
        controller.pointer_up(PointerId::MOUSE, screen, viewer, zones);
    }

    fn event_names(&mut self) -> Vec<&'static str> {
        self.registry.drain_events().iter().map(MarkerEvent::name).collect()
    }

    fn finish_fly(&mut self) {
        let mut frames = 0;
        while self.fly.step(1.0 / 60.0, &mut self.viewer) == FlyStatus::Running {
            frames += 1;
            assert!(frames < 200);
        }
    }
}

#[test]
fn test_click_selects_and_flies() {
    let mut h = Harness::with_marker();
    let start = h.marker_screen();

    assert!(h.down(PointerButton::Primary, start));
    assert!(!h.viewer.navigation_enabled);
    h.moved(start + Vec2::new(3.0, 0.0));
    h.up(start + Vec2::new(3.0, 0.0));

    assert_eq!(h.event_names(), vec!["label-click"]);
    assert_eq!(h.registry.selected(), Some(&MarkerId::Numeric(1)));
    assert!(h.fly.is_active());
    assert!(!h.viewer.navigation_enabled);

    h.finish_fly();
    assert_eq!(h.viewer.camera.unwrap().position, Vec3::new(0.0, 0.0, 8.0));
    assert!(h.viewer.navigation_enabled);
}

#[test]
fn test_drag_emits_drop_and_no_click() {
    let mut h = Harness::with_marker();
    let start = h.marker_screen();
    let end = start + Vec2::new(5.0, 0.0);

    h.down(PointerButton::Primary, start);
    h.moved(end);
    assert!(h.drag.ghost().is_some());
    h.up(end);

    assert_eq!(h.event_names(), vec!["label-drag-start", "label-drop"]);
    assert_eq!(h.registry.selected(), None);
    assert!(!h.fly.is_active());
    assert!(h.viewer.navigation_enabled);
    // The registry never moves the marker itself
    assert_eq!(h.registry.get_markers()[0].local_anchor, MARKER_ANCHOR);
}

#[test]
fn test_drop_on_zone_reports_target() {
    let mut h = Harness::with_marker();
    h.zones.register("bin", Rect::new(0.0, 0.0, 50.0, 50.0));
    let start = h.marker_screen();

    h.down(PointerButton::Primary, start);
    h.moved(Vec2::new(20.0, 20.0));
    h.up(Vec2::new(20.0, 20.0));

    let events = h.registry.drain_events();
    assert_eq!(
        events.last(),
        Some(&MarkerEvent::Dropped {
            id: MarkerId::Numeric(1),
            target: Some(DropTarget::Zone("bin".to_string())),
            pointer: Vec2::new(20.0, 20.0),
        })
    );
}

#[test]
fn test_pointer_cancel_resolves_like_release() {
    let mut h = Harness::with_marker();
    let start = h.marker_screen();
    h.down(PointerButton::Primary, start);
    h.moved(start + Vec2::new(10.0, 0.0));

    let (mut controller, viewer, zones) = h.parts();
    controller.pointer_cancel(PointerId::MOUSE, viewer, zones);

    assert_eq!(h.event_names(), vec!["label-drag-start", "label-drop"]);
    assert!(h.viewer.navigation_enabled);
    assert!(!h.drag.is_active());
}

#[test]
fn test_editing_disabled_allows_click_only() {
    let mut h = Harness::with_marker();
    h.registry.set_editing_enabled(false);
    let start = h.marker_screen();

    h.down(PointerButton::Primary, start);
    h.moved(start + Vec2::new(20.0, 0.0));
    h.up(start + Vec2::new(20.0, 0.0));
    assert_eq!(h.event_names(), vec!["label-click"]);

    h.finish_fly();
    h.refresh();
    let start = h.marker_screen();
    assert!(!h.down(PointerButton::Secondary, start));
    assert!(!h.menu.is_open());

    let (mut controller, viewer, _) = h.parts();
    assert_eq!(
        controller.start_placement(viewer, None),
        Err(PlacementRejected::EditingDisabled)
    );
}

#[test]
fn test_disabling_editing_mid_press_keeps_click_only() {
    let mut h = Harness::with_marker();
    let start = h.marker_screen();
    assert!(h.down(PointerButton::Primary, start));

    let (mut controller, viewer, _) = h.parts();
    controller.set_editing_enabled(false, viewer);
    h.moved(start + Vec2::new(20.0, 0.0));
    assert!(h.drag.ghost().is_none());
    h.up(start + Vec2::new(20.0, 0.0));

    assert_eq!(h.event_names(), vec!["label-click"]);
    h.finish_fly();
    assert!(h.viewer.navigation_enabled);
    assert!(!h.drag.is_active());
}

#[test]
fn test_select_and_fly_during_press_ends_the_press() {
    let mut h = Harness::with_marker();
    let start = h.marker_screen();
    assert!(h.down(PointerButton::Primary, start));

    let (mut controller, viewer, _) = h.parts();
    controller.apply(MarkerCommand::SelectAndFly(MarkerId::Numeric(1)), viewer);
    assert!(!h.drag.is_active());
    assert!(h.fly.is_active());

    // Releasing the old press must not hand navigation back mid-flight
    h.up(start);
    assert!(!h.viewer.navigation_enabled);
    assert_eq!(h.event_names(), vec!["label-click"]);

    h.finish_fly();
    assert!(h.viewer.navigation_enabled);
}

#[test]
fn test_disabling_editing_cancels_placement_and_menus() {
    let mut h = Harness::with_marker();
    let (mut controller, viewer, _) = h.parts();
    controller.start_placement(viewer, None).unwrap();
    assert!(!viewer.navigation_enabled);

    controller.set_editing_enabled(false, viewer);
    assert!(!h.placement.is_placing());
    assert!(h.viewer.navigation_enabled);
    assert!(!h.registry.editing_enabled());

    let (mut controller, viewer, _) = h.parts();
    controller.set_editing_enabled(true, viewer);
    let centre = Vec2::new(400.0, 300.0);
    assert!(h.down(PointerButton::Secondary, centre));
    assert!(h.menu.is_open());

    let (mut controller, viewer, _) = h.parts();
    controller.set_editing_enabled(false, viewer);
    assert!(!h.menu.is_open());
}

#[test]
fn test_primary_outside_menu_closes_it() {
    let mut h = Harness::with_marker();
    let centre = Vec2::new(400.0, 300.0);
    assert!(h.down(PointerButton::Secondary, centre));
    assert!(matches!(h.menu.menu(), ContextMenu::Surface { .. }));

    // Consumed: closes the menu and does nothing else
    assert!(h.down(PointerButton::Primary, Vec2::new(10.0, 10.0)));
    assert!(!h.menu.is_open());
    assert!(h.viewer.navigation_enabled);

    // Next press falls through to navigation
    assert!(!h.down(PointerButton::Primary, Vec2::new(10.0, 10.0)));
}

#[test]
fn test_surface_menu_adds_marker() {
    let mut h = Harness::with_marker();
    let target = h.viewer.screen_of(Vec3::new(-1.0, -1.0, 0.0));
    assert!(h.down(PointerButton::Secondary, target));

    let (mut controller, viewer, _) = h.parts();
    let id = controller.add_marker_from_menu(&*viewer).unwrap();
    assert_eq!(id, MarkerId::Numeric(2));
    assert!(!h.menu.is_open());

    let anchor = h.registry.get(&id).unwrap().local_anchor();
    assert!((anchor - Vec3::new(-1.0, -1.0, 0.0)).length() < 1e-3);
    assert_eq!(h.event_names(), vec!["label-placed"]);
}

#[test]
fn test_surface_menu_places_at_opened_point_after_camera_moves() {
    let mut h = Harness::with_marker();
    let target = h.viewer.screen_of(Vec3::new(-1.0, -1.0, 0.0));
    assert!(h.down(PointerButton::Secondary, target));

    // The view changes while the menu is open
    h.viewer.camera.as_mut().unwrap().position = Vec3::new(2.0, 1.0, 6.0);
    let (mut controller, viewer, _) = h.parts();
    let id = controller.add_marker_from_menu(&*viewer).unwrap();

    let marker = h.registry.get(&id).unwrap();
    assert!((marker.local_anchor() - Vec3::new(-1.0, -1.0, 0.0)).length() < 1e-3);
    // The saved view is the one current when the marker was added
    assert_eq!(
        marker.snapshot().unwrap().camera_position,
        Vec3::new(2.0, 1.0, 6.0)
    );
}

#[test]
fn test_marker_menu_delete() {
    let mut h = Harness::with_marker();
    let screen = h.marker_screen();
    assert!(h.down(PointerButton::Secondary, screen));
    assert!(matches!(h.menu.menu(), ContextMenu::Marker { .. }));

    let (mut controller, _, _) = h.parts();
    assert!(controller.run_menu_action(MarkerAction::Delete));
    assert!(h.registry.is_empty());
    assert!(!h.menu.is_open());
    assert_eq!(h.event_names(), vec!["label-delete"]);
}

#[test]
fn test_secondary_on_empty_space_opens_nothing() {
    let mut h = Harness::new();
    h.viewer = MockViewer::with_small_face();
    assert!(!h.down(PointerButton::Secondary, Vec2::new(5.0, 5.0)));
    assert!(!h.menu.is_open());
}

#[test]
fn test_placement_rejected_while_pressing_marker() {
    let mut h = Harness::with_marker();
    let start = h.marker_screen();
    h.down(PointerButton::Primary, start);

    let (mut controller, viewer, _) = h.parts();
    assert_eq!(
        controller.start_placement(viewer, None),
        Err(PlacementRejected::DragInProgress)
    );
}

#[test]
fn test_placement_click_places_and_restores_navigation() {
    let mut h = Harness::with_marker();
    let (mut controller, viewer, _) = h.parts();
    controller.start_placement(viewer, None).unwrap();

    let target = h.viewer.screen_of(Vec3::new(0.0, 1.0, 0.0));
    assert!(h.down(PointerButton::Primary, target));
    assert!(!h.placement.is_placing());
    assert!(h.viewer.navigation_enabled);
    assert_eq!(h.registry.len(), 2);
    assert_eq!(h.event_names(), vec!["label-placed"]);
}

#[test]
fn test_press_during_fly_cancels_it() {
    let mut h = Harness::with_marker();
    let (mut controller, viewer, _) = h.parts();
    assert!(controller.select_and_fly(&MarkerId::Numeric(1), viewer));
    assert!(h.fly.is_active());
    h.fly.step(0.05, &mut h.viewer);
    h.refresh();

    let start = h.marker_screen();
    assert!(h.down(PointerButton::Primary, start));
    assert!(!h.fly.is_active());
    h.moved(start + Vec2::new(30.0, 0.0));
    h.up(start + Vec2::new(30.0, 0.0));
    assert!(h.viewer.navigation_enabled);
}

#[test]
fn test_placement_start_cancels_fly() {
    let mut h = Harness::with_marker();
    let (mut controller, viewer, _) = h.parts();
    controller.select_and_fly(&MarkerId::Numeric(1), viewer);
    controller.start_placement(viewer, None).unwrap();
    assert!(!h.fly.is_active());

    let (mut controller, viewer, _) = h.parts();
    controller.escape(viewer);
    assert!(h.viewer.navigation_enabled);
}

#[test]
fn test_set_markers_command_closes_stale_menu() {
    let mut h = Harness::with_marker();
    let screen = h.marker_screen();
    h.down(PointerButton::Secondary, screen);

    let (mut controller, viewer, _) = h.parts();
    controller.apply(
        MarkerCommand::SetMarkers(vec![MarkerData::new(Vec3::ZERO).with_id("other")]),
        viewer,
    );
    assert!(!h.menu.is_open());
    assert_eq!(h.registry.next_id(), MarkerId::Numeric(1));
}

#[test]
fn test_hidden_command_while_auto_hidden() {
    let mut h = Harness::with_marker();
    h.auto_hide.navigation_started(&mut h.registry);
    let (mut controller, viewer, _) = h.parts();
    controller.apply(MarkerCommand::SetMarkersHidden(true), viewer);
    h.auto_hide.navigation_ended(None, 0.0, &mut h.registry);
    assert!(h.registry.markers_hidden());
}
