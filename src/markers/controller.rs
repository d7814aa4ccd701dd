//! Coordinates the marker sessions over one pointer stream.
//!
//! Placement, a marker press and a fly animation can each suspend navigation.
//! Only one of them holds the navigation lease at any time: starting one ends
//! the others first.

use bevy::prelude::*;

use super::auto_hide::AutoHide;
use super::context_menu::{ContextMenu, ContextMenuState, MarkerAction};
use super::drag::{DragOutcome, DragState, DropTargetResolver};
use super::events::MarkerEvent;
use super::placement::{PlacementOutcome, PlacementRejected, PlacementState};
use super::registry::{anchor_from_world, MarkerData, MarkerId, MarkerRegistry};
use crate::common::PointerId;
use crate::config::MarkerSettings;
use crate::viewer::Viewer;
use crate::viewpoint::FlyAnimation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Requests from the UI and the host, applied at the start of the next frame.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum MarkerCommand {
    StartPlacement,
    CancelPlacement,
    SetEditingEnabled(bool),
    SetMarkersHidden(bool),
    SelectAndFly(MarkerId),
    ClearSelection,
    RunMenuAction(MarkerAction),
    AddMarkerFromMenu,
    CloseMenu,
    SetMarkers(Vec<MarkerData>),
}

pub struct MarkerController<'a> {
    pub registry: &'a mut MarkerRegistry,
    pub placement: &'a mut PlacementState,
    pub drag: &'a mut DragState,
    pub menu: &'a mut ContextMenuState,
    pub fly: &'a mut FlyAnimation,
    pub auto_hide: &'a mut AutoHide,
    pub settings: &'a MarkerSettings,
}

impl MarkerController<'_> {
    fn clip_epsilon(&self) -> f32 {
        self.settings.occlusion_epsilon
    }

    pub fn start_placement(
        &mut self,
        viewer: &mut impl Viewer,
        pointer: Option<Vec2>,
    ) -> Result<(), PlacementRejected> {
        if self.drag.is_active() {
            return Err(PlacementRejected::DragInProgress);
        }
        self.placement.check_start(self.registry)?;
        self.menu.close();
        self.fly.cancel(viewer);
        self.placement.start(self.registry, viewer, pointer)
    }

    pub fn cancel_placement(&mut self, viewer: &mut impl Viewer) -> bool {
        self.placement.cancel(viewer)
    }

    /// Escape: leave placement and close any menu.
    pub fn escape(&mut self, viewer: &mut impl Viewer) {
        self.placement.cancel(viewer);
        self.menu.close();
    }

    /// Turning editing off cancels placement, closes menus and stops a held
    /// press from becoming a drag. Marker clicks (select and fly) keep working.
    pub fn set_editing_enabled(&mut self, enabled: bool, viewer: &mut impl Viewer) {
        if self.registry.editing_enabled() == enabled {
            return;
        }
        self.registry.set_editing_enabled(enabled);
        if !enabled {
            self.placement.cancel(viewer);
            self.drag.restrict_to_click(viewer);
            self.menu.close();
        }
        info!("Marker editing {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn set_markers_hidden(&mut self, hidden: bool) {
        self.auto_hide.set_user_hidden(hidden, self.registry);
    }

    /// Returns true when the press was claimed by a marker session and must
    /// not reach navigation.
    pub fn pointer_down(
        &mut self,
        button: PointerButton,
        pointer: PointerId,
        screen: Vec2,
        viewer: &mut impl Viewer,
    ) -> bool {
        match button {
            PointerButton::Primary => self.primary_down(pointer, screen, viewer),
            PointerButton::Secondary => self.secondary_down(screen, viewer),
        }
    }

    fn primary_down(&mut self, pointer: PointerId, screen: Vec2, viewer: &mut impl Viewer) -> bool {
        if self.menu.is_open() && !self.menu.contains(screen) {
            self.menu.close();
            return true;
        }

        if self.placement.is_placing() {
            let epsilon = self.clip_epsilon();
            if let PlacementOutcome::NoHit =
                self.placement.pointer_down(screen, self.registry, viewer, epsilon)
            {
                debug!("Placement click missed the model");
            }
            return true;
        }

        if let Some(id) = self.registry.handle_at(screen, None).cloned() {
            self.fly.cancel(viewer);
            let draggable = self.registry.editing_enabled();
            self.drag.begin(id, pointer, screen, draggable, viewer);
            return true;
        }
        false
    }

    fn secondary_down(&mut self, screen: Vec2, viewer: &mut impl Viewer) -> bool {
        if self.placement.is_placing() || self.drag.is_active() {
            return true;
        }
        if !self.registry.editing_enabled() {
            return false;
        }
        let Some(viewport) = viewer.viewport_size() else {
            return false;
        };

        if let Some(id) = self.registry.handle_at(screen, None).cloned() {
            self.menu.open_marker(id, screen, viewport);
            return true;
        }
        if let Some(world) = viewer.surface_point_at(screen, self.clip_epsilon())
            && let Some(model) = viewer.model_transform()
        {
            let local_anchor = anchor_from_world(&model, world);
            if local_anchor.is_finite() {
                self.menu.open_surface(screen, local_anchor, viewport);
                return true;
            }
        }
        self.menu.close();
        false
    }

    pub fn pointer_moved(&mut self, pointer: PointerId, screen: Vec2) {
        self.placement.pointer_moved(screen);
        if let Some(id) = self
            .drag
            .pointer_moved(pointer, screen, self.settings.drag_threshold_px)
        {
            self.registry.emit(MarkerEvent::DragStarted { id });
        }
    }

    /// Primary release. Also used for pointer cancel.
    pub fn pointer_up(
        &mut self,
        pointer: PointerId,
        screen: Vec2,
        viewer: &mut impl Viewer,
        resolver: &dyn DropTargetResolver,
    ) {
        let Some(outcome) = self.drag.finish(pointer, screen, viewer, resolver, self.registry) else {
            return;
        };
        match outcome {
            DragOutcome::Click(id) => {
                self.select_and_fly(&id, viewer);
            }
            DragOutcome::Drop {
                id,
                target,
                pointer,
            } => self.registry.emit(MarkerEvent::Dropped {
                id,
                target,
                pointer,
            }),
        }
    }

    /// The pointer went away mid-press; resolve at its last known position.
    pub fn pointer_cancel(
        &mut self,
        pointer: PointerId,
        viewer: &mut impl Viewer,
        resolver: &dyn DropTargetResolver,
    ) {
        let Some(last) = self
            .drag
            .session()
            .filter(|session| session.pointer == pointer)
            .map(|session| session.current)
        else {
            return;
        };
        self.pointer_up(pointer, last, viewer, resolver);
    }

    /// Select a marker, report the click and fly to its viewpoint.
    pub fn select_and_fly(&mut self, id: &MarkerId, viewer: &mut impl Viewer) -> bool {
        let Some(snapshot) = self.registry.click(id) else {
            return false;
        };
        self.placement.cancel(viewer);
        self.drag.abort(viewer);
        if let Some(snapshot) = snapshot {
            let report = self.fly.start(&snapshot, viewer, self.settings.fly_duration_secs);
            report.log("Fly");
        }
        true
    }

    /// Run an action from the open marker menu, then close it.
    pub fn run_menu_action(&mut self, action: MarkerAction) -> bool {
        let ContextMenu::Marker { id, .. } = self.menu.menu().clone() else {
            return false;
        };
        self.menu.close();
        self.registry.perform(action, &id)
    }

    /// "Add marker" from the open surface menu, then close it. The marker goes
    /// where the menu was opened, even if the view has moved since.
    pub fn add_marker_from_menu(&mut self, viewer: &impl Viewer) -> Option<MarkerId> {
        let ContextMenu::Surface { local_anchor, .. } = *self.menu.menu() else {
            return None;
        };
        self.menu.close();
        if !self.registry.editing_enabled() {
            return None;
        }
        self.registry.place_at_anchor(local_anchor, viewer)
    }

    pub fn apply(&mut self, command: MarkerCommand, viewer: &mut impl Viewer) {
        match command {
            MarkerCommand::StartPlacement => {
                if let Err(reason) = self.start_placement(viewer, None) {
                    debug!("Placement not started: {:?}", reason);
                }
            }
            MarkerCommand::CancelPlacement => {
                self.cancel_placement(viewer);
            }
            MarkerCommand::SetEditingEnabled(enabled) => self.set_editing_enabled(enabled, viewer),
            MarkerCommand::SetMarkersHidden(hidden) => self.set_markers_hidden(hidden),
            MarkerCommand::SelectAndFly(id) => {
                self.select_and_fly(&id, viewer);
            }
            MarkerCommand::ClearSelection => {
                self.registry.select(None);
            }
            MarkerCommand::RunMenuAction(action) => {
                self.run_menu_action(action);
            }
            MarkerCommand::AddMarkerFromMenu => {
                self.add_marker_from_menu(&*viewer);
            }
            MarkerCommand::CloseMenu => {
                self.menu.close();
            }
            MarkerCommand::SetMarkers(items) => {
                self.registry.set_markers(items);
                let stale = matches!(
                    self.menu.menu(),
                    ContextMenu::Marker { id, .. } if self.registry.get(id).is_none()
                );
                if stale {
                    self.menu.close();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
