//! Marker storage and the public marker API.
//!
//! Markers are anchored in the model's local frame. Their world position is
//! recomputed from the current model transform every frame, so they follow the
//! model under translation, rotation and scale. Per-marker screen state (the
//! "handle") lives here and is never handed out mutably; callers get copies.

use std::collections::HashSet;
use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::context_menu::MarkerAction;
use super::events::MarkerEvent;
use super::visibility::{HiddenReason, MarkerVisibility};
use crate::constants::MARKER_HANDLE_RADIUS;
use crate::viewer::Viewer;
use crate::viewpoint::{capture, ViewpointSnapshot};

/// Marker identity: caller-assigned name or auto-incremented number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerId {
    Numeric(u64),
    Named(String),
}

impl MarkerId {
    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            MarkerId::Numeric(n) => Some(*n),
            MarkerId::Named(_) => None,
        }
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerId::Numeric(n) => write!(f, "{}", n),
            MarkerId::Named(name) => f.write_str(name),
        }
    }
}

impl From<u64> for MarkerId {
    fn from(n: u64) -> Self {
        MarkerId::Numeric(n)
    }
}

impl From<&str> for MarkerId {
    fn from(name: &str) -> Self {
        MarkerId::Named(name.to_string())
    }
}

/// Plain marker data exchanged with the host.
///
/// `id` is always set on data coming out of the registry. On the way in it may
/// be left empty to request an auto-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MarkerId>,
    pub local_anchor: Vec3,
    #[serde(default)]
    pub snapshot: Option<ViewpointSnapshot>,
}

impl MarkerData {
    pub fn new(local_anchor: Vec3) -> Self {
        Self {
            id: None,
            local_anchor,
            snapshot: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<MarkerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_snapshot(mut self, snapshot: ViewpointSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// Convert a world point into the model's local frame.
pub fn anchor_from_world(model: &Transform, world: Vec3) -> Vec3 {
    model.compute_affine().inverse().transform_point3(world)
}

/// Current world position of a local anchor.
pub fn anchor_to_world(model: &Transform, local_anchor: Vec3) -> Vec3 {
    model.transform_point(local_anchor)
}

#[derive(Debug, Clone, Default)]
struct MarkerHandle {
    world: Option<Vec3>,
    screen: Option<Vec2>,
    visible: bool,
    hidden_reason: Option<HiddenReason>,
}

#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    local_anchor: Vec3,
    snapshot: Option<ViewpointSnapshot>,
    handle: MarkerHandle,
}

impl Marker {
    fn new(id: MarkerId, local_anchor: Vec3, snapshot: Option<ViewpointSnapshot>) -> Self {
        Self {
            id,
            local_anchor,
            snapshot,
            handle: MarkerHandle::default(),
        }
    }

    pub fn id(&self) -> &MarkerId {
        &self.id
    }

    pub fn local_anchor(&self) -> Vec3 {
        self.local_anchor
    }

    pub fn snapshot(&self) -> Option<&ViewpointSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.handle.visible
    }

    /// Why the marker was hidden on the last visibility pass.
    pub fn hidden_reason(&self) -> Option<HiddenReason> {
        self.handle.hidden_reason
    }

    pub fn world_position(&self) -> Option<Vec3> {
        self.handle.world
    }

    pub fn screen_position(&self) -> Option<Vec2> {
        self.handle.screen
    }

    pub fn data(&self) -> MarkerData {
        MarkerData {
            id: Some(self.id.clone()),
            local_anchor: self.local_anchor,
            snapshot: self.snapshot,
        }
    }

    pub(super) fn apply_visibility(&mut self, result: MarkerVisibility) {
        self.handle.world = result.world;
        self.handle.screen = result.screen;
        self.handle.visible = result.hidden.is_none();
        self.handle.hidden_reason = result.hidden;
    }
}

#[derive(Resource, Debug)]
pub struct MarkerRegistry {
    markers: Vec<Marker>,
    next_id: u64,
    selected: Option<MarkerId>,
    editing_enabled: bool,
    hidden: bool,
    outbox: Vec<MarkerEvent>,
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            next_id: 1,
            selected: None,
            editing_enabled: true,
            hidden: false,
            outbox: Vec::new(),
        }
    }
}

impl MarkerRegistry {
    /// Replace every marker.
    ///
    /// The next auto id becomes one past the largest numeric id. Items without
    /// an id are numbered from there. Later items repeating an id are dropped.
    /// Selection survives if the selected id is still present.
    pub fn set_markers(&mut self, items: impl IntoIterator<Item = MarkerData>) {
        let items: Vec<MarkerData> = items.into_iter().collect();
        self.next_id = items
            .iter()
            .filter_map(|item| item.id.as_ref().and_then(MarkerId::as_numeric))
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let mut seen = HashSet::new();
        let mut markers = Vec::with_capacity(items.len());
        for item in items {
            let id = match item.id {
                Some(id) => id,
                None => self.allocate_id(),
            };
            if !seen.insert(id.clone()) {
                warn!("Duplicate marker id {} dropped", id);
                continue;
            }
            markers.push(Marker::new(id, item.local_anchor, item.snapshot));
        }
        self.markers = markers;

        if let Some(selected) = &self.selected
            && self.get(selected).is_none()
        {
            self.selected = None;
        }
        info!("Markers replaced ({} total)", self.markers.len());
    }

    /// Copies of every marker's data, in insertion order.
    pub fn get_markers(&self) -> Vec<MarkerData> {
        self.markers.iter().map(Marker::data).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub(super) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Marker> {
        self.markers.iter_mut()
    }

    pub fn get(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Id the next placed marker will get.
    pub fn next_id(&self) -> MarkerId {
        MarkerId::Numeric(self.next_id)
    }

    fn allocate_id(&mut self) -> MarkerId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        MarkerId::Numeric(id)
    }

    /// Select a marker, or clear the selection with `None`. Unknown ids leave the
    /// selection unchanged and return false.
    pub fn select(&mut self, id: Option<MarkerId>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.get(&id).is_some() => {
                debug!("Marker {} selected", id);
                self.selected = Some(id);
                true
            }
            Some(id) => {
                debug!("Ignoring selection of unknown marker {}", id);
                false
            }
        }
    }

    pub fn selected(&self) -> Option<&MarkerId> {
        self.selected.as_ref()
    }

    pub fn editing_enabled(&self) -> bool {
        self.editing_enabled
    }

    /// Raw flag. `MarkerController::set_editing_enabled` also tears down
    /// sessions that editing gates.
    pub fn set_editing_enabled(&mut self, enabled: bool) {
        self.editing_enabled = enabled;
    }

    pub fn markers_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_markers_hidden(&mut self, hidden: bool) {
        if self.hidden != hidden {
            debug!("Markers {}", if hidden { "hidden" } else { "shown" });
        }
        self.hidden = hidden;
    }

    /// Topmost visible marker whose handle contains `screen`, skipping `exclude`.
    pub fn handle_at(&self, screen: Vec2, exclude: Option<&MarkerId>) -> Option<&MarkerId> {
        self.markers
            .iter()
            .rev()
            .filter(|m| m.handle.visible && Some(&m.id) != exclude)
            .filter_map(|m| {
                let distance = m.handle.screen?.distance(screen);
                (distance <= MARKER_HANDLE_RADIUS).then_some((m, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| &m.id)
    }

    /// Create a marker at a world-space surface point, capturing the current
    /// viewpoint. Returns `None` when no model is loaded.
    pub fn place_at_world(&mut self, world: Vec3, viewer: &impl Viewer) -> Option<MarkerId> {
        let model = viewer.model_transform()?;
        let local_anchor = anchor_from_world(&model, world);
        if !local_anchor.is_finite() {
            warn!("Model transform is not invertible, marker not placed");
            return None;
        }
        self.place_at_anchor(local_anchor, viewer)
    }

    /// Create a marker at a model-local anchor, capturing the current
    /// viewpoint. Returns `None` when no model is loaded.
    pub fn place_at_anchor(&mut self, local_anchor: Vec3, viewer: &impl Viewer) -> Option<MarkerId> {
        viewer.model_transform()?;
        let snapshot = capture(viewer);
        let id = self.allocate_id();
        self.markers.push(Marker::new(id.clone(), local_anchor, snapshot));
        info!("Marker {} placed at local {:?}", id, local_anchor);
        self.emit(MarkerEvent::Placed {
            id: id.clone(),
            local_anchor,
            snapshot,
        });
        Some(id)
    }

    /// Ray cast from a viewport pixel and place a marker on the nearest
    /// visible model surface. `None` when nothing was hit.
    pub fn place_at_screen(
        &mut self,
        screen: Vec2,
        viewer: &mut impl Viewer,
        clip_epsilon: f32,
    ) -> Option<MarkerId> {
        let Some(world) = viewer.surface_point_at(screen, clip_epsilon) else {
            debug!("No model surface under {:?}", screen);
            return None;
        };
        self.place_at_world(world, &*viewer)
    }

    /// Select a marker and report the click. Returns its snapshot, if any.
    pub(super) fn click(&mut self, id: &MarkerId) -> Option<Option<ViewpointSnapshot>> {
        let snapshot = self.get(id)?.snapshot;
        self.select(Some(id.clone()));
        self.emit(MarkerEvent::Clicked {
            id: id.clone(),
            snapshot,
        });
        Some(snapshot)
    }

    pub fn remove(&mut self, id: &MarkerId) -> Option<MarkerData> {
        let index = self.markers.iter().position(|m| &m.id == id)?;
        let marker = self.markers.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Some(marker.data())
    }

    /// Run a context-menu action. Delete removes the marker; copy and move only
    /// notify the host, which re-applies the result through `set_markers`.
    pub fn perform(&mut self, action: MarkerAction, id: &MarkerId) -> bool {
        let event = match action {
            MarkerAction::Copy => self.get(id).map(|m| MarkerEvent::Copied(m.data())),
            MarkerAction::Move => self.get(id).map(|m| MarkerEvent::MoveRequested(m.data())),
            MarkerAction::Delete => self.remove(id).map(MarkerEvent::Deleted),
        };
        match event {
            Some(event) => {
                info!("Marker {} action: {}", id, event.name());
                self.emit(event);
                true
            }
            None => {
                debug!("Marker action {:?} on unknown marker {}", action, id);
                false
            }
        }
    }

    pub(super) fn emit(&mut self, event: MarkerEvent) {
        self.outbox.push(event);
    }

    /// Take every event raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<MarkerEvent> {
        std::mem::take(&mut self.outbox)
    }
}
