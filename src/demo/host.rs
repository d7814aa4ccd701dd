//! Host side of the marker contract.
//!
//! Copy, move and drop events only report intent. The host decides what they
//! mean and writes the resulting list back with `MarkerCommand::SetMarkers`.

use bevy::prelude::*;

use crate::markers::{
    DropTarget, MarkerCommand, MarkerData, MarkerEvent, MarkerId, MarkerRegistry, PlacementState,
};
use crate::ui::markers_panel::TRASH_ZONE;

/// Local-space offset applied to a copied marker
const COPY_OFFSET: Vec3 = Vec3::new(0.25, 0.0, 0.0);

/// Frames to wait for a requested move placement to start
const MOVE_START_FRAMES: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
struct PendingMove {
    id: MarkerId,
    started: bool,
    frames_waiting: u8,
}

#[derive(Resource, Debug, Default)]
pub struct HostState {
    pending_move: Option<PendingMove>,
}

/// What the host wants done after looking at one event.
#[derive(Debug, Default, PartialEq)]
pub struct HostReaction {
    /// The marker list was edited and must be written back
    pub changed: bool,
    pub start_placement: bool,
}

impl HostState {
    pub fn pending_move(&self) -> Option<&MarkerId> {
        self.pending_move.as_ref().map(|pending| &pending.id)
    }

    /// Apply one event to the host's working copy of the marker list.
    pub fn handle(&mut self, event: &MarkerEvent, items: &mut Vec<MarkerData>) -> HostReaction {
        let mut reaction = HostReaction::default();
        match event {
            MarkerEvent::Copied(data) => {
                let mut copy = MarkerData::new(data.local_anchor + COPY_OFFSET);
                copy.snapshot = data.snapshot;
                items.push(copy);
                reaction.changed = true;
            }
            MarkerEvent::MoveRequested(data) => {
                if let Some(id) = &data.id {
                    info!("Moving marker {}: click the model to re-place it", id);
                    self.pending_move = Some(PendingMove {
                        id: id.clone(),
                        started: false,
                        frames_waiting: 0,
                    });
                    reaction.start_placement = true;
                }
            }
            MarkerEvent::Placed { id, .. } => {
                if let Some(pending) = self.pending_move.take() {
                    items.retain(|item| item.id.as_ref() != Some(&pending.id));
                    if let Some(item) = items.iter_mut().find(|item| item.id.as_ref() == Some(id)) {
                        item.id = Some(pending.id.clone());
                        info!("Marker {} moved", pending.id);
                    }
                    reaction.changed = true;
                }
            }
            MarkerEvent::Dropped {
                id,
                target: Some(DropTarget::Zone(zone)),
                ..
            } if zone == TRASH_ZONE => {
                let before = items.len();
                items.retain(|item| item.id.as_ref() != Some(id));
                reaction.changed = items.len() != before;
                info!("Marker {} dropped in the trash", id);
            }
            MarkerEvent::Dropped { id, target, .. } => {
                info!("Marker {} dropped on {:?}", id, target);
            }
            MarkerEvent::Deleted(data) => {
                if self.pending_move() == data.id.as_ref() {
                    self.pending_move = None;
                }
            }
            MarkerEvent::Clicked { id, .. } => info!("Marker {} clicked", id),
            MarkerEvent::DragStarted { .. } => {}
        }
        reaction
    }

    /// Forget a requested move once its placement was cancelled or never
    /// started.
    pub fn placement_tick(&mut self, placing: bool) {
        let Some(pending) = &mut self.pending_move else {
            return;
        };
        if placing {
            pending.started = true;
            return;
        }
        pending.frames_waiting = pending.frames_waiting.saturating_add(1);
        if pending.started || pending.frames_waiting > MOVE_START_FRAMES {
            info!("Move of marker {} abandoned", pending.id);
            self.pending_move = None;
        }
    }
}

pub fn consume_marker_events(
    mut events: MessageReader<MarkerEvent>,
    registry: Res<MarkerRegistry>,
    placement: Res<PlacementState>,
    mut host: ResMut<HostState>,
    mut commands: MessageWriter<MarkerCommand>,
) {
    let mut items = registry.get_markers();
    let mut changed = false;

    for event in events.read() {
        let reaction = host.handle(event, &mut items);
        changed |= reaction.changed;
        if reaction.start_placement {
            commands.write(MarkerCommand::StartPlacement);
        }
    }
    host.placement_tick(placement.is_placing());

    if changed {
        commands.write(MarkerCommand::SetMarkers(items));
    }
}
