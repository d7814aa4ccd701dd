//! Outgoing marker notifications.

use bevy::prelude::*;

use super::registry::{MarkerData, MarkerId};
use crate::viewpoint::ViewpointSnapshot;

/// What a drag was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A host-registered drop zone, by name
    Zone(String),
    /// Another marker's handle
    Marker(MarkerId),
}

/// Notifications for the host application, drained from the registry once per
/// frame.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum MarkerEvent {
    Placed {
        id: MarkerId,
        local_anchor: Vec3,
        snapshot: Option<ViewpointSnapshot>,
    },
    Clicked {
        id: MarkerId,
        snapshot: Option<ViewpointSnapshot>,
    },
    DragStarted {
        id: MarkerId,
    },
    Dropped {
        id: MarkerId,
        target: Option<DropTarget>,
        /// Release position in viewport pixels
        pointer: Vec2,
    },
    Copied(MarkerData),
    MoveRequested(MarkerData),
    Deleted(MarkerData),
}

impl MarkerEvent {
    /// External event name.
    pub fn name(&self) -> &'static str {
        match self {
            MarkerEvent::Placed { .. } => "label-placed",
            MarkerEvent::Clicked { .. } => "label-click",
            MarkerEvent::DragStarted { .. } => "label-drag-start",
            MarkerEvent::Dropped { .. } => "label-drop",
            MarkerEvent::Copied(_) => "label-copy",
            MarkerEvent::MoveRequested(_) => "label-move",
            MarkerEvent::Deleted(_) => "label-delete",
        }
    }
}
