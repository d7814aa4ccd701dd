//! Marker handles and ghosts painted over the 3D view.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::constants::MARKER_HANDLE_RADIUS;
use crate::markers::{DragState, MarkerRegistry, PlacementState};

const HANDLE_FILL: egui::Color32 = egui::Color32::from_rgb(230, 120, 40);
const SELECTED_FILL: egui::Color32 = egui::Color32::from_rgb(250, 210, 60);
const GHOST_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(120, 60, 20, 120);

fn to_pos(screen: Vec2) -> egui::Pos2 {
    egui::pos2(screen.x, screen.y)
}

/// Draw every visible marker at its projected position, plus the placement
/// and drag ghosts.
pub fn marker_overlay_ui(
    mut contexts: EguiContexts,
    registry: Res<MarkerRegistry>,
    placement: Res<PlacementState>,
    drag: Res<DragState>,
) -> Result {
    let ctx = contexts.ctx_mut()?;
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("marker_overlay"),
    ));

    let dragged = drag.ghost().map(|(id, _)| id.clone());
    let selected = registry.selected();

    for marker in registry.iter().filter(|marker| marker.is_visible()) {
        let Some(screen) = marker.screen_position() else {
            continue;
        };
        let center = to_pos(screen);
        let is_selected = selected == Some(marker.id());
        let fill = if dragged.as_ref() == Some(marker.id()) {
            GHOST_FILL
        } else if is_selected {
            SELECTED_FILL
        } else {
            HANDLE_FILL
        };

        painter.circle(
            center,
            MARKER_HANDLE_RADIUS,
            fill,
            egui::Stroke::new(if is_selected { 2.5 } else { 1.5 }, egui::Color32::WHITE),
        );
        painter.text(
            center + egui::vec2(MARKER_HANDLE_RADIUS + 4.0, 0.0),
            egui::Align2::LEFT_CENTER,
            marker.id().to_string(),
            egui::FontId::proportional(12.0),
            egui::Color32::WHITE,
        );
    }

    if let Some(ghost) = placement.ghost() {
        painter.circle_stroke(
            to_pos(ghost),
            MARKER_HANDLE_RADIUS,
            egui::Stroke::new(2.0, HANDLE_FILL),
        );
        painter.text(
            to_pos(ghost) + egui::vec2(0.0, MARKER_HANDLE_RADIUS + 10.0),
            egui::Align2::CENTER_CENTER,
            "Click the model to place",
            egui::FontId::proportional(11.0),
            egui::Color32::LIGHT_GRAY,
        );
    }

    if let Some((_, ghost)) = drag.ghost() {
        painter.circle(
            to_pos(ghost),
            MARKER_HANDLE_RADIUS,
            GHOST_FILL,
            egui::Stroke::new(1.5, HANDLE_FILL),
        );
    }

    Ok(())
}
