use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::markers::{ContextMenu, ContextMenuState, MarkerAction, MarkerCommand};

/// Renders the open marker or surface menu and records where it was drawn,
/// so presses inside it are not treated as outside clicks.
pub fn context_menu_ui(
    mut contexts: EguiContexts,
    mut menu_state: ResMut<ContextMenuState>,
    mut commands: MessageWriter<MarkerCommand>,
) -> Result {
    let (position, title) = match menu_state.menu() {
        ContextMenu::Closed => return Ok(()),
        ContextMenu::Marker { id, position } => (*position, format!("Marker {}", id)),
        ContextMenu::Surface { position, .. } => (*position, "Model".to_string()),
    };
    let is_marker_menu = matches!(menu_state.menu(), ContextMenu::Marker { .. });

    let response = egui::Area::new(egui::Id::new("marker_context_menu"))
        .order(egui::Order::Foreground)
        .fixed_pos(egui::pos2(position.x, position.y))
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::menu(ui.style()).show(ui, |ui| {
                ui.set_min_width(120.0);
                ui.label(egui::RichText::new(title).weak().size(11.0));
                ui.separator();

                if is_marker_menu {
                    for action in MarkerAction::ALL {
                        if ui.button(action.label()).clicked() {
                            commands.write(MarkerCommand::RunMenuAction(action));
                        }
                    }
                } else if ui.button("Add marker").clicked() {
                    commands.write(MarkerCommand::AddMarkerFromMenu);
                }
            });
        })
        .response;

    let rect = response.rect;
    menu_state.set_drawn_rect(Rect::new(rect.min.x, rect.min.y, rect.max.x, rect.max.y));
    Ok(())
}
