use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::{AppConfig, UpdateMarkerSettingsRequest};
use crate::markers::{
    AutoHide, DragState, DropZones, MarkerCommand, MarkerRegistry, PlacementState,
};
use crate::viewer::{SectionAxis, SectionPlane, SectionPlanes, ViewerCamera};
use crate::viewpoint::FlyAnimation;

/// Name of the panel drop zone; markers dropped here are deleted by the demo host
pub const TRASH_ZONE: &str = "trash";

/// Section distances typed into the panel while a plane is disabled
#[derive(Resource, Default)]
pub struct SectionControls {
    pub distances: [f32; 3],
}

#[allow(clippy::too_many_arguments)]
pub fn markers_panel_ui(
    mut contexts: EguiContexts,
    registry: Res<MarkerRegistry>,
    placement: Res<PlacementState>,
    drag: Res<DragState>,
    auto_hide: Res<AutoHide>,
    fly: Res<FlyAnimation>,
    config: Res<AppConfig>,
    mut zones: ResMut<DropZones>,
    mut commands: MessageWriter<MarkerCommand>,
    mut settings_events: MessageWriter<UpdateMarkerSettingsRequest>,
) -> Result {
    egui::SidePanel::right("markers_panel")
        .default_width(220.0)
        .show(contexts.ctx_mut()?, |ui| {
            // =========================================
            // MARKERS SECTION
            // =========================================
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Markers").heading().size(18.0));
            ui.add_space(4.0);
            ui.separator();

            let mut editing = registry.editing_enabled();
            if ui.checkbox(&mut editing, "Editing").changed() {
                commands.write(MarkerCommand::SetEditingEnabled(editing));
            }

            let mut hidden = auto_hide.user_hidden(&registry);
            if ui.checkbox(&mut hidden, "Hide markers").changed() {
                commands.write(MarkerCommand::SetMarkersHidden(hidden));
            }

            let mut auto = config.markers().auto_hide_during_navigation;
            if ui
                .checkbox(&mut auto, "Hide while navigating")
                .on_hover_text("Markers reappear once the camera has settled")
                .changed()
            {
                let mut settings = config.markers().clone();
                settings.auto_hide_during_navigation = auto;
                settings_events.write(UpdateMarkerSettingsRequest { settings });
            }

            ui.add_space(6.0);
            ui.add_enabled_ui(editing, |ui| {
                if placement.is_placing() {
                    if ui.button("Cancel placement (Esc)").clicked() {
                        commands.write(MarkerCommand::CancelPlacement);
                    }
                } else if ui.button("Place marker (P)").clicked() {
                    commands.write(MarkerCommand::StartPlacement);
                }
            });
            if let Some(progress) = fly.progress() {
                ui.add(egui::ProgressBar::new(progress).desired_height(6.0));
            }

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(format!("{} markers", registry.len()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(registry.selected().is_some(), egui::Button::new("Deselect"))
                        .clicked()
                    {
                        commands.write(MarkerCommand::ClearSelection);
                    }
                });
            });

            egui::ScrollArea::vertical()
                .id_salt("marker_list")
                .max_height(220.0)
                .show(ui, |ui| {
                    if registry.is_empty() {
                        ui.label(egui::RichText::new("No markers").weak().italics());
                    }
                    for marker in registry.iter() {
                        let is_selected = registry.selected() == Some(marker.id());
                        let text = match marker.hidden_reason() {
                            Some(reason) => egui::RichText::new(format!(
                                "Marker {} ({})",
                                marker.id(),
                                reason.description()
                            ))
                            .weak(),
                            None => egui::RichText::new(format!("Marker {}", marker.id())),
                        };
                        let response = ui.selectable_label(is_selected, text);
                        let view = if marker.snapshot().is_some() {
                            "Click to fly to the saved view"
                        } else {
                            "No saved view"
                        };
                        let response = match marker.world_position() {
                            Some(world) => response.on_hover_text(format!(
                                "{}\nWorld: ({:.2}, {:.2}, {:.2})",
                                view, world.x, world.y, world.z
                            )),
                            None => response.on_hover_text(view),
                        };
                        if response.clicked() {
                            commands.write(MarkerCommand::SelectAndFly(marker.id().clone()));
                        }
                    }
                });

            ui.add_space(6.0);
            if !editing {
                zones.unregister(TRASH_ZONE);
                return;
            }
            let highlight = drag.ghost().is_some();
            let frame = egui::Frame::group(ui.style()).fill(if highlight {
                egui::Color32::from_rgb(90, 40, 40)
            } else {
                ui.visuals().extreme_bg_color
            });
            let zone = frame.show(ui, |ui| {
                ui.set_min_size(egui::vec2(ui.available_width(), 36.0));
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Drop here to delete").weak());
                });
            });
            let rect = zone.response.rect;
            zones.register(
                TRASH_ZONE,
                Rect::new(rect.min.x, rect.min.y, rect.max.x, rect.max.y),
            );
        });
    Ok(())
}

/// Projection and section-plane controls
pub fn view_panel_ui(
    mut contexts: EguiContexts,
    mut cameras: Query<&mut ViewerCamera>,
    mut sections: ResMut<SectionPlanes>,
    mut controls: ResMut<SectionControls>,
) -> Result {
    let Ok(mut camera) = cameras.single_mut() else {
        return Ok(());
    };

    egui::SidePanel::right("view_panel")
        .default_width(200.0)
        .show(contexts.ctx_mut()?, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("View").heading().size(18.0));
            ui.add_space(4.0);
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Projection:");
                if ui.button(camera.projection.display_name()).clicked() {
                    camera.projection = camera.projection.toggled();
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Section planes").strong());
                if ui
                    .add_enabled(sections.any_enabled(), egui::Button::new("Clear"))
                    .clicked()
                {
                    *sections = SectionPlanes::default();
                }
            });
            for axis in SectionAxis::ALL {
                let slot = axis.index();
                let plane = sections.get(axis);
                if let Some(distance) = plane.and_then(|plane| plane.axis_distance(axis)) {
                    controls.distances[slot] = distance;
                }

                ui.horizontal(|ui| {
                    let mut enabled = plane.is_some();
                    let toggled = ui.checkbox(&mut enabled, axis.display_name()).changed();
                    let moved = ui
                        .add(
                            egui::DragValue::new(&mut controls.distances[slot])
                                .speed(0.05)
                                .max_decimals(2),
                        )
                        .changed();

                    if toggled || (moved && enabled) {
                        let plane = enabled.then(|| {
                            SectionPlane::facing_away_from(
                                axis,
                                controls.distances[slot],
                                camera.position,
                            )
                        });
                        sections.set(axis, plane);
                    }
                });
            }
        });
    Ok(())
}
