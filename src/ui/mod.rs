mod context_menu;
mod dialogs;
pub mod markers_panel;
mod overlay;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<markers_panel::SectionControls>()
            // Panels first, then overlays and dialogs
            .add_systems(
                EguiPrimaryContextPass,
                (markers_panel::markers_panel_ui, markers_panel::view_panel_ui).chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    overlay::marker_overlay_ui,
                    context_menu::context_menu_ui,
                    dialogs::config_reset_notification_ui,
                )
                    .after(markers_panel::view_panel_ui),
            );
    }
}
