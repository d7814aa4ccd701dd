//! Point annotations anchored to the model.
//!
//! ## Module Structure
//!
//! - [`registry`] - Marker storage, ids, local anchors, the public marker API
//! - [`visibility`] - Clip, frustum and occlusion tests run every frame
//! - [`placement`] - Click-to-place session
//! - [`drag`] - Click-versus-drag disambiguation and drop target resolution
//! - [`auto_hide`] - Hide markers while the camera is navigated
//! - [`context_menu`] - Marker and surface menus
//! - [`controller`] - Routes pointer input and commands to the sessions
//! - [`input`] - Bevy systems around the controller
//! - [`events`] - Messages for the host application
//!
//! ## Frame order
//!
//! `MarkerSet::Input` runs before orbit navigation so a press claimed by a
//! marker session never starts a gesture. Animation follows navigation.
//! Visibility runs in `PostUpdate` after transform propagation, so occlusion
//! rays see the model where this frame's changes put it, and before the egui
//! pass draws the labels.

pub mod auto_hide;
pub mod context_menu;
pub mod controller;
pub mod drag;
pub mod events;
pub mod input;
pub mod placement;
pub mod registry;
pub mod visibility;

use bevy::prelude::*;
use bevy::transform::TransformSystems;
use bevy_egui::EguiPostUpdateSet;

pub use auto_hide::AutoHide;
pub use context_menu::{ContextMenu, ContextMenuState, MarkerAction};
pub use controller::MarkerCommand;
pub use drag::{DragState, DropZones};
pub use events::{DropTarget, MarkerEvent};
pub use placement::PlacementState;
pub use registry::{MarkerData, MarkerId, MarkerRegistry};

use crate::config::{AppConfig, ConfigLoaded};
use crate::viewer::ViewerSet;
use crate::viewpoint::FlyAnimation;

/// Ordering of marker systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerSet {
    /// Commands, pointer and keyboard input
    Input,
    /// Fly animation and auto-hide
    Animate,
    /// Visibility recompute and event flush, in `PostUpdate`
    Visibility,
}

fn configure_marker_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            MarkerSet::Input,
            ViewerSet::Navigate,
            MarkerSet::Animate,
            ViewerSet::Sync,
        )
            .chain(),
    )
    .configure_sets(
        PostUpdate,
        MarkerSet::Visibility
            .after(TransformSystems::Propagate)
            .before(EguiPostUpdateSet::EndPass),
    );
}

/// Apply persisted settings once the config has been read.
fn apply_startup_settings(config: Res<AppConfig>, mut registry: ResMut<MarkerRegistry>) {
    registry.set_editing_enabled(config.markers().editing_enabled_on_startup);
}

pub struct MarkersPlugin;

impl Plugin for MarkersPlugin {
    fn build(&self, app: &mut App) {
        configure_marker_sets(app);
        app.init_resource::<MarkerRegistry>()
            .init_resource::<PlacementState>()
            .init_resource::<DragState>()
            .init_resource::<DropZones>()
            .init_resource::<ContextMenuState>()
            .init_resource::<AutoHide>()
            .init_resource::<FlyAnimation>()
            .add_message::<MarkerCommand>()
            .add_message::<MarkerEvent>()
            .add_systems(Startup, apply_startup_settings.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    input::apply_marker_commands,
                    input::handle_marker_keyboard,
                    input::handle_marker_pointer,
                )
                    .chain()
                    .in_set(MarkerSet::Input),
            )
            .add_systems(
                Update,
                (
                    crate::viewpoint::fly::step_fly_animation,
                    auto_hide::update_auto_hide,
                )
                    .chain()
                    .in_set(MarkerSet::Animate),
            )
            .add_systems(
                PostUpdate,
                (
                    visibility::update_marker_visibility,
                    input::flush_marker_events,
                )
                    .chain()
                    .in_set(MarkerSet::Visibility),
            );
    }
}
