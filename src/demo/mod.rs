//! Sample host application: a small model, keyboard model controls, section
//! plane gizmos and a consumer for marker events.

pub mod host;
mod model_controls;
mod scene;

use bevy::prelude::*;

use crate::markers::MarkerSet;
use crate::viewer::ViewerSet;

pub struct DemoPlugin;

impl Plugin for DemoPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<host::HostState>()
            .add_systems(Startup, (scene::spawn_demo_scene, scene::seed_demo_markers))
            .add_systems(
                Update,
                model_controls::model_keyboard_controls.in_set(ViewerSet::Navigate),
            )
            .add_systems(PostUpdate, host::consume_marker_events.after(MarkerSet::Visibility))
            .add_systems(Update, scene::draw_section_planes);
    }
}
