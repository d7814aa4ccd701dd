use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::common::require;
use crate::markers::input::egui_wants_keyboard;
use crate::viewer::{SceneViewer, Viewer};

const MOVE_SPEED: f32 = 1.5;
const ROTATE_SPEED: f32 = 1.2;
const SCALE_SPEED: f32 = 0.8;

/// Move, rotate and scale the model from the keyboard.
///
/// - Arrow keys: translate on the ground plane
/// - PageUp / PageDown: raise / lower
/// - Q / E: rotate about Y
/// - `=` / `-`: scale up / down
/// - R: reset
pub fn model_keyboard_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut viewer: SceneViewer,
    mut contexts: EguiContexts,
) {
    if egui_wants_keyboard(&mut contexts) {
        return;
    }

    let axis = |positive: KeyCode, negative: KeyCode| -> f32 {
        keyboard.pressed(positive) as i32 as f32 - keyboard.pressed(negative) as i32 as f32
    };
    let translate = Vec3::new(
        axis(KeyCode::ArrowRight, KeyCode::ArrowLeft),
        axis(KeyCode::PageUp, KeyCode::PageDown),
        axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
    );
    let rotate = axis(KeyCode::KeyQ, KeyCode::KeyE);
    let scale = axis(KeyCode::Equal, KeyCode::Minus);
    let reset = keyboard.just_pressed(KeyCode::KeyR);

    if translate == Vec3::ZERO && rotate == 0.0 && scale == 0.0 && !reset {
        return;
    }
    let Some(mut transform) = require("demo.model", viewer.model_transform()) else {
        return;
    };

    if reset {
        transform = Transform::default();
        info!("Model transform reset");
    } else {
        let dt = time.delta_secs();
        transform.translation += translate * MOVE_SPEED * dt;
        transform.rotate_y(rotate * ROTATE_SPEED * dt);
        let factor = (1.0 + scale * SCALE_SPEED * dt).max(0.01);
        transform.scale = (transform.scale * factor).clamp(Vec3::splat(0.05), Vec3::splat(20.0));
    }
    viewer.set_model_transform(transform);
}
