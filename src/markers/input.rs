//! Bevy systems that feed window input and queued commands into the
//! [`MarkerController`].

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::{CursorLeft, WindowFocused};
use bevy_egui::EguiContexts;

use super::auto_hide::AutoHide;
use super::context_menu::ContextMenuState;
use super::controller::{MarkerCommand, MarkerController, PointerButton};
use super::drag::{DragState, DropZones};
use super::events::MarkerEvent;
use super::placement::PlacementState;
use super::registry::MarkerRegistry;
use crate::common::PointerId;
use crate::config::AppConfig;
use crate::viewer::SceneViewer;
use crate::viewpoint::FlyAnimation;

/// Bundled marker session resources
#[derive(SystemParam)]
pub struct MarkerSessions<'w> {
    pub registry: ResMut<'w, MarkerRegistry>,
    pub placement: ResMut<'w, PlacementState>,
    pub drag: ResMut<'w, DragState>,
    pub menu: ResMut<'w, ContextMenuState>,
    pub fly: ResMut<'w, FlyAnimation>,
    pub auto_hide: ResMut<'w, AutoHide>,
    pub zones: Res<'w, DropZones>,
    pub config: Res<'w, AppConfig>,
}

impl MarkerSessions<'_> {
    pub fn controller(&mut self) -> (MarkerController<'_>, &DropZones) {
        (
            MarkerController {
                registry: &mut self.registry,
                placement: &mut self.placement,
                drag: &mut self.drag,
                menu: &mut self.menu,
                fly: &mut self.fly,
                auto_hide: &mut self.auto_hide,
                settings: self.config.markers(),
            },
            &self.zones,
        )
    }
}

/// Check if cursor is over egui UI (for input gating)
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

pub fn egui_wants_keyboard(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false)
}

pub fn apply_marker_commands(
    mut commands: MessageReader<MarkerCommand>,
    mut sessions: MarkerSessions,
    mut viewer: SceneViewer,
) {
    for command in commands.read() {
        let (mut controller, _) = sessions.controller();
        controller.apply(command.clone(), &mut viewer);
    }
}

pub fn handle_marker_keyboard(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut sessions: MarkerSessions,
    mut viewer: SceneViewer,
    mut contexts: EguiContexts,
) {
    if egui_wants_keyboard(&mut contexts) {
        return;
    }
    let cursor = viewer.cursor_position();
    let (mut controller, _) = sessions.controller();

    if keyboard.just_pressed(KeyCode::Escape) {
        controller.escape(&mut viewer);
    }
    if keyboard.just_pressed(KeyCode::KeyP)
        && let Err(reason) = controller.start_placement(&mut viewer, cursor)
    {
        debug!("Placement not started: {:?}", reason);
    }
}

pub fn handle_marker_pointer(
    mouse: Res<ButtonInput<MouseButton>>,
    mut cursor_left: MessageReader<CursorLeft>,
    mut focus: MessageReader<WindowFocused>,
    mut sessions: MarkerSessions,
    mut viewer: SceneViewer,
    mut contexts: EguiContexts,
) {
    let cursor = viewer.cursor_position();
    let over_ui = is_cursor_over_ui(&mut contexts);
    let pointer_lost = cursor_left.read().count() > 0 || focus.read().any(|event| !event.focused);
    let (mut controller, zones) = sessions.controller();

    if let Some(screen) = cursor {
        for (button, pressed) in [
            (PointerButton::Primary, mouse.just_pressed(MouseButton::Left)),
            (PointerButton::Secondary, mouse.just_pressed(MouseButton::Right)),
        ] {
            if !pressed {
                continue;
            }
            if over_ui {
                // Clicks on other UI still dismiss an open menu
                if button == PointerButton::Primary
                    && controller.menu.is_open()
                    && !controller.menu.contains(screen)
                {
                    controller.menu.close();
                }
                continue;
            }
            if controller.pointer_down(button, PointerId::MOUSE, screen, &mut viewer) {
                viewer.claim_press();
            }
        }

        controller.pointer_moved(PointerId::MOUSE, screen);
    }

    if mouse.just_released(MouseButton::Left) {
        match cursor {
            Some(screen) => controller.pointer_up(PointerId::MOUSE, screen, &mut viewer, zones),
            None => controller.pointer_cancel(PointerId::MOUSE, &mut viewer, zones),
        }
    } else if pointer_lost {
        controller.pointer_cancel(PointerId::MOUSE, &mut viewer, zones);
    }
}

/// Hand queued registry events to the host as messages.
pub fn flush_marker_events(
    mut registry: ResMut<MarkerRegistry>,
    mut writer: MessageWriter<MarkerEvent>,
) {
    for event in registry.drain_events() {
        debug!("Marker event {}", event.name());
        writer.write(event);
    }
}
