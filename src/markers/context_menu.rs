//! Per-marker and per-surface context menus.
//!
//! At most one menu is open. Opening either closes the other.

use bevy::prelude::*;

use super::registry::MarkerId;
use crate::constants::CONTEXT_MENU_ESTIMATED_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAction {
    Copy,
    Move,
    Delete,
}

impl MarkerAction {
    pub const ALL: [MarkerAction; 3] = [MarkerAction::Copy, MarkerAction::Move, MarkerAction::Delete];

    pub fn label(&self) -> &'static str {
        match self {
            MarkerAction::Copy => "Copy",
            MarkerAction::Move => "Move",
            MarkerAction::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContextMenu {
    #[default]
    Closed,
    Marker {
        id: MarkerId,
        /// Top-left corner, clamped inside the viewport
        position: Vec2,
    },
    Surface {
        /// Model-local point that was under the pointer when the menu opened
        local_anchor: Vec3,
        position: Vec2,
    },
}

/// Keep a menu of `size` opened at `anchor` fully inside the viewport.
pub fn clamp_menu_position(anchor: Vec2, size: Vec2, viewport: Vec2) -> Vec2 {
    let max = (viewport - size).max(Vec2::ZERO);
    anchor.clamp(Vec2::ZERO, max)
}

#[derive(Resource, Debug, Default)]
pub struct ContextMenuState {
    menu: ContextMenu,
    /// Rect of the open menu as last drawn by the UI
    drawn_rect: Option<Rect>,
}

impl ContextMenuState {
    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn is_open(&self) -> bool {
        self.menu != ContextMenu::Closed
    }

    pub fn open_marker(&mut self, id: MarkerId, at: Vec2, viewport: Vec2) {
        let position = clamp_menu_position(at, CONTEXT_MENU_ESTIMATED_SIZE, viewport);
        debug!("Marker menu opened for {}", id);
        self.menu = ContextMenu::Marker { id, position };
        self.drawn_rect = None;
    }

    pub fn open_surface(&mut self, at: Vec2, local_anchor: Vec3, viewport: Vec2) {
        let position = clamp_menu_position(at, CONTEXT_MENU_ESTIMATED_SIZE, viewport);
        debug!("Surface menu opened at {:?} over {:?}", at, local_anchor);
        self.menu = ContextMenu::Surface {
            local_anchor,
            position,
        };
        self.drawn_rect = None;
    }

    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        if was_open {
            debug!("Context menu closed");
        }
        self.menu = ContextMenu::Closed;
        self.drawn_rect = None;
        was_open
    }

    pub fn set_drawn_rect(&mut self, rect: Rect) {
        if self.is_open() {
            self.drawn_rect = Some(rect);
        }
    }

    /// Screen area the open menu covers; estimated until it has been drawn.
    pub fn rect(&self) -> Option<Rect> {
        let position = match &self.menu {
            ContextMenu::Closed => return None,
            ContextMenu::Marker { position, .. } | ContextMenu::Surface { position, .. } => *position,
        };
        Some(
            self.drawn_rect
                .unwrap_or_else(|| Rect::from_corners(position, position + CONTEXT_MENU_ESTIMATED_SIZE)),
        )
    }

    pub fn contains(&self, screen: Vec2) -> bool {
        self.rect().is_some_and(|rect| rect.contains(screen))
    }
}
