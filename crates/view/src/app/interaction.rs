use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::input::{action_for_key, ActionStates};
use super::rendering::{hover_tile_at, TileCoord, ViewportConfig};
use super::{InputAction, InputSnapshot, TilePos};

/// Whether a key event was claimed by the front-end. Consumed keys must not trigger any
/// platform default behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyDisposition {
    Consumed,
    Ignored,
}

/// Owns held keys, pending one-shot flags and the hovered tile between ticks.
#[derive(Debug, Default)]
pub(crate) struct InteractionMapper {
    actions: ActionStates,
    hover_tile: Option<TileCoord>,
    quit_requested: bool,
}

impl InteractionMapper {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) -> KeyDisposition {
        self.handle_key(key_event.physical_key, key_event.state)
    }

    /// Key repeat is not filtered: every press of a one-shot key re-arms its flag, and the
    /// flag stays armed until the next tick consumes it.
    pub(crate) fn handle_key(&mut self, key: PhysicalKey, state: ElementState) -> KeyDisposition {
        if key == PhysicalKey::Code(KeyCode::Escape) {
            if state == ElementState::Pressed {
                self.quit_requested = true;
            }
            return KeyDisposition::Consumed;
        }

        let Some(action) = action_for_key(key) else {
            return KeyDisposition::Ignored;
        };

        match state {
            ElementState::Pressed => {
                self.actions.set(action, true);
                KeyDisposition::Consumed
            }
            ElementState::Released if action.is_level_triggered() => {
                self.actions.set(action, false);
                KeyDisposition::Consumed
            }
            ElementState::Released => KeyDisposition::Ignored,
        }
    }

    /// `player` is the last player tile seen by the renderer, so hover and camera agree.
    pub(crate) fn handle_pointer_moved(
        &mut self,
        screen_x: f32,
        screen_y: f32,
        player: TilePos,
        config: &ViewportConfig,
    ) {
        self.hover_tile = hover_tile_at(screen_x, screen_y, player, config);
    }

    pub(crate) fn handle_pointer_left(&mut self) {
        self.hover_tile = None;
    }

    pub(crate) fn hover_tile(&self) -> Option<TileCoord> {
        self.hover_tile
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    /// Assembles the snapshot for the next tick without consuming anything; the scheduler
    /// clears one-shots once the step has returned.
    pub(crate) fn snapshot_for_tick(&self) -> InputSnapshot {
        let hover = self.hover_tile.and_then(TileCoord::to_tile_pos);
        InputSnapshot::new(self.actions, hover)
    }

    pub(crate) fn clear_one_shots(&mut self) {
        self.actions.clear_one_shots();
    }

    pub(crate) fn one_shots_pending(&self) -> bool {
        self.actions.any_one_shot_down()
    }

    #[cfg(test)]
    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }
}
