use winit::keyboard::{KeyCode, PhysicalKey};

use super::TilePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveNorth,
    MoveSouth,
    MoveEast,
    MoveWest,
    Mine,
    Place,
    Harvest,
    CyclePrev,
    CycleNext,
    Drop,
    CraftFurnace,
    CraftBelt,
    CraftArm,
    CraftChest,
    CraftDrill,
    Rotate,
    PickUpStructure,
}

const ACTION_COUNT: usize = 17;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveNorth,
        InputAction::MoveSouth,
        InputAction::MoveEast,
        InputAction::MoveWest,
        InputAction::Mine,
        InputAction::Place,
        InputAction::Harvest,
        InputAction::CyclePrev,
        InputAction::CycleNext,
        InputAction::Drop,
        InputAction::CraftFurnace,
        InputAction::CraftBelt,
        InputAction::CraftArm,
        InputAction::CraftChest,
        InputAction::CraftDrill,
        InputAction::Rotate,
        InputAction::PickUpStructure,
    ];

    /// Movement actions stay down while the key is held; everything else is a one-shot.
    pub const fn is_level_triggered(self) -> bool {
        matches!(
            self,
            InputAction::MoveNorth
                | InputAction::MoveSouth
                | InputAction::MoveEast
                | InputAction::MoveWest
        )
    }

    const fn index(self) -> usize {
        match self {
            InputAction::MoveNorth => 0,
            InputAction::MoveSouth => 1,
            InputAction::MoveEast => 2,
            InputAction::MoveWest => 3,
            InputAction::Mine => 4,
            InputAction::Place => 5,
            InputAction::Harvest => 6,
            InputAction::CyclePrev => 7,
            InputAction::CycleNext => 8,
            InputAction::Drop => 9,
            InputAction::CraftFurnace => 10,
            InputAction::CraftBelt => 11,
            InputAction::CraftArm => 12,
            InputAction::CraftChest => 13,
            InputAction::CraftDrill => 14,
            InputAction::Rotate => 15,
            InputAction::PickUpStructure => 16,
        }
    }
}

/// Key binding table. Arrow keys mirror WASD.
pub(crate) fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveNorth,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveSouth,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveEast,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveWest,
        KeyCode::KeyM => InputAction::Mine,
        KeyCode::Space => InputAction::Place,
        KeyCode::KeyH => InputAction::Harvest,
        KeyCode::BracketLeft => InputAction::CyclePrev,
        KeyCode::BracketRight => InputAction::CycleNext,
        KeyCode::KeyJ => InputAction::Drop,
        KeyCode::KeyF => InputAction::CraftFurnace,
        KeyCode::KeyB => InputAction::CraftBelt,
        KeyCode::KeyP => InputAction::CraftArm,
        KeyCode::KeyC => InputAction::CraftChest,
        KeyCode::KeyT => InputAction::CraftDrill,
        KeyCode::KeyR => InputAction::Rotate,
        KeyCode::Delete | KeyCode::Backspace => InputAction::PickUpStructure,
        _ => return None,
    };
    Some(action)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn clear_one_shots(&mut self) {
        for action in InputAction::ALL {
            if !action.is_level_triggered() {
                self.set(action, false);
            }
        }
    }

    pub(crate) fn any_one_shot_down(&self) -> bool {
        InputAction::ALL
            .iter()
            .any(|action| !action.is_level_triggered() && self.is_down(*action))
    }
}

/// Everything the simulation sees from the player for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
    hover_tile: Option<TilePos>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(actions: ActionStates, hover_tile: Option<TilePos>) -> Self {
        Self {
            actions,
            hover_tile,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn hover_tile(&self) -> Option<TilePos> {
        self.hover_tile
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_hover_tile(mut self, hover_tile: Option<TilePos>) -> Self {
        self.hover_tile = hover_tile;
        self
    }
}
