//! Built-in stand-in simulation so the front-end runs without an external engine.

mod machines;
mod terrain;

use std::collections::{HashMap, VecDeque};

use factory_view::{
    Direction, InputAction, InputSnapshot, ItemKind, MapExtent, PlacedStructure, PlayerView,
    ResourceDeposit, Simulation, StructureData, StructureKind, TileItem, TilePos, WaterPatch,
};
use tracing::{debug, info};

use machines::{Machine, Structure};
use terrain::Terrain;

pub(crate) const DEFAULT_SEED: u64 = 0x5eed_f00d;
const STARTING_STACK: u32 = 50;
const CONSOLE_HISTORY: usize = 50;
/// A held movement key moves the player every second tick.
const MOVE_INTERVAL_TICKS: u32 = 2;
const BELT_STEP_TICKS: u64 = 30;

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// One-shot actions in the order they are resolved within a tick.
const ONE_SHOT_ORDER: [InputAction; 13] = [
    InputAction::Mine,
    InputAction::CraftFurnace,
    InputAction::CraftBelt,
    InputAction::CraftArm,
    InputAction::CraftChest,
    InputAction::CraftDrill,
    InputAction::Place,
    InputAction::CyclePrev,
    InputAction::CycleNext,
    InputAction::Harvest,
    InputAction::Drop,
    InputAction::Rotate,
    InputAction::PickUpStructure,
];

struct Recipe {
    result: ItemKind,
    ingredient: ItemKind,
    amount: u32,
}

const RECIPES: [Recipe; 5] = [
    Recipe {
        result: ItemKind::Furnace,
        ingredient: ItemKind::Stone,
        amount: 5,
    },
    Recipe {
        result: ItemKind::Belt,
        ingredient: ItemKind::IronPlate,
        amount: 1,
    },
    Recipe {
        result: ItemKind::Arm,
        ingredient: ItemKind::CopperPlate,
        amount: 1,
    },
    Recipe {
        result: ItemKind::Chest,
        ingredient: ItemKind::IronPlate,
        amount: 1,
    },
    Recipe {
        result: ItemKind::Drill,
        ingredient: ItemKind::IronOre,
        amount: 5,
    },
];

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::North => "North",
        Direction::South => "South",
        Direction::East => "East",
        Direction::West => "West",
    }
}

fn lower_name(item: ItemKind) -> String {
    item.display_name().to_lowercase()
}

#[derive(Debug, Clone, Default)]
struct Inventory {
    counts: HashMap<ItemKind, u32>,
}

impl Inventory {
    fn count(&self, item: ItemKind) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    fn add(&mut self, item: ItemKind, quantity: u32) {
        *self.counts.entry(item).or_insert(0) += quantity;
    }

    fn remove(&mut self, item: ItemKind, quantity: u32) -> bool {
        match self.counts.get_mut(&item) {
            Some(count) if *count >= quantity => {
                *count -= quantity;
                true
            }
            _ => false,
        }
    }

    fn available(&self) -> Vec<ItemKind> {
        ItemKind::ALL
            .into_iter()
            .filter(|item| self.count(*item) > 0)
            .collect()
    }
}

pub(crate) struct SandboxWorld {
    terrain: Terrain,
    player: PlayerView,
    inventory: Inventory,
    selected: Option<ItemKind>,
    structures: Vec<(TilePos, Structure)>,
    belt_items: Vec<TileItem>,
    dropped_items: Vec<TileItem>,
    console: VecDeque<String>,
    cursor: Option<TilePos>,
    tick: u64,
    move_cooldown: u32,
}

impl SandboxWorld {
    pub(crate) fn generate(seed: u64) -> Self {
        let terrain = Terrain::generate(seed);
        info!(
            seed,
            water_patches = terrain.water().len(),
            deposits = terrain.deposits().len(),
            "sandbox_generated"
        );
        let extent = terrain.extent();
        let start = TilePos::new(extent.width / 2, extent.height / 2);
        Self::with_terrain(terrain, start)
    }

    fn with_terrain(terrain: Terrain, start: TilePos) -> Self {
        let mut inventory = Inventory::default();
        for item in ItemKind::ALL {
            inventory.add(item, STARTING_STACK);
        }
        let mut world = Self {
            terrain,
            player: PlayerView {
                tile: start,
                facing: Direction::South,
            },
            inventory,
            selected: None,
            structures: Vec::new(),
            belt_items: Vec::new(),
            dropped_items: Vec::new(),
            console: VecDeque::with_capacity(CONSOLE_HISTORY),
            cursor: None,
            tick: 0,
            move_cooldown: 0,
        };
        world.validate_selection();
        world
    }

    fn log(&mut self, message: impl Into<String>) {
        if self.console.len() == CONSOLE_HISTORY {
            self.console.pop_front();
        }
        self.console.push_back(message.into());
    }

    /// Keeps the selection on a held item, falling back to the first one held.
    fn validate_selection(&mut self) {
        let available = self.inventory.available();
        let still_held = self
            .selected
            .is_some_and(|selected| available.contains(&selected));
        if !still_held {
            self.selected = available.first().copied();
        }
    }

    fn structure_index(&self, tile: TilePos) -> Option<usize> {
        self.structures.iter().position(|(at, _)| *at == tile)
    }

    fn structure_at(&self, tile: TilePos) -> Option<&Structure> {
        self.structure_index(tile).map(|index| &self.structures[index].1)
    }

    fn neighbor(&self, tile: TilePos, direction: Direction) -> Option<TilePos> {
        let next = match direction {
            Direction::North => TilePos::new(tile.x, tile.y.checked_sub(1)?),
            Direction::South => TilePos::new(tile.x, tile.y + 1),
            Direction::East => TilePos::new(tile.x + 1, tile.y),
            Direction::West => TilePos::new(tile.x.checked_sub(1)?, tile.y),
        };
        self.terrain.contains(next).then_some(next)
    }

    /// Hovered tile when there is one, otherwise the tile the player faces.
    fn target_tile(&self) -> Option<TilePos> {
        self.cursor
            .or_else(|| self.neighbor(self.player.tile, self.player.facing))
    }

    fn is_blocked(&self, tile: TilePos) -> bool {
        self.terrain.is_water(tile) || self.structure_at(tile).is_some()
    }

    fn step_movement(&mut self, input: &InputSnapshot) {
        if self.move_cooldown > 0 {
            self.move_cooldown -= 1;
            return;
        }

        let extent = self.terrain.extent();
        let mut tile = self.player.tile;
        let mut facing = self.player.facing;
        let mut moved = false;
        if input.is_down(InputAction::MoveNorth) && tile.y > 0 {
            tile.y -= 1;
            facing = Direction::North;
            moved = true;
        }
        if input.is_down(InputAction::MoveSouth) && tile.y + 1 < extent.height {
            tile.y += 1;
            facing = Direction::South;
            moved = true;
        }
        if input.is_down(InputAction::MoveWest) && tile.x > 0 {
            tile.x -= 1;
            facing = Direction::West;
            moved = true;
        }
        if input.is_down(InputAction::MoveEast) && tile.x + 1 < extent.width {
            tile.x += 1;
            facing = Direction::East;
            moved = true;
        }

        if moved && !self.is_blocked(tile) {
            self.player = PlayerView { tile, facing };
            self.move_cooldown = MOVE_INTERVAL_TICKS - 1;
        }
    }

    fn apply_action(&mut self, action: InputAction) {
        match action {
            InputAction::Mine => self.mine(),
            InputAction::CraftFurnace => self.craft(ItemKind::Furnace),
            InputAction::CraftBelt => self.craft(ItemKind::Belt),
            InputAction::CraftArm => self.craft(ItemKind::Arm),
            InputAction::CraftChest => self.craft(ItemKind::Chest),
            InputAction::CraftDrill => self.craft(ItemKind::Drill),
            InputAction::Place => self.place_or_insert(),
            InputAction::CyclePrev => self.cycle_selection(false),
            InputAction::CycleNext => self.cycle_selection(true),
            InputAction::Harvest => self.harvest(),
            InputAction::Drop => self.drop_selected(),
            InputAction::Rotate => self.rotate(),
            InputAction::PickUpStructure => self.pick_up_structure(),
            InputAction::MoveNorth
            | InputAction::MoveSouth
            | InputAction::MoveEast
            | InputAction::MoveWest => {}
        }
    }

    fn mine(&mut self) {
        let origin = self.player.tile;
        let found = NEIGHBOR_OFFSETS.iter().find_map(|(dx, dy)| {
            let x = u32::try_from(i64::from(origin.x) + dx).ok()?;
            let y = u32::try_from(i64::from(origin.y) + dy).ok()?;
            let tile = TilePos::new(x, y);
            if !self.terrain.contains(tile) {
                return None;
            }
            self.terrain.deposit_at(tile)
        });
        let Some(kind) = found else {
            return;
        };

        let item = kind.item();
        self.inventory.add(item, 1);
        self.validate_selection();
        let total = self.inventory.count(item);
        self.log(format!("Mined {}! Total: {total}", item.display_name()));
    }

    fn craft(&mut self, result: ItemKind) {
        let Some(recipe) = RECIPES.iter().find(|recipe| recipe.result == result) else {
            return;
        };
        let have = self.inventory.count(recipe.ingredient);
        if have < recipe.amount {
            self.log(format!(
                "Not enough resources! Need {} {} (have {have})",
                recipe.amount,
                recipe.ingredient.display_name()
            ));
            return;
        }
        self.inventory.remove(recipe.ingredient, recipe.amount);
        self.inventory.add(result, 1);
        self.validate_selection();
        self.log(format!("Crafted {}!", result.display_name()));
    }

    fn place_or_insert(&mut self) {
        let target = self.target_tile();
        let container = target.filter(|tile| {
            self.structure_at(*tile)
                .is_some_and(|structure| structure.kind().is_inspectable())
        });
        match container {
            Some(tile) => self.insert_into(tile),
            None => self.place(target),
        }
    }

    fn insert_into(&mut self, tile: TilePos) {
        let Some(item) = self.selected else {
            self.log("No item selected!");
            return;
        };
        let Some(index) = self.structure_index(tile) else {
            return;
        };
        let kind = self.structures[index].1.kind();
        if !self.structures[index].1.machine.accepts(item) {
            let refusal = match kind {
                StructureKind::Drill => "Drill only accepts coal!",
                _ => "Furnace only accepts coal, iron ore, or copper!",
            };
            self.log(refusal);
            return;
        }
        if !self.inventory.remove(item, 1) {
            self.log(format!("No {} in inventory!", lower_name(item)));
            return;
        }
        self.structures[index].1.machine.insert(item);
        self.validate_selection();
        let message = match kind {
            StructureKind::Chest => format!("Added {} to chest!", item.display_name()),
            _ => format!("Added {} to {}!", lower_name(item), lower_name(kind.item())),
        };
        self.log(message);
    }

    fn place(&mut self, target: Option<TilePos>) {
        let Some(tile) = target else {
            self.log("Cannot place outside map bounds!");
            return;
        };
        let Some(item) = self.selected else {
            self.log("No item selected!");
            return;
        };
        let Some(kind) = item.placeable() else {
            self.log("Selected item cannot be placed!");
            return;
        };
        if self.inventory.count(item) == 0 {
            self.log(format!("No {} in inventory!", lower_name(item)));
            return;
        }
        if self.terrain.is_water(tile) {
            self.log("Cannot place on water!");
            return;
        }
        if self.structure_at(tile).is_some() {
            self.log("Position already occupied!");
            return;
        }
        if kind != StructureKind::Drill && self.terrain.deposit_at(tile).is_some() {
            self.log("Cannot place on resource!");
            return;
        }

        self.inventory.remove(item, 1);
        self.validate_selection();
        self.structures
            .push((tile, Structure::new(kind, self.player.facing)));
        debug!(x = tile.x, y = tile.y, kind = ?kind, "structure_placed");
        self.log(format!("Placed {}!", lower_name(item)));
    }

    fn cycle_selection(&mut self, forward: bool) {
        let available = self.inventory.available();
        if available.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .and_then(|selected| available.iter().position(|item| *item == selected))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % available.len()
        } else {
            current.checked_sub(1).unwrap_or(available.len() - 1)
        };
        self.selected = Some(available[next]);
    }

    fn harvest(&mut self) {
        let Some(tile) = self.target_tile() else {
            return;
        };

        if let Some(index) = self.belt_items.iter().position(|item| item.tile == tile) {
            let picked = self.belt_items.remove(index);
            self.inventory.add(picked.item, picked.quantity);
            self.validate_selection();
            self.log(format!(
                "Picked up {} {} from belt!",
                picked.quantity,
                picked.item.display_name()
            ));
            return;
        }

        if let Some(index) = self.dropped_items.iter().position(|item| item.tile == tile) {
            let picked = self.dropped_items.remove(index);
            self.inventory.add(picked.item, picked.quantity);
            self.validate_selection();
            self.log(format!(
                "Picked up {} {}!",
                picked.quantity,
                picked.item.display_name()
            ));
            return;
        }

        let Some(index) = self.structure_index(tile) else {
            return;
        };
        let Machine::Furnace(furnace) = &mut self.structures[index].1.machine else {
            return;
        };
        match furnace.take_plate() {
            Some(plate) => {
                self.inventory.add(plate, 1);
                self.validate_selection();
                self.log(format!("Harvested {}!", lower_name(plate)));
            }
            None => self.log("No plates in furnace!"),
        }
    }

    fn drop_selected(&mut self) {
        let Some(tile) = self.target_tile() else {
            self.log("Cannot drop outside map bounds!");
            return;
        };
        if self.terrain.is_water(tile) {
            self.log("Cannot drop on water!");
            return;
        }
        let on_kind = self.structure_at(tile).map(Structure::kind);
        match on_kind {
            Some(StructureKind::Furnace | StructureKind::Chest) => {
                self.log("Cannot drop on furnace or chest!");
                return;
            }
            Some(StructureKind::Arm | StructureKind::Drill) => {
                self.log("Position already occupied!");
                return;
            }
            Some(StructureKind::Belt) | None => {}
        }
        let Some(item) = self.selected else {
            self.log("No item selected!");
            return;
        };
        if self.inventory.count(item) == 0 {
            self.log("No items to drop!");
            return;
        }

        if on_kind == Some(StructureKind::Belt) {
            if self.belt_items.iter().any(|existing| existing.tile == tile) {
                self.log("Belt already has an item!");
                return;
            }
            self.inventory.remove(item, 1);
            self.belt_items.push(TileItem {
                tile,
                item,
                quantity: 1,
            });
            self.validate_selection();
            self.log(format!("Placed 1 {} on belt!", item.display_name()));
            return;
        }

        match self.dropped_items.iter_mut().find(|existing| existing.tile == tile) {
            Some(existing) if existing.item != item => {
                self.log("Cannot drop on different item!");
                return;
            }
            Some(existing) => existing.quantity += 1,
            None => self.dropped_items.push(TileItem {
                tile,
                item,
                quantity: 1,
            }),
        }
        self.inventory.remove(item, 1);
        self.validate_selection();
        self.log(format!("Dropped 1 {}!", item.display_name()));
    }

    fn rotate(&mut self) {
        let Some(index) = self.target_tile().and_then(|tile| self.structure_index(tile)) else {
            return;
        };
        let structure = &mut self.structures[index].1;
        if !structure.is_rotatable() {
            return;
        }
        structure.facing = structure.facing.rotated_clockwise();
        let message = format!(
            "Rotated {} to {}!",
            lower_name(structure.kind().item()),
            direction_name(structure.facing)
        );
        self.log(message);
    }

    fn pick_up_structure(&mut self) {
        let Some(tile) = self.target_tile() else {
            return;
        };
        let Some(index) = self.structure_index(tile) else {
            self.log("Nothing to pick up here!");
            return;
        };
        let (_, structure) = self.structures.remove(index);
        let kind = structure.kind();
        self.inventory.add(kind.item(), 1);
        let contents = structure.machine.contents();
        for (item, count) in &contents {
            self.inventory.add(*item, *count);
        }
        if let Some(position) = self.belt_items.iter().position(|item| item.tile == tile) {
            let riding = self.belt_items.remove(position);
            self.inventory.add(riding.item, riding.quantity);
        }
        self.validate_selection();

        let name = lower_name(kind.item());
        if kind.is_inspectable() {
            self.log(format!("Picked up {name} with all contents!"));
        } else {
            self.log(format!("Picked up {name}!"));
        }
    }

    fn step_furnaces(&mut self) {
        let mut produced = Vec::new();
        for (tile, structure) in &mut self.structures {
            if let Machine::Furnace(furnace) = &mut structure.machine {
                if let Some(plate) = furnace.tick() {
                    produced.push((*tile, plate));
                }
            }
        }
        for (tile, plate) in produced {
            let article = if plate == ItemKind::IronPlate { "an" } else { "a" };
            self.log(format!(
                "Furnace at ({}, {}) produced {article} {}!",
                tile.x,
                tile.y,
                lower_name(plate)
            ));
        }
    }

    /// Every belt step, items advance one tile along their belt into an empty belt or a
    /// machine that accepts them; anything else leaves them where they are.
    fn step_belts(&mut self) {
        if self.tick % BELT_STEP_TICKS != 0 {
            return;
        }

        for index in 0..self.belt_items.len() {
            let current = self.belt_items[index];
            let Some(facing) = self
                .structure_at(current.tile)
                .filter(|structure| structure.kind() == StructureKind::Belt)
                .map(|structure| structure.facing)
            else {
                continue;
            };
            let Some(next) = self.neighbor(current.tile, facing) else {
                continue;
            };
            let Some(next_index) = self.structure_index(next) else {
                continue;
            };
            let machine = &mut self.structures[next_index].1.machine;
            if *machine == Machine::Belt {
                if !self.belt_items.iter().any(|item| item.tile == next) {
                    self.belt_items[index].tile = next;
                }
            } else if current.quantity == 1 && machine.insert(current.item) {
                self.belt_items[index].quantity = 0;
            }
        }
        self.belt_items.retain(|item| item.quantity > 0);
    }

    /// Drills sitting on ore, copper or coal push one item per cycle into the tile they face.
    fn step_drills(&mut self) {
        for index in 0..self.structures.len() {
            let (tile, facing) = {
                let (tile, structure) = &self.structures[index];
                (*tile, structure.facing)
            };
            let Machine::Drill(drill) = &self.structures[index].1.machine else {
                continue;
            };
            let output = self
                .terrain
                .deposit_at(tile)
                .map(|kind| kind.item())
                .filter(|item| *item != ItemKind::Stone);
            let target = self.neighbor(tile, facing);

            if drill.is_idle() {
                let ready = match (output, target) {
                    (Some(item), Some(target)) => self.can_receive(target, item),
                    _ => false,
                };
                if !ready {
                    continue;
                }
                if let Machine::Drill(drill) = &mut self.structures[index].1.machine {
                    drill.start_if_able();
                }
            }

            let finished = match &mut self.structures[index].1.machine {
                Machine::Drill(drill) => drill.tick(),
                _ => false,
            };
            if let (true, Some(item), Some(target)) = (finished, output, target) {
                self.deliver(target, item);
            }
        }
    }

    fn can_receive(&self, tile: TilePos, item: ItemKind) -> bool {
        if self.terrain.is_water(tile) {
            return false;
        }
        match self.structure_at(tile) {
            Some(structure) if structure.machine == Machine::Belt => {
                !self.belt_items.iter().any(|riding| riding.tile == tile)
            }
            Some(structure) => structure.machine.accepts(item),
            None => !self.dropped_items.iter().any(|dropped| dropped.tile == tile),
        }
    }

    fn deliver(&mut self, tile: TilePos, item: ItemKind) {
        if !self.can_receive(tile, item) {
            return;
        }
        let single = TileItem {
            tile,
            item,
            quantity: 1,
        };
        match self.structure_index(tile) {
            Some(index) if self.structures[index].1.machine == Machine::Belt => {
                self.belt_items.push(single);
            }
            Some(index) => {
                self.structures[index].1.machine.insert(item);
            }
            None => self.dropped_items.push(single),
        }
    }
}

impl Simulation for SandboxWorld {
    fn advance(&mut self, input: &InputSnapshot) {
        self.tick += 1;
        self.cursor = input
            .hover_tile()
            .filter(|tile| self.terrain.contains(*tile));

        self.step_movement(input);
        for action in ONE_SHOT_ORDER {
            if input.is_down(action) {
                self.apply_action(action);
            }
        }
        self.step_furnaces();
        self.step_belts();
        self.step_drills();
    }

    fn player(&self) -> PlayerView {
        self.player
    }

    fn map_extent(&self) -> MapExtent {
        self.terrain.extent()
    }

    fn water_patches(&self) -> Vec<WaterPatch> {
        self.terrain.water().to_vec()
    }

    fn resources(&self) -> Vec<ResourceDeposit> {
        self.terrain.deposits().to_vec()
    }

    fn structures(&self) -> Vec<PlacedStructure> {
        self.structures
            .iter()
            .map(|(tile, structure)| PlacedStructure {
                tile: *tile,
                kind: structure.kind(),
                facing: structure.facing,
            })
            .collect()
    }

    fn structure_data(&self, tile: TilePos) -> Option<StructureData> {
        self.structure_at(tile)?.machine.inspect()
    }

    fn belt_items(&self) -> Vec<TileItem> {
        self.belt_items.clone()
    }

    fn dropped_items(&self) -> Vec<TileItem> {
        self.dropped_items.clone()
    }

    fn inventory_count(&self, item: ItemKind) -> u32 {
        self.inventory.count(item)
    }

    fn available_items(&self) -> Vec<ItemKind> {
        self.inventory.available()
    }

    fn selected_item(&self) -> Option<ItemKind> {
        self.selected
    }

    fn console_messages(&self) -> Vec<String> {
        self.console.iter().cloned().collect()
    }
}
