//! Read/advance boundary with the simulation that owns world truth.
//!
//! Everything the front-end draws comes through [`Simulation`] queries made fresh each frame;
//! the only mutation is [`Simulation::advance`], called once per fixed tick.

use super::InputSnapshot;

/// Number of ticks in one furnace/drill processing cycle.
pub const PROCESSING_CYCLE_TICKS: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    #[default]
    South,
    East,
    West,
}

impl Direction {
    pub const fn rotated_clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub const fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    IronOre,
    Copper,
    Stone,
    Coal,
}

impl ResourceKind {
    pub const fn item(self) -> ItemKind {
        match self {
            ResourceKind::IronOre => ItemKind::IronOre,
            ResourceKind::Copper => ItemKind::Copper,
            ResourceKind::Stone => ItemKind::Stone,
            ResourceKind::Coal => ItemKind::Coal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    IronOre,
    Copper,
    Stone,
    Coal,
    Furnace,
    IronPlate,
    Belt,
    CopperPlate,
    Arm,
    Chest,
    Drill,
}

impl ItemKind {
    pub const ALL: [ItemKind; 11] = [
        ItemKind::IronOre,
        ItemKind::Copper,
        ItemKind::Stone,
        ItemKind::Coal,
        ItemKind::Furnace,
        ItemKind::IronPlate,
        ItemKind::Belt,
        ItemKind::CopperPlate,
        ItemKind::Arm,
        ItemKind::Chest,
        ItemKind::Drill,
    ];

    pub const fn display_name(self) -> &'static str {
        match self {
            ItemKind::IronOre => "Iron Ore",
            ItemKind::Copper => "Copper",
            ItemKind::Stone => "Stone",
            ItemKind::Coal => "Coal",
            ItemKind::Furnace => "Furnace",
            ItemKind::IronPlate => "Iron Plate",
            ItemKind::Belt => "Belt",
            ItemKind::CopperPlate => "Copper Plate",
            ItemKind::Arm => "Arm",
            ItemKind::Chest => "Chest",
            ItemKind::Drill => "Drill",
        }
    }

    /// Structure this item turns into when placed, if any.
    pub const fn placeable(self) -> Option<StructureKind> {
        match self {
            ItemKind::Furnace => Some(StructureKind::Furnace),
            ItemKind::Belt => Some(StructureKind::Belt),
            ItemKind::Arm => Some(StructureKind::Arm),
            ItemKind::Chest => Some(StructureKind::Chest),
            ItemKind::Drill => Some(StructureKind::Drill),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Furnace,
    Belt,
    Arm,
    Chest,
    Drill,
}

impl StructureKind {
    /// Kinds that expose internal state through [`Simulation::structure_data`].
    pub const fn is_inspectable(self) -> bool {
        match self {
            StructureKind::Furnace | StructureKind::Chest | StructureKind::Drill => true,
            StructureKind::Belt | StructureKind::Arm => false,
        }
    }

    pub const fn item(self) -> ItemKind {
        match self {
            StructureKind::Furnace => ItemKind::Furnace,
            StructureKind::Belt => ItemKind::Belt,
            StructureKind::Arm => ItemKind::Arm,
            StructureKind::Chest => ItemKind::Chest,
            StructureKind::Drill => ItemKind::Drill,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    pub tile: TilePos,
    pub facing: Direction,
}

/// Map size in tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapExtent {
    pub width: u32,
    pub height: u32,
}

/// Axis-aligned block of water, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterPatch {
    pub origin: TilePos,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDeposit {
    pub tile: TilePos,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedStructure {
    pub tile: TilePos,
    pub kind: StructureKind,
    pub facing: Direction,
}

/// An item stack sitting on a tile, either riding a belt or dropped on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileItem {
    pub tile: TilePos,
    pub item: ItemKind,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FurnaceData {
    pub coal: u32,
    pub iron_ore: u32,
    pub iron_plate: u32,
    pub copper: u32,
    pub copper_plate: u32,
    pub processing_ticks_remaining: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChestData {
    pub items: Vec<(ItemKind, u32)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrillData {
    pub coal: u32,
    pub processing_ticks_remaining: u32,
}

/// Inspectable per-structure state, one variant per inspectable kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureData {
    Furnace(FurnaceData),
    Chest(ChestData),
    Drill(DrillData),
}

pub trait Simulation {
    /// Consumes exactly one input snapshot. Called once per fixed tick.
    fn advance(&mut self, input: &InputSnapshot);

    fn player(&self) -> PlayerView;
    fn map_extent(&self) -> MapExtent;
    fn water_patches(&self) -> Vec<WaterPatch>;
    fn resources(&self) -> Vec<ResourceDeposit>;
    fn structures(&self) -> Vec<PlacedStructure>;
    /// `None` when the tile holds nothing inspectable.
    fn structure_data(&self, tile: TilePos) -> Option<StructureData>;
    fn belt_items(&self) -> Vec<TileItem>;
    fn dropped_items(&self) -> Vec<TileItem>;
    fn inventory_count(&self, item: ItemKind) -> u32;
    /// Item kinds currently held, in display order.
    fn available_items(&self) -> Vec<ItemKind>;
    fn selected_item(&self) -> Option<ItemKind>;
    /// Recent messages, oldest first.
    fn console_messages(&self) -> Vec<String>;
}
