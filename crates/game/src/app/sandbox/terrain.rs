use std::collections::HashMap;

use factory_view::{MapExtent, ResourceDeposit, ResourceKind, TilePos, WaterPatch};

pub(crate) const MAP_WIDTH: u32 = 160;
pub(crate) const MAP_HEIGHT: u32 = 120;
const PLACEMENT_ATTEMPTS: u32 = 50;
const ANCHOR_SPACING_TILES: u32 = 3;
const WATER_PATCH_MAX_EDGE: u32 = 5;
const DEPOSIT_PATCH_MAX_EDGE: u32 = 4;
const DEPOSIT_ORDER: [ResourceKind; 4] = [
    ResourceKind::IronOre,
    ResourceKind::Copper,
    ResourceKind::Stone,
    ResourceKind::Coal,
];

/// Linear congruential generator. The same seed always yields the same map.
#[derive(Debug, Clone)]
pub(crate) struct Lcg {
    state: u64,
}

impl Lcg {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.state
    }

    /// Uniform-ish value in `0..bound`. The low bits of an LCG cycle quickly, so they are
    /// shifted away first.
    pub(crate) fn below(&mut self, bound: u32) -> u32 {
        ((self.next_u64() >> 16) % u64::from(bound.max(1))) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileBlock {
    origin: TilePos,
    width: u32,
    height: u32,
}

impl TileBlock {
    fn overlaps(&self, other: &TileBlock) -> bool {
        self.origin.x < other.origin.x + other.width
            && self.origin.x + self.width > other.origin.x
            && self.origin.y < other.origin.y + other.height
            && self.origin.y + self.height > other.origin.y
    }

    fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        (self.origin.x..self.origin.x + self.width).flat_map(move |x| {
            (self.origin.y..self.origin.y + self.height).map(move |y| TilePos::new(x, y))
        })
    }
}

impl From<WaterPatch> for TileBlock {
    fn from(patch: WaterPatch) -> Self {
        Self {
            origin: patch.origin,
            width: patch.width,
            height: patch.height,
        }
    }
}

/// Static ground layer: map bounds, water and resource deposits.
#[derive(Debug, Clone, Default)]
pub(crate) struct Terrain {
    extent: MapExtent,
    water: Vec<WaterPatch>,
    deposits: Vec<ResourceDeposit>,
    deposit_index: HashMap<TilePos, ResourceKind>,
}

impl Terrain {
    pub(crate) fn empty(width: u32, height: u32) -> Self {
        Self {
            extent: MapExtent { width, height },
            ..Self::default()
        }
    }

    /// 10-20 water patches, then 5-10 deposit patches per resource kind, never on water.
    pub(crate) fn generate(seed: u64) -> Self {
        let mut rng = Lcg::new(seed);
        let mut terrain = Self::empty(MAP_WIDTH, MAP_HEIGHT);
        let mut anchors = Vec::new();

        let water_count = 10 + rng.below(11);
        for _ in 0..water_count {
            if let Some(block) =
                terrain.pick_block(&mut rng, WATER_PATCH_MAX_EDGE, &anchors, false)
            {
                anchors.push(block.origin);
                terrain.add_water(WaterPatch {
                    origin: block.origin,
                    width: block.width,
                    height: block.height,
                });
            }
        }

        for kind in DEPOSIT_ORDER {
            let patch_count = 5 + rng.below(6);
            for _ in 0..patch_count {
                if let Some(block) =
                    terrain.pick_block(&mut rng, DEPOSIT_PATCH_MAX_EDGE, &anchors, true)
                {
                    anchors.push(block.origin);
                    for tile in block.tiles() {
                        terrain.add_deposit(tile, kind);
                    }
                }
            }
        }

        terrain
    }

    /// Random block inside the map, kept clear of earlier anchors while attempts remain.
    /// Once the budget is spent a crowded spot is accepted; a wet one never is when
    /// `avoid_water` is set.
    fn pick_block(
        &self,
        rng: &mut Lcg,
        max_edge: u32,
        anchors: &[TilePos],
        avoid_water: bool,
    ) -> Option<TileBlock> {
        for attempt in 0..=PLACEMENT_ATTEMPTS {
            let block = TileBlock {
                origin: TilePos::new(rng.below(self.extent.width), rng.below(self.extent.height)),
                width: 1 + rng.below(max_edge),
                height: 1 + rng.below(max_edge),
            };
            if block.origin.x + block.width > self.extent.width
                || block.origin.y + block.height > self.extent.height
            {
                continue;
            }
            if avoid_water
                && self
                    .water
                    .iter()
                    .any(|patch| TileBlock::from(*patch).overlaps(&block))
            {
                continue;
            }
            let crowded = anchors.iter().any(|anchor| {
                block.overlaps(&TileBlock {
                    origin: *anchor,
                    width: ANCHOR_SPACING_TILES,
                    height: ANCHOR_SPACING_TILES,
                })
            });
            if !crowded || attempt == PLACEMENT_ATTEMPTS {
                return Some(block);
            }
        }
        None
    }

    pub(crate) fn add_water(&mut self, patch: WaterPatch) {
        self.water.push(patch);
    }

    /// Ignored when the tile is wet or already holds a deposit.
    pub(crate) fn add_deposit(&mut self, tile: TilePos, kind: ResourceKind) {
        if self.is_water(tile) || self.deposit_index.contains_key(&tile) {
            return;
        }
        self.deposit_index.insert(tile, kind);
        self.deposits.push(ResourceDeposit { tile, kind });
    }

    pub(crate) fn extent(&self) -> MapExtent {
        self.extent
    }

    pub(crate) fn water(&self) -> &[WaterPatch] {
        &self.water
    }

    pub(crate) fn deposits(&self) -> &[ResourceDeposit] {
        &self.deposits
    }

    pub(crate) fn contains(&self, tile: TilePos) -> bool {
        tile.x < self.extent.width && tile.y < self.extent.height
    }

    pub(crate) fn is_water(&self, tile: TilePos) -> bool {
        self.water.iter().any(|patch| {
            tile.x >= patch.origin.x
                && tile.x < patch.origin.x + patch.width
                && tile.y >= patch.origin.y
                && tile.y < patch.origin.y + patch.height
        })
    }

    pub(crate) fn deposit_at(&self, tile: TilePos) -> Option<ResourceKind> {
        self.deposit_index.get(&tile).copied()
    }
}
