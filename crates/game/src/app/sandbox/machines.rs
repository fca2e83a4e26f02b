use factory_view::{
    ChestData, Direction, DrillData, FurnaceData, ItemKind, StructureData, StructureKind,
    PROCESSING_CYCLE_TICKS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Smelt {
    IronPlate,
    CopperPlate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Furnace {
    state: FurnaceData,
    smelting: Option<Smelt>,
}

impl Furnace {
    pub(crate) fn accepts(item: ItemKind) -> bool {
        matches!(item, ItemKind::Coal | ItemKind::IronOre | ItemKind::Copper)
    }

    pub(crate) fn insert(&mut self, item: ItemKind) -> bool {
        let slot = match item {
            ItemKind::Coal => &mut self.state.coal,
            ItemKind::IronOre => &mut self.state.iron_ore,
            ItemKind::Copper => &mut self.state.copper,
            _ => return false,
        };
        *slot += 1;
        true
    }

    /// Iron is preferred when both ores are loaded.
    fn start_if_able(&mut self) {
        if self.state.processing_ticks_remaining > 0 || self.state.coal == 0 {
            return;
        }
        let smelt = if self.state.iron_ore > 0 {
            Smelt::IronPlate
        } else if self.state.copper > 0 {
            Smelt::CopperPlate
        } else {
            return;
        };
        self.smelting = Some(smelt);
        self.state.processing_ticks_remaining = PROCESSING_CYCLE_TICKS;
    }

    /// Advances one tick and returns the plate finished on this tick, if any.
    pub(crate) fn tick(&mut self) -> Option<ItemKind> {
        self.start_if_able();
        if self.state.processing_ticks_remaining == 0 {
            return None;
        }
        self.state.processing_ticks_remaining -= 1;
        if self.state.processing_ticks_remaining > 0 {
            return None;
        }

        let state = &mut self.state;
        let produced = match self.smelting.take()? {
            Smelt::IronPlate if state.coal > 0 && state.iron_ore > 0 => {
                state.iron_ore -= 1;
                state.iron_plate += 1;
                ItemKind::IronPlate
            }
            Smelt::CopperPlate if state.coal > 0 && state.copper > 0 => {
                state.copper -= 1;
                state.copper_plate += 1;
                ItemKind::CopperPlate
            }
            _ => return None,
        };
        state.coal -= 1;
        Some(produced)
    }

    /// Removes one finished plate, iron first.
    pub(crate) fn take_plate(&mut self) -> Option<ItemKind> {
        if self.state.iron_plate > 0 {
            self.state.iron_plate -= 1;
            Some(ItemKind::IronPlate)
        } else if self.state.copper_plate > 0 {
            self.state.copper_plate -= 1;
            Some(ItemKind::CopperPlate)
        } else {
            None
        }
    }

    fn contents(&self) -> Vec<(ItemKind, u32)> {
        vec![
            (ItemKind::Coal, self.state.coal),
            (ItemKind::IronOre, self.state.iron_ore),
            (ItemKind::IronPlate, self.state.iron_plate),
            (ItemKind::Copper, self.state.copper),
            (ItemKind::CopperPlate, self.state.copper_plate),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Chest {
    state: ChestData,
}

impl Chest {
    /// Stacks with an existing entry, otherwise appends in arrival order.
    pub(crate) fn insert(&mut self, item: ItemKind, quantity: u32) {
        match self.state.items.iter_mut().find(|(kind, _)| *kind == item) {
            Some((_, count)) => *count += quantity,
            None => self.state.items.push((item, quantity)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Drill {
    state: DrillData,
}

impl Drill {
    pub(crate) fn insert_coal(&mut self) {
        self.state.coal += 1;
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.state.processing_ticks_remaining == 0
    }

    pub(crate) fn start_if_able(&mut self) {
        if self.is_idle() && self.state.coal > 0 {
            self.state.processing_ticks_remaining = PROCESSING_CYCLE_TICKS;
        }
    }

    /// Returns true when a cycle finishes on this tick; each cycle burns one coal.
    pub(crate) fn tick(&mut self) -> bool {
        if self.state.processing_ticks_remaining == 0 {
            return false;
        }
        self.state.processing_ticks_remaining -= 1;
        if self.state.processing_ticks_remaining > 0 || self.state.coal == 0 {
            return false;
        }
        self.state.coal -= 1;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Machine {
    Furnace(Furnace),
    Chest(Chest),
    Drill(Drill),
    Belt,
    Arm,
}

impl Machine {
    pub(crate) fn for_kind(kind: StructureKind) -> Self {
        match kind {
            StructureKind::Furnace => Machine::Furnace(Furnace::default()),
            StructureKind::Chest => Machine::Chest(Chest::default()),
            StructureKind::Drill => Machine::Drill(Drill::default()),
            StructureKind::Belt => Machine::Belt,
            StructureKind::Arm => Machine::Arm,
        }
    }

    pub(crate) fn kind(&self) -> StructureKind {
        match self {
            Machine::Furnace(_) => StructureKind::Furnace,
            Machine::Chest(_) => StructureKind::Chest,
            Machine::Drill(_) => StructureKind::Drill,
            Machine::Belt => StructureKind::Belt,
            Machine::Arm => StructureKind::Arm,
        }
    }

    pub(crate) fn inspect(&self) -> Option<StructureData> {
        match self {
            Machine::Furnace(furnace) => Some(StructureData::Furnace(furnace.state)),
            Machine::Chest(chest) => Some(StructureData::Chest(chest.state.clone())),
            Machine::Drill(drill) => Some(StructureData::Drill(drill.state)),
            Machine::Belt | Machine::Arm => None,
        }
    }

    /// Whether an item arriving from a belt or drill would be taken in.
    pub(crate) fn accepts(&self, item: ItemKind) -> bool {
        match self {
            Machine::Furnace(_) => Furnace::accepts(item),
            Machine::Chest(_) => true,
            Machine::Drill(_) => item == ItemKind::Coal,
            Machine::Belt | Machine::Arm => false,
        }
    }

    /// Inserts one item if [`Machine::accepts`] allows it.
    pub(crate) fn insert(&mut self, item: ItemKind) -> bool {
        if !self.accepts(item) {
            return false;
        }
        match self {
            Machine::Furnace(furnace) => furnace.insert(item),
            Machine::Chest(chest) => {
                chest.insert(item, 1);
                true
            }
            Machine::Drill(drill) => {
                drill.insert_coal();
                true
            }
            Machine::Belt | Machine::Arm => false,
        }
    }

    /// Everything stored inside, returned to the player when the structure is picked up.
    pub(crate) fn contents(&self) -> Vec<(ItemKind, u32)> {
        let mut contents = match self {
            Machine::Furnace(furnace) => furnace.contents(),
            Machine::Chest(chest) => chest.state.items.clone(),
            Machine::Drill(drill) => vec![(ItemKind::Coal, drill.state.coal)],
            Machine::Belt | Machine::Arm => Vec::new(),
        };
        contents.retain(|(_, count)| *count > 0);
        contents
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Structure {
    pub(crate) facing: Direction,
    pub(crate) machine: Machine,
}

impl Structure {
    pub(crate) fn new(kind: StructureKind, facing: Direction) -> Self {
        Self {
            facing,
            machine: Machine::for_kind(kind),
        }
    }

    pub(crate) fn kind(&self) -> StructureKind {
        self.machine.kind()
    }

    /// Belts, arms and drills have a meaningful direction.
    pub(crate) fn is_rotatable(&self) -> bool {
        matches!(
            self.kind(),
            StructureKind::Belt | StructureKind::Arm | StructureKind::Drill
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(furnace: &mut Furnace, ticks: u32) -> Vec<ItemKind> {
        (0..ticks).filter_map(|_| furnace.tick()).collect()
    }

    #[test]
    fn furnace_without_coal_never_starts() {
        let mut furnace = Furnace::default();
        furnace.insert(ItemKind::IronOre);
        assert!(run_ticks(&mut furnace, 120).is_empty());
        assert_eq!(furnace.state.processing_ticks_remaining, 0);
    }

    #[test]
    fn furnace_smelts_iron_in_one_cycle() {
        let mut furnace = Furnace::default();
        furnace.insert(ItemKind::Coal);
        furnace.insert(ItemKind::IronOre);

        assert!(run_ticks(&mut furnace, PROCESSING_CYCLE_TICKS - 1).is_empty());
        assert_eq!(furnace.state.processing_ticks_remaining, 1);
        assert_eq!(furnace.tick(), Some(ItemKind::IronPlate));
        assert_eq!(furnace.state.coal, 0);
        assert_eq!(furnace.state.iron_plate, 1);
        assert_eq!(furnace.take_plate(), Some(ItemKind::IronPlate));
        assert_eq!(furnace.take_plate(), None);
    }

    #[test]
    fn furnace_falls_back_to_copper() {
        let mut furnace = Furnace::default();
        furnace.insert(ItemKind::Coal);
        furnace.insert(ItemKind::Copper);
        let produced = run_ticks(&mut furnace, PROCESSING_CYCLE_TICKS);
        assert_eq!(produced, vec![ItemKind::CopperPlate]);
    }

    #[test]
    fn furnace_rejects_other_items() {
        let mut machine = Machine::for_kind(StructureKind::Furnace);
        assert!(!machine.insert(ItemKind::Stone));
        assert!(machine.insert(ItemKind::Coal));
        assert_eq!(machine.contents(), vec![(ItemKind::Coal, 1)]);
    }

    #[test]
    fn drill_burns_one_coal_per_cycle() {
        let mut drill = Drill::default();
        drill.insert_coal();
        drill.start_if_able();
        let finished = (0..PROCESSING_CYCLE_TICKS).filter(|_| drill.tick()).count();
        assert_eq!(finished, 1);
        assert_eq!(drill.state.coal, 0);
        assert!(drill.is_idle());
    }

    #[test]
    fn chest_stacks_matching_items() {
        let mut chest = Chest::default();
        chest.insert(ItemKind::Stone, 2);
        chest.insert(ItemKind::Coal, 1);
        chest.insert(ItemKind::Stone, 3);
        assert_eq!(
            chest.state.items,
            vec![(ItemKind::Stone, 5), (ItemKind::Coal, 1)]
        );
    }

    #[test]
    fn only_storage_machines_are_inspectable() {
        assert!(Machine::for_kind(StructureKind::Belt).inspect().is_none());
        assert!(Machine::for_kind(StructureKind::Arm).inspect().is_none());
        assert!(matches!(
            Machine::for_kind(StructureKind::Chest).inspect(),
            Some(StructureData::Chest(_))
        ));
    }
}
