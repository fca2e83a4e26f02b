use std::time::{Duration, Instant};

use tracing::warn;

use super::interaction::InteractionMapper;
use super::Simulation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickPhase {
    Ready,
    InFlight,
}

/// Result of checking the fixed-rate clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickDue {
    NotYet,
    /// One tick should run now. `dropped` intervals elapsed during a stall and are skipped.
    Now { dropped: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Stepped,
    SkippedInFlight,
}

/// Fixed-rate step driver, independent of the render cadence. Runs at most one step per
/// poll and never replays intervals it missed.
#[derive(Debug)]
pub(crate) struct TickScheduler {
    interval: Duration,
    next_deadline: Instant,
    phase: TickPhase,
    ticks_run: u64,
    dropped_ticks: u64,
}

impl TickScheduler {
    pub(crate) fn new(target_tps: u32, start: Instant) -> Self {
        let interval = Duration::from_secs_f64(1.0 / target_tps.max(1) as f64);
        Self {
            interval,
            next_deadline: start + interval,
            phase: TickPhase::Ready,
            ticks_run: 0,
            dropped_ticks: 0,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    pub(crate) fn phase(&self) -> TickPhase {
        self.phase
    }

    pub(crate) fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    pub(crate) fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    pub(crate) fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub(crate) fn poll(&mut self, now: Instant) -> TickDue {
        if now < self.next_deadline {
            return TickDue::NotYet;
        }

        let late = now.saturating_duration_since(self.next_deadline);
        let missed = (late.as_nanos() / self.interval.as_nanos().max(1)) as u64;
        let advance = u32::try_from(missed.saturating_add(1)).unwrap_or(u32::MAX);
        self.next_deadline += self.interval.saturating_mul(advance);
        self.dropped_ticks = self.dropped_ticks.saturating_add(missed);
        TickDue::Now { dropped: missed }
    }

    /// Snapshot, single mutating call, then one-shot reset. The simulation never sees the
    /// mapper directly.
    pub(crate) fn run_tick(
        &mut self,
        mapper: &mut InteractionMapper,
        simulation: &mut dyn Simulation,
    ) -> TickOutcome {
        if self.phase == TickPhase::InFlight {
            warn!(ticks_run = self.ticks_run, "tick_skipped_in_flight");
            return TickOutcome::SkippedInFlight;
        }

        self.phase = TickPhase::InFlight;
        let snapshot = mapper.snapshot_for_tick();
        simulation.advance(&snapshot);
        mapper.clear_one_shots();
        debug_assert!(
            !mapper.one_shots_pending(),
            "one-shot input survived its tick"
        );
        self.ticks_run = self.ticks_run.saturating_add(1);
        self.phase = TickPhase::Ready;
        TickOutcome::Stepped
    }
}

#[cfg(test)]
mod tests {
    use winit::event::ElementState;
    use winit::keyboard::{KeyCode, PhysicalKey};

    use super::*;
    use crate::app::{
        InputAction, InputSnapshot, ItemKind, MapExtent, PlacedStructure, PlayerView,
        ResourceDeposit, StructureData, TileItem, TilePos, WaterPatch,
    };

    #[derive(Default)]
    struct RecordingSimulation {
        seen: Vec<InputSnapshot>,
    }

    impl Simulation for RecordingSimulation {
        fn advance(&mut self, input: &InputSnapshot) {
            self.seen.push(*input);
        }

        fn player(&self) -> PlayerView {
            PlayerView {
                tile: TilePos::new(0, 0),
                facing: Default::default(),
            }
        }

        fn map_extent(&self) -> MapExtent {
            MapExtent::default()
        }

        fn water_patches(&self) -> Vec<WaterPatch> {
            Vec::new()
        }

        fn resources(&self) -> Vec<ResourceDeposit> {
            Vec::new()
        }

        fn structures(&self) -> Vec<PlacedStructure> {
            Vec::new()
        }

        fn structure_data(&self, _tile: TilePos) -> Option<StructureData> {
            None
        }

        fn belt_items(&self) -> Vec<TileItem> {
            Vec::new()
        }

        fn dropped_items(&self) -> Vec<TileItem> {
            Vec::new()
        }

        fn inventory_count(&self, _item: ItemKind) -> u32 {
            0
        }

        fn available_items(&self) -> Vec<ItemKind> {
            Vec::new()
        }

        fn selected_item(&self) -> Option<ItemKind> {
            None
        }

        fn console_messages(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn press(mapper: &mut InteractionMapper, code: KeyCode) {
        mapper.handle_key(PhysicalKey::Code(code), ElementState::Pressed);
    }

    fn release(mapper: &mut InteractionMapper, code: KeyCode) {
        mapper.handle_key(PhysicalKey::Code(code), ElementState::Released);
    }

    #[test]
    fn one_shot_is_seen_by_exactly_one_tick() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(60, start);
        let mut mapper = InteractionMapper::new();
        let mut sim = RecordingSimulation::default();

        press(&mut mapper, KeyCode::KeyM);
        scheduler.run_tick(&mut mapper, &mut sim);
        scheduler.run_tick(&mut mapper, &mut sim);

        assert!(sim.seen[0].is_down(InputAction::Mine));
        assert!(!sim.seen[1].is_down(InputAction::Mine));
    }

    #[test]
    fn repeated_presses_before_a_tick_collapse_into_one_step() {
        let mut scheduler = TickScheduler::new(60, Instant::now());
        let mut mapper = InteractionMapper::new();
        let mut sim = RecordingSimulation::default();

        press(&mut mapper, KeyCode::KeyF);
        press(&mut mapper, KeyCode::KeyF);
        press(&mut mapper, KeyCode::KeyF);
        scheduler.run_tick(&mut mapper, &mut sim);
        scheduler.run_tick(&mut mapper, &mut sim);

        let crafted = sim
            .seen
            .iter()
            .filter(|snapshot| snapshot.is_down(InputAction::CraftFurnace))
            .count();
        assert_eq!(crafted, 1);
    }

    #[test]
    fn held_movement_persists_until_release() {
        let mut scheduler = TickScheduler::new(60, Instant::now());
        let mut mapper = InteractionMapper::new();
        let mut sim = RecordingSimulation::default();

        press(&mut mapper, KeyCode::KeyA);
        for _ in 0..5 {
            scheduler.run_tick(&mut mapper, &mut sim);
        }
        release(&mut mapper, KeyCode::KeyA);
        scheduler.run_tick(&mut mapper, &mut sim);

        assert!(sim.seen[..5]
            .iter()
            .all(|snapshot| snapshot.is_down(InputAction::MoveWest)));
        assert!(!sim.seen[5].is_down(InputAction::MoveWest));
        assert_eq!(scheduler.ticks_run(), 6);
    }

    #[test]
    fn hover_is_forwarded_with_the_snapshot() {
        let mut scheduler = TickScheduler::new(60, Instant::now());
        let mut mapper = InteractionMapper::new();
        let mut sim = RecordingSimulation::default();
        let config = crate::app::rendering::ViewportConfig::from_window(850, 540, 250, 140, 20);

        mapper.handle_pointer_moved(300.0, 200.0, TilePos::new(10, 10), &config);
        scheduler.run_tick(&mut mapper, &mut sim);

        assert_eq!(sim.seen[0].hover_tile(), Some(TilePos::new(10, 10)));
    }

    #[test]
    fn in_flight_entry_is_skipped() {
        let mut scheduler = TickScheduler::new(60, Instant::now());
        let mut mapper = InteractionMapper::new();
        let mut sim = RecordingSimulation::default();
        press(&mut mapper, KeyCode::KeyR);

        scheduler.phase = TickPhase::InFlight;
        let outcome = scheduler.run_tick(&mut mapper, &mut sim);

        assert_eq!(outcome, TickOutcome::SkippedInFlight);
        assert!(sim.seen.is_empty());
        assert!(mapper.one_shots_pending());
    }

    #[test]
    fn phase_returns_to_ready_after_a_step() {
        let mut scheduler = TickScheduler::new(60, Instant::now());
        let mut mapper = InteractionMapper::new();
        let mut sim = RecordingSimulation::default();
        assert_eq!(
            scheduler.run_tick(&mut mapper, &mut sim),
            TickOutcome::Stepped
        );
        assert_eq!(scheduler.phase(), TickPhase::Ready);
    }

    #[test]
    fn poll_waits_for_the_first_deadline() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(50, start);
        assert_eq!(scheduler.poll(start), TickDue::NotYet);
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(19)),
            TickDue::NotYet
        );
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(20)),
            TickDue::Now { dropped: 0 }
        );
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(21)),
            TickDue::NotYet
        );
    }

    #[test]
    fn stalled_intervals_are_dropped_not_replayed() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(50, start);

        // Deadline at 20ms; a poll at 95ms is 75ms late, so three intervals are lost.
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(95)),
            TickDue::Now { dropped: 3 }
        );
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(96)),
            TickDue::NotYet
        );
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(100)),
            TickDue::Now { dropped: 0 }
        );
        assert_eq!(scheduler.dropped_ticks(), 3);
    }

    #[test]
    fn sixty_tps_interval_is_one_sixtieth_of_a_second() {
        let scheduler = TickScheduler::new(60, Instant::now());
        assert!((scheduler.interval().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }
}
