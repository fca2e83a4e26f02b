//! Frame and tick rates gathered by the loop and shared with whoever holds a [`MetricsHandle`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static POISON_REPORTED: AtomicBool = AtomicBool::new(false);

/// Takes the value out of a poisoned lock, logging the first time this happens.
fn recover<G>(poisoned: PoisonError<G>, operation: &'static str) -> G {
    if !POISON_REPORTED.swap(true, Ordering::Relaxed) {
        warn!(operation, "loop_metrics_lock_poisoned");
    }
    poisoned.into_inner()
}

/// Rates measured over one metrics interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_time_ms: f32,
    /// Tick deadlines skipped because the loop stalled past them.
    pub dropped_ticks: u64,
}

/// Cloneable read side of the loop metrics; the loop publishes, anyone may read.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self
            .latest
            .read()
            .unwrap_or_else(|poisoned| recover(poisoned, "read"))
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut latest = self
            .latest
            .write()
            .unwrap_or_else(|poisoned| recover(poisoned, "write"));
        *latest = snapshot;
    }
}

#[derive(Debug, Default)]
struct IntervalCounters {
    frames: u32,
    ticks: u32,
    dropped_ticks: u64,
    frame_time_total: Duration,
    frame_time_worst: Duration,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    started: Instant,
    counters: IntervalCounters,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Instant::now(),
            counters: IntervalCounters::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        let counters = &mut self.counters;
        counters.frames = counters.frames.saturating_add(1);
        counters.frame_time_total = counters.frame_time_total.saturating_add(frame_dt);
        counters.frame_time_worst = counters.frame_time_worst.max(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.counters.ticks = self.counters.ticks.saturating_add(1);
    }

    pub(crate) fn record_dropped_ticks(&mut self, dropped: u64) {
        self.counters.dropped_ticks = self.counters.dropped_ticks.saturating_add(dropped);
    }

    /// Closes the interval once it has run its length, returning its rates and starting a
    /// fresh one at `now`.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.interval {
            return None;
        }

        let counters = std::mem::take(&mut self.counters);
        self.started = now;

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match counters.frames {
            0 => 0.0,
            frames => counters.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        Some(LoopMetricsSnapshot {
            fps: counters.frames as f32 / seconds,
            tps: counters.ticks as f32 / seconds,
            frame_time_ms,
            worst_frame_time_ms: counters.frame_time_worst.as_secs_f32() * 1000.0,
            dropped_ticks: counters.dropped_ticks,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison(handle: &MetricsHandle) {
        let latest = Arc::clone(&handle.latest);
        let _ = thread::spawn(move || {
            let _guard = latest.write().expect("write guard");
            panic!("poison metrics lock");
        })
        .join();
    }

    #[test]
    fn interval_rates_cover_frames_ticks_and_drops() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let start = accumulator.started;

        accumulator.record_frame(Duration::from_millis(10));
        accumulator.record_frame(Duration::from_millis(30));
        for _ in 0..60 {
            accumulator.record_tick();
        }
        accumulator.record_dropped_ticks(3);

        let snapshot = accumulator
            .maybe_snapshot(start + Duration::from_secs(2))
            .expect("interval elapsed");
        assert!((snapshot.fps - 1.0).abs() < 0.01);
        assert!((snapshot.tps - 30.0).abs() < 0.01);
        assert!((snapshot.frame_time_ms - 20.0).abs() < 0.001);
        assert!((snapshot.worst_frame_time_ms - 30.0).abs() < 0.001);
        assert_eq!(snapshot.dropped_ticks, 3);
    }

    #[test]
    fn next_interval_starts_empty() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let start = accumulator.started;
        accumulator.record_frame(Duration::from_millis(50));
        accumulator.record_dropped_ticks(2);
        accumulator
            .maybe_snapshot(start + Duration::from_secs(1))
            .expect("first interval");

        let second = accumulator
            .maybe_snapshot(start + Duration::from_secs(2))
            .expect("second interval");
        assert_eq!(second, LoopMetricsSnapshot::default());
    }

    #[test]
    fn short_interval_yields_nothing() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_millis(500));
        let start = accumulator.started;
        accumulator.record_tick();
        assert!(accumulator
            .maybe_snapshot(start + Duration::from_millis(499))
            .is_none());
    }

    #[test]
    fn poisoned_handle_still_reads_and_publishes() {
        let handle = MetricsHandle::default();
        poison(&handle);
        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());

        let published = LoopMetricsSnapshot {
            fps: 58.0,
            tps: 60.0,
            frame_time_ms: 17.2,
            worst_frame_time_ms: 40.0,
            dropped_ticks: 1,
        };
        handle.publish(published);
        assert_eq!(handle.snapshot(), published);
    }
}
