use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::{resolve_app_paths, StartupError};

use super::interaction::{InteractionMapper, KeyDisposition};
use super::metrics::MetricsAccumulator;
use super::rendering::{load_sprite, AssetError, PanelLayout, Renderer, StructureArt};
use super::scheduler::{TickDue, TickOutcome, TickScheduler};
use super::{MetricsHandle, Simulation};

pub const RENDER_FPS_CAP_ENV_VAR: &str = "FACTORY_VIEW_RENDER_FPS_CAP";
const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub side_panel_width: u32,
    pub bottom_panel_height: u32,
    pub tile_size: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    /// Relative to the assets directory.
    pub furnace_sprite: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Factory".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            side_panel_width: 250,
            bottom_panel_height: 140,
            tile_size: super::rendering::DEFAULT_TILE_SIZE_PX,
            metrics_log_interval: DEFAULT_METRICS_INTERVAL,
            max_render_fps: None,
            furnace_sprite: PathBuf::from("sprites").join("furnace.png"),
        }
    }
}

impl LoopConfig {
    fn panel_layout(&self) -> PanelLayout {
        PanelLayout {
            side_panel_width: self.side_panel_width,
            bottom_panel_height: self.bottom_panel_height,
            tile_size: self.tile_size.max(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("cannot start the window event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("cannot open the factory window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("cannot create the frame buffer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("window event loop stopped with an error: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, simulation: Box<dyn Simulation>) -> Result<(), AppError> {
    run_app_with_metrics(config, simulation, MetricsHandle::default())
}

/// Opens the window and drives ticks and frames until shutdown. All fallible setup happens
/// before the event loop starts, so a startup failure never leaves a half-running loop.
pub fn run_app_with_metrics(
    config: LoopConfig,
    mut simulation: Box<dyn Simulation>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );
    let furnace_sprite = load_sprite(&app_paths.assets_dir.join(&config.furnace_sprite))?;
    info!(
        width = furnace_sprite.width(),
        height = furnace_sprite.height(),
        "furnace_sprite_loaded"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let art = StructureArt {
        furnace: Some(furnace_sprite),
    };
    let mut renderer = Renderer::new(Arc::clone(&window), config.panel_layout(), art)
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Wait);

    let metrics_log_interval = Some(config.metrics_log_interval)
        .filter(|interval| !interval.is_zero())
        .unwrap_or(DEFAULT_METRICS_INTERVAL);
    let render_cap = resolve_render_fps_cap(config.max_render_fps);
    let mut scheduler = TickScheduler::new(config.target_tps, Instant::now());
    let mut pacer = FramePacer::new(render_cap, scheduler.interval(), Instant::now());
    let mut redraw_pending = false;
    let mut mapper = InteractionMapper::new();
    let mut last_player_tile = simulation.player().tile;

    info!(
        target_tps = config.target_tps.max(1),
        tick_interval_us = scheduler.interval().as_micros() as u64,
        tile_size = config.tile_size,
        side_panel_width = config.side_panel_width,
        bottom_panel_height = config.bottom_panel_height,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %cap_label(render_cap),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    mapper.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    renderer.request_resize(new_size.width, new_size.height);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    renderer.request_resize(size.width, size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    mapper.handle_pointer_moved(
                        position.x as f32,
                        position.y as f32,
                        last_player_tile,
                        renderer.viewport_config(),
                    );
                }
                WindowEvent::CursorLeft { .. } => {
                    mapper.handle_pointer_left();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if mapper.handle_keyboard_input(&event) == KeyDisposition::Ignored {
                        trace!(key = ?event.physical_key, state = ?event.state, "key_ignored");
                    }
                    if mapper.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    match renderer.render(simulation.as_ref(), mapper.hover_tile()) {
                        Ok(Some(player)) => last_player_tile = player.tile,
                        Ok(None) => {}
                        Err(error) => {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                    }
                    pacer.mark_presented(now);
                    redraw_pending = false;
                    metrics_accumulator.record_frame(frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_time_ms = snapshot.worst_frame_time_ms,
                            dropped_ticks = snapshot.dropped_ticks,
                            ticks_run = scheduler.ticks_run(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let plan = plan_wake(&mut scheduler, &pacer, redraw_pending, Instant::now());
                if let TickDue::Now { dropped } = plan.tick {
                    if dropped > 0 {
                        debug!(
                            dropped,
                            total_dropped = scheduler.dropped_ticks(),
                            "tick_deadlines_dropped"
                        );
                        metrics_accumulator.record_dropped_ticks(dropped);
                    }
                    if scheduler.run_tick(&mut mapper, simulation.as_mut()) == TickOutcome::Stepped
                    {
                        metrics_accumulator.record_tick();
                    }
                }
                if plan.redraw {
                    redraw_pending = true;
                    window.request_redraw();
                }
                window_target.set_control_flow(ControlFlow::WaitUntil(plan.wake_at));
            }
            Event::LoopExiting => {
                info!(
                    ticks_run = scheduler.ticks_run(),
                    dropped_ticks = scheduler.dropped_ticks(),
                    "shutdown"
                );
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Tracks when the next frame may be presented. Without a render cap, frames follow the
/// tick interval so the display never outpaces what the simulation can change.
#[derive(Debug)]
struct FramePacer {
    min_frame_time: Duration,
    last_present: Instant,
}

impl FramePacer {
    fn new(render_cap: Option<u32>, tick_interval: Duration, now: Instant) -> Self {
        let min_frame_time = render_cap
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_nanos(1_000_000_000 / u64::from(fps)))
            .unwrap_or(tick_interval);
        Self {
            min_frame_time,
            last_present: now,
        }
    }

    fn next_slot(&self) -> Instant {
        self.last_present + self.min_frame_time
    }

    fn frame_due(&self, now: Instant) -> bool {
        now >= self.next_slot()
    }

    /// `frame_start` is when the frame began, so slow presents do not stretch the cadence.
    fn mark_presented(&mut self, frame_start: Instant) {
        self.last_present = frame_start;
    }
}

/// What the loop does on one wake-up: at most one tick, maybe a redraw, then sleep until the
/// earlier of the next tick deadline and the next frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WakePlan {
    tick: TickDue,
    redraw: bool,
    wake_at: Instant,
}

/// Ticks are served on every wake, independent of presents, so a slow frame cadence never
/// slows the simulation down.
fn plan_wake(
    scheduler: &mut TickScheduler,
    pacer: &FramePacer,
    redraw_pending: bool,
    now: Instant,
) -> WakePlan {
    let tick = scheduler.poll(now);
    let redraw = !redraw_pending && pacer.frame_due(now);
    let wake_at = if redraw_pending || redraw {
        scheduler.next_deadline()
    } else {
        scheduler.next_deadline().min(pacer.next_slot())
    };
    WakePlan {
        tick,
        redraw,
        wake_at,
    }
}

fn cap_label(render_cap: Option<u32>) -> String {
    render_cap.map_or_else(|| "off".to_string(), |fps| fps.to_string())
}

fn resolve_render_fps_cap(config_cap: Option<u32>) -> Option<u32> {
    let raw = match env::var(RENDER_FPS_CAP_ENV_VAR) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var = RENDER_FPS_CAP_ENV_VAR,
                error = %err,
                "render_cap_env_unreadable"
            );
            None
        }
    };
    render_fps_cap_from(raw.as_deref(), config_cap)
}

/// `0` and `off` disable the cap; anything unparseable falls back to the configured value.
fn render_fps_cap_from(raw: Option<&str>, config_cap: Option<u32>) -> Option<u32> {
    let configured = config_cap.filter(|fps| *fps > 0);
    let Some(value) = raw.map(str::trim) else {
        return configured;
    };
    if value.eq_ignore_ascii_case("off") {
        return None;
    }
    match value.parse::<u32>() {
        Ok(fps) => Some(fps).filter(|fps| *fps > 0),
        Err(_) => {
            warn!(
                env_var = RENDER_FPS_CAP_ENV_VAR,
                value, "render_cap_env_invalid"
            );
            configured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_nanos(16_666_667);

    #[test]
    fn uncapped_pacer_follows_the_tick_interval() {
        let start = Instant::now();
        let pacer = FramePacer::new(None, TICK, start);
        assert_eq!(pacer.next_slot(), start + TICK);
        assert!(!pacer.frame_due(start));
        assert!(pacer.frame_due(start + TICK));
    }

    #[test]
    fn capped_pacer_spaces_frames_from_the_last_present() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(Some(50), TICK, start);
        assert!(!pacer.frame_due(start + Duration::from_millis(19)));
        assert!(pacer.frame_due(start + Duration::from_millis(20)));

        pacer.mark_presented(start + Duration::from_millis(25));
        assert_eq!(pacer.next_slot(), start + Duration::from_millis(45));
    }

    #[test]
    fn pending_redraw_is_not_requested_twice() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(60, start);
        let pacer = FramePacer::new(Some(30), TICK, start);
        let now = start + Duration::from_millis(40);

        let first = plan_wake(&mut scheduler, &pacer, false, now);
        assert!(first.redraw);
        assert_eq!(first.wake_at, scheduler.next_deadline());

        let again = plan_wake(&mut scheduler, &pacer, true, now);
        assert!(!again.redraw);
        assert_eq!(again.tick, TickDue::NotYet);
    }

    /// Drives the wake plan the way the event loop does, with a 30 fps cap and every present
    /// taking 5 ms, and checks the simulation still gets its full tick rate.
    #[test]
    fn thirty_fps_cap_keeps_sixty_ticks_per_second() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(60, start);
        let mut pacer = FramePacer::new(Some(30), scheduler.interval(), start);
        let present_cost = Duration::from_millis(5);
        let end = start + Duration::from_secs(1);

        let mut now = start;
        let mut ticks = 0;
        let mut frames = 0;
        while now <= end {
            let plan = plan_wake(&mut scheduler, &pacer, false, now);
            if matches!(plan.tick, TickDue::Now { .. }) {
                ticks += 1;
            }
            if plan.redraw {
                pacer.mark_presented(now);
                now += present_cost;
                frames += 1;
                let after = plan_wake(&mut scheduler, &pacer, false, now);
                if matches!(after.tick, TickDue::Now { .. }) {
                    ticks += 1;
                }
                now = now.max(after.wake_at);
                continue;
            }
            now = now.max(plan.wake_at);
        }

        assert!((58..=60).contains(&ticks), "ticks = {ticks}");
        assert!((28..=31).contains(&frames), "frames = {frames}");
        assert_eq!(scheduler.dropped_ticks(), 0);
    }

    #[test]
    fn render_cap_env_value_overrides_config() {
        assert_eq!(render_fps_cap_from(Some("144"), Some(60)), Some(144));
        assert_eq!(render_fps_cap_from(Some(" 30 "), None), Some(30));
        assert_eq!(render_fps_cap_from(Some("OFF"), Some(60)), None);
        assert_eq!(render_fps_cap_from(Some("0"), Some(60)), None);
    }

    #[test]
    fn invalid_render_cap_env_value_falls_back_to_config() {
        assert_eq!(render_fps_cap_from(Some("fast"), Some(60)), Some(60));
        assert_eq!(render_fps_cap_from(None, Some(0)), None);
        assert_eq!(render_fps_cap_from(None, Some(75)), Some(75));
    }

    #[test]
    fn default_config_matches_panel_layout() {
        let config = LoopConfig::default();
        assert_eq!(config.target_tps, 60);
        assert_eq!(
            config.panel_layout(),
            PanelLayout {
                side_panel_width: 250,
                bottom_panel_height: 140,
                tile_size: 20,
            }
        );
        assert_eq!(cap_label(config.max_render_fps), "off");
        assert_eq!(cap_label(Some(120)), "120");
    }
}
