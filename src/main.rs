//! Fight Night
//!
//! Headless match driver: two CPU-scripted fighters, a frame loop and a
//! one-second round timer on separate intervals, then a replay check.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fight_night::{
    TICK_RATE, VERSION,
    core::fixed::{fixed_abs, from_int},
    game::{
        controller::MatchController,
        events::{dispatch, GameEvent, GameEventData, MatchObserver},
        input::Action,
        state::PlayerSlot,
        tick::replay_match,
        MatchConfig,
    },
};

/// Stop this long after the result if the match somehow keeps going.
const SAFETY_FRAMES: u32 = 60 * 120;

/// Frames to keep simulating after the result (fighters settle).
const SETTLE_FRAMES: u32 = 30;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Fight Night v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => MatchConfig::load(&path).with_context(|| format!("loading config from {path}"))?,
        None => MatchConfig::default(),
    };
    info!(
        "Frame interval: {} ms (~{} Hz), round: {} s, time scale: x{}",
        config.frame_interval_ms, TICK_RATE, config.round_seconds, config.time_scale
    );

    let controller = run_match(config).await?;
    verify_replay(&controller)?;
    Ok(())
}

/// Run a full match in (scaled) real time.
async fn run_match(config: MatchConfig) -> Result<MatchController> {
    let scale = u64::from(config.time_scale.max(1));
    let frame_ms = config.frame_interval_ms;
    let mut controller = MatchController::new(config).context("invalid match config")?;

    let mut hud = LogHud::default();
    let mut cpu = [CpuScript::new(PlayerSlot::Player1), CpuScript::new(PlayerSlot::Player2)];

    let mut frames = interval(Duration::from_millis((frame_ms / scale).max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seconds = interval(Duration::from_millis((1000 / scale).max(1)));
    seconds.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Simulation clock; advances one frame interval per frame tick.
    let mut clock_ms = 0u64;
    dispatch(&controller.start(clock_ms), &mut hud);

    // First tick of a tokio interval completes immediately
    seconds.tick().await;

    let mut frames_after_end = 0u32;
    let mut frame_count = 0u32;
    loop {
        tokio::select! {
            _ = frames.tick() => {
                clock_ms += frame_ms;
                frame_count += 1;

                if !controller.state().is_ended() {
                    for script in &mut cpu {
                        script.drive(&mut controller);
                    }
                }

                let result = controller.tick(clock_ms);
                dispatch(&result.events, &mut hud);

                if result.match_ended {
                    frames_after_end += 1;
                    if frames_after_end > SETTLE_FRAMES {
                        break;
                    }
                }
                if frame_count > SAFETY_FRAMES {
                    warn!(frame_count, "match did not finish, stopping");
                    break;
                }
            }
            _ = seconds.tick() => {
                let result = controller.poll_timer(clock_ms);
                dispatch(&result.events, &mut hud);
            }
        }
    }

    let snapshot = controller.snapshot();
    for fighter in &snapshot.fighters {
        info!(
            "{} ({:?}): health {}, pose {:?}, at ({:.1}, {:.1})",
            fighter.name, fighter.slot, fighter.health, fighter.pose, fighter.x, fighter.y
        );
    }
    Ok(controller)
}

/// Re-run the recorded inputs and compare state hashes.
fn verify_replay(controller: &MatchController) -> Result<()> {
    info!("=== Verifying Replay ===");

    let state = controller.state();
    let Some(live_result) = state.result else {
        warn!("no result to verify");
        return Ok(());
    };
    let end_tick = controller
        .recordings()
        .iter()
        .map(|recording| recording.end_tick)
        .max()
        .unwrap_or(0);

    let (first, events) = replay_match(controller.config(), controller.recordings(), end_tick)
        .context("replay failed")?;
    let (second, _) = replay_match(controller.config(), controller.recordings(), end_tick)
        .context("replay failed")?;

    let first_hash = first.compute_hash();
    let second_hash = second.compute_hash();
    info!("Replay ticks: {}, events: {}", end_tick, events.len());
    for recording in controller.recordings() {
        let active = recording
            .deltas()
            .iter()
            .filter(|delta| !delta.frame.is_idle())
            .count();
        info!(
            slot = ?recording.slot,
            changes = recording.deltas().len(),
            active,
            "input recording"
        );
    }
    info!("Replay State Hash: {}", hex::encode(first_hash));

    if first_hash == second_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
    }

    // Live seconds land between frames, so a replay may see the final
    // second one frame apart.
    match first.result {
        Some(replayed) if replayed.winner == live_result.winner => {
            info!(winner = ?replayed.winner, "replay reproduces the live result");
        }
        other => {
            warn!(live = ?live_result, replay = ?other, "replay result differs from live run");
        }
    }
    Ok(())
}

// =============================================================================
// HUD
// =============================================================================

/// Health bars, timer text and the result banner, as log lines.
#[derive(Default)]
struct LogHud {
    hits: u32,
}

impl MatchObserver for LogHud {
    fn on_event(&mut self, event: &GameEvent) {
        match &event.data {
            GameEventData::MatchStarted { round_seconds } => {
                info!("FIGHT! {} seconds on the clock", round_seconds);
            }
            GameEventData::AttackStarted { slot, pose } => {
                debug!(tick = event.tick, ?slot, ?pose, "attack");
            }
            GameEventData::FighterHit { attacker, defender, health, impact } => {
                self.hits += 1;
                let (x, y) = impact.to_floats();
                info!(
                    "{:?} hits {:?} -> health {}% (impact at {:.0},{:.0})",
                    attacker, defender, health, x, y
                );
            }
            GameEventData::FighterKnockedOut { slot } => {
                info!("{:?} is knocked out!", slot);
            }
            GameEventData::TimerChanged { seconds_remaining } => {
                if seconds_remaining % 10 == 0 || *seconds_remaining <= 5 {
                    info!("Timer: {}", seconds_remaining);
                }
            }
            GameEventData::MatchEnded { result } => {
                let banner = match result.winner.slot() {
                    Some(slot) => format!("{slot:?} wins"),
                    None => "Draw".to_string(),
                };
                info!(
                    "=== {} by {:?} ({} - {}) after {} hits ===",
                    banner,
                    event.end_reason().unwrap_or(result.reason),
                    result.player1_health,
                    result.player2_health,
                    self.hits
                );
            }
            GameEventData::MatchReset => {
                self.hits = 0;
                info!("Match reset");
            }
        }
    }
}

// =============================================================================
// CPU SCRIPT
// =============================================================================

/// Walks toward the opponent and swings when in reach.
struct CpuScript {
    slot: PlayerSlot,
    frame: u32,
    held: Option<Action>,
}

impl CpuScript {
    /// Swing once within this many pixels (left edge to left edge).
    const REACH_PX: i32 = 140;

    fn new(slot: PlayerSlot) -> Self {
        Self { slot, frame: 0, held: None }
    }

    fn drive(&mut self, controller: &mut MatchController) {
        self.frame += 1;
        let state = controller.state();
        let me = state.fighter(self.slot).position.x;
        let gap = state.fighter(self.slot.opponent()).position.x - me;

        let wanted = if fixed_abs(gap) > from_int(Self::REACH_PX) {
            Some(if gap > 0 { Action::Right } else { Action::Left })
        } else {
            None
        };
        if wanted != self.held {
            if let Some(action) = self.held.take() {
                controller.release(self.slot, action);
            }
            if let Some(action) = wanted {
                controller.press(self.slot, action);
            }
            self.held = wanted;
        }

        // Player 2 swings a little slower so rounds are not mirror images
        let offset = self.slot.index() as u32;
        if wanted.is_none() && self.frame % (24 + 9 * offset) == 0 {
            controller.press(self.slot, Action::Attack);
        }

        // Occasional hop
        let phase = self.frame % 240;
        if phase == 120 + 60 * offset {
            controller.press(self.slot, Action::Jump);
        } else if phase == 125 + 60 * offset {
            controller.release(self.slot, Action::Jump);
        }
    }
}
