//! Authoritative Simulation Tick
//!
//! One frame of the match: inputs, fighter updates, push, damage, end check.
//! The round countdown is polled separately by `tick_round_timer` since it
//! runs on its own interval.

use tracing::{debug, info};

use crate::core::fixed::{JUMP_TOLERANCE, JUMP_VELOCITY, fixed_clamp};
use crate::core::vec2::FixedVec2;
use crate::game::collision::{attack_connects, compute_push};
use crate::game::config::{ConfigError, MatchConfig};
use crate::game::events::GameEvent;
use crate::game::fighter::UpdateContext;
use crate::game::input::{InputState, PlayerInputBuffer};
use crate::game::state::{
    EndReason, Impact, MatchPhase, MatchResult, MatchState, PlayerSlot, Winner,
};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match is over
    pub match_ended: bool,
    /// Final result (once decided)
    pub result: Option<MatchResult>,
}

impl TickResult {
    fn drain(state: &mut MatchState) -> Self {
        Self {
            events: state.take_events(),
            match_ended: state.is_ended(),
            result: state.result,
        }
    }
}

/// Run one frame tick at clock reading `now_ms`.
///
/// Does nothing before the match starts. After it ends, fighters keep
/// falling and animating but input has no effect and hits no longer land.
pub fn tick(state: &mut MatchState, input: &mut InputState, now_ms: u64) -> TickResult {
    let playing = match state.phase {
        MatchPhase::Waiting => return TickResult::default(),
        MatchPhase::Playing => true,
        MatchPhase::Ended => false,
    };

    // 0. Advance clock
    state.tick += 1;
    state.now_ms = now_ms;
    if state.impact.is_some_and(|impact| now_ms >= impact.until_ms) {
        state.impact = None;
    }

    // 1. Apply inputs
    apply_inputs(state, input, playing);

    // 2-3. Update fighters, non-attacker first
    for slot in update_order(state) {
        let ctx = UpdateContext {
            now_ms,
            enemy_x: state.enemy_x(slot),
            arena: state.arena,
        };
        state.fighter_mut(slot).update(&ctx);
    }

    // 4. Push grounded fighters apart
    resolve_push(state);

    // 5. Damage, player 1 first
    if playing {
        resolve_hit(state, PlayerSlot::Player1);
        resolve_hit(state, PlayerSlot::Player2);
    }

    // 6. Knockout ends the match
    if playing && state.fighters.iter().any(|f| f.health == 0) {
        end_match(state, EndReason::KnockOut);
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = state.tick,
        now_ms,
        p1_x = crate::core::fixed::to_float(state.fighters[0].position.x),
        p2_x = crate::core::fixed::to_float(state.fighters[1].position.x),
        "tick"
    );

    TickResult::drain(state)
}

/// Apply every countdown second due by `now_ms`. Reaching zero ends the
/// match on remaining health.
pub fn tick_round_timer(state: &mut MatchState, now_ms: u64) -> TickResult {
    if state.phase != MatchPhase::Playing {
        return TickResult::drain(state);
    }

    let fired = state.timer.poll(now_ms);
    if fired > 0 {
        let seconds = state.timer.seconds_remaining;
        state.push_event(GameEvent::timer_changed(state.tick, now_ms, seconds));
        if state.timer.expired() {
            end_match(state, EndReason::TimeUp);
        }
    }

    TickResult::drain(state)
}

/// Order in which fighters update this tick.
///
/// When exactly one fighter is attacking, the other goes first. Otherwise
/// the fighter further left goes first, player 1 on a tie.
pub fn update_order(state: &MatchState) -> [PlayerSlot; 2] {
    let p1 = state.fighter(PlayerSlot::Player1);
    let p2 = state.fighter(PlayerSlot::Player2);

    let p2_first = match (p1.is_attacking, p2.is_attacking) {
        (true, false) => true,
        (false, true) => false,
        _ => p1.position.x > p2.position.x,
    };

    if p2_first {
        [PlayerSlot::Player2, PlayerSlot::Player1]
    } else {
        [PlayerSlot::Player1, PlayerSlot::Player2]
    }
}

fn apply_inputs(state: &mut MatchState, input: &mut InputState, playing: bool) {
    let now_ms = state.now_ms;
    let ground_level = state.arena.ground_level;

    for slot in PlayerSlot::ALL {
        let keys = input.get_mut(slot);
        let attack_pressed = keys.take_attack();
        if !playing {
            state.fighter_mut(slot).velocity.x = 0;
            continue;
        }

        let velocity_x = keys.horizontal_velocity();
        let jump_held = keys.jump;

        if attack_pressed {
            trigger_attack(state, slot, now_ms);
        }

        let fighter = state.fighter_mut(slot);
        fighter.velocity.x = velocity_x;
        if jump_held && fighter.is_near_ground(ground_level, JUMP_TOLERANCE) {
            fighter.velocity.y = JUMP_VELOCITY;
        }
    }
}

/// Start an attack for `slot` and announce it if it went live.
pub fn trigger_attack(state: &mut MatchState, slot: PlayerSlot, now_ms: u64) -> bool {
    let fighter = state.fighter_mut(slot);
    if !fighter.attack(now_ms) {
        return false;
    }
    let pose = fighter.attack_pose;
    let event = GameEvent::attack_started(state.tick, now_ms, slot, pose);
    state.push_event(event);
    true
}

fn resolve_push(state: &mut MatchState) {
    let ground_level = state.arena.ground_level;
    let [a, b] = &state.fighters;
    let Some((push_a, push_b)) = compute_push(a, b, ground_level) else {
        return;
    };

    let max_x = state.arena.width;
    for (fighter, push) in state.fighters.iter_mut().zip([push_a, push_b]) {
        let limit = max_x - fighter.width;
        fighter.position.x = fixed_clamp(fighter.position.x + push, 0, limit);
    }
}

fn resolve_hit(state: &mut MatchState, attacker: PlayerSlot) {
    let defender = attacker.opponent();
    if !attack_connects(state.fighter(attacker), state.fighter(defender)) {
        return;
    }

    let now_ms = state.now_ms;
    let attacker_x = state.fighter(attacker).position.x;
    let facing_right = state.fighter(defender).facing_right(Some(attacker_x));
    let reach = state.fighter(attacker).attack_box;
    let impact = FixedVec2::new(
        reach.position.x + reach.width / 2,
        reach.position.y + reach.height / 2,
    );

    // One hit per activation
    state.fighter_mut(attacker).is_attacking = false;

    let target = state.fighter_mut(defender);
    target.take_hit(now_ms, facing_right);
    let health = target.health;
    let knocked_out = target.dead;

    debug!(?attacker, ?defender, health, "hit landed");

    state.impact = Some(Impact {
        position: impact,
        until_ms: now_ms + state.timing.impact_flash_ms,
    });
    let tick = state.tick;
    state.push_event(GameEvent::fighter_hit(tick, now_ms, attacker, defender, health, impact));
    if knocked_out {
        state.push_event(GameEvent::knocked_out(tick, now_ms, defender));
    }
}

fn end_match(state: &mut MatchState, reason: EndReason) {
    if state.is_ended() {
        return;
    }

    let player1_health = state.fighter(PlayerSlot::Player1).health;
    let player2_health = state.fighter(PlayerSlot::Player2).health;
    let result = MatchResult {
        winner: Winner::by_health(player1_health, player2_health),
        reason,
        player1_health,
        player2_health,
    };

    state.timer.cancel();
    state.phase = MatchPhase::Ended;
    state.result = Some(result);
    let event = GameEvent::match_ended(state.tick, state.now_ms, result);
    state.push_event(event);

    info!(
        winner = ?result.winner,
        ?reason,
        player1_health,
        player2_health,
        tick = state.tick,
        "match ended"
    );
}

/// Replay a match from recorded inputs.
///
/// Starts at clock 0 and runs up to `tick_count` ticks spaced
/// `frame_interval_ms` apart, polling the round timer after each tick.
/// Stops early once the match ends.
pub fn replay_match(
    config: &MatchConfig,
    recordings: &[PlayerInputBuffer; 2],
    tick_count: u32,
) -> Result<(MatchState, Vec<GameEvent>), ConfigError> {
    let mut state = MatchState::new(config)?;
    let mut input = InputState::new();
    let mut all_events = Vec::new();

    state.start(0);
    all_events.extend(state.take_events());

    for t in 1..=tick_count {
        let now_ms = u64::from(t) * config.frame_interval_ms;

        for recording in recordings {
            input.load_frame(recording.slot, recording.get_input_at(t));
        }

        let result = tick(&mut state, &mut input, now_ms);
        all_events.extend(result.events);
        let timer = tick_round_timer(&mut state, now_ms);
        all_events.extend(timer.events);

        if timer.match_ended {
            break;
        }
    }

    Ok((state, all_events))
}

// =============================================================================
// TESTS
// =============================================================================
