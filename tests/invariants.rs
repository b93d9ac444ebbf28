//! Property tests: random key sequences never break the fighter invariants.

use proptest::prelude::*;

use fight_night::core::fixed::from_int;
use fight_night::game::fighter::{Fighter, MAX_HEALTH};
use fight_night::game::input::Action;
use fight_night::game::state::PlayerSlot;
use fight_night::{MatchConfig, MatchController};

const FRAME_MS: u64 = 16;

#[derive(Clone, Copy, Debug)]
enum Step {
    Press(PlayerSlot, Action),
    Release(PlayerSlot, Action),
    Frames(u8),
    Second,
}

fn slot() -> impl Strategy<Value = PlayerSlot> {
    prop_oneof![Just(PlayerSlot::Player1), Just(PlayerSlot::Player2)]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Left),
        Just(Action::Right),
        Just(Action::Jump),
        Just(Action::Attack),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (slot(), action()).prop_map(|(s, a)| Step::Press(s, a)),
        2 => (slot(), action()).prop_map(|(s, a)| Step::Release(s, a)),
        4 => (1u8..30).prop_map(Step::Frames),
        1 => Just(Step::Second),
    ]
}

fn check_fighter(fighter: &Fighter, was_dead: bool) -> Result<(), TestCaseError> {
    let config = MatchConfig::default();
    let ground = from_int(config.arena.height - config.arena.floor_height);
    let right_limit = from_int(config.arena.width) - fighter.width;

    prop_assert!(fighter.health <= MAX_HEALTH);
    prop_assert_eq!(fighter.dead, fighter.health == 0);
    if was_dead {
        prop_assert!(fighter.dead, "dead fighter came back");
    }
    prop_assert!(fighter.position.x >= 0);
    prop_assert!(fighter.position.x <= right_limit);
    prop_assert!(fighter.position.y + fighter.height <= ground);
    Ok(())
}

/// Play the steps; frames and seconds advance a shared clock.
fn play(controller: &mut MatchController, steps: &[Step]) -> Result<(), TestCaseError> {
    let mut clock = 0u64;
    let mut dead = [false; 2];

    for step in steps {
        match *step {
            Step::Press(slot, action) => {
                controller.press(slot, action);
            }
            Step::Release(slot, action) => {
                controller.release(slot, action);
            }
            Step::Frames(n) => {
                for _ in 0..n {
                    clock += FRAME_MS;
                    controller.tick(clock);
                    for slot in PlayerSlot::ALL {
                        let fighter = controller.state().fighter(slot);
                        check_fighter(fighter, dead[slot.index()])?;
                        dead[slot.index()] = fighter.dead;
                    }
                }
            }
            Step::Second => {
                clock += 1000;
                controller.poll_timer(clock);
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_invariants_hold_under_random_input(steps in prop::collection::vec(step(), 1..120)) {
        let mut controller = MatchController::new(MatchConfig::default()).unwrap();
        controller.start(0);
        play(&mut controller, &steps)?;

        if let Some(result) = controller.state().result {
            let p1 = controller.state().fighter(PlayerSlot::Player1).health;
            let p2 = controller.state().fighter(PlayerSlot::Player2).health;
            prop_assert!(p1 == 0 || p2 == 0 || controller.state().timer.seconds_remaining == 0);
            prop_assert_eq!(result.player1_health, p1);
            prop_assert_eq!(result.player2_health, p2);
        }
    }

    #[test]
    fn test_reset_reproduces_initial_state(steps in prop::collection::vec(step(), 1..80)) {
        let fresh = MatchController::new(MatchConfig::default()).unwrap();
        let mut controller = MatchController::new(MatchConfig::default()).unwrap();
        controller.start(0);
        play(&mut controller, &steps)?;

        controller.reset(0);
        let state = controller.state();
        prop_assert_eq!(&state.fighters, &fresh.state().fighters);
        prop_assert_eq!(state.timer.seconds_remaining, 60);
        prop_assert!(state.result.is_none());
    }

    #[test]
    fn test_recordings_replay_identically(steps in prop::collection::vec(step(), 1..80)) {
        let mut controller = MatchController::new(MatchConfig::default()).unwrap();
        controller.start(0);

        // Frames only: the replay polls the timer on its own schedule
        let frames_only: Vec<Step> = steps
            .into_iter()
            .filter(|s| !matches!(s, Step::Second))
            .collect();
        play(&mut controller, &frames_only)?;
        // Replay stops at the result; the live run keeps simulating
        prop_assume!(controller.state().result.is_none());

        let ticks = controller.state().tick;
        let (replayed, _) = fight_night::game::tick::replay_match(
            controller.config(),
            controller.recordings(),
            ticks,
        ).unwrap();
        prop_assert_eq!(&replayed.fighters, &controller.state().fighters);
    }
}
