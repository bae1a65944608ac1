//! End-to-end match flow through the public engine API

use std::cell::RefCell;
use std::rc::Rc;

use chun_flick::consts::SIM_DT;
use chun_flick::sim::{BotPolicy, FlickInput, MatchEngine, MatchEvent, MatchPhase, MatchResult, Side, Tier};
use chun_flick::{MatchConfig, RoundOutcome, Session};
use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

type EventLog = Rc<RefCell<Vec<MatchEvent>>>;

fn record(engine: &mut MatchEngine) -> EventLog {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}

/// Player token centered at (200, 400)
fn centered_player_config() -> MatchConfig {
    MatchConfig {
        player_start: (0.5, 400.0 / 700.0),
        ..MatchConfig::default()
    }
}

/// Tick until the current simulated turn is decided; returns the tick count
fn finish_turn(engine: &mut MatchEngine) -> u32 {
    let limit = engine.config().max_simulation_frames + engine.config().settle_frames_required + 5;
    let mut ticks = 0;
    while engine.phase().is_stepping() {
        assert!(ticks < limit, "turn still running after {ticks} ticks");
        engine.tick(SIM_DT);
        ticks += 1;
    }
    ticks
}

/// Turn-level ordering that must hold for any event stream
fn assert_well_ordered(events: &[MatchEvent]) {
    let mut in_turn = false;
    let mut flicked = false;
    let mut game_overs = 0;
    for (i, event) in events.iter().enumerate() {
        match event {
            MatchEvent::TurnStart { .. } => {
                assert!(!in_turn, "turn started twice at {i}");
                in_turn = true;
                flicked = false;
            }
            MatchEvent::Flick { .. } => {
                assert!(in_turn && !flicked, "flick out of place at {i}");
                flicked = true;
            }
            MatchEvent::Collision { .. } => assert!(flicked, "collision before flick at {i}"),
            MatchEvent::TurnEnd { .. } => {
                assert!(flicked, "turn ended without a flick at {i}");
                in_turn = false;
            }
            MatchEvent::RoundEnd { .. } => {
                assert!(!in_turn);
                assert!(matches!(events.get(i + 1), Some(MatchEvent::GameOver { .. })));
            }
            MatchEvent::GameOver { .. } => game_overs += 1,
        }
    }
    assert!(game_overs <= 1);
}

#[test]
fn drag_release_launches_player() {
    let mut engine = MatchEngine::create_seeded(Tier::One, centered_player_config(), 7).expect("valid config");
    let events = record(&mut engine);

    assert!(engine.begin_drag(DVec2::new(200.0, 400.0)));
    let outcome = engine.release_drag(DVec2::new(150.0, 450.0)).expect("long enough pull");

    assert!(!outcome.was_overshoot);
    assert!((outcome.input.power - 0.589).abs() < 0.01, "power {}", outcome.input.power);
    let expected = DVec2::new(50.0, -50.0).normalize();
    assert!((outcome.input.direction - expected).length() < 1e-9);

    assert_eq!(engine.phase(), MatchPhase::PlayerSimulating);
    assert_eq!(engine.state().last_attacker, Some(Side::Player));
    let velocity = engine.player().velocity;
    assert!((velocity.normalize() - expected).length() < 1e-9);
    assert!((velocity.length() - outcome.input.power * engine.config().max_flick_power).abs() < 1e-6);

    let names: Vec<_> = events.borrow().iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["turn-start", "flick"]);
}

#[test]
fn short_drag_is_cancelled() {
    let mut engine = MatchEngine::create_seeded(Tier::One, centered_player_config(), 7).expect("valid config");
    let events = record(&mut engine);

    assert!(engine.begin_drag(DVec2::new(200.0, 400.0)));
    assert!(engine.release_drag(DVec2::new(203.0, 404.0)).is_none());
    assert_eq!(engine.phase(), MatchPhase::Idle);
    assert_eq!(engine.player().velocity, DVec2::ZERO);
    assert!(!events.borrow().iter().any(|e| e.name() == "flick"));

    // The turn is still the player's
    assert!(engine.begin_drag(DVec2::new(200.0, 400.0)));
}

#[test]
fn player_input_ignored_during_bot_turn() {
    let mut engine = MatchEngine::create_seeded(Tier::Two, MatchConfig::default(), 21).expect("valid config");
    assert!(engine.player_flick(FlickInput::new(DVec2::new(1.0, 0.0), 0.05)));
    finish_turn(&mut engine);
    assert_eq!(engine.phase(), MatchPhase::BotThinking);

    let before = engine.snapshot();
    assert!(!engine.player_flick(FlickInput::new(DVec2::new(0.0, -1.0), 1.0)));
    assert!(!engine.begin_drag(engine.player().position));
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn bot_turn_runs_on_ticks_alone() {
    let mut engine = MatchEngine::create_seeded(Tier::Two, MatchConfig::default(), 99).expect("valid config");
    let events = record(&mut engine);

    engine.player_flick(FlickInput::new(DVec2::new(1.0, 0.0), 0.05));
    finish_turn(&mut engine);
    assert_eq!(engine.phase(), MatchPhase::BotThinking);

    let think_ticks = (engine.config().bots.get(Tier::Two).think_time_max_ms as f64 / (SIM_DT * 1000.0)).ceil() as u32;
    let mut ticks = 0;
    while engine.phase() == MatchPhase::BotThinking {
        assert!(ticks <= think_ticks + 1, "bot never fired");
        engine.tick(SIM_DT);
        ticks += 1;
    }
    assert_eq!(engine.state().last_attacker, Some(Side::Bot));
    finish_turn(&mut engine);

    // Either the bot landed its shot or it is the player's turn again
    match engine.phase() {
        MatchPhase::Ended => assert!(engine.result().is_terminal()),
        MatchPhase::Idle => assert_eq!(engine.state().current_turn, Side::Player),
        other => panic!("unexpected phase {other:?}"),
    }
    assert_eq!(engine.state().turns_taken, 2);
    assert_well_ordered(&events.borrow());
    let bot_flicks = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, MatchEvent::Flick { side: Side::Bot, .. }))
        .count();
    assert_eq!(bot_flicks, 1);
}

#[test]
fn resting_contact_wins_for_the_attacker() {
    // Tokens start 68 apart; a nudge closes the gap without touching
    let config = MatchConfig {
        player_start: (0.5, 400.0 / 700.0),
        bot_start: (0.5, 332.0 / 700.0),
        ..MatchConfig::default()
    };
    let mut engine = MatchEngine::create_seeded(Tier::Three, config, 3).expect("valid config");
    let events = record(&mut engine);

    assert!(engine.player_flick(FlickInput::new(DVec2::new(0.0, -1.0), 0.01)));
    finish_turn(&mut engine);

    assert_eq!(engine.phase(), MatchPhase::Ended);
    assert_eq!(engine.result(), MatchResult::PlayerWins);
    let gap = engine.player().position.distance(engine.bot().position);
    assert!(gap < 64.0 * engine.config().overlap_tolerance, "gap {gap}");

    // Ended is terminal
    for _ in 0..120 {
        engine.tick(SIM_DT);
    }
    assert!(!engine.player_flick(FlickInput::new(DVec2::new(0.0, -1.0), 0.5)));

    let events = events.borrow();
    assert_well_ordered(&events);
    let game_overs: Vec<_> = events.iter().filter(|e| e.name() == "game-over").collect();
    assert_eq!(game_overs.len(), 1);
    assert_eq!(game_overs[0].result(), Some(MatchResult::PlayerWins));
}

#[test]
fn reset_restores_a_fresh_match() {
    let mut engine = MatchEngine::create_seeded(Tier::Two, MatchConfig::default(), 5).expect("valid config");
    engine.player_flick(FlickInput::new(DVec2::new(0.2, -1.0), 0.7));
    for _ in 0..90 {
        engine.tick(SIM_DT);
    }
    engine.reset();

    let fresh = MatchEngine::create_seeded(Tier::Two, MatchConfig::default(), 5).expect("valid config");
    let (a, b) = (engine.snapshot(), fresh.snapshot());
    assert_eq!(a.state, b.state);
    assert_eq!(a.player, b.player);
    assert_eq!(a.bot, b.bot);
    assert_eq!(a.bot_think_remaining_ms, None);
}

#[test]
fn endless_motion_is_forced_to_settle() {
    let mut config = MatchConfig::default();
    config.physics.friction_high = 0.999_999;
    config.physics.friction_low = 0.999_999;
    config.physics.wall_restitution = 0.999_999;
    let cap = config.max_simulation_frames;
    let mut engine = MatchEngine::create_seeded(Tier::One, config, 11).expect("valid config");

    engine.player_flick(FlickInput::new(DVec2::new(1.0, 0.0), 1.0));
    let ticks = finish_turn(&mut engine);

    assert!(ticks <= cap, "took {ticks} ticks");
    assert_eq!(engine.phase(), MatchPhase::BotThinking);
    assert_eq!(engine.player().velocity, DVec2::ZERO);
}

#[test]
fn destroy_during_bot_think_cancels_the_shot() {
    let mut engine = MatchEngine::create_seeded(Tier::One, MatchConfig::default(), 8).expect("valid config");
    let events = record(&mut engine);
    engine.player_flick(FlickInput::new(DVec2::new(1.0, 0.0), 0.05));
    finish_turn(&mut engine);
    assert_eq!(engine.phase(), MatchPhase::BotThinking);

    engine.destroy();
    let seen = events.borrow().len();
    for _ in 0..600 {
        engine.tick(SIM_DT);
    }
    assert_eq!(engine.bot().velocity, DVec2::ZERO);
    assert_eq!(events.borrow().len(), seen);
    assert!(!events.borrow().iter().any(|e| matches!(e, MatchEvent::Flick { side: Side::Bot, .. })));
}

#[test]
fn unsubscribed_listener_hears_nothing() {
    let mut engine = MatchEngine::create_seeded(Tier::One, MatchConfig::default(), 8).expect("valid config");
    let kept = record(&mut engine);
    let dropped = Rc::new(RefCell::new(0));
    let id = {
        let dropped = Rc::clone(&dropped);
        engine.subscribe(move |_| *dropped.borrow_mut() += 1)
    };
    assert!(engine.unsubscribe(id));

    engine.player_flick(FlickInput::new(DVec2::new(1.0, 0.0), 0.05));
    assert_eq!(*dropped.borrow(), 0);
    assert!(!kept.borrow().is_empty());
}

#[test]
fn autoplay_always_reaches_a_result() {
    let config = MatchConfig::default();
    let stand_in = BotPolicy::new(Tier::Three, &config);
    let mut rng = Pcg32::seed_from_u64(2024);
    let mut session = Session::new();

    for tier in Tier::ALL {
        let mut engine = MatchEngine::create_seeded(tier, config.clone(), u64::from(tier.as_u8())).expect("valid config");
        let events = record(&mut engine);

        // Turn limit guarantees an end; bound generously above it
        let mut ticks = 0;
        while engine.phase() != MatchPhase::Ended {
            assert!(ticks < 40_000, "tier {} never ended", tier.as_u8());
            if engine.phase() == MatchPhase::Idle {
                let shot = stand_in.decide(engine.player(), engine.bot(), &mut rng);
                assert!(engine.player_flick(shot.input));
            }
            engine.tick(SIM_DT);
            ticks += 1;
        }

        assert!(engine.result().is_terminal());
        assert!(engine.state().turns_taken <= config.max_turns);
        assert_well_ordered(&events.borrow());
        assert!(session.record_result(tier, engine.result()));
    }

    assert_eq!(session.rounds_played(), 3);
}

#[test]
fn session_follows_round_results() {
    let mut session = Session::new();
    session.record(Tier::Three, RoundOutcome::Win);
    session.record(Tier::Three, RoundOutcome::Win);
    session.record(Tier::Three, RoundOutcome::Lose);
    session.record(Tier::Three, RoundOutcome::Draw);

    assert_eq!(session.inventory.get(Tier::Three), 1);
    assert_eq!(session.streak, 0);
    assert_eq!(session.max_streak, 2);
    assert_eq!((session.wins, session.losses, session.draws), (2, 1, 1));
}
