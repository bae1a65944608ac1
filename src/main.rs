//! Chun Flick entry point
//!
//! In the browser this only wires up logging; the host page drives
//! `web::ChunMatch`. Natively it plays headless seeded matches, with a tier-3
//! bot policy standing in for the player, and logs the event stream.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Chun Flick ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let tier = args.next().and_then(|a| a.parse::<u8>().ok()).unwrap_or(2);
    let rounds = args.next().and_then(|a| a.parse::<u32>().ok()).unwrap_or(3);

    if let Err(e) = headless::run(tier, rounds) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use chun_flick::consts::{DEFAULT_SEED, SIM_DT};
    use chun_flick::sim::{BotPolicy, MatchEngine, MatchEvent, MatchPhase, Side, Tier};
    use chun_flick::{MatchConfig, MatchError, Session};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Ticks allowed per round before giving up (about ten minutes of play)
    const ROUND_TICK_LIMIT: u32 = 60 * 60 * 10;

    pub fn run(tier: u8, rounds: u32) -> Result<(), MatchError> {
        let tier = Tier::try_from(tier)?;
        let config = MatchConfig::default();
        let mut engine = MatchEngine::create_seeded(tier, config.clone(), DEFAULT_SEED)?;
        engine.subscribe(|event: &MatchEvent| match event {
            MatchEvent::Collision { impact, .. } => {
                log::info!("collision at {:.1} units/s", impact.impact_speed)
            }
            MatchEvent::GameOver { result, .. } => log::info!("game over: {result:?}"),
            other => log::debug!("{} ({})", other.name(), other.side().as_str()),
        });

        // The stand-in player aims like the strongest bot
        let stand_in = BotPolicy::new(Tier::Three, &config);
        let mut rng = Pcg32::seed_from_u64(DEFAULT_SEED ^ 0xFF);
        let mut session = Session::new();

        for round in 1..=rounds {
            log::info!("round {round} (tier {})", tier.as_u8());
            let mut ticks = 0;
            while engine.phase() != MatchPhase::Ended && ticks < ROUND_TICK_LIMIT {
                if engine.phase() == MatchPhase::Idle && engine.state().current_turn == Side::Player {
                    // Shoot from the player's seat: same geometry with roles swapped
                    let shot = stand_in.decide(engine.player(), engine.bot(), &mut rng);
                    engine.player_flick(shot.input);
                }
                engine.tick(SIM_DT);
                ticks += 1;
            }

            if !session.record_result(tier, engine.result()) {
                log::warn!("round {round} did not finish within {ROUND_TICK_LIMIT} ticks");
            }
            engine.reset();
        }

        log::info!(
            "session: {} won, {} lost, {} drawn, best streak {}",
            session.wins,
            session.losses,
            session.draws,
            session.max_streak
        );
        engine.destroy();
        Ok(())
    }
}
