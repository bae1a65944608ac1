//! Match engine: the turn/phase state machine
//!
//! Drives one match between the player and the bot. Each stepped tick:
//! 1. integrate both tokens
//! 2. resolve their collision
//! 3. update the settle counters and, once settled or capped, decide the turn
//!
//! The bot's think time is a cancellable timer advanced by `tick` while the
//! phase is `BotThinking`; nothing runs outside the caller's tick.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arbiter::{self, SettleStatus};
use super::bot::{BotDecision, BotPolicy};
use super::collision;
use super::events::{EventBus, MatchEvent, SubscriptionId};
use super::flick::{self, FlickInput, FlickOutcome};
use super::physics;
use super::schedule::{ActionHandle, Scheduler};
use super::state::{Bounds, MatchPhase, MatchResult, MatchState, Side, Tier, Token};
use crate::config::MatchConfig;
use crate::consts::DEFAULT_SEED;
use crate::error::MatchError;

/// Read-only frame for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tier: Tier,
    pub board_width: f64,
    pub board_height: f64,
    pub state: MatchState,
    pub player: Token,
    pub bot: Token,
    /// Think time left while the bot is thinking
    pub bot_think_remaining_ms: Option<f64>,
}

/// An in-progress drag on the player token
#[derive(Debug, Clone, Copy)]
struct Drag {
    anchor: DVec2,
    contact_offset: DVec2,
}

/// One match against the bot
#[derive(Debug)]
pub struct MatchEngine {
    tier: Tier,
    config: MatchConfig,
    bounds: Bounds,
    bot_policy: BotPolicy,
    state: MatchState,
    player: Token,
    bot: Token,
    rng: Pcg32,
    bot_timer: Scheduler<BotDecision>,
    /// The think-time action the current `BotThinking` phase waits for
    bot_action: Option<ActionHandle>,
    drag: Option<Drag>,
    events: EventBus,
    /// `TurnStart` for the current turn has been delivered
    turn_announced: bool,
    game_over_sent: bool,
    destroyed: bool,
}

impl MatchEngine {
    /// New match with the default seed
    pub fn create(tier: Tier, config: MatchConfig) -> Result<Self, MatchError> {
        Self::create_seeded(tier, config, DEFAULT_SEED)
    }

    /// New match; `seed` drives every random draw (bot and overshoot wobble)
    pub fn create_seeded(tier: Tier, config: MatchConfig, seed: u64) -> Result<Self, MatchError> {
        config.validate()?;
        let (player, bot) = initial_tokens(tier, &config);
        log::info!(
            "match created: tier {} ({} physics, seed {seed:#x})",
            tier.as_u8(),
            config.physics.kind.as_str()
        );
        Ok(Self {
            tier,
            bounds: Bounds::from_config(&config),
            bot_policy: BotPolicy::new(tier, &config),
            config,
            state: MatchState::new(),
            player,
            bot,
            rng: Pcg32::seed_from_u64(seed),
            bot_timer: Scheduler::new(),
            bot_action: None,
            drag: None,
            events: EventBus::new(),
            turn_announced: false,
            game_over_sent: false,
            destroyed: false,
        })
    }

    // === Read access ===

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    pub fn result(&self) -> MatchResult {
        self.state.result
    }

    pub fn player(&self) -> &Token {
        &self.player
    }

    pub fn bot(&self) -> &Token {
        &self.bot
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn bot_think_remaining_ms(&self) -> Option<f64> {
        self.bot_timer.remaining_ms()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            tier: self.tier,
            board_width: self.bounds.width,
            board_height: self.bounds.height,
            state: self.state.clone(),
            player: self.player.clone(),
            bot: self.bot.clone(),
            bot_think_remaining_ms: self.bot_timer.remaining_ms(),
        }
    }

    // === Listeners ===

    pub fn subscribe(&mut self, listener: impl FnMut(&MatchEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // === Player input ===

    /// Start a drag at `point`. Accepted only on the player's idle turn and
    /// only within the player token's grab radius.
    pub fn begin_drag(&mut self, point: DVec2) -> bool {
        if !self.player_may_act() || self.state.phase != MatchPhase::Idle {
            return false;
        }
        if !point.is_finite() || !self.player.contains_point(point, self.config.flick.hit_radius_scale) {
            return false;
        }
        self.announce_turn();

        let anchor = self.player.position;
        self.drag = Some(Drag {
            anchor,
            contact_offset: (point - anchor) / self.player.radius,
        });
        self.state.phase = MatchPhase::PlayerAiming;
        true
    }

    /// What releasing at `point` would launch (no overshoot wobble)
    pub fn drag_preview(&self, point: DVec2) -> Option<FlickOutcome> {
        if self.state.phase != MatchPhase::PlayerAiming {
            return None;
        }
        let drag = self.drag?;
        flick::preview_drag(drag.anchor, point, drag.contact_offset, &self.config.flick)
    }

    /// Finish a drag. A pull below the activation distance cancels back to `Idle`.
    pub fn release_drag(&mut self, point: DVec2) -> Option<FlickOutcome> {
        if self.destroyed || self.state.phase != MatchPhase::PlayerAiming {
            return None;
        }
        let drag = self.drag.take()?;
        match flick::map_drag(drag.anchor, point, drag.contact_offset, &self.config.flick, &mut self.rng) {
            Some(outcome) => {
                if outcome.was_overshoot {
                    log::debug!("overshoot flick, deviation {:.3} rad", outcome.deviation);
                }
                self.launch(Side::Player, outcome.input);
                Some(outcome)
            }
            None => {
                log::debug!("drag cancelled (pull too short)");
                self.state.phase = MatchPhase::Idle;
                None
            }
        }
    }

    pub fn cancel_drag(&mut self) {
        if self.state.phase == MatchPhase::PlayerAiming {
            self.drag = None;
            self.state.phase = MatchPhase::Idle;
        }
    }

    /// Launch the player token directly. Ignored outside the player's aiming
    /// phase; a degenerate input counts as a cancelled gesture.
    pub fn player_flick(&mut self, input: FlickInput) -> bool {
        if !self.player_may_act() || !self.state.phase.accepts_player_input() {
            return false;
        }
        self.drag = None;
        if input.is_degenerate() {
            self.state.phase = MatchPhase::Idle;
            return false;
        }
        self.announce_turn();
        self.launch(Side::Player, input);
        true
    }

    // === Lifecycle ===

    /// Advance by `dt` seconds
    pub fn tick(&mut self, dt: f64) {
        if self.destroyed || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.announce_turn();

        match self.state.phase {
            MatchPhase::Idle | MatchPhase::PlayerAiming | MatchPhase::Ended => {}
            MatchPhase::BotThinking => self.advance_bot_timer(dt),
            MatchPhase::PlayerSimulating | MatchPhase::BotSimulating | MatchPhase::Settling => self.step(dt),
        }
    }

    /// Back to the initial state and positions; cancels the bot timer.
    /// The RNG stream continues so the next round plays out differently.
    pub fn reset(&mut self) {
        if self.destroyed {
            return;
        }
        if self.bot_timer.cancel() {
            log::debug!("pending bot shot cancelled by reset");
        }
        self.bot_action = None;
        self.drag = None;
        self.state = MatchState::new();
        let (player, bot) = initial_tokens(self.tier, &self.config);
        self.player = player;
        self.bot = bot;
        self.turn_announced = false;
        self.game_over_sent = false;
        log::info!("match reset (tier {})", self.tier.as_u8());
    }

    /// Cancel timers and drop listeners. Every later call is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.bot_timer.cancel();
        self.bot_action = None;
        self.drag = None;
        self.events.clear();
        self.destroyed = true;
        log::info!("match destroyed");
    }

    // === Internals ===

    fn player_may_act(&self) -> bool {
        !self.destroyed && self.state.current_turn == Side::Player
    }

    /// Deliver the pending `TurnStart` (the first turn starts before anyone
    /// can subscribe, so it is announced on first use)
    fn announce_turn(&mut self) {
        if self.turn_announced || self.state.phase == MatchPhase::Ended {
            return;
        }
        self.turn_announced = true;
        self.events.emit(&MatchEvent::TurnStart {
            side: self.state.current_turn,
        });
    }

    fn launch(&mut self, side: Side, input: FlickInput) {
        let max_power = self.config.max_flick_power;
        let slide_frames = self.config.physics.overshoot_slide_frames;
        let token = match side {
            Side::Player => &mut self.player,
            Side::Bot => &mut self.bot,
        };
        token.launch(&input, max_power, slide_frames);
        log::info!(
            "{} flicks: power {:.3}, speed {:.1}{}",
            side.as_str(),
            input.power,
            token.speed(),
            if input.overshoot { " (overshoot)" } else { "" }
        );

        self.state.last_attacker = Some(side);
        self.state.simulation_frame_count = 0;
        self.state.settle_frame_count = 0;
        self.state.phase = simulating_phase(side);
        self.events.emit(&MatchEvent::Flick { side, input });
    }

    fn advance_bot_timer(&mut self, dt: f64) {
        let Some((handle, decision)) = self.bot_timer.advance(dt * 1000.0) else {
            return;
        };
        // The phase or the expected action may have changed while waiting
        if self.state.phase != MatchPhase::BotThinking || self.bot_action != Some(handle) {
            log::debug!("stale bot action ignored");
            return;
        }
        self.bot_action = None;
        self.launch(Side::Bot, decision.input);
    }

    fn step(&mut self, dt: f64) {
        let profile = &self.config.physics;
        physics::integrate(&mut self.player, &self.bounds, profile, dt);
        physics::integrate(&mut self.bot, &self.bounds, profile, dt);

        if let Some(impact) = collision::resolve_pair(&mut self.player, &mut self.bot, &self.bounds, profile) {
            self.events.emit(&MatchEvent::Collision {
                side: self.state.current_turn,
                impact,
            });
        }

        let status = arbiter::track_settle(&mut self.state, &self.player, &self.bot, &self.config);
        match status {
            SettleStatus::Moving => self.state.phase = simulating_phase(self.state.current_turn),
            SettleStatus::Settling => self.state.phase = MatchPhase::Settling,
            SettleStatus::Settled | SettleStatus::Forced => self.finish_turn(status),
        }
    }

    fn finish_turn(&mut self, status: SettleStatus) {
        let side = self.state.current_turn;
        if status == SettleStatus::Forced {
            log::warn!(
                "{} turn hit the {}-frame cap, deciding from current positions",
                side.as_str(),
                self.config.max_simulation_frames
            );
        }

        // Residual drift must not leak into the next turn
        for token in [&mut self.player, &mut self.bot] {
            token.velocity = DVec2::ZERO;
            token.slide_frames = 0;
            token.clear_trail();
        }

        self.state.turns_taken += 1;
        self.events.emit(&MatchEvent::TurnEnd { side });

        let mut result = arbiter::decide(
            &self.player,
            &self.bot,
            self.state.last_attacker,
            self.config.overlap_tolerance,
        );
        if result == MatchResult::None && self.config.max_turns > 0 && self.state.turns_taken >= self.config.max_turns {
            log::info!("turn limit ({}) reached", self.config.max_turns);
            result = MatchResult::Draw;
        }

        if result.is_terminal() {
            self.end_match(side, result);
        } else {
            self.begin_turn(side.other());
        }
    }

    fn begin_turn(&mut self, side: Side) {
        self.state.current_turn = side;
        self.state.settle_frame_count = 0;
        self.turn_announced = true;
        match side {
            Side::Player => {
                self.state.phase = MatchPhase::Idle;
                self.events.emit(&MatchEvent::TurnStart { side });
            }
            Side::Bot => {
                self.state.phase = MatchPhase::BotThinking;
                self.events.emit(&MatchEvent::TurnStart { side });
                let decision = self.bot_policy.decide(&self.bot, &self.player, &mut self.rng);
                self.bot_action = Some(self.bot_timer.schedule(decision.think_time_ms, decision));
            }
        }
    }

    fn end_match(&mut self, side: Side, result: MatchResult) {
        self.state.result = result;
        self.state.phase = MatchPhase::Ended;
        self.drag = None;
        self.bot_timer.cancel();
        self.bot_action = None;
        if self.game_over_sent {
            return;
        }
        self.game_over_sent = true;
        log::info!("match over: {result:?} after {} turns", self.state.turns_taken);
        self.events.emit(&MatchEvent::RoundEnd { side, result });
        self.events.emit(&MatchEvent::GameOver { side, result });
    }
}

fn simulating_phase(side: Side) -> MatchPhase {
    match side {
        Side::Player => MatchPhase::PlayerSimulating,
        Side::Bot => MatchPhase::BotSimulating,
    }
}

fn initial_tokens(tier: Tier, config: &MatchConfig) -> (Token, Token) {
    let mut player = Token::new(Side::Player, config.start_position(Side::Player), config.token_radius);
    player.tier = Some(tier);
    let bot = Token::new(Side::Bot, config.start_position(Side::Bot), config.token_radius);
    (player, bot)
}
