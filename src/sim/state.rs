//! Match state and core simulation types
//!
//! Everything a renderer needs to draw a frame lives here; the engine owns the
//! only mutable copies.

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::flick::FlickInput;
use crate::config::MatchConfig;
use crate::consts::TRAIL_LENGTH;
use crate::error::MatchError;
use crate::session::RoundOutcome;

/// Which token a turn, event or result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Bot,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Player => Side::Bot,
            Side::Bot => Side::Player,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Bot => "bot",
        }
    }
}

/// Difficulty/stake rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    One,
    Two,
    Three,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::One, Tier::Two, Tier::Three];

    pub fn as_u8(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = MatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            other => Err(MatchError::InvalidTier(other)),
        }
    }
}

/// A chun (disc token)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub role: Side,
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
    /// Player's stake tier (cosmetic); `None` for the bot
    pub tier: Option<Tier>,
    /// Frames left of reduced friction after an overshoot launch
    pub slide_frames: u32,
    /// Recent positions, newest first (render hint only)
    pub trail: VecDeque<DVec2>,
}

impl Token {
    pub fn new(role: Side, position: DVec2, radius: f64) -> Self {
        Self {
            role,
            position,
            velocity: DVec2::ZERO,
            radius,
            tier: None,
            slide_frames: 0,
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.velocity != DVec2::ZERO
    }

    /// Below the settle threshold
    #[inline]
    pub fn is_settled(&self, velocity_threshold: f64) -> bool {
        self.speed() < velocity_threshold
    }

    /// Whether `point` is within the grab radius
    pub fn contains_point(&self, point: DVec2, hit_radius_scale: f64) -> bool {
        self.position.distance(point) <= self.radius * hit_radius_scale
    }

    /// Set velocity from a flick
    pub fn launch(&mut self, input: &FlickInput, max_flick_power: f64, overshoot_slide_frames: u32) {
        let direction = input.direction.normalize_or_zero();
        let power = if input.power.is_finite() { input.power.clamp(0.0, 1.0) } else { 0.0 };
        self.velocity = direction * power * max_flick_power;
        self.slide_frames = if input.overshoot { overshoot_slide_frames } else { 0 };
    }

    /// Record a position to the trail
    pub fn record_trail(&mut self, pos: DVec2) {
        self.trail.push_front(pos);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_back();
        }
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }
}

/// Board extents and surface response, fixed for a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
    pub friction_high: f64,
    pub friction_low: f64,
    pub friction_speed_threshold: f64,
    pub wall_restitution: f64,
}

impl Bounds {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            width: config.board_width,
            height: config.board_height,
            friction_high: config.physics.friction_high,
            friction_low: config.physics.friction_low,
            friction_speed_threshold: config.physics.friction_speed_threshold,
            wall_restitution: config.physics.wall_restitution,
        }
    }

    /// Per-frame friction factor for a given speed
    #[inline]
    pub fn friction_for(&self, speed: f64) -> f64 {
        if speed > self.friction_speed_threshold {
            self.friction_high
        } else {
            self.friction_low
        }
    }

    /// Clamp a center so a disc of `radius` stays on the board
    pub fn clamp_center(&self, pos: DVec2, radius: f64) -> DVec2 {
        DVec2::new(
            pos.x.clamp(radius, (self.width - radius).max(radius)),
            pos.y.clamp(radius, (self.height - radius).max(radius)),
        )
    }
}

/// Match phase (state machine key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Player's turn, awaiting a drag
    Idle,
    /// Player is dragging
    PlayerAiming,
    PlayerSimulating,
    /// Bot's think-time delay is pending
    BotThinking,
    BotSimulating,
    /// Both tokens below threshold, waiting for the settle count
    Settling,
    /// Terminal result reached; only `reset` leaves it
    Ended,
}

impl MatchPhase {
    /// Physics is stepped in these phases
    pub fn is_stepping(self) -> bool {
        matches!(
            self,
            MatchPhase::PlayerSimulating | MatchPhase::BotSimulating | MatchPhase::Settling
        )
    }

    /// The player may start or finish a flick
    pub fn accepts_player_input(self) -> bool {
        matches!(self, MatchPhase::Idle | MatchPhase::PlayerAiming)
    }
}

/// Round result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchResult {
    #[default]
    None,
    PlayerWins,
    BotWins,
    Draw,
}

impl MatchResult {
    pub fn is_terminal(self) -> bool {
        self != MatchResult::None
    }

    pub fn win_for(side: Side) -> Self {
        match side {
            Side::Player => MatchResult::PlayerWins,
            Side::Bot => MatchResult::BotWins,
        }
    }

    /// The result from the player's point of view (`None` while undecided)
    pub fn player_outcome(self) -> Option<RoundOutcome> {
        match self {
            MatchResult::None => None,
            MatchResult::PlayerWins => Some(RoundOutcome::Win),
            MatchResult::BotWins => Some(RoundOutcome::Lose),
            MatchResult::Draw => Some(RoundOutcome::Draw),
        }
    }
}

/// Turn bookkeeping for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub phase: MatchPhase,
    pub current_turn: Side,
    /// Side that issued the most recent flick
    pub last_attacker: Option<Side>,
    pub simulation_frame_count: u32,
    pub settle_frame_count: u32,
    pub result: MatchResult,
    /// Settled turns so far (drives the turn-limit draw)
    pub turns_taken: u32,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::Idle,
            current_turn: Side::Player,
            last_attacker: None,
            simulation_frame_count: 0,
            settle_frame_count: 0,
            result: MatchResult::None,
            turns_taken: 0,
        }
    }
}
