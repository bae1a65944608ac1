//! Match configuration
//!
//! Everything a match needs that is tunable lives here: board geometry, the
//! physics profile, flick gesture tuning and the bot difficulty table. The
//! host page can ship a JSON override; missing fields fall back to defaults.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{Side, Tier};

/// Physics feel presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProfileKind {
    /// Plain bouncy discs, little attacker bias
    Elastic,
    /// Skill model: overshoot slide, strong attacker bias
    #[default]
    Flick,
    /// Exaggerated knockbacks and long trails
    Juicy,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Elastic => "Elastic",
            ProfileKind::Flick => "Flick",
            ProfileKind::Juicy => "Juicy",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "elastic" | "simple" => Some(ProfileKind::Elastic),
            "flick" | "skill" => Some(ProfileKind::Flick),
            "juicy" => Some(ProfileKind::Juicy),
            _ => None,
        }
    }
}

/// Friction, restitution and collision response for one feel preset
///
/// Deserializes over `preset(kind)`: listed fields override the preset,
/// unlisted ones keep its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PhysicsOverride")]
pub struct PhysicsProfile {
    pub kind: ProfileKind,

    // === Integration ===
    /// Per-frame velocity factor above `friction_speed_threshold`
    pub friction_high: f64,
    /// Per-frame velocity factor at or below `friction_speed_threshold`
    pub friction_low: f64,
    pub friction_speed_threshold: f64,
    /// Fraction of the normal velocity kept after a wall bounce
    pub wall_restitution: f64,
    /// Snap-to-zero speed
    pub velocity_epsilon: f64,

    // === Collision response ===
    /// Speed above which a token counts as the moving side of a collision
    pub collision_activity_speed: f64,
    /// Velocity factor applied to a lone attacker on impact
    pub attacker_damping: f64,
    /// Defender launch speed as a fraction of the attacker's impact speed
    pub defender_push: f64,
    /// Normal restitution when both tokens are moving
    pub restitution: f64,

    // === Overshoot slide ===
    /// Divides the friction loss for overshoot launches (1.0 disables)
    pub overshoot_friction_multiplier: f64,
    pub overshoot_slide_frames: u32,

    // === Render hints ===
    pub trail: bool,
    pub trail_min_speed: f64,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self::preset(ProfileKind::default())
    }
}

impl PhysicsProfile {
    pub fn preset(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Elastic => Self {
                kind,
                friction_high: 0.975,
                friction_low: 0.93,
                friction_speed_threshold: 120.0,
                wall_restitution: 0.8,
                velocity_epsilon: VELOCITY_EPSILON,
                collision_activity_speed: 15.0,
                attacker_damping: 0.35,
                defender_push: 0.85,
                restitution: 0.85,
                overshoot_friction_multiplier: 1.0,
                overshoot_slide_frames: 0,
                trail: false,
                trail_min_speed: TRAIL_MIN_SPEED,
            },
            ProfileKind::Flick => Self {
                kind,
                friction_high: 0.96,
                friction_low: 0.9,
                friction_speed_threshold: 120.0,
                wall_restitution: 0.6,
                velocity_epsilon: VELOCITY_EPSILON,
                collision_activity_speed: 15.0,
                attacker_damping: 0.15,
                defender_push: 0.9,
                restitution: 0.5,
                overshoot_friction_multiplier: 2.0,
                overshoot_slide_frames: 30,
                trail: true,
                trail_min_speed: TRAIL_MIN_SPEED,
            },
            ProfileKind::Juicy => Self {
                kind,
                friction_high: 0.965,
                friction_low: 0.88,
                friction_speed_threshold: 150.0,
                wall_restitution: 0.7,
                velocity_epsilon: VELOCITY_EPSILON,
                collision_activity_speed: 20.0,
                attacker_damping: 0.05,
                defender_push: 1.25,
                restitution: 0.2,
                overshoot_friction_multiplier: 1.5,
                overshoot_slide_frames: 20,
                trail: true,
                trail_min_speed: TRAIL_MIN_SPEED * 0.5,
            },
        }
    }
}

/// Sparse physics JSON; `None` fields fall back to the chosen preset
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PhysicsOverride {
    kind: ProfileKind,
    friction_high: Option<f64>,
    friction_low: Option<f64>,
    friction_speed_threshold: Option<f64>,
    wall_restitution: Option<f64>,
    velocity_epsilon: Option<f64>,
    collision_activity_speed: Option<f64>,
    attacker_damping: Option<f64>,
    defender_push: Option<f64>,
    restitution: Option<f64>,
    overshoot_friction_multiplier: Option<f64>,
    overshoot_slide_frames: Option<u32>,
    trail: Option<bool>,
    trail_min_speed: Option<f64>,
}

impl From<PhysicsOverride> for PhysicsProfile {
    fn from(o: PhysicsOverride) -> Self {
        let base = PhysicsProfile::preset(o.kind);
        Self {
            kind: o.kind,
            friction_high: o.friction_high.unwrap_or(base.friction_high),
            friction_low: o.friction_low.unwrap_or(base.friction_low),
            friction_speed_threshold: o.friction_speed_threshold.unwrap_or(base.friction_speed_threshold),
            wall_restitution: o.wall_restitution.unwrap_or(base.wall_restitution),
            velocity_epsilon: o.velocity_epsilon.unwrap_or(base.velocity_epsilon),
            collision_activity_speed: o.collision_activity_speed.unwrap_or(base.collision_activity_speed),
            attacker_damping: o.attacker_damping.unwrap_or(base.attacker_damping),
            defender_push: o.defender_push.unwrap_or(base.defender_push),
            restitution: o.restitution.unwrap_or(base.restitution),
            overshoot_friction_multiplier: o
                .overshoot_friction_multiplier
                .unwrap_or(base.overshoot_friction_multiplier),
            overshoot_slide_frames: o.overshoot_slide_frames.unwrap_or(base.overshoot_slide_frames),
            trail: o.trail.unwrap_or(base.trail),
            trail_min_speed: o.trail_min_speed.unwrap_or(base.trail_min_speed),
        }
    }
}

/// Drag gesture to power mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickTuning {
    pub max_pull_length: f64,
    /// Pulls shorter than this are cancelled gestures
    pub min_pull_length: f64,
    /// Pull ratio where power reaches the optimal zone
    pub optimal_ratio: f64,
    /// Pull ratio where overshoot starts
    pub overshoot_start_ratio: f64,
    /// Power gained per unit of ratio inside the optimal plateau
    pub plateau_gain: f64,
    /// Fraction of power lost at a full overshoot
    pub overshoot_power_penalty: f64,
    /// Max random deviation at a full overshoot (radians)
    pub overshoot_max_deviation: f64,
    /// Fraction of power lost when grabbed at the rim
    pub contact_power_loss: f64,
    /// Drift angle for a full perpendicular grab offset (radians)
    pub contact_drift_max: f64,
    /// Grab radius as a multiple of the token radius
    pub hit_radius_scale: f64,
}

impl Default for FlickTuning {
    fn default() -> Self {
        Self {
            max_pull_length: MAX_PULL_LENGTH,
            min_pull_length: MIN_PULL_LENGTH,
            optimal_ratio: 0.6,
            overshoot_start_ratio: 0.75,
            plateau_gain: 0.25,
            overshoot_power_penalty: 0.3,
            overshoot_max_deviation: 0.35,
            contact_power_loss: 0.35,
            contact_drift_max: 0.25,
            hit_radius_scale: HIT_RADIUS_SCALE,
        }
    }
}

/// Bot skill for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotDifficultyProfile {
    pub aim_error_radians: f64,
    pub power_error: f64,
    pub overshoot_chance: f64,
    pub optimal_aim_chance: f64,
    pub random_shot_chance: f64,
    pub think_time_min_ms: u32,
    pub think_time_max_ms: u32,
}

impl BotDifficultyProfile {
    /// Built-in profile for a tier
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::One => Self {
                aim_error_radians: 0.35,
                power_error: 0.2,
                overshoot_chance: 0.35,
                optimal_aim_chance: 0.5,
                random_shot_chance: 0.15,
                think_time_min_ms: 600,
                think_time_max_ms: 1400,
            },
            Tier::Two => Self {
                aim_error_radians: 0.18,
                power_error: 0.1,
                overshoot_chance: 0.2,
                optimal_aim_chance: 0.7,
                random_shot_chance: 0.03,
                think_time_min_ms: 800,
                think_time_max_ms: 1600,
            },
            Tier::Three => Self {
                aim_error_radians: 0.06,
                power_error: 0.04,
                overshoot_chance: 0.08,
                optimal_aim_chance: 0.9,
                random_shot_chance: 0.0,
                think_time_min_ms: 900,
                think_time_max_ms: 1800,
            },
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let probabilities = [
            self.overshoot_chance,
            self.optimal_aim_chance,
            self.random_shot_chance,
        ];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(ConfigError::invalid(field, "probabilities must be within [0, 1]"));
        }
        if !(self.aim_error_radians.is_finite() && self.aim_error_radians >= 0.0) {
            return Err(ConfigError::invalid(field, "aim error must be finite and non-negative"));
        }
        if !(self.power_error.is_finite() && self.power_error >= 0.0) {
            return Err(ConfigError::invalid(field, "power error must be finite and non-negative"));
        }
        if self.think_time_min_ms > self.think_time_max_ms {
            return Err(ConfigError::invalid(field, "think time min exceeds max"));
        }
        Ok(())
    }
}

/// Difficulty profiles indexed by tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotProfileTable {
    pub tier1: BotDifficultyProfile,
    pub tier2: BotDifficultyProfile,
    pub tier3: BotDifficultyProfile,
}

impl Default for BotProfileTable {
    fn default() -> Self {
        Self {
            tier1: BotDifficultyProfile::for_tier(Tier::One),
            tier2: BotDifficultyProfile::for_tier(Tier::Two),
            tier3: BotDifficultyProfile::for_tier(Tier::Three),
        }
    }
}

impl BotProfileTable {
    pub fn get(&self, tier: Tier) -> &BotDifficultyProfile {
        match tier {
            Tier::One => &self.tier1,
            Tier::Two => &self.tier2,
            Tier::Three => &self.tier3,
        }
    }
}

/// Complete match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub board_width: f64,
    pub board_height: f64,
    pub token_radius: f64,
    /// Starting centers as fractions of the board
    pub player_start: (f64, f64),
    pub bot_start: (f64, f64),
    pub physics: PhysicsProfile,
    /// Launch speed at power 1.0 (units/s)
    pub max_flick_power: f64,
    pub velocity_threshold: f64,
    pub settle_frames_required: u32,
    pub max_simulation_frames: u32,
    pub overlap_tolerance: f64,
    /// Settled non-overlap turns before a draw (0 = unlimited)
    pub max_turns: u32,
    pub flick: FlickTuning,
    pub bots: BotProfileTable,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            token_radius: TOKEN_RADIUS,
            player_start: PLAYER_START,
            bot_start: BOT_START,
            physics: PhysicsProfile::default(),
            max_flick_power: MAX_FLICK_POWER,
            velocity_threshold: VELOCITY_THRESHOLD,
            settle_frames_required: SETTLE_FRAMES_REQUIRED,
            max_simulation_frames: MAX_SIMULATION_FRAMES,
            overlap_tolerance: OVERLAP_TOLERANCE,
            max_turns: MAX_TURNS,
            flick: FlickTuning::default(),
            bots: BotProfileTable::default(),
        }
    }
}

impl MatchConfig {
    /// Default configuration with a different physics preset
    pub fn with_profile(kind: ProfileKind) -> Self {
        Self {
            physics: PhysicsProfile::preset(kind),
            ..Self::default()
        }
    }

    /// Parse a JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded match config ({} profile, {}x{} board)",
            config.physics.kind.as_str(),
            config.board_width,
            config.board_height
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Board-space starting center for a side's token, kept on the board
    pub fn start_position(&self, side: Side) -> DVec2 {
        let (fx, fy) = match side {
            Side::Player => self.player_start,
            Side::Bot => self.bot_start,
        };
        let r = self.token_radius;
        DVec2::new(
            (fx * self.board_width).clamp(r, self.board_width - r),
            (fy * self.board_height).clamp(r, self.board_height - r),
        )
    }

    /// Reject values that would make the simulation misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("board_width", self.board_width),
            ("board_height", self.board_height),
            ("token_radius", self.token_radius),
            ("max_flick_power", self.max_flick_power),
            ("velocity_threshold", self.velocity_threshold),
            ("flick.max_pull_length", self.flick.max_pull_length),
            ("physics.velocity_epsilon", self.physics.velocity_epsilon),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, "must be finite and positive"));
            }
        }

        let diameter = self.token_radius * 2.0;
        if self.board_width < diameter * 2.0 || self.board_height < diameter * 2.0 {
            return Err(ConfigError::invalid("board", "must fit two tokens side by side"));
        }

        let starts = [self.player_start.0, self.player_start.1, self.bot_start.0, self.bot_start.1];
        if starts.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(ConfigError::invalid("player_start/bot_start", "fractions must be within [0, 1]"));
        }
        let start_gap = self
            .start_position(Side::Player)
            .distance(self.start_position(Side::Bot));
        if start_gap < diameter {
            return Err(ConfigError::invalid("player_start/bot_start", "tokens must not start overlapping"));
        }

        let unit_open = [
            ("physics.friction_high", self.physics.friction_high),
            ("physics.friction_low", self.physics.friction_low),
            ("physics.wall_restitution", self.physics.wall_restitution),
            ("physics.restitution", self.physics.restitution),
        ];
        for (field, value) in unit_open {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::invalid(field, "must be within (0, 1)"));
            }
        }

        let p = &self.physics;
        if !(p.attacker_damping >= 0.0 && p.attacker_damping < 1.0) {
            return Err(ConfigError::invalid("physics.attacker_damping", "must be within [0, 1)"));
        }
        if !(p.defender_push.is_finite() && p.defender_push >= 0.0) {
            return Err(ConfigError::invalid("physics.defender_push", "must be finite and non-negative"));
        }
        if !(p.friction_speed_threshold.is_finite() && p.friction_speed_threshold >= 0.0) {
            return Err(ConfigError::invalid(
                "physics.friction_speed_threshold",
                "must be finite and non-negative",
            ));
        }
        if !(p.overshoot_friction_multiplier.is_finite() && p.overshoot_friction_multiplier >= 1.0) {
            return Err(ConfigError::invalid(
                "physics.overshoot_friction_multiplier",
                "must be at least 1.0",
            ));
        }
        if p.velocity_epsilon >= self.velocity_threshold {
            return Err(ConfigError::invalid(
                "physics.velocity_epsilon",
                "must be below velocity_threshold",
            ));
        }

        if self.settle_frames_required == 0 {
            return Err(ConfigError::invalid("settle_frames_required", "must be at least 1"));
        }
        if self.max_simulation_frames == 0 {
            return Err(ConfigError::invalid("max_simulation_frames", "must be at least 1"));
        }
        if !(self.overlap_tolerance.is_finite() && self.overlap_tolerance >= 1.0) {
            return Err(ConfigError::invalid("overlap_tolerance", "must be at least 1.0"));
        }

        let f = &self.flick;
        if !(f.min_pull_length >= 0.0 && f.min_pull_length < f.max_pull_length) {
            return Err(ConfigError::invalid("flick.min_pull_length", "must be below max_pull_length"));
        }
        if !(0.0 < f.optimal_ratio
            && f.optimal_ratio <= f.overshoot_start_ratio
            && f.overshoot_start_ratio < 1.0)
        {
            return Err(ConfigError::invalid(
                "flick.optimal_ratio",
                "ratios must satisfy 0 < optimal <= overshoot_start < 1",
            ));
        }
        let unit_closed = [
            ("flick.plateau_gain", f.plateau_gain),
            ("flick.overshoot_power_penalty", f.overshoot_power_penalty),
            ("flick.contact_power_loss", f.contact_power_loss),
        ];
        for (field, value) in unit_closed {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be within [0, 1]"));
            }
        }
        if !(f.hit_radius_scale.is_finite() && f.hit_radius_scale >= 1.0) {
            return Err(ConfigError::invalid("flick.hit_radius_scale", "must be at least 1.0"));
        }

        self.bots.tier1.validate("bots.tier1")?;
        self.bots.tier2.validate("bots.tier2")?;
        self.bots.tier3.validate("bots.tier3")?;
        Ok(())
    }
}
