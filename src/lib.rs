//! Chun Flick - flick-physics and match-resolution engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (flick mapping, physics, collisions, settle/win, bot)
//! - `config`: Data-driven match tuning (physics profiles, bot difficulty table)
//! - `session`: Streak/inventory ledger fed by terminal round results
//! - `web`: Browser bindings (wasm32 only)

pub mod config;
pub mod error;
pub mod session;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{BotDifficultyProfile, BotProfileTable, FlickTuning, MatchConfig, PhysicsProfile, ProfileKind};
pub use error::{ConfigError, MatchError};
pub use session::{RoundOutcome, Session};
pub use sim::{FlickInput, MatchEngine, MatchEvent, MatchPhase, MatchResult, MatchState, Side, Tier, Token};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration; per-frame coefficients are defined against it
    pub const NOMINAL_FRAME_DT: f64 = 1.0 / 60.0;
    /// Fixed simulation timestep used by the drivers (60 Hz)
    pub const SIM_DT: f64 = NOMINAL_FRAME_DT;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Board dimensions
    pub const BOARD_WIDTH: f64 = 400.0;
    pub const BOARD_HEIGHT: f64 = 700.0;

    /// Token defaults
    pub const TOKEN_RADIUS: f64 = 32.0;
    /// Starting centers as fractions of the board (player near the bottom)
    pub const PLAYER_START: (f64, f64) = (0.5, 0.8);
    pub const BOT_START: (f64, f64) = (0.5, 0.2);

    /// Launch speed at power 1.0 (units/s)
    pub const MAX_FLICK_POWER: f64 = 1800.0;
    /// Below this speed a token is snapped to a full stop
    pub const VELOCITY_EPSILON: f64 = 1.0;
    /// Below this speed a token counts as settled
    pub const VELOCITY_THRESHOLD: f64 = 6.0;
    /// Consecutive settled frames before the arbiter decides
    pub const SETTLE_FRAMES_REQUIRED: u32 = 20;
    /// Forced-settle guard (10 s at 60 Hz)
    pub const MAX_SIMULATION_FRAMES: u32 = 600;
    /// Contact distance multiplier that still counts as "on top"
    pub const OVERLAP_TOLERANCE: f64 = 1.08;
    /// Settled non-overlap turns before the match is called a draw
    pub const MAX_TURNS: u32 = 20;

    /// Drag gesture
    pub const MAX_PULL_LENGTH: f64 = 120.0;
    pub const MIN_PULL_LENGTH: f64 = 10.0;
    /// Grab radius multiplier for starting a drag on the token
    pub const HIT_RADIUS_SCALE: f64 = 1.25;

    /// Trail sampling (render hint only)
    pub const TRAIL_LENGTH: usize = 16;
    pub const TRAIL_MIN_SPEED: f64 = 60.0;

    /// Seed used by `MatchEngine::create`
    pub const DEFAULT_SEED: u64 = 0x00C4_0F11_C4ED;
}

/// Unit vector pointing along `theta`
#[inline]
pub fn direction_from_angle(theta: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_angle_is_unit() {
        for theta in [0.0, 1.0, -2.5, 1e6] {
            assert!((direction_from_angle(theta).length() - 1.0).abs() < 1e-12);
        }
        assert!((direction_from_angle(std::f64::consts::FRAC_PI_2) - DVec2::Y).length() < 1e-12);
    }
}
