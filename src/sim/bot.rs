//! Bot decision policy
//!
//! Three knobs per tier shape the shot: a chance of a fully random "mistake"
//! shot, aim noise (doubled on a bad-aim roll), and power drawn either from an
//! overshoot band or a band around the ideal that tightens with tier.

use std::f64::consts::PI;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::flick::FlickInput;
use super::physics::speed_for_distance;
use super::state::{Bounds, Tier, Token};
use super::vector::{rotate, safe_normalize};
use crate::config::{BotDifficultyProfile, MatchConfig};
use crate::direction_from_angle;

/// Half-width of the optimal power band at tier 1 (divided by tier)
const OPTIMAL_SPREAD: f64 = 0.3;
/// Overshoot power band, as a multiple of the ideal power
const OVERSHOOT_BAND: (f64, f64) = (1.25, 1.6);
/// Power band of a random shot
const RANDOM_POWER_BAND: (f64, f64) = (0.2, 0.9);
const MIN_POWER: f64 = 0.05;

/// Which branch produced the shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotKind {
    Random,
    Aimed,
    BadAim,
}

/// A planned bot shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotDecision {
    pub input: FlickInput,
    pub think_time_ms: u32,
    pub kind: ShotKind,
}

/// Per-match bot, fixed at match start
#[derive(Debug, Clone)]
pub struct BotPolicy {
    pub tier: Tier,
    pub profile: BotDifficultyProfile,
    bounds: Bounds,
    max_flick_power: f64,
    overlap_tolerance: f64,
}

impl BotPolicy {
    pub fn new(tier: Tier, config: &MatchConfig) -> Self {
        Self {
            tier,
            profile: config.bots.get(tier).clone(),
            bounds: Bounds::from_config(config),
            max_flick_power: config.max_flick_power,
            overlap_tolerance: config.overlap_tolerance,
        }
    }

    /// Power that brings the bot to rest just inside contact range
    pub fn ideal_power(&self, bot: &Token, player: &Token) -> f64 {
        let contact = bot.radius + player.radius;
        let gap = (bot.position.distance(player.position) - contact).max(0.0);
        let travel = gap + contact * (self.overlap_tolerance - 1.0) * 0.5;
        (speed_for_distance(travel, &self.bounds) / self.max_flick_power).clamp(MIN_POWER, 1.0)
    }

    /// Plan a shot from the current positions
    pub fn decide<R: Rng + ?Sized>(&self, bot: &Token, player: &Token, rng: &mut R) -> BotDecision {
        let p = &self.profile;
        let aim = optimal_direction(bot, player);

        let (input, kind) = if aim == DVec2::ZERO || rng.random_bool(p.random_shot_chance) {
            let theta = rng.random_range(-PI..PI);
            let power = rng.random_range(RANDOM_POWER_BAND.0..=RANDOM_POWER_BAND.1);
            (FlickInput::new(direction_from_angle(theta), power), ShotKind::Random)
        } else {
            let (noise_scale, kind) = if rng.random_bool(p.optimal_aim_chance) {
                (p.aim_error_radians, ShotKind::Aimed)
            } else {
                (p.aim_error_radians * 2.0, ShotKind::BadAim)
            };
            let direction = rotate(aim, rng.random_range(-1.0..=1.0) * noise_scale);

            let ideal = self.ideal_power(bot, player);
            let overshoot = rng.random_bool(p.overshoot_chance);
            let factor = if overshoot {
                rng.random_range(OVERSHOOT_BAND.0..=OVERSHOOT_BAND.1)
            } else {
                let spread = OPTIMAL_SPREAD / f64::from(self.tier.as_u8());
                rng.random_range((1.0 - spread)..=(1.0 + spread))
            };
            let power = ideal * factor + rng.random_range(-p.power_error..=p.power_error);

            let input = FlickInput {
                overshoot,
                ..FlickInput::new(direction, power.clamp(MIN_POWER, 1.0))
            };
            (input, kind)
        };

        let think_time_ms = rng.random_range(p.think_time_min_ms..=p.think_time_max_ms);
        log::debug!(
            "bot tier {} plans {:?} power={:.3} think={}ms",
            self.tier.as_u8(),
            kind,
            input.power,
            think_time_ms
        );

        BotDecision {
            input,
            think_time_ms,
            kind,
        }
    }
}

/// Straight line from the bot to the player (zero if they coincide)
pub fn optimal_direction(bot: &Token, player: &Token) -> DVec2 {
    safe_normalize(player.position - bot.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Side;
    use crate::sim::vector::signed_angle;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tokens() -> (Token, Token) {
        (
            Token::new(Side::Bot, DVec2::new(200.0, 140.0), 32.0),
            Token::new(Side::Player, DVec2::new(260.0, 560.0), 32.0),
        )
    }

    fn mean_deviation(tier: Tier, samples: usize, seed: u64) -> f64 {
        let config = MatchConfig::default();
        let policy = BotPolicy::new(tier, &config);
        let (bot, player) = tokens();
        let optimal = optimal_direction(&bot, &player);
        let mut rng = Pcg32::seed_from_u64(seed);
        let total: f64 = (0..samples)
            .map(|_| {
                let d = policy.decide(&bot, &player, &mut rng);
                signed_angle(optimal, d.input.direction).abs()
            })
            .sum();
        total / samples as f64
    }

    #[test]
    fn test_tier_three_aims_closer_than_tier_one() {
        let easy = mean_deviation(Tier::One, 10_000, 42);
        let hard = mean_deviation(Tier::Three, 10_000, 42);
        assert!(hard < easy, "tier 3 deviation {hard} should be below tier 1 {easy}");
    }

    #[test]
    fn test_tier_three_never_shoots_randomly() {
        let config = MatchConfig::default();
        let policy = BotPolicy::new(Tier::Three, &config);
        let (bot, player) = tokens();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..2_000 {
            assert_ne!(policy.decide(&bot, &player, &mut rng).kind, ShotKind::Random);
        }
    }

    #[test]
    fn test_tier_one_overshoots_more() {
        let config = MatchConfig::default();
        let (bot, player) = tokens();
        let count = |tier| {
            let policy = BotPolicy::new(tier, &config);
            let mut rng = Pcg32::seed_from_u64(11);
            (0..5_000)
                .filter(|_| policy.decide(&bot, &player, &mut rng).input.overshoot)
                .count()
        };
        assert!(count(Tier::Three) < count(Tier::One));
    }

    #[test]
    fn test_decision_ranges() {
        let config = MatchConfig::default();
        let (bot, player) = tokens();
        for tier in Tier::ALL {
            let policy = BotPolicy::new(tier, &config);
            let profile = config.bots.get(tier);
            let mut rng = Pcg32::seed_from_u64(5);
            for _ in 0..1_000 {
                let d = policy.decide(&bot, &player, &mut rng);
                assert!((0.0..=1.0).contains(&d.input.power));
                assert!((d.input.direction.length() - 1.0).abs() < 1e-9);
                assert!(d.think_time_ms >= profile.think_time_min_ms);
                assert!(d.think_time_ms <= profile.think_time_max_ms);
            }
        }
    }

    #[test]
    fn test_seeded_decisions_repeat() {
        let config = MatchConfig::default();
        let policy = BotPolicy::new(Tier::Two, &config);
        let (bot, player) = tokens();
        let mut a = Pcg32::seed_from_u64(99);
        let mut b = Pcg32::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(policy.decide(&bot, &player, &mut a), policy.decide(&bot, &player, &mut b));
        }
    }

    #[test]
    fn test_ideal_power_grows_with_distance() {
        let config = MatchConfig::default();
        let policy = BotPolicy::new(Tier::Three, &config);
        let bot = Token::new(Side::Bot, DVec2::new(200.0, 100.0), 32.0);
        let near = Token::new(Side::Player, DVec2::new(200.0, 250.0), 32.0);
        let far = Token::new(Side::Player, DVec2::new(200.0, 600.0), 32.0);
        assert!(policy.ideal_power(&bot, &far) > policy.ideal_power(&bot, &near));
    }

    #[test]
    fn test_coincident_tokens_fall_back_to_random() {
        let config = MatchConfig::default();
        let policy = BotPolicy::new(Tier::Three, &config);
        let bot = Token::new(Side::Bot, DVec2::new(200.0, 300.0), 32.0);
        let player = Token::new(Side::Player, DVec2::new(200.0, 300.0), 32.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let d = policy.decide(&bot, &player, &mut rng);
        assert_eq!(d.kind, ShotKind::Random);
        assert!(!d.input.direction.is_nan());
    }
}
