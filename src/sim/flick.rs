//! Drag gesture to launch mapping
//!
//! Slingshot semantics: the token flies opposite to the pull. Pull length maps
//! to power through three zones:
//! - linear up to `optimal_ratio`
//! - a flat plateau up to `overshoot_start_ratio`
//! - overshoot beyond it: power drops and the aim wobbles randomly

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::vector::{clamp_length, perpendicular_component, rotate, safe_normalize};
use crate::config::FlickTuning;

/// A launch request, consumed once to set a token's velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlickInput {
    /// Unit launch direction (zero for a degenerate flick)
    pub direction: DVec2,
    /// Normalized power in [0, 1]
    pub power: f64,
    /// Where the gesture grabbed the token, in radius units
    pub contact_offset: DVec2,
    /// Launched from the overshoot zone (enables the slide refinement)
    pub overshoot: bool,
}

impl FlickInput {
    pub fn new(direction: DVec2, power: f64) -> Self {
        let power = if power.is_finite() { power.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            direction: safe_normalize(direction),
            power,
            contact_offset: DVec2::ZERO,
            overshoot: false,
        }
    }

    /// Nothing would move, or the input is not a number
    pub fn is_degenerate(&self) -> bool {
        !self.direction.is_finite() || self.direction == DVec2::ZERO || !(self.power.is_finite() && self.power > 0.0)
    }
}

/// Mapper output: the input plus feedback for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlickOutcome {
    pub input: FlickInput,
    /// Clamped pull length over `max_pull_length`
    pub pull_ratio: f64,
    pub was_overshoot: bool,
    /// Total angular deviation applied to the aim (radians)
    pub deviation: f64,
}

/// Power for a pull ratio, plus how far into the overshoot zone it is (0..=1)
pub fn power_curve(ratio: f64, tuning: &FlickTuning) -> (f64, f64) {
    let optimal = tuning.optimal_ratio;
    let overshoot_start = tuning.overshoot_start_ratio;
    let plateau = optimal + (overshoot_start - optimal) * tuning.plateau_gain;

    if ratio <= optimal {
        (ratio, 0.0)
    } else if ratio <= overshoot_start {
        (optimal + (ratio - optimal) * tuning.plateau_gain, 0.0)
    } else {
        let span = (1.0 - overshoot_start).max(f64::EPSILON);
        let excess = ((ratio - overshoot_start) / span).clamp(0.0, 1.0);
        (plateau * (1.0 - tuning.overshoot_power_penalty * excess), excess)
    }
}

/// Map a drag from `start` to `end` into a flick
///
/// Returns `None` for a cancelled gesture (pull shorter than `min_pull_length`).
/// `rng` is only drawn from for overshoot pulls.
pub fn map_drag<R: Rng + ?Sized>(
    start: DVec2,
    end: DVec2,
    contact_offset: DVec2,
    tuning: &FlickTuning,
    rng: &mut R,
) -> Option<FlickOutcome> {
    let (mut outcome, excess) = map_without_wobble(start, end, contact_offset, tuning)?;
    if excess > 0.0 {
        let wobble = rng.random_range(-1.0..=1.0) * tuning.overshoot_max_deviation * excess;
        outcome.input.direction = rotate(outcome.input.direction, wobble);
        outcome.deviation += wobble;
    }
    Some(outcome)
}

/// Aim preview while dragging: same mapping, no random wobble
pub fn preview_drag(
    start: DVec2,
    end: DVec2,
    contact_offset: DVec2,
    tuning: &FlickTuning,
) -> Option<FlickOutcome> {
    map_without_wobble(start, end, contact_offset, tuning).map(|(outcome, _)| outcome)
}

fn map_without_wobble(
    start: DVec2,
    end: DVec2,
    contact_offset: DVec2,
    tuning: &FlickTuning,
) -> Option<(FlickOutcome, f64)> {
    let pull = end - start;
    let raw_length = pull.length();
    if !raw_length.is_finite() || raw_length < tuning.min_pull_length {
        return None;
    }

    let pull_length = raw_length.min(tuning.max_pull_length);
    let ratio = pull_length / tuning.max_pull_length;
    let mut direction = safe_normalize(-pull);
    let (mut power, excess) = power_curve(ratio, tuning);

    // Off-center grabs lose power and drift away from the grab side
    let offset = if contact_offset.is_finite() {
        clamp_length(contact_offset, 1.0)
    } else {
        DVec2::ZERO
    };
    power *= 1.0 - tuning.contact_power_loss * offset.length();
    let drift = -perpendicular_component(offset, direction) * tuning.contact_drift_max;
    direction = rotate(direction, drift);

    let input = FlickInput {
        direction,
        power: power.clamp(0.0, 1.0),
        contact_offset: offset,
        overshoot: excess > 0.0,
    };
    log::trace!("flick ratio={ratio:.3} power={:.3} excess={excess:.3}", input.power);

    Some((
        FlickOutcome {
            input,
            pull_ratio: ratio,
            was_overshoot: excess > 0.0,
            deviation: drift,
        },
        excess,
    ))
}
