//! Per-token integration
//!
//! Each token is advanced on its own; the collision pass runs afterwards.
//! Friction factors are defined per 60 Hz frame and scaled by `dt`.

use glam::DVec2;

use super::state::{Bounds, Token};
use crate::config::PhysicsProfile;
use crate::consts::NOMINAL_FRAME_DT;

/// Advance one token by `dt` seconds. Returns true if it bounced off a wall.
pub fn integrate(token: &mut Token, bounds: &Bounds, profile: &PhysicsProfile, dt: f64) -> bool {
    if !token.is_moving() {
        return false;
    }

    let speed = token.speed();
    if profile.trail && speed > profile.trail_min_speed {
        let pos = token.position;
        token.record_trail(pos);
    }

    token.position += token.velocity * dt;

    let mut friction = bounds.friction_for(speed);
    if token.slide_frames > 0 {
        // Overshoot slide: same curve, smaller loss per frame
        friction = 1.0 - (1.0 - friction) / profile.overshoot_friction_multiplier;
        token.slide_frames -= 1;
    }
    token.velocity *= friction.powf(dt / NOMINAL_FRAME_DT);

    if token.speed() < profile.velocity_epsilon {
        token.velocity = DVec2::ZERO;
        token.slide_frames = 0;
    }

    resolve_walls(token, bounds)
}

/// Clamp to the board and reflect the crossing velocity component
fn resolve_walls(token: &mut Token, bounds: &Bounds) -> bool {
    let r = token.radius;
    let restitution = bounds.wall_restitution;
    let mut hit = false;

    if token.position.x < r {
        token.position.x = r;
        if token.velocity.x < 0.0 {
            token.velocity.x = -token.velocity.x * restitution;
        }
        hit = true;
    } else if token.position.x > bounds.width - r {
        token.position.x = bounds.width - r;
        if token.velocity.x > 0.0 {
            token.velocity.x = -token.velocity.x * restitution;
        }
        hit = true;
    }

    if token.position.y < r {
        token.position.y = r;
        if token.velocity.y < 0.0 {
            token.velocity.y = -token.velocity.y * restitution;
        }
        hit = true;
    } else if token.position.y > bounds.height - r {
        token.position.y = bounds.height - r;
        if token.velocity.y > 0.0 {
            token.velocity.y = -token.velocity.y * restitution;
        }
        hit = true;
    }

    hit
}

/// Approximate open-board travel distance for a launch at `speed`
///
/// Sums the two geometric friction regimes; ignores walls and the epsilon snap.
pub fn reach_distance(speed: f64, bounds: &Bounds) -> f64 {
    let dt = NOMINAL_FRAME_DT;
    let threshold = bounds.friction_speed_threshold;
    let low_loss = 1.0 - bounds.friction_low;
    let high_loss = 1.0 - bounds.friction_high;
    if speed <= threshold {
        speed * dt / low_loss
    } else {
        dt * ((speed - threshold) / high_loss + threshold / low_loss)
    }
}

/// Inverse of [`reach_distance`]: launch speed that travels `distance`
pub fn speed_for_distance(distance: f64, bounds: &Bounds) -> f64 {
    let distance = distance.max(0.0);
    let dt = NOMINAL_FRAME_DT;
    let threshold = bounds.friction_speed_threshold;
    let low_loss = 1.0 - bounds.friction_low;
    let high_loss = 1.0 - bounds.friction_high;
    let low_reach = threshold * dt / low_loss;
    if distance <= low_reach {
        distance * low_loss / dt
    } else {
        threshold + high_loss * (distance / dt - threshold / low_loss)
    }
}
