//! Token-token collision detection and response
//!
//! Response is deliberately lopsided: when only one token is moving, it stops
//! almost dead and the resting token takes the hit. Only when both are moving
//! does a plain restitution exchange happen.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::{Bounds, Side, Token};
use crate::config::PhysicsProfile;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: DVec2,
    /// Unit normal from the first circle toward the second
    pub normal: DVec2,
    /// Overlap depth (for position correction)
    pub penetration: f64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: DVec2::ZERO,
            normal: DVec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// A velocity-changing contact, reported for render/audio hints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// The lone moving side, `None` when both were moving
    pub attacker: Option<Side>,
    /// Relevant pre-impact speed
    pub impact_speed: f64,
    pub point: DVec2,
    pub normal: DVec2,
}

/// Circle-circle overlap test
///
/// `fallback_normal` is used when the centers coincide.
pub fn circle_collision(
    a_pos: DVec2,
    a_radius: f64,
    b_pos: DVec2,
    b_radius: f64,
    fallback_normal: DVec2,
) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let min_dist = a_radius + b_radius;

    if !dist.is_finite() || dist >= min_dist {
        return CollisionResult::miss();
    }

    let normal = if dist > f64::EPSILON {
        delta / dist
    } else {
        let n = fallback_normal.normalize_or_zero();
        if n == DVec2::ZERO { DVec2::Y } else { n }
    };

    CollisionResult {
        hit: true,
        point: a_pos + normal * (a_radius - (min_dist - dist) * 0.5),
        normal,
        penetration: min_dist - dist,
    }
}

/// Detect and resolve an overlap between the two tokens
///
/// Always restores `distance >= a.radius + b.radius` (up to rounding) when the
/// board has room. Returns the impact if velocities were changed.
pub fn resolve_pair(
    a: &mut Token,
    b: &mut Token,
    bounds: &Bounds,
    profile: &PhysicsProfile,
) -> Option<Impact> {
    let fallback = if a.is_moving() {
        a.velocity
    } else {
        -b.velocity
    };
    let contact = circle_collision(a.position, a.radius, b.position, b.radius, fallback);
    if !contact.hit {
        return None;
    }
    let n = contact.normal;

    separate(a, b, n, bounds);

    let activity = profile.collision_activity_speed;
    let a_active = a.speed() > activity;
    let b_active = b.speed() > activity;

    let impact = match (a_active, b_active) {
        (true, false) => strike(a, b, n, profile),
        (false, true) => strike(b, a, -n, profile),
        (true, true) => exchange(a, b, n, profile.restitution),
        (false, false) => None,
    };

    impact.map(|(attacker, impact_speed)| {
        log::debug!(
            "collision attacker={:?} speed={impact_speed:.1}",
            attacker.map(|s| s.as_str())
        );
        Impact {
            attacker,
            impact_speed,
            point: contact.point,
            normal: n,
        }
    })
}

/// Lone attacker hits a resting defender; `n` points from attacker to defender
fn strike(
    attacker: &mut Token,
    defender: &mut Token,
    n: DVec2,
    profile: &PhysicsProfile,
) -> Option<(Option<Side>, f64)> {
    if attacker.velocity.dot(n) <= 0.0 {
        // Moving away already
        return None;
    }
    let impact_speed = attacker.speed();
    attacker.velocity *= profile.attacker_damping;
    defender.velocity += n * impact_speed * profile.defender_push;
    attacker.slide_frames = 0;
    Some((Some(attacker.role), impact_speed))
}

/// Both moving: equal-mass exchange along the normal with restitution
fn exchange(a: &mut Token, b: &mut Token, n: DVec2, restitution: f64) -> Option<(Option<Side>, f64)> {
    let closing = (a.velocity - b.velocity).dot(n);
    if closing <= 0.0 {
        return None;
    }
    let j = (1.0 + restitution) * closing * 0.5;
    a.velocity -= n * j;
    b.velocity += n * j;
    Some((None, closing))
}

/// Push apart along `n`, half each, then keep both on the board
fn separate(a: &mut Token, b: &mut Token, n: DVec2, bounds: &Bounds) {
    let min_dist = a.radius + b.radius;
    let overlap = min_dist - a.position.distance(b.position);
    if overlap <= 0.0 {
        return;
    }
    a.position = bounds.clamp_center(a.position - n * (overlap * 0.5), a.radius);
    b.position = bounds.clamp_center(b.position + n * (overlap * 0.5), b.radius);

    // A wall may have pinned one side; hand the remainder to the other
    for _ in 0..3 {
        let delta = b.position - a.position;
        let dist = delta.length();
        let remaining = min_dist - dist;
        if remaining <= 0.0 {
            return;
        }
        let dir = if dist > f64::EPSILON { delta / dist } else { n };
        b.position = bounds.clamp_center(b.position + dir * remaining, b.radius);

        let remaining = min_dist - a.position.distance(b.position);
        if remaining > 0.0 {
            a.position = bounds.clamp_center(a.position - dir * remaining, a.radius);
        }
    }
}
