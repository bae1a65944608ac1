//! Settle detection and win arbitration
//!
//! A turn ends once both tokens have stayed below the velocity threshold for
//! `settle_frames_required` consecutive ticks, or when the frame cap forces it.
//! Resting in contact is a win for whoever launched last.

use super::state::{MatchResult, MatchState, Side, Token};
use crate::config::MatchConfig;

/// Where a stepping turn stands after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStatus {
    /// At least one token is above the threshold
    Moving,
    /// Both below the threshold, count still running
    Settling,
    /// Settle count reached
    Settled,
    /// Frame cap reached before settling
    Forced,
}

impl SettleStatus {
    pub fn is_done(self) -> bool {
        matches!(self, SettleStatus::Settled | SettleStatus::Forced)
    }
}

/// Update the frame counters for one stepped tick
pub fn track_settle(state: &mut MatchState, player: &Token, bot: &Token, config: &MatchConfig) -> SettleStatus {
    if player.is_moving() || bot.is_moving() {
        state.simulation_frame_count = state.simulation_frame_count.saturating_add(1);
    }

    let threshold = config.velocity_threshold;
    let both_settled = player.is_settled(threshold) && bot.is_settled(threshold);
    if both_settled {
        state.settle_frame_count = state.settle_frame_count.saturating_add(1);
    } else {
        state.settle_frame_count = 0;
    }

    if state.settle_frame_count >= config.settle_frames_required {
        SettleStatus::Settled
    } else if state.simulation_frame_count >= config.max_simulation_frames {
        SettleStatus::Forced
    } else if both_settled {
        SettleStatus::Settling
    } else {
        SettleStatus::Moving
    }
}

/// Whether the tokens rest in contact
pub fn tokens_overlap(player: &Token, bot: &Token, overlap_tolerance: f64) -> bool {
    player.position.distance(bot.position) < (player.radius + bot.radius) * overlap_tolerance
}

/// Decide a settled turn
///
/// `MatchResult::None` means no contact: play passes to the other side.
pub fn decide(player: &Token, bot: &Token, last_attacker: Option<Side>, overlap_tolerance: f64) -> MatchResult {
    if !tokens_overlap(player, bot, overlap_tolerance) {
        return MatchResult::None;
    }

    match last_attacker {
        Some(side) => MatchResult::win_for(side),
        None => {
            // Unknown attacker: the token higher on the board (lower y) wins
            log::warn!("overlap with no recorded attacker, using vertical tie-break");
            if player.position.y < bot.position.y {
                MatchResult::PlayerWins
            } else if bot.position.y < player.position.y {
                MatchResult::BotWins
            } else {
                MatchResult::Draw
            }
        }
    }
}
