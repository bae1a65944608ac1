//! Profile ledger fed by finished rounds
//!
//! Tracks streaks and the per-tier chun inventory in memory. Storing it is
//! the host's business.

use serde::{Deserialize, Serialize};

use crate::sim::{MatchResult, Tier};

/// One finished round from the player's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Win,
    Lose,
    Draw,
}

/// Per-tier chun counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub tier1: u32,
    pub tier2: u32,
    pub tier3: u32,
}

impl Inventory {
    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::One => self.tier1,
            Tier::Two => self.tier2,
            Tier::Three => self.tier3,
        }
    }

    fn slot(&mut self, tier: Tier) -> &mut u32 {
        match tier {
            Tier::One => &mut self.tier1,
            Tier::Two => &mut self.tier2,
            Tier::Three => &mut self.tier3,
        }
    }
}

/// Streak and inventory bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub streak: u32,
    pub max_streak: u32,
    pub inventory: Inventory,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            inventory,
            ..Self::default()
        }
    }

    pub fn rounds_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Apply one round result
    pub fn record(&mut self, tier: Tier, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Win => {
                let slot = self.inventory.slot(tier);
                *slot = slot.saturating_add(1);
                self.streak += 1;
                self.max_streak = self.max_streak.max(self.streak);
                self.wins += 1;
            }
            RoundOutcome::Lose => {
                let slot = self.inventory.slot(tier);
                *slot = slot.saturating_sub(1);
                self.streak = 0;
                self.losses += 1;
            }
            RoundOutcome::Draw => self.draws += 1,
        }
        log::info!(
            "round recorded: tier {} {:?}, streak {} (best {}), tier stock {}",
            tier.as_u8(),
            outcome,
            self.streak,
            self.max_streak,
            self.inventory.get(tier)
        );
    }

    /// Record a match result. Returns false (and records nothing) while the
    /// match is undecided.
    pub fn record_result(&mut self, tier: Tier, result: MatchResult) -> bool {
        match result.player_outcome() {
            Some(outcome) => {
                self.record(tier, outcome);
                true
            }
            None => false,
        }
    }
}
