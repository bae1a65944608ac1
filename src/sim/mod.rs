//! Match simulation
//!
//! All gameplay logic lives here. Time only advances through
//! `MatchEngine::tick`, and every random draw comes from the engine's seeded
//! RNG, so a seed plus an input sequence replays exactly.

pub mod arbiter;
pub mod bot;
pub mod collision;
pub mod engine;
pub mod events;
pub mod flick;
pub mod physics;
pub mod schedule;
pub mod state;
pub mod vector;

pub use arbiter::SettleStatus;
pub use bot::{BotDecision, BotPolicy, ShotKind};
pub use collision::{CollisionResult, Impact, circle_collision, resolve_pair};
pub use engine::{MatchEngine, MatchSnapshot};
pub use events::{EventBus, Listener, MatchEvent, SubscriptionId};
pub use flick::{FlickInput, FlickOutcome};
pub use schedule::{ActionHandle, Scheduler};
pub use state::{Bounds, MatchPhase, MatchResult, MatchState, Side, Tier, Token};
pub use vector::Vector2D;
