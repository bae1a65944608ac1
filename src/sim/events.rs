//! Match events and synchronous listener dispatch

use serde::{Deserialize, Serialize};

use super::collision::Impact;
use super::flick::FlickInput;
use super::state::{MatchResult, Side};

/// Something observable happened. Within one turn the order is
/// `TurnStart, Flick, Collision*, TurnEnd`, then `RoundEnd, GameOver` once a
/// terminal result is decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MatchEvent {
    TurnStart { side: Side },
    Flick { side: Side, input: FlickInput },
    /// `side` is whose turn is being played; `impact.attacker` is the lone
    /// attacker, if only one token was moving
    Collision { side: Side, impact: Impact },
    TurnEnd { side: Side },
    /// `side` is the side whose turn produced the result
    RoundEnd { side: Side, result: MatchResult },
    GameOver { side: Side, result: MatchResult },
}

impl MatchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MatchEvent::TurnStart { .. } => "turn-start",
            MatchEvent::Flick { .. } => "flick",
            MatchEvent::Collision { .. } => "collision",
            MatchEvent::TurnEnd { .. } => "turn-end",
            MatchEvent::RoundEnd { .. } => "round-end",
            MatchEvent::GameOver { .. } => "game-over",
        }
    }

    pub fn side(&self) -> Side {
        match self {
            MatchEvent::TurnStart { side }
            | MatchEvent::Flick { side, .. }
            | MatchEvent::Collision { side, .. }
            | MatchEvent::TurnEnd { side }
            | MatchEvent::RoundEnd { side, .. }
            | MatchEvent::GameOver { side, .. } => *side,
        }
    }

    pub fn result(&self) -> Option<MatchResult> {
        match self {
            MatchEvent::RoundEnd { result, .. } | MatchEvent::GameOver { result, .. } => Some(*result),
            _ => None,
        }
    }
}

/// Returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&MatchEvent)>;

/// Ordered listener list
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver to every listener in subscription order
    pub fn emit(&mut self, event: &MatchEvent) {
        log::debug!("event {} side={}", event.name(), event.side().as_str());
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(Box::new(move |e: &MatchEvent| seen.borrow_mut().push((tag, e.name()))));
        }
        bus.emit(&MatchEvent::TurnStart { side: Side::Player });
        assert_eq!(
            *seen.borrow(),
            vec![("first", "turn-start"), ("second", "turn-start")]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let id = {
            let count = Rc::clone(&count);
            bus.subscribe(Box::new(move |_| *count.borrow_mut() += 1))
        };
        bus.emit(&MatchEvent::TurnEnd { side: Side::Bot });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&MatchEvent::TurnEnd { side: Side::Bot });
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let event = MatchEvent::GameOver {
            side: Side::Player,
            result: MatchResult::PlayerWins,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"type":"game-over","side":"Player","result":"PlayerWins"}"#);
        assert_eq!(event.result(), Some(MatchResult::PlayerWins));
    }

    #[test]
    fn test_collision_carries_turn_side() {
        let impact = Impact {
            attacker: None,
            impact_speed: 120.0,
            point: glam::DVec2::new(200.0, 300.0),
            normal: glam::DVec2::Y,
        };
        let event = MatchEvent::Collision { side: Side::Bot, impact };
        assert_eq!(event.side(), Side::Bot);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.starts_with(r#"{"type":"collision","side":"Bot""#), "{json}");
    }
}
