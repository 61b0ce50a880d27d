//! In-process pub/sub for game events, owned by `GameCore` rather than
//! inherited from an emitter base class (spec §9 redesign note).
//!
//! Emission is synchronous. A panicking subscriber is caught and logged
//! so it can't block delivery to the others (the `ListenerException`
//! error kind in spec §7).

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::domain::CollisionEvent;

/// Events are cloned before being handed to subscribers so a listener
/// can never mutate core state through the payload.
#[derive(Debug, Clone)]
pub enum BusEvent {
    Collision(CollisionEvent),
    Join { player_id: String },
    Leave { player_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Group(String),
    Targeted(String),
}

type Handler = Box<dyn Fn(&BusEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    global: Vec<Handler>,
    groups: HashMap<String, Vec<Handler>>,
    targeted: HashMap<String, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, scope: Scope, handler: Handler) {
        match scope {
            Scope::Global => self.global.push(handler),
            Scope::Group(tag) => self.groups.entry(tag).or_default().push(handler),
            Scope::Targeted(player_id) => self.targeted.entry(player_id).or_default().push(handler),
        }
    }

    pub fn emit(&self, scope: &Scope, event: &BusEvent) {
        let handlers: &[Handler] = match scope {
            Scope::Global => &self.global,
            Scope::Group(tag) => self.groups.get(tag).map(Vec::as_slice).unwrap_or(&[]),
            Scope::Targeted(player_id) => {
                self.targeted.get(player_id).map(Vec::as_slice).unwrap_or(&[])
            }
        };

        for handler in handlers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            if outcome.is_err() {
                error!("event bus listener panicked; continuing delivery to other subscribers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn faulty_subscriber_does_not_block_others() {
        let mut bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        bus.on(
            Scope::Global,
            Box::new(|_| panic!("boom")),
        );
        let calls2 = calls.clone();
        bus.on(
            Scope::Global,
            Box::new(move |_| {
                calls2.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(
            &Scope::Global,
            &BusEvent::Join {
                player_id: "p1".to_string(),
            },
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn targeted_scope_only_reaches_matching_subscribers() {
        let mut bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        bus.on(
            Scope::Targeted("p1".to_string()),
            Box::new(move |_| {
                calls2.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(
            &Scope::Targeted("p2".to_string()),
            &BusEvent::Leave {
                player_id: "p2".to_string(),
            },
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        bus.emit(
            &Scope::Targeted("p1".to_string()),
            &BusEvent::Leave {
                player_id: "p1".to_string(),
            },
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
