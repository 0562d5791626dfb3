//! Synchronous typed pub-sub hub.
//!
//! Replaces the donor's async/thread-pool event system: per §5 of the
//! spec this core runs as a single cooperative actor, so delivery is
//! synchronous and subscribers must not re-enter the actor from inside
//! a handler.

use std::fmt;
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::entity::model::EntityPathway;
use crate::world::chunk::{ChunkPos, ClientBlockPosition};

#[derive(Debug, Clone)]
pub enum CoreEvent {
    ChunkLoaded(ChunkPos),
    ChunkUpdated(ChunkPos),
    ChunkUnloaded(ChunkPos),

    PositionChanged {
        entity_id: String,
        position: Vec3,
    },
    UnderwaterChanged {
        entity_id: String,
        underwater: bool,
    },
    StepOver {
        entity_id: String,
        block: ClientBlockPosition,
        movement_type: String,
    },
    Collision {
        entity_id: String,
        block: ClientBlockPosition,
    },

    Pathway {
        entity_id: String,
        pathway: EntityPathway,
    },
    Transform {
        entity_id: String,
        position: Vec3,
        rotation: Quat,
        pose: Option<i32>,
        velocity: Vec3,
    },
    Visibility {
        entity_id: String,
        visible: bool,
    },
    Removed {
        entity_id: String,
    },
}

impl fmt::Display for CoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreEvent::ChunkLoaded(p) => write!(f, "chunk:loaded({},{})", p.cx, p.cz),
            CoreEvent::ChunkUpdated(p) => write!(f, "chunk:updated({},{})", p.cx, p.cz),
            CoreEvent::ChunkUnloaded(p) => write!(f, "chunk:unloaded({},{})", p.cx, p.cz),
            CoreEvent::PositionChanged { entity_id, .. } => {
                write!(f, "position:changed({entity_id})")
            }
            CoreEvent::UnderwaterChanged { entity_id, .. } => {
                write!(f, "underwater:changed({entity_id})")
            }
            CoreEvent::StepOver { entity_id, .. } => write!(f, "step:over({entity_id})"),
            CoreEvent::Collision { entity_id, .. } => write!(f, "collision({entity_id})"),
            CoreEvent::Pathway { entity_id, .. } => write!(f, "pathway({entity_id})"),
            CoreEvent::Transform { entity_id, .. } => write!(f, "transform({entity_id})"),
            CoreEvent::Visibility { entity_id, .. } => write!(f, "visibility({entity_id})"),
            CoreEvent::Removed { entity_id } => write!(f, "removed({entity_id})"),
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&CoreEvent) + Send + Sync>;

/// Registers handlers at startup and delivers events to them synchronously,
/// in registration order, on the calling (actor) thread.
#[derive(Default, Clone)]
pub struct EventHub {
    handlers: Vec<EventHandler>,
    dispatching: std::cell::Cell<bool>,
}

impl EventHub {
    pub fn new() -> Self {
        EventHub {
            handlers: Vec::new(),
            dispatching: std::cell::Cell::new(false),
        }
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&CoreEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    /// Delivers `event` to every subscriber in order. Panics in debug
    /// builds if called re-entrantly from inside a handler, since that
    /// would violate the single-actor delivery contract.
    pub fn publish(&self, event: CoreEvent) {
        debug_assert!(
            !self.dispatching.get(),
            "event hub re-entered from inside a handler: {event}"
        );
        self.dispatching.set(true);
        for handler in &self.handlers {
            handler(&event);
        }
        self.dispatching.set(false);
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("subscriber_count", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn delivers_to_all_subscribers_in_order() {
        let mut hub = EventHub::new();
        let seen = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let seen = seen.clone();
            hub.subscribe(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }
        hub.publish(CoreEvent::Removed {
            entity_id: "e1".into(),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    #[should_panic(expected = "re-entered")]
    fn rejects_reentrant_publish_in_debug() {
        let mut hub = EventHub::new();
        hub.subscribe(|_| {});
        hub.dispatching.set(true);
        hub.publish(CoreEvent::Removed {
            entity_id: "e1".into(),
        });
    }
}
