//! Per-graph message pools (spec §4.4, §5 "Allocation discipline").
//!
//! Messages are small immutable records; reusing their allocations
//! across a graph's run avoids allocator pressure on the hot path.
//! Unlike the event pool (`ir::instance::EventPool`), message pool slots
//! are not typed by a schema class — a graph-wide pool is keyed by
//! `kind_name()` and simply hands back `Box<MessageSlot>` storage for the
//! iterator to overwrite.

use crate::graph::GraphHandle;
use crate::message::Message;
use std::cell::RefCell;
use std::collections::HashMap;

/// A free-listed allocation a message was built in, returned once the
/// message is no longer referenced anywhere (spec: "message lifetime is
/// caller-controlled via refcount" — in this crate that refcount is
/// `Rc`'s, so release is an explicit call once a consumer is done.)
pub struct MessageSlot(Box<Message>);

impl MessageSlot {
    pub fn message(&self) -> &Message {
        &self.0
    }

    pub fn into_message(self) -> Message {
        *self.0
    }
}

/// A per-graph pool of message storage, with one free list per message
/// kind (spec §4.4: "pool-allocated per graph by message kind").
#[derive(Default)]
pub struct MessagePool {
    free_lists: RefCell<HashMap<&'static str, Vec<Box<Message>>>>,
}

impl MessagePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `message` in pooled storage, reusing a parked allocation of
    /// the same kind if one is available.
    pub fn alloc(&self, message: Message) -> MessageSlot {
        let kind = message.kind_name();
        let mut lists = self.free_lists.borrow_mut();
        if let Some(mut boxed) = lists.get_mut(kind).and_then(Vec::pop) {
            *boxed = message;
            return MessageSlot(boxed);
        }
        MessageSlot(Box::new(message))
    }

    /// Returns a slot's storage to the pool once its message is no
    /// longer needed.
    pub fn release(&self, slot: MessageSlot) {
        let kind = slot.0.kind_name();
        self.free_lists.borrow_mut().entry(kind).or_default().push(slot.0);
    }

    pub fn parked(&self, kind: &str) -> usize {
        self.free_lists.borrow().get(kind).map(Vec::len).unwrap_or(0)
    }
}

/// A cloneable handle to a graph's message pool, usable from inside a
/// message iterator's own `next` implementation (spec §4.4:
/// "pool-allocated per graph by message kind"). Obtained via
/// [`crate::component::SelfComponent::message_pool`] during
/// `message_iterator_initialize` and carried into the iterator's own
/// state.
#[derive(Clone)]
pub struct MessagePoolHandle {
    pub(crate) graph: GraphHandle,
}

impl MessagePoolHandle {
    pub fn alloc(&self, message: Message) -> MessageSlot {
        self.graph.with(|g| g.message_pool().alloc(message))
    }

    pub fn release(&self, slot: MessageSlot) {
        self.graph.with(|g| g.message_pool().release(slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockClass;
    use crate::clock::ClockSnapshot;

    fn inactivity() -> Message {
        let cc = ClockClass::new(1_000_000);
        Message::MessageIteratorInactivity {
            clock_snapshot: ClockSnapshot::new(cc.clone(), 0),
            clock_class: cc,
        }
    }

    #[test]
    fn releasing_and_reallocating_reuses_the_same_kind_slot() {
        let pool = MessagePool::new();
        let slot = pool.alloc(inactivity());
        pool.release(slot);
        assert_eq!(pool.parked("message_iterator_inactivity"), 1);
        let slot = pool.alloc(inactivity());
        assert_eq!(pool.parked("message_iterator_inactivity"), 0);
        assert_eq!(slot.message().kind_name(), "message_iterator_inactivity");
    }
}
