//! Event instances, pool-recycled per stream class (spec §4.3 "Event
//! recycling").

use super::field::{create_field, Field};
use crate::error::GraphError;
use crate::ir::class::{EventClass, StreamClass};
use std::cell::RefCell;
use std::collections::HashMap;

/// An event instance: the concrete payload/context fields produced for
/// one firing of an [`EventClass`].
#[derive(Debug)]
pub struct Event {
    event_class: EventClass,
    common_context_fc: Option<crate::ir::class::FieldClass>,
    common_context: Option<Field>,
    specific_context: Option<Field>,
    payload: Option<Field>,
}

impl Event {
    fn new(event_class: EventClass, common_context_fc: Option<crate::ir::class::FieldClass>) -> Self {
        let specific_context = event_class.specific_context_field_class().map(|fc| create_field(&fc));
        let payload = event_class.payload_field_class().map(|fc| create_field(&fc));
        let common_context = common_context_fc.as_ref().map(create_field);
        Event {
            event_class,
            common_context_fc,
            common_context,
            specific_context,
            payload,
        }
    }

    pub fn event_class(&self) -> &EventClass {
        &self.event_class
    }

    pub fn common_context(&self) -> Option<&Field> {
        self.common_context.as_ref()
    }

    pub fn common_context_mut(&mut self) -> Option<&mut Field> {
        self.common_context.as_mut()
    }

    pub fn specific_context(&self) -> Option<&Field> {
        self.specific_context.as_ref()
    }

    pub fn specific_context_mut(&mut self) -> Option<&mut Field> {
        self.specific_context.as_mut()
    }

    pub fn payload(&self) -> Option<&Field> {
        self.payload.as_ref()
    }

    pub fn payload_mut(&mut self) -> Option<&mut Field> {
        self.payload.as_mut()
    }

    /// Resets every owned field back to its class's zero value in place,
    /// keeping the allocations around for reuse by the pool.
    fn reset(&mut self) {
        if let (Some(field), Some(fc)) = (self.common_context.as_mut(), self.common_context_fc.as_ref()) {
            field.reset(fc);
        }
        if let (Some(field), Some(fc)) = (
            self.specific_context.as_mut(),
            self.event_class.specific_context_field_class(),
        ) {
            field.reset(&fc);
        }
        if let (Some(field), Some(fc)) = (self.payload.as_mut(), self.event_class.payload_field_class()) {
            field.reset(&fc);
        }
    }
}

/// A per-stream-class pool of recyclable [`Event`] instances, keyed by
/// event class so an event's field shapes never need to be rebuilt on
/// reuse (spec §4.3: "a free-list of event instances is maintained; on
/// release the event's fields are reset (not deallocated) ... initial
/// size 0").
pub struct EventPool {
    stream_class: StreamClass,
    free_lists: RefCell<HashMap<u64, Vec<Event>>>,
}

impl EventPool {
    pub fn new(stream_class: StreamClass) -> Self {
        EventPool {
            stream_class,
            free_lists: RefCell::new(HashMap::new()),
        }
    }

    pub fn stream_class(&self) -> &StreamClass {
        &self.stream_class
    }

    /// Returns how many instances are currently parked, for tests and
    /// diagnostics.
    pub fn parked(&self, event_class_id: u64) -> usize {
        self.free_lists
            .borrow()
            .get(&event_class_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Acquires an event instance for `event_class`, reusing a parked
    /// instance of the same class if one is available.
    pub fn acquire(&self, event_class: EventClass) -> Result<Event, GraphError> {
        if !event_class.is_frozen() {
            return Err(GraphError::InvalidObject(
                "cannot instantiate an event for an unfrozen event class".into(),
            ));
        }
        let mut lists = self.free_lists.borrow_mut();
        if let Some(parked) = lists.get_mut(&event_class.id()).and_then(Vec::pop) {
            return Ok(parked);
        }
        let common_context_fc = self.stream_class.event_common_context_field_class();
        Ok(Event::new(event_class, common_context_fc))
    }

    /// Returns `event` to its free list, resetting its fields rather
    /// than dropping the allocation.
    pub fn release(&self, mut event: Event) {
        event.reset();
        let id = event.event_class.id();
        self.free_lists.borrow_mut().entry(id).or_default().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::class::TraceClass;

    fn stream_class_with_event(payload_width: u8) -> (StreamClass, EventClass) {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        let ec = sc.create_event_class(0).unwrap();
        ec.set_payload_field_class(crate::ir::class::FieldClass::unsigned_integer(payload_width))
            .unwrap();
        tc.freeze();
        (sc, ec)
    }

    #[test]
    fn acquiring_after_release_reuses_the_same_allocation_and_resets_it() {
        let (sc, ec) = stream_class_with_event(32);
        let pool = EventPool::new(sc);
        let mut ev = pool.acquire(ec.clone()).unwrap();
        ev.payload_mut().unwrap().set_integer(42).unwrap();
        pool.release(ev);
        assert_eq!(pool.parked(ec.id()), 1);

        let reused = pool.acquire(ec.clone()).unwrap();
        assert_eq!(reused.payload().unwrap().as_integer(), Some(0));
        assert_eq!(pool.parked(ec.id()), 0);
    }

    #[test]
    fn pool_starts_empty_and_allocates_on_first_acquire() {
        let (sc, ec) = stream_class_with_event(8);
        let pool = EventPool::new(sc);
        assert_eq!(pool.parked(ec.id()), 0);
        let _ev = pool.acquire(ec).unwrap();
    }

    #[test]
    fn distinct_event_classes_are_pooled_separately() {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        let ec_a = sc.create_event_class(0).unwrap();
        let ec_b = sc.create_event_class(1).unwrap();
        tc.freeze();
        let pool = EventPool::new(sc);
        let a = pool.acquire(ec_a.clone()).unwrap();
        let b = pool.acquire(ec_b.clone()).unwrap();
        pool.release(a);
        assert_eq!(pool.parked(ec_a.id()), 1);
        assert_eq!(pool.parked(ec_b.id()), 0);
        pool.release(b);
        assert_eq!(pool.parked(ec_b.id()), 1);
    }
}
