//! Message iterators: pull cursors that produce messages at a port
//! (spec §4.7).

use crate::component::{ComponentId, MessageIteratorMethods};
use crate::connection::ConnectionId;
use crate::error::GraphError;
use crate::message::Message;
use crate::port::PortId;
use crate::status::IteratorStatus;
use std::cell::{Cell, RefCell};

/// The result of a single `next(capacity)` call (spec §4.7). Unlike
/// [`crate::status::IteratorStatus`], which only reports how many
/// messages came back, this carries the messages themselves — the type
/// a component's own iterator implementation and its caller actually
/// exchange.
pub enum IteratorOutcome {
    Messages(Vec<Message>),
    Again,
    End,
    Error,
}

impl IteratorOutcome {
    pub fn status(&self) -> IteratorStatus {
        match self {
            IteratorOutcome::Messages(messages) => IteratorStatus::Messages(messages.len()),
            IteratorOutcome::Again => IteratorStatus::Again,
            IteratorOutcome::End => IteratorStatus::End,
            IteratorOutcome::Error => IteratorStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NonInitialized,
    Active,
    Last,
    Ended,
    Seeking,
}

/// A pull cursor over the messages produced at one port, driving a
/// source or filter's own [`MessageIteratorMethods`] through the
/// `NonInitialized -> Active <-> Last -> Ended` state machine, plus the
/// `Seeking` sub-state entered for the duration of `seek_beginning`
/// (spec §4.7). A filter's or sink's iterator is free to hold further
/// upstream iterators of its own inside its `MessageIteratorMethods`
/// state; that nesting is invisible here.
pub struct MessageIterator {
    component: ComponentId,
    port: PortId,
    connection: ConnectionId,
    methods: RefCell<Box<dyn MessageIteratorMethods>>,
    state: Cell<State>,
}

impl MessageIterator {
    pub(crate) fn new(
        component: ComponentId,
        port: PortId,
        connection: ConnectionId,
        methods: Box<dyn MessageIteratorMethods>,
    ) -> Self {
        Self {
            component,
            port,
            connection,
            methods: RefCell::new(methods),
            state: Cell::new(State::NonInitialized),
        }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn port(&self) -> PortId {
        self.port
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn is_ended(&self) -> bool {
        self.state.get() == State::Ended
    }

    /// Pulls up to `capacity` messages. Calling `next` after `End` or
    /// `Error` is a caller bug (spec §4.7: "after END or ERROR, only
    /// finalize is valid") and is reported as `Error` rather than
    /// replayed.
    pub fn next(&self, capacity: usize) -> IteratorOutcome {
        if self.state.get() == State::Ended {
            return IteratorOutcome::Error;
        }
        if self.state.get() == State::NonInitialized {
            self.state.set(State::Active);
        }
        let outcome = self.methods.borrow_mut().next(capacity);
        match &outcome {
            IteratorOutcome::Messages(messages) if !messages.is_empty() => {
                self.state.set(State::Last);
            }
            IteratorOutcome::Messages(_) | IteratorOutcome::Again => {}
            IteratorOutcome::End | IteratorOutcome::Error => self.state.set(State::Ended),
        }
        outcome
    }

    pub fn can_seek_beginning(&self) -> bool {
        self.methods.borrow().can_seek_beginning()
    }

    /// Restarts the iterator at the beginning of its stream (spec
    /// §4.7), passing through the `Seeking` sub-state for the call's
    /// duration.
    pub fn seek_beginning(&self) -> Result<(), GraphError> {
        self.state.set(State::Seeking);
        let result = self.methods.borrow_mut().seek_beginning();
        self.state
            .set(if result.is_ok() { State::NonInitialized } else { State::Ended });
        result
    }

    pub fn finalize(&self) {
        if self.state.get() == State::Ended {
            return;
        }
        self.methods.borrow_mut().finalize();
        self.state.set(State::Ended);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_port() -> PortId {
        PortId {
            index: 0,
            graph: crate::graph::GraphId(0),
        }
    }

    #[test]
    fn next_after_end_is_reported_as_error_not_replayed() {
        struct Empty;
        impl MessageIteratorMethods for Empty {
            fn next(&mut self, _capacity: usize) -> IteratorOutcome {
                IteratorOutcome::End
            }
        }
        let iter = MessageIterator::new(ComponentId(0), dummy_port(), ConnectionId(0), Box::new(Empty));
        assert!(matches!(iter.next(4), IteratorOutcome::End));
        assert!(iter.is_ended());
        assert!(matches!(iter.next(4), IteratorOutcome::Error));
    }

    #[test]
    fn seek_beginning_resets_to_non_initialized_on_success() {
        struct Seekable(bool);
        impl MessageIteratorMethods for Seekable {
            fn next(&mut self, _capacity: usize) -> IteratorOutcome {
                IteratorOutcome::Again
            }
            fn seek_beginning(&mut self) -> Result<(), GraphError> {
                Ok(())
            }
            fn can_seek_beginning(&self) -> bool {
                self.0
            }
        }
        let iter = MessageIterator::new(ComponentId(0), dummy_port(), ConnectionId(0), Box::new(Seekable(true)));
        assert!(iter.can_seek_beginning());
        assert!(iter.seek_beginning().is_ok());
        assert!(!iter.is_ended());
    }

    #[test]
    fn seek_beginning_is_unsupported_by_default() {
        struct NoSeek;
        impl MessageIteratorMethods for NoSeek {
            fn next(&mut self, _capacity: usize) -> IteratorOutcome {
                IteratorOutcome::Again
            }
        }
        let iter = MessageIterator::new(ComponentId(0), dummy_port(), ConnectionId(0), Box::new(NoSeek));
        assert!(!iter.can_seek_beginning());
        assert!(iter.seek_beginning().is_err());
    }
}
