//! Stream instances (spec §3): one stream class's runtime state within a
//! trace instance.

use super::event::EventPool;
use super::packet::Packet;
use crate::error::GraphError;
use crate::ir::class::StreamClass;
use crate::object::Shared;
use std::cell::RefCell;
use std::rc::Rc;

struct StreamData {
    id: u64,
    stream_class: StreamClass,
    current_packet: Option<Packet>,
    event_pool: EventPool,
}

/// A handle to a stream instance. Its event pool outlives any single
/// packet, since events recycle across packet boundaries (spec §4.3).
#[derive(Clone)]
pub struct Stream(Shared<RefCell<StreamData>>);

impl Stream {
    pub(crate) fn new(id: u64, stream_class: StreamClass) -> Self {
        let event_pool = EventPool::new(stream_class.clone());
        Stream(Rc::new(RefCell::new(StreamData {
            id,
            stream_class,
            current_packet: None,
            event_pool,
        })))
    }

    pub fn id(&self) -> u64 {
        self.0.borrow().id
    }

    pub fn stream_class(&self) -> StreamClass {
        self.0.borrow().stream_class.clone()
    }

    pub fn has_open_packet(&self) -> bool {
        self.0.borrow().current_packet.is_some()
    }

    /// Opens a new packet for this stream. Fails if one is already open,
    /// or if the stream class's policy does not support packets.
    pub fn open_packet(&self) -> Result<(), GraphError> {
        let mut data = self.0.borrow_mut();
        if !data.stream_class.policy().supports_packets {
            return Err(GraphError::InvalidObject(
                "stream class does not support packets".into(),
            ));
        }
        if data.current_packet.is_some() {
            return Err(GraphError::InvalidObject(
                "stream already has an open packet".into(),
            ));
        }
        data.current_packet = Some(Packet::new(data.stream_class.clone()));
        Ok(())
    }

    /// Closes and returns the currently open packet, if any.
    pub fn close_packet(&self) -> Option<Packet> {
        self.0.borrow_mut().current_packet.take()
    }

    pub fn with_current_packet<R>(&self, f: impl FnOnce(Option<&Packet>) -> R) -> R {
        f(self.0.borrow().current_packet.as_ref())
    }

    pub fn with_current_packet_mut<R>(&self, f: impl FnOnce(Option<&mut Packet>) -> R) -> R {
        f(self.0.borrow_mut().current_packet.as_mut())
    }

    pub fn event_pool(&self) -> std::cell::Ref<'_, EventPool> {
        std::cell::Ref::map(self.0.borrow(), |d| &d.event_pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::class::{StreamClassPolicy, TraceClass};

    fn packetized_stream() -> Stream {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        sc.set_policy(StreamClassPolicy {
            supports_packets: true,
            ..Default::default()
        })
        .unwrap();
        tc.freeze();
        Stream::new(0, sc)
    }

    #[test]
    fn opening_a_packet_twice_without_closing_fails() {
        let stream = packetized_stream();
        stream.open_packet().unwrap();
        assert!(stream.open_packet().is_err());
    }

    #[test]
    fn closing_returns_the_packet_and_clears_the_slot() {
        let stream = packetized_stream();
        stream.open_packet().unwrap();
        assert!(stream.has_open_packet());
        let packet = stream.close_packet();
        assert!(packet.is_some());
        assert!(!stream.has_open_packet());
    }

    #[test]
    fn packets_are_rejected_when_the_stream_class_does_not_support_them() {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        tc.freeze();
        let stream = Stream::new(0, sc);
        assert!(stream.open_packet().is_err());
    }
}
