//! The message model: tagged, immutable records that flow between
//! message iterators (spec component E, spec §4.4).
//!
//! A message holds strong references to whichever trace-IR objects it
//! exposes (stream, packet, event), so a consumer may read them safely
//! after the iterator that produced the message has advanced past it.

use crate::clock::{ClockClass, ClockSnapshot};
use crate::ir::instance::{Event, Packet, Stream};
use crate::object::Shared;

/// The count carried by a discarded-events or discarded-packets message,
/// when the source was able to determine it.
pub type DiscardedCount = u64;

/// A tagged, immutable message (spec §4.4).
#[derive(Clone)]
pub enum Message {
    StreamBeginning {
        stream: Stream,
        clock_snapshot: Option<ClockSnapshot>,
    },
    StreamEnd {
        stream: Stream,
        clock_snapshot: Option<ClockSnapshot>,
    },
    PacketBeginning {
        packet: Shared<Packet>,
        clock_snapshot: Option<ClockSnapshot>,
    },
    PacketEnd {
        packet: Shared<Packet>,
        clock_snapshot: Option<ClockSnapshot>,
    },
    Event {
        event: Shared<Event>,
        clock_snapshot: Option<ClockSnapshot>,
    },
    DiscardedEvents {
        stream: Stream,
        beginning_clock_snapshot: Option<ClockSnapshot>,
        end_clock_snapshot: Option<ClockSnapshot>,
        count: Option<DiscardedCount>,
    },
    DiscardedPackets {
        stream: Stream,
        beginning_clock_snapshot: Option<ClockSnapshot>,
        end_clock_snapshot: Option<ClockSnapshot>,
        count: Option<DiscardedCount>,
    },
    /// A source or filter declares a known quiet period on a clock
    /// without producing any other message. The spec's distillation
    /// lists this twice, once as a bare "Inactivity" message and once as
    /// "MessageIteratorInactivity" — both shapes are `(clock_class,
    /// clock_snapshot)`, so both collapse onto this one variant; see
    /// DESIGN.md.
    MessageIteratorInactivity {
        clock_class: Shared<ClockClass>,
        clock_snapshot: ClockSnapshot,
    },
}

impl Message {
    /// The stream this message belongs to, for stream-ordering checks
    /// (spec §4.4). `None` for messages not scoped to a single stream.
    pub fn stream(&self) -> Option<&Stream> {
        match self {
            Message::StreamBeginning { stream, .. }
            | Message::StreamEnd { stream, .. }
            | Message::DiscardedEvents { stream, .. }
            | Message::DiscardedPackets { stream, .. } => Some(stream),
            Message::PacketBeginning { .. }
            | Message::PacketEnd { .. }
            | Message::Event { .. }
            | Message::MessageIteratorInactivity { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Message::StreamBeginning { .. } => "stream_beginning",
            Message::StreamEnd { .. } => "stream_end",
            Message::PacketBeginning { .. } => "packet_beginning",
            Message::PacketEnd { .. } => "packet_end",
            Message::Event { .. } => "event",
            Message::DiscardedEvents { .. } => "discarded_events",
            Message::DiscardedPackets { .. } => "discarded_packets",
            Message::MessageIteratorInactivity { .. } => "message_iterator_inactivity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::class::TraceClass;
    use crate::ir::instance::Trace;

    fn a_stream() -> Stream {
        let tc = TraceClass::new();
        tc.create_stream_class(0).unwrap();
        let trace = Trace::new(tc);
        trace.create_stream(0, 0).unwrap()
    }

    #[test]
    fn stream_scoped_messages_expose_their_stream() {
        let stream = a_stream();
        let msg = Message::StreamBeginning {
            stream: stream.clone(),
            clock_snapshot: None,
        };
        assert!(msg.stream().is_some());
        assert_eq!(msg.kind_name(), "stream_beginning");
    }

    #[test]
    fn inactivity_message_is_not_stream_scoped() {
        let cc = ClockClass::new(1_000_000);
        let snapshot = ClockSnapshot::new(cc.clone(), 0);
        let msg = Message::MessageIteratorInactivity {
            clock_class: cc,
            clock_snapshot: snapshot,
        };
        assert!(msg.stream().is_none());
    }
}
