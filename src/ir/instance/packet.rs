//! Packet instances (spec §3): the unit streams are chunked into when
//! their stream class's policy enables packets.

use super::field::{create_field, Field};
use crate::clock::ClockSnapshot;
use crate::ir::class::StreamClass;

/// A packet instance: a packet-context field plus the clock snapshots
/// bracketing it, owned by the stream that opened it.
#[derive(Debug)]
pub struct Packet {
    stream_class: StreamClass,
    context: Option<Field>,
    beginning_clock_snapshot: Option<ClockSnapshot>,
    end_clock_snapshot: Option<ClockSnapshot>,
}

impl Packet {
    pub(crate) fn new(stream_class: StreamClass) -> Self {
        let context = stream_class.packet_context_field_class().map(|fc| create_field(&fc));
        Packet {
            stream_class,
            context,
            beginning_clock_snapshot: None,
            end_clock_snapshot: None,
        }
    }

    pub fn stream_class(&self) -> &StreamClass {
        &self.stream_class
    }

    pub fn context(&self) -> Option<&Field> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut Field> {
        self.context.as_mut()
    }

    pub fn beginning_clock_snapshot(&self) -> Option<&ClockSnapshot> {
        self.beginning_clock_snapshot.as_ref()
    }

    pub fn set_beginning_clock_snapshot(&mut self, snapshot: ClockSnapshot) {
        self.beginning_clock_snapshot = Some(snapshot);
    }

    pub fn end_clock_snapshot(&self) -> Option<&ClockSnapshot> {
        self.end_clock_snapshot.as_ref()
    }

    pub fn set_end_clock_snapshot(&mut self, snapshot: ClockSnapshot) {
        self.end_clock_snapshot = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockClass;
    use crate::ir::class::{FieldClass, TraceClass};

    #[test]
    fn packet_context_is_zero_initialized_from_the_stream_classs_field_class() {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        sc.set_packet_context_field_class(FieldClass::unsigned_integer(64)).unwrap();
        let packet = Packet::new(sc);
        assert_eq!(packet.context().unwrap().as_integer(), Some(0));
    }

    #[test]
    fn clock_snapshots_default_to_absent_until_set() {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        let mut packet = Packet::new(sc);
        assert!(packet.beginning_clock_snapshot().is_none());
        let cc = ClockClass::new(1_000_000_000);
        packet.set_beginning_clock_snapshot(ClockSnapshot::new(cc, 5));
        assert_eq!(packet.beginning_clock_snapshot().unwrap().cycles(), 5);
    }
}
