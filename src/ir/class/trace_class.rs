//! Trace class: the schema root (spec §3).

use super::field_class::{validate_scope, FieldClass};
use super::stream_class::StreamClass;
use crate::error::GraphError;
use crate::object::{FreezeFlag, Shared};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentValue {
    String(String),
    Integer(i64),
}

struct TraceClassData {
    uuid: Option<Uuid>,
    packet_header_fc: Option<FieldClass>,
    environment: Vec<(String, EnvironmentValue)>,
    native_byte_order: ByteOrder,
    stream_classes: Vec<StreamClass>,
    stream_class_ids: HashSet<u64>,
    /// Shared with every stream/event class created under this trace
    /// class, so freezing the trace class freezes the whole schema tree
    /// in one flip, matching "Frozen with its trace class" (spec §3).
    frozen: Rc<FreezeFlag>,
}

/// A handle to a trace class, the schema root. Frozen on first use that
/// observes it structurally (first trace instance, first attached
/// graph) — freezing is exposed as an explicit method the owner of that
/// first use calls.
#[derive(Clone)]
pub struct TraceClass(Shared<RefCell<TraceClassData>>);

impl TraceClass {
    pub fn new() -> Self {
        TraceClass(Rc::new(RefCell::new(TraceClassData {
            uuid: None,
            packet_header_fc: None,
            environment: Vec::new(),
            native_byte_order: ByteOrder::LittleEndian,
            stream_classes: Vec::new(),
            stream_class_ids: HashSet::new(),
            frozen: Rc::new(FreezeFlag::new()),
        })))
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.0.borrow().uuid
    }

    pub fn set_uuid(&self, uuid: Uuid) -> Result<(), GraphError> {
        self.check_mutable("set trace class uuid")?;
        self.0.borrow_mut().uuid = Some(uuid);
        Ok(())
    }

    pub fn native_byte_order(&self) -> ByteOrder {
        self.0.borrow().native_byte_order
    }

    pub fn set_native_byte_order(&self, order: ByteOrder) -> Result<(), GraphError> {
        self.check_mutable("set trace class native byte order")?;
        self.0.borrow_mut().native_byte_order = order;
        Ok(())
    }

    pub fn set_packet_header_field_class(&self, fc: FieldClass) -> Result<(), GraphError> {
        validate_scope(&fc)?;
        self.check_mutable("set trace class packet header")?;
        self.0.borrow_mut().packet_header_fc = Some(fc);
        Ok(())
    }

    pub fn packet_header_field_class(&self) -> Option<FieldClass> {
        self.0.borrow().packet_header_fc.clone()
    }

    pub fn set_environment_entry(
        &self,
        key: impl Into<String>,
        value: EnvironmentValue,
    ) -> Result<(), GraphError> {
        self.check_mutable("set trace class environment entry")?;
        let key = key.into();
        let mut data = self.0.borrow_mut();
        if let Some(slot) = data.environment.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            data.environment.push((key, value));
        }
        Ok(())
    }

    pub fn environment(&self) -> Vec<(String, EnvironmentValue)> {
        self.0.borrow().environment.clone()
    }

    /// Creates and appends a new stream class with the given unique
    /// numeric ID.
    pub fn create_stream_class(&self, id: u64) -> Result<StreamClass, GraphError> {
        self.check_mutable("create stream class")?;
        let mut data = self.0.borrow_mut();
        if !data.stream_class_ids.insert(id) {
            return Err(GraphError::InvalidParams(format!(
                "stream class id {id} is not unique within this trace class"
            )));
        }
        let frozen = Rc::clone(&data.frozen);
        let sc = StreamClass::new(id, frozen);
        data.stream_classes.push(sc.clone());
        Ok(sc)
    }

    pub fn stream_class_by_id(&self, id: u64) -> Option<StreamClass> {
        self.0
            .borrow()
            .stream_classes
            .iter()
            .find(|sc| sc.id() == id)
            .cloned()
    }

    pub fn stream_classes(&self) -> Vec<StreamClass> {
        self.0.borrow().stream_classes.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.borrow().frozen.is_frozen()
    }

    /// Freezes this trace class and, by virtue of the shared freeze
    /// flag, every stream/event class already created under it — and any
    /// created afterward would be rejected since `create_*` checks
    /// mutability first.
    pub fn freeze(&self) {
        self.0.borrow().frozen.freeze();
    }

    fn check_mutable(&self, what: &'static str) -> Result<(), GraphError> {
        self.0
            .borrow()
            .frozen
            .check_mutable(what)
            .map_err(|e| GraphError::InvalidObject(e.to_string()))
    }
}

impl Default for TraceClass {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TraceClass {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for TraceClass {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freezing_the_trace_class_freezes_its_stream_and_event_classes() {
        let tc = TraceClass::new();
        let sc = tc.create_stream_class(0).unwrap();
        let ec = sc.create_event_class(0).unwrap();
        assert!(!sc.is_frozen());
        assert!(!ec.is_frozen());
        tc.freeze();
        assert!(sc.is_frozen());
        assert!(ec.is_frozen());
        assert!(tc.create_stream_class(1).is_err());
        assert!(sc.create_event_class(1).is_err());
    }

    #[test]
    fn stream_class_ids_must_be_unique() {
        let tc = TraceClass::new();
        tc.create_stream_class(0).unwrap();
        assert!(tc.create_stream_class(0).is_err());
    }
}
