//! Stream classes: schema for a stream within a trace class (spec §3).

use crate::clock::ClockClass;
use super::event_class::EventClass;
use super::field_class::{validate_scope, FieldClass};
use crate::error::GraphError;
use crate::object::{FreezeFlag, Shared};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Default, Clone, Copy)]
pub struct StreamClassPolicy {
    pub supports_packets: bool,
    pub packets_have_beginning_default_clock_snapshot: bool,
    pub packets_have_end_default_clock_snapshot: bool,
    pub supports_discarded_events: bool,
    pub discarded_events_have_default_clock_snapshots: bool,
    pub supports_discarded_packets: bool,
    pub discarded_packets_have_default_clock_snapshots: bool,
}

#[derive(Debug)]
struct StreamClassData {
    id: u64,
    name: Option<String>,
    packet_context_fc: Option<FieldClass>,
    event_header_fc: Option<FieldClass>,
    event_common_context_fc: Option<FieldClass>,
    event_classes: Vec<EventClass>,
    event_class_ids: HashSet<u64>,
    default_clock_class: Option<Shared<ClockClass>>,
    policy: StreamClassPolicy,
    frozen: Rc<FreezeFlag>,
}

/// A handle to a stream class. Event classes are appended and looked up
/// by their unique numeric ID (spec §3).
#[derive(Debug, Clone)]
pub struct StreamClass(Shared<RefCell<StreamClassData>>);

impl StreamClass {
    pub(crate) fn new(id: u64, frozen: Rc<FreezeFlag>) -> Self {
        StreamClass(Rc::new(RefCell::new(StreamClassData {
            id,
            name: None,
            packet_context_fc: None,
            event_header_fc: None,
            event_common_context_fc: None,
            event_classes: Vec::new(),
            event_class_ids: HashSet::new(),
            default_clock_class: None,
            policy: StreamClassPolicy::default(),
            frozen,
        })))
    }

    pub fn id(&self) -> u64 {
        self.0.borrow().id
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) -> Result<(), GraphError> {
        self.check_mutable("set stream class name")?;
        self.0.borrow_mut().name = Some(name.into());
        Ok(())
    }

    pub fn policy(&self) -> StreamClassPolicy {
        self.0.borrow().policy
    }

    pub fn set_policy(&self, policy: StreamClassPolicy) -> Result<(), GraphError> {
        self.check_mutable("set stream class policy")?;
        self.0.borrow_mut().policy = policy;
        Ok(())
    }

    pub fn set_default_clock_class(&self, clock_class: Shared<ClockClass>) -> Result<(), GraphError> {
        self.check_mutable("set stream class default clock class")?;
        self.0.borrow_mut().default_clock_class = Some(clock_class);
        Ok(())
    }

    pub fn default_clock_class(&self) -> Option<Shared<ClockClass>> {
        self.0.borrow().default_clock_class.clone()
    }

    pub fn set_packet_context_field_class(&self, fc: FieldClass) -> Result<(), GraphError> {
        validate_scope(&fc)?;
        self.check_mutable("set stream class packet context")?;
        self.0.borrow_mut().packet_context_fc = Some(fc);
        Ok(())
    }

    pub fn packet_context_field_class(&self) -> Option<FieldClass> {
        self.0.borrow().packet_context_fc.clone()
    }

    pub fn set_event_header_field_class(&self, fc: FieldClass) -> Result<(), GraphError> {
        validate_scope(&fc)?;
        self.check_mutable("set stream class event header")?;
        self.0.borrow_mut().event_header_fc = Some(fc);
        Ok(())
    }

    pub fn set_event_common_context_field_class(&self, fc: FieldClass) -> Result<(), GraphError> {
        validate_scope(&fc)?;
        self.check_mutable("set stream class event common context")?;
        self.0.borrow_mut().event_common_context_fc = Some(fc);
        Ok(())
    }

    pub fn event_common_context_field_class(&self) -> Option<FieldClass> {
        self.0.borrow().event_common_context_fc.clone()
    }

    /// Creates and appends a new event class with the given unique
    /// numeric ID, sharing this stream class's freeze flag.
    pub fn create_event_class(&self, id: u64) -> Result<EventClass, GraphError> {
        self.check_mutable("create event class")?;
        let mut data = self.0.borrow_mut();
        if !data.event_class_ids.insert(id) {
            return Err(GraphError::InvalidParams(format!(
                "event class id {id} is not unique within stream class {}",
                data.id
            )));
        }
        let frozen = Rc::clone(&data.frozen);
        let ec = EventClass::new(id, frozen);
        data.event_classes.push(ec.clone());
        Ok(ec)
    }

    pub fn event_class_by_id(&self, id: u64) -> Option<EventClass> {
        self.0
            .borrow()
            .event_classes
            .iter()
            .find(|ec| ec.id() == id)
            .cloned()
    }

    pub fn event_classes(&self) -> Vec<EventClass> {
        self.0.borrow().event_classes.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.borrow().frozen.is_frozen()
    }

    fn check_mutable(&self, what: &'static str) -> Result<(), GraphError> {
        self.0
            .borrow()
            .frozen
            .check_mutable(what)
            .map_err(|e| GraphError::InvalidObject(e.to_string()))
    }
}

impl PartialEq for StreamClass {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for StreamClass {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_class_ids_must_be_unique() {
        let sc = StreamClass::new(0, Rc::new(FreezeFlag::new()));
        sc.create_event_class(1).unwrap();
        assert!(sc.create_event_class(1).is_err());
        assert!(sc.create_event_class(2).is_ok());
    }
}
