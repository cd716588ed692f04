//! Event classes: schema for one kind of event within a stream class
//! (spec §3).

use super::field_class::{validate_scope, FieldClass};
use crate::error::GraphError;
use crate::object::{FreezeFlag, Shared};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    DebugSystem,
    DebugProgram,
    DebugProcess,
    DebugModule,
    DebugUnit,
    DebugFunction,
    DebugLine,
    Debug,
}

#[derive(Debug)]
struct EventClassData {
    id: u64,
    name: Option<String>,
    specific_context_fc: Option<FieldClass>,
    payload_fc: Option<FieldClass>,
    log_level: Option<LogLevel>,
    frozen: Rc<FreezeFlag>,
}

/// A handle to an event class. Cheap to clone (an `Rc`); every clone
/// shares the same underlying data and the same freeze flag as its
/// owning stream class.
#[derive(Debug, Clone)]
pub struct EventClass(Shared<RefCell<EventClassData>>);

impl EventClass {
    pub(crate) fn new(id: u64, frozen: Rc<FreezeFlag>) -> Self {
        EventClass(Rc::new(RefCell::new(EventClassData {
            id,
            name: None,
            specific_context_fc: None,
            payload_fc: None,
            log_level: None,
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
        let mut data = self.0.borrow_mut();
        data.frozen
            .check_mutable("set event class name")
            .map_err(|e| GraphError::InvalidObject(e.to_string()))?;
        data.name = Some(name.into());
        Ok(())
    }

    pub fn set_log_level(&self, level: LogLevel) -> Result<(), GraphError> {
        let mut data = self.0.borrow_mut();
        data.frozen
            .check_mutable("set event class log level")
            .map_err(|e| GraphError::InvalidObject(e.to_string()))?;
        data.log_level = Some(level);
        Ok(())
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.0.borrow().log_level
    }

    pub fn set_specific_context_field_class(&self, fc: FieldClass) -> Result<(), GraphError> {
        validate_scope(&fc)?;
        let mut data = self.0.borrow_mut();
        data.frozen
            .check_mutable("set event class specific context")
            .map_err(|e| GraphError::InvalidObject(e.to_string()))?;
        data.specific_context_fc = Some(fc);
        Ok(())
    }

    pub fn specific_context_field_class(&self) -> Option<FieldClass> {
        self.0.borrow().specific_context_fc.clone()
    }

    pub fn set_payload_field_class(&self, fc: FieldClass) -> Result<(), GraphError> {
        validate_scope(&fc)?;
        let mut data = self.0.borrow_mut();
        data.frozen
            .check_mutable("set event class payload")
            .map_err(|e| GraphError::InvalidObject(e.to_string()))?;
        data.payload_fc = Some(fc);
        Ok(())
    }

    pub fn payload_field_class(&self) -> Option<FieldClass> {
        self.0.borrow().payload_fc.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.borrow().frozen.is_frozen()
    }
}

impl PartialEq for EventClass {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for EventClass {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutators_are_rejected_once_frozen() {
        let frozen = Rc::new(FreezeFlag::new());
        let ec = EventClass::new(1, frozen.clone());
        ec.set_name("foo").unwrap();
        frozen.freeze();
        assert!(ec.set_name("bar").is_err());
        assert_eq!(ec.name().unwrap(), "foo");
    }
}
