//! Trace instances (spec §3): the runtime root produced from a trace
//! class.

use super::stream::Stream;
use crate::error::GraphError;
use crate::ir::class::{EnvironmentValue, TraceClass};
use crate::object::Shared;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Called when a trace instance is destroyed; used by plug-ins that need
/// to release external resources tied to a trace's lifetime.
pub trait DestructionListener {
    fn trace_destroyed(&self, trace: &Trace);
}

struct TraceData {
    trace_class: TraceClass,
    streams: Vec<Stream>,
    stream_ids: HashSet<u64>,
    environment_overrides: Vec<(String, EnvironmentValue)>,
    destruction_listeners: Vec<Rc<dyn DestructionListener>>,
}

/// A handle to a trace instance.
#[derive(Clone)]
pub struct Trace(Shared<RefCell<TraceData>>);

impl Trace {
    /// Creates a trace instance from `trace_class`, freezing it first if
    /// it is not frozen already (spec §3: "Frozen on first use that
    /// observes it structurally (first trace instance...)").
    pub fn new(trace_class: TraceClass) -> Self {
        trace_class.freeze();
        Trace(Rc::new(RefCell::new(TraceData {
            trace_class,
            streams: Vec::new(),
            stream_ids: HashSet::new(),
            environment_overrides: Vec::new(),
            destruction_listeners: Vec::new(),
        })))
    }

    pub fn trace_class(&self) -> TraceClass {
        self.0.borrow().trace_class.clone()
    }

    pub fn create_stream(&self, id: u64, stream_class_id: u64) -> Result<Stream, GraphError> {
        let mut data = self.0.borrow_mut();
        if !data.stream_ids.insert(id) {
            return Err(GraphError::InvalidParams(format!(
                "stream id {id} is not unique within this trace"
            )));
        }
        let stream_class = data
            .trace_class
            .stream_class_by_id(stream_class_id)
            .ok_or_else(|| GraphError::InvalidParams(format!("no stream class with id {stream_class_id}")))?;
        let stream = Stream::new(id, stream_class);
        data.streams.push(stream.clone());
        Ok(stream)
    }

    pub fn stream_by_id(&self, id: u64) -> Option<Stream> {
        self.0.borrow().streams.iter().find(|s| s.id() == id).cloned()
    }

    pub fn streams(&self) -> Vec<Stream> {
        self.0.borrow().streams.clone()
    }

    pub fn set_environment_override(&self, key: impl Into<String>, value: EnvironmentValue) {
        let key = key.into();
        let mut data = self.0.borrow_mut();
        if let Some(slot) = data.environment_overrides.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            data.environment_overrides.push((key, value));
        }
    }

    /// Trace-level environment as seen at read time: the trace class's
    /// static environment with this instance's overrides applied on top.
    pub fn environment(&self) -> Vec<(String, EnvironmentValue)> {
        let data = self.0.borrow();
        let mut merged = data.trace_class.environment();
        for (key, value) in &data.environment_overrides {
            if let Some(slot) = merged.iter_mut().find(|(k, _)| k == key) {
                slot.1 = value.clone();
            } else {
                merged.push((key.clone(), value.clone()));
            }
        }
        merged
    }

    pub fn add_destruction_listener(&self, listener: Rc<dyn DestructionListener>) {
        self.0.borrow_mut().destruction_listeners.push(listener);
    }

    /// Notifies every registered destruction listener and drops this
    /// handle's last owned reference to the trace data. The graph (or
    /// whichever owner holds the final strong reference to a trace
    /// instance) calls this explicitly rather than relying on `Drop`,
    /// since a listener callback needs a live `Trace` handle and none
    /// can be reconstructed once `Rc<RefCell<TraceData>>` starts
    /// unwinding.
    pub fn destroy(self) {
        let listeners = self.0.borrow().destruction_listeners.clone();
        for listener in &listeners {
            listener.trace_destroyed(&self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_a_trace_freezes_its_trace_class() {
        let tc = TraceClass::new();
        tc.create_stream_class(0).unwrap();
        assert!(!tc.is_frozen());
        let _trace = Trace::new(tc.clone());
        assert!(tc.is_frozen());
    }

    #[test]
    fn stream_ids_are_unique_within_a_trace() {
        let tc = TraceClass::new();
        tc.create_stream_class(0).unwrap();
        let trace = Trace::new(tc);
        trace.create_stream(0, 0).unwrap();
        assert!(trace.create_stream(0, 0).is_err());
    }

    #[test]
    fn environment_overrides_shadow_the_trace_class_defaults() {
        let tc = TraceClass::new();
        tc.set_environment_entry("hostname", EnvironmentValue::String("a".into()))
            .unwrap();
        let trace = Trace::new(tc);
        trace.set_environment_override("hostname", EnvironmentValue::String("b".into()));
        let env = trace.environment();
        assert_eq!(
            env.iter().find(|(k, _)| k == "hostname").map(|(_, v)| v.clone()),
            Some(EnvironmentValue::String("b".into()))
        );
    }

    struct Flag(std::cell::Cell<bool>);
    impl DestructionListener for Flag {
        fn trace_destroyed(&self, _trace: &Trace) {
            self.0.set(true);
        }
    }

    #[test]
    fn destroy_notifies_every_registered_listener() {
        let tc = TraceClass::new();
        let trace = Trace::new(tc);
        let flag = Rc::new(Flag(std::cell::Cell::new(false)));
        trace.add_destruction_listener(flag.clone());
        trace.destroy();
        assert!(flag.0.get());
    }
}
