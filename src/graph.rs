//! The graph engine: assembly, lazy configure transition, and the
//! scheduling queue (spec §4.8, component H).
//!
//! Every dynamic-topology object (component, port, connection) is a
//! thin `(graph handle, index)` pair; the arenas themselves live in
//! [`GraphData`] behind a single `Rc<RefCell<_>>`. This mirrors the
//! teacher's own split between a host-owned object and the opaque
//! handle a plug-in callback receives, without needing `unsafe` pointer
//! arithmetic to get there.

use crate::component::{Component, ComponentEntry, ComponentId, ComponentKind, ComponentMethods, SelfComponent};
use crate::connection::{Connection, ConnectionEntry, ConnectionId};
use crate::error::{record_error, GraphError};
use crate::iterator::MessageIterator;
use crate::log::{GraphLogLevel, LoggingLevel};
use crate::pool::MessagePool;
use crate::port::{Port, PortDirection, PortEntry, PortId, SelfPort};
use crate::scheduler;
use crate::status::RunStatus;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one graph instance, tagged onto every `PortId` it mints so
/// cross-graph `PortId`s can be rejected instead of indexed (spec
/// invariant I-Graph-Same).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(pub(crate) u64);

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) struct GraphData {
    id: GraphId,
    components: Vec<ComponentEntry>,
    ports: Vec<PortEntry>,
    connections: Vec<ConnectionEntry>,
    sink_queue: VecDeque<ComponentId>,
    configured: bool,
    canceled: bool,
    log_level: GraphLogLevel,
    message_pool: MessagePool,
}

impl GraphData {
    pub(crate) fn component(&self, id: ComponentId) -> &ComponentEntry {
        &self.components[id.0 as usize]
    }

    /// Resolves a port, rejecting one tagged with a different graph's
    /// identity before it can be used to index `self.ports` (spec
    /// invariant I-Graph-Same).
    pub(crate) fn port(&self, id: PortId) -> Result<&PortEntry, GraphError> {
        if id.graph != self.id {
            return Err(GraphError::InvalidParams(
                "port belongs to a different graph".into(),
            ));
        }
        Ok(&self.ports[id.index as usize])
    }

    pub(crate) fn connection(&self, id: ConnectionId) -> &ConnectionEntry {
        &self.connections[id.0 as usize]
    }

    pub(crate) fn message_pool(&self) -> &MessagePool {
        &self.message_pool
    }

    pub(crate) fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub(crate) fn log_level(&self) -> crate::log::LoggingLevel {
        self.log_level.get()
    }

    pub(crate) fn sink_queue_is_empty(&self) -> bool {
        self.sink_queue.is_empty()
    }

    pub(crate) fn sink_queue_len(&self) -> usize {
        self.sink_queue.len()
    }

    pub(crate) fn pop_front_sink(&mut self) -> Option<ComponentId> {
        self.sink_queue.pop_front()
    }

    pub(crate) fn push_back_sink(&mut self, id: ComponentId) {
        self.sink_queue.push_back(id);
    }

    /// Adds a port to `component` (spec §4.6: legal only during
    /// `initialize` or `port_connected`, i.e. before I-Config).
    pub(crate) fn add_port(&mut self, component: ComponentId, direction: PortDirection, name: String) -> Result<PortId, GraphError> {
        if self.configured {
            return Err(GraphError::InvalidObject(
                "cannot add a port after the graph is configured".into(),
            ));
        }
        let siblings = match direction {
            PortDirection::Input => &self.components[component.0 as usize].input_ports,
            PortDirection::Output => &self.components[component.0 as usize].output_ports,
        };
        if siblings.iter().any(|&id| self.ports[id.index as usize].name == name) {
            return Err(GraphError::InvalidParams(format!(
                "port name `{name}` is already in use on this component"
            )));
        }
        let id = PortId {
            index: self.ports.len() as u32,
            graph: self.id,
        };
        self.ports.push(PortEntry {
            id,
            name,
            direction,
            component,
            connection: None,
        });
        match direction {
            PortDirection::Input => self.components[component.0 as usize].input_ports.push(id),
            PortDirection::Output => self.components[component.0 as usize].output_ports.push(id),
        }
        Ok(id)
    }
}

/// A shared handle to one graph's arenas, cloned freely by every
/// `Component`/`Port`/`Connection` handle that needs to reach back into
/// them.
#[derive(Clone)]
pub struct GraphHandle(Rc<RefCell<GraphData>>);

impl GraphHandle {
    pub(crate) fn with<R>(&self, f: impl FnOnce(&GraphData) -> R) -> R {
        f(&self.0.borrow())
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut GraphData) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

/// Checks out a component's method table, runs `f` against it with the
/// graph's own borrow released, and checks it back in. Releasing the
/// graph borrow first is what lets `f` call back into the graph (e.g. a
/// `port_connected` implementation adding a port) without a reentrant
/// `RefCell` panic.
pub(crate) fn with_component_methods<R>(
    graph: &GraphHandle,
    id: ComponentId,
    f: impl FnOnce(&mut dyn ComponentMethods) -> R,
) -> R {
    let mut methods = graph
        .with(|g| g.component(id).methods.borrow_mut().take())
        .expect("component methods already checked out (reentrant call into the same component?)");
    let result = f(&mut *methods);
    graph.with(|g| *g.component(id).methods.borrow_mut() = Some(methods));
    result
}

/// A single pipeline: components, their ports, the connections between
/// them, and the sink scheduling queue (spec §3 "Graph").
#[derive(Clone)]
pub struct Graph {
    pub(crate) handle: GraphHandle,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            handle: GraphHandle(Rc::new(RefCell::new(GraphData {
                id: GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)),
                components: Vec::new(),
                ports: Vec::new(),
                connections: Vec::new(),
                sink_queue: VecDeque::new(),
                configured: false,
                canceled: false,
                log_level: GraphLogLevel::default(),
                message_pool: MessagePool::new(),
            }))),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.handle.with(|g| g.canceled)
    }

    pub fn log_level(&self) -> LoggingLevel {
        self.handle.with(|g| g.log_level.get())
    }

    pub fn set_log_level(&self, level: LoggingLevel) {
        self.handle.with(|g| g.log_level.set(level));
    }

    /// Sets the cooperative, advisory cancellation flag (spec §4.8).
    pub fn cancel(&self) {
        self.handle.with_mut(|g| g.canceled = true);
    }

    pub fn is_configured(&self) -> bool {
        self.handle.with(|g| g.configured)
    }

    /// Adds a component to the graph and runs its `initialize` (spec
    /// §4.8 assembly phase). Rejected once the graph is configured
    /// (I-Config).
    pub fn add_component(
        &self,
        kind: ComponentKind,
        class_name: impl Into<String>,
        name: impl Into<String>,
        methods: Box<dyn ComponentMethods>,
        params: &Value,
    ) -> Result<Component, GraphError> {
        let class_name = class_name.into();
        let name = name.into();
        let id = self.handle.with_mut(|g| -> Result<ComponentId, GraphError> {
            if g.configured {
                return Err(GraphError::InvalidObject(
                    "cannot add a component after the graph is configured".into(),
                ));
            }
            let id = ComponentId(g.components.len() as u32);
            g.components.push(ComponentEntry {
                id,
                class_name: class_name.clone(),
                kind,
                name: name.clone(),
                methods: RefCell::new(Some(methods)),
                input_ports: Vec::new(),
                output_ports: Vec::new(),
            });
            if kind == ComponentKind::Sink {
                g.sink_queue.push_back(id);
            }
            Ok(id)
        })?;

        let mut self_component = SelfComponent {
            graph: self.handle.clone(),
            id,
        };
        with_component_methods(&self.handle, id, |m| m.initialize(&mut self_component, params))
            .map_err(|err| record_error!(err, name.clone()))?;

        Ok(Component {
            graph: self.handle.clone(),
            id,
        })
    }

    /// Joins an output port to an input port (spec §4.7/§4.8): checks
    /// I-Graph-Bipartite and I-Port-Uniq, then notifies both endpoints
    /// upstream-first. Either endpoint refusing rolls the connection
    /// back before it is recorded.
    pub fn connect_ports(&self, output: PortId, input: PortId) -> Result<Connection, GraphError> {
        self.handle.with(|g| -> Result<(), GraphError> {
            if g.configured {
                return Err(GraphError::InvalidObject(
                    "cannot add a connection after the graph is configured".into(),
                ));
            }
            let out = g.port(output)?;
            let inp = g.port(input)?;
            if out.direction != PortDirection::Output || inp.direction != PortDirection::Input {
                return Err(GraphError::InvalidParams(
                    "a connection must join an output port to an input port".into(),
                ));
            }
            if out.connection.is_some() || inp.connection.is_some() {
                return Err(GraphError::InvalidParams(
                    "a port may carry at most one connection".into(),
                ));
            }
            Ok(())
        })?;

        let output_component = self.handle.with(|g| g.port(output).map(|p| p.component))?;
        let input_component = self.handle.with(|g| g.port(input).map(|p| p.component))?;
        let upstream_name = self.handle.with(|g| g.component(output_component).name.clone());
        let downstream_name = self.handle.with(|g| g.component(input_component).name.clone());

        let mut upstream_self = SelfComponent {
            graph: self.handle.clone(),
            id: output_component,
        };
        with_component_methods(&self.handle, output_component, |m| {
            m.port_connected(
                &mut upstream_self,
                SelfPort {
                    graph: self.handle.clone(),
                    id: output,
                },
                Port {
                    graph: self.handle.clone(),
                    id: input,
                },
            )
        })
        .map_err(|err| record_error!(err, upstream_name))?;

        let mut downstream_self = SelfComponent {
            graph: self.handle.clone(),
            id: input_component,
        };
        with_component_methods(&self.handle, input_component, |m| {
            m.port_connected(
                &mut downstream_self,
                SelfPort {
                    graph: self.handle.clone(),
                    id: input,
                },
                Port {
                    graph: self.handle.clone(),
                    id: output,
                },
            )
        })
        .map_err(|err| record_error!(err, downstream_name))?;

        let id = self.handle.with_mut(|g| {
            let id = ConnectionId(g.connections.len() as u32);
            g.connections.push(ConnectionEntry { id, output, input });
            g.ports[output.index as usize].connection = Some(id);
            g.ports[input.index as usize].connection = Some(id);
            id
        });

        Ok(Connection {
            graph: self.handle.clone(),
            id,
        })
    }

    /// Runs the lazy configure transition (spec §4.8): invokes
    /// `graph_is_configured` on every sink once, in declaration order,
    /// then sets I-Config. A no-op if already configured. Trace-IR
    /// schema in this crate freezes eagerly the moment an instance is
    /// created from it (see `ir::instance::Trace::new`) rather than at
    /// configure time, so there is no separate schema-freezing walk
    /// here — see DESIGN.md.
    pub fn configure(&self) -> Result<(), GraphError> {
        if self.handle.with(|g| g.configured) {
            return Ok(());
        }
        let sinks: Vec<ComponentId> = self
            .handle
            .with(|g| g.components.iter().filter(|c| c.kind == ComponentKind::Sink).map(|c| c.id).collect());
        for id in sinks {
            let name = self.handle.with(|g| g.component(id).name.clone());
            let mut self_component = SelfComponent {
                graph: self.handle.clone(),
                id,
            };
            with_component_methods(&self.handle, id, |m| m.graph_is_configured(&mut self_component))
                .map_err(|err| record_error!(err, name))?;
        }
        self.handle.with_mut(|g| g.configured = true);
        Ok(())
    }

    /// Creates a message iterator pulling from `port`'s upstream source
    /// or filter (spec §4.7). `port` may be the output port itself or a
    /// connected input port downstream of it — a sink or filter
    /// ordinarily passes one of its own input ports, mirroring
    /// `message_iterator_initialize`'s `self_port` being the *upstream*
    /// component's output port regardless of who asked for the
    /// iterator.
    pub fn create_message_iterator(&self, port: PortId) -> Result<MessageIterator, GraphError> {
        let output_port = self.handle.with(|g| -> Result<PortId, GraphError> {
            let entry = g.port(port)?;
            match entry.direction {
                PortDirection::Output => Ok(port),
                PortDirection::Input => {
                    let connection_id = entry.connection.ok_or_else(|| {
                        GraphError::InvalidObject("cannot create a message iterator on an unconnected port".into())
                    })?;
                    Ok(g.connection(connection_id).output)
                }
            }
        })?;
        let (component, connection) = self.handle.with(|g| -> Result<_, GraphError> {
            let entry = g.port(output_port)?;
            Ok((entry.component, entry.connection))
        })?;
        let connection = connection.ok_or_else(|| {
            GraphError::InvalidObject("cannot create a message iterator on an unconnected port".into())
        })?;
        let name = self.handle.with(|g| g.component(component).name.clone());
        let methods = with_component_methods(&self.handle, component, |m| m.message_iterator_initialize(
            &mut SelfComponent {
                graph: self.handle.clone(),
                id: component,
            },
            output_port,
        ))
        .map_err(|err| record_error!(err, name))?;
        Ok(MessageIterator::new(component, port, connection, methods))
    }

    /// Configures the graph if needed, then drains sink progress until
    /// a terminal outcome (spec §4.8).
    pub fn run(&self) -> RunStatus {
        if self.configure().is_err() {
            // `configure` already appended the offending component's
            // cause to the error stack before returning it.
            return RunStatus::Error;
        }
        scheduler::run(&self.handle)
    }

    /// Configures the graph if needed, then executes exactly one
    /// head-sink `consume` (spec §4.8 "step variant").
    pub fn run_once(&self) -> RunStatus {
        if self.configure().is_err() {
            return RunStatus::Error;
        }
        scheduler::run_once(&self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::MessageIteratorMethods;
    use crate::iterator::IteratorOutcome;
    use crate::status::ConsumeStatus;

    struct Source;
    impl ComponentMethods for Source {
        fn initialize(&mut self, self_component: &mut SelfComponent, _params: &Value) -> Result<(), GraphError> {
            self_component.add_port(PortDirection::Output, "out")?;
            Ok(())
        }

        fn message_iterator_initialize(
            &mut self,
            _self_component: &mut SelfComponent,
            _self_port: PortId,
        ) -> Result<Box<dyn MessageIteratorMethods>, GraphError> {
            Ok(Box::new(Exhausted))
        }
    }

    struct Exhausted;
    impl MessageIteratorMethods for Exhausted {
        fn next(&mut self, _capacity: usize) -> IteratorOutcome {
            IteratorOutcome::End
        }
    }

    struct Sink(std::cell::Cell<u32>);
    impl ComponentMethods for Sink {
        fn initialize(&mut self, self_component: &mut SelfComponent, _params: &Value) -> Result<(), GraphError> {
            self_component.add_port(PortDirection::Input, "in")?;
            Ok(())
        }

        fn consume(&mut self, _self_component: &mut SelfComponent) -> Result<ConsumeStatus, GraphError> {
            let calls = self.0.get() + 1;
            self.0.set(calls);
            if calls >= 3 {
                Ok(ConsumeStatus::End)
            } else {
                Ok(ConsumeStatus::Ok)
            }
        }
    }

    #[test]
    fn connecting_output_to_input_succeeds_and_records_the_connection() {
        let graph = Graph::new();
        let source = graph.add_component(ComponentKind::Source, "src", "s", Box::new(Source), &Value::Null).unwrap();
        let sink = graph
            .add_component(ComponentKind::Sink, "sink", "k", Box::new(Sink(std::cell::Cell::new(0))), &Value::Null)
            .unwrap();
        let out = source.output_ports().remove(0);
        let inp = sink.input_ports().remove(0);
        let connection = graph.connect_ports(out.id(), inp.id()).unwrap();
        assert!(out.is_connected());
        assert!(inp.is_connected());
        assert_eq!(connection.output_port().id(), out.id());
    }

    #[test]
    fn connecting_two_outputs_is_rejected() {
        let graph = Graph::new();
        let a = graph.add_component(ComponentKind::Source, "src", "a", Box::new(Source), &Value::Null).unwrap();
        let b = graph.add_component(ComponentKind::Source, "src", "b", Box::new(Source), &Value::Null).unwrap();
        let out_a = a.output_ports().remove(0);
        let out_b = b.output_ports().remove(0);
        assert!(graph.connect_ports(out_a.id(), out_b.id()).is_err());
    }

    #[test]
    fn adding_a_port_after_configure_is_rejected() {
        let graph = Graph::new();
        let sink = graph
            .add_component(ComponentKind::Sink, "sink", "k", Box::new(Sink(std::cell::Cell::new(0))), &Value::Null)
            .unwrap();
        graph.configure().unwrap();
        let mut self_component = SelfComponent {
            graph: graph.handle.clone(),
            id: sink.id(),
        };
        assert!(self_component.add_port(PortDirection::Input, "late").is_err());
    }

    #[test]
    fn run_drains_a_sink_to_end() {
        let graph = Graph::new();
        graph
            .add_component(ComponentKind::Sink, "sink", "k", Box::new(Sink(std::cell::Cell::new(0))), &Value::Null)
            .unwrap();
        assert_eq!(graph.run(), RunStatus::End);
    }

    #[test]
    fn cancellation_is_observed_before_the_next_round() {
        let graph = Graph::new();
        graph
            .add_component(ComponentKind::Sink, "sink", "k", Box::new(Sink(std::cell::Cell::new(0))), &Value::Null)
            .unwrap();
        graph.cancel();
        assert_eq!(graph.run(), RunStatus::Canceled);
    }
}
