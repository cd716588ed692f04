//! The component model: component classes, component instances, and the
//! method table they implement (spec §3, §4.6).

use crate::error::GraphError;
use crate::graph::GraphHandle;
use crate::port::{Port, PortDirection, PortId, SelfPort};
use crate::query::QueryExecutor;
use crate::status::ConsumeStatus;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Source,
    Filter,
    Sink,
}

/// Static description of a component class, independent of any instance
/// (spec §3 "Component class").
pub struct ComponentClass {
    pub kind: ComponentKind,
    pub name: String,
    pub description: Option<String>,
    pub help: Option<String>,
}

/// Per-iterator state a source/filter's `message_iterator_initialize`
/// hands back; `next`/`seek_beginning`/`finalize` are the remaining rows
/// of spec §4.6's method table that apply to message iterators rather
/// than to the component itself.
pub trait MessageIteratorMethods {
    fn next(&mut self, capacity: usize) -> crate::iterator::IteratorOutcome;

    fn seek_beginning(&mut self) -> Result<(), GraphError> {
        Err(GraphError::InvalidObject(
            "this message iterator does not support seek_beginning".into(),
        ))
    }

    fn can_seek_beginning(&self) -> bool {
        false
    }

    fn finalize(&mut self) {}
}

/// The method table of spec §4.6, rendered as a trait with default
/// no-op/unsupported bodies for every row that is "optional" per the
/// spec's table — grounded on the teacher's own `SourcePluginHandler`
/// trait (`initialize`, `finalize`, `iterator_next`) in `main.rs`.
pub trait ComponentMethods {
    fn initialize(&mut self, _self_component: &mut SelfComponent, _params: &Value) -> Result<(), GraphError> {
        Ok(())
    }

    fn finalize(&mut self, _self_component: &mut SelfComponent) {}

    fn query(
        &self,
        class: &ComponentClass,
        _executor: &QueryExecutor,
        object: &str,
        _params: &Value,
    ) -> Result<Value, GraphError> {
        Err(GraphError::InvalidParams(format!(
            "component class `{}` does not support query object `{object}`",
            class.name
        )))
    }

    /// Reacting to a new connection. Returning `Err` refuses the
    /// connection (spec §4.8 `REFUSE_PORT_CONNECTION`), rolling it back
    /// before either endpoint observes it as established.
    fn port_connected(
        &mut self,
        _self_component: &mut SelfComponent,
        _self_port: SelfPort,
        _other_port: Port,
    ) -> Result<(), GraphError> {
        Ok(())
    }

    /// Required for sinks; the default errors so a sink class that
    /// forgot to implement it fails loudly instead of silently never
    /// consuming.
    fn graph_is_configured(&mut self, _self_component: &mut SelfComponent) -> Result<(), GraphError> {
        Ok(())
    }

    /// Required for sinks.
    fn consume(&mut self, _self_component: &mut SelfComponent) -> Result<ConsumeStatus, GraphError> {
        Err(GraphError::InvalidObject(
            "component does not implement consume (is it really a sink?)".into(),
        ))
    }

    /// Required for sources/filters.
    fn message_iterator_initialize(
        &mut self,
        _self_component: &mut SelfComponent,
        _self_port: PortId,
    ) -> Result<Box<dyn MessageIteratorMethods>, GraphError> {
        Err(GraphError::InvalidObject(
            "component does not implement message_iterator_initialize (is it really a source or filter?)".into(),
        ))
    }
}

pub(crate) struct ComponentEntry {
    pub id: ComponentId,
    pub class_name: String,
    pub kind: ComponentKind,
    pub name: String,
    pub methods: std::cell::RefCell<Option<Box<dyn ComponentMethods>>>,
    pub input_ports: Vec<PortId>,
    pub output_ports: Vec<PortId>,
}

/// Read-only view of a component, handed to the rest of the graph.
#[derive(Clone)]
pub struct Component {
    pub(crate) graph: GraphHandle,
    pub(crate) id: ComponentId,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> String {
        self.graph.with(|g| g.component(self.id).name.clone())
    }

    pub fn kind(&self) -> ComponentKind {
        self.graph.with(|g| g.component(self.id).kind)
    }

    pub fn input_ports(&self) -> Vec<Port> {
        self.graph.with(|g| {
            g.component(self.id)
                .input_ports
                .iter()
                .map(|&id| Port {
                    graph: self.graph.clone(),
                    id,
                })
                .collect()
        })
    }

    pub fn output_ports(&self) -> Vec<Port> {
        self.graph.with(|g| {
            g.component(self.id)
                .output_ports
                .iter()
                .map(|&id| Port {
                    graph: self.graph.clone(),
                    id,
                })
                .collect()
        })
    }

    pub fn port_by_name(&self, direction: PortDirection, name: &str) -> Option<Port> {
        let ports = match direction {
            PortDirection::Input => self.input_ports(),
            PortDirection::Output => self.output_ports(),
        };
        ports.into_iter().find(|p| p.name() == name)
    }
}

/// Write-capability handle to a component, valid only inside that
/// component's own callbacks (spec Design Notes §9).
pub struct SelfComponent {
    pub(crate) graph: GraphHandle,
    pub(crate) id: ComponentId,
}

impl SelfComponent {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn as_component(&self) -> Component {
        Component {
            graph: self.graph.clone(),
            id: self.id,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.graph.with(|g| g.is_canceled())
    }

    /// Adds a port to this component. Only legal during `initialize` or
    /// `port_connected` (spec §4.6: "Adding a port is legal only during
    /// `initialize` or `port_connected`; after the graph is configured,
    /// port topology is frozen.").
    pub fn add_port(&mut self, direction: PortDirection, name: impl Into<String>) -> Result<SelfPort, GraphError> {
        let id = self.graph.with_mut(|g| g.add_port(self.id, direction, name.into()))?;
        Ok(SelfPort {
            graph: self.graph.clone(),
            id,
        })
    }

    /// Creates a message iterator pulling from `input_port`'s upstream
    /// source or filter (spec §4.7). The usual way a filter or sink
    /// acquires the iterators it pulls from during its own `consume` or
    /// `initialize`.
    pub fn create_message_iterator(&self, input_port: PortId) -> Result<crate::iterator::MessageIterator, GraphError> {
        crate::graph::Graph {
            handle: self.graph.clone(),
        }
        .create_message_iterator(input_port)
    }

    /// A handle to this graph's per-kind message pool (spec §4.4), for a
    /// source or filter's own `MessageIteratorMethods::next` to build
    /// messages through instead of allocating fresh storage every call.
    pub fn message_pool(&self) -> crate::pool::MessagePoolHandle {
        crate::pool::MessagePoolHandle {
            graph: self.graph.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    struct Noop;
    impl ComponentMethods for Noop {}

    #[test]
    fn components_report_their_declared_kind_and_name() {
        let graph = Graph::new();
        let component = graph
            .add_component(ComponentKind::Filter, "id", "the-filter", Box::new(Noop), &Value::Null)
            .unwrap();
        assert_eq!(component.kind(), ComponentKind::Filter);
        assert_eq!(component.name(), "the-filter");
    }

    #[test]
    fn message_pool_handle_round_trips_through_the_owning_graphs_pool() {
        use crate::clock::{ClockClass, ClockSnapshot};
        use crate::message::Message;

        let graph = Graph::new();
        let component = graph
            .add_component(ComponentKind::Filter, "id", "the-filter", Box::new(Noop), &Value::Null)
            .unwrap();
        let self_component = SelfComponent {
            graph: graph.handle.clone(),
            id: component.id(),
        };
        let pool = self_component.message_pool();

        let cc = ClockClass::new(1_000_000);
        let message = Message::MessageIteratorInactivity {
            clock_snapshot: ClockSnapshot::new(cc.clone(), 0),
            clock_class: cc,
        };
        let slot = pool.alloc(message);
        assert_eq!(slot.message().kind_name(), "message_iterator_inactivity");
        pool.release(slot);

        assert_eq!(graph.handle.with(|g| g.message_pool().parked("message_iterator_inactivity")), 1);
    }
}
