//! Ports: named connection points on a component (spec §3, §4.6).
//!
//! A [`Port`] is the read-only handle the rest of the graph sees; a
//! [`SelfPort`] is the write-capability handle passed back to the owning
//! component's own callbacks. Both are thin `(graph, id)` pairs — all
//! state lives in the graph's port table — mirroring the teacher's own
//! `SelfComponent`/`Component` split for FFI handles that really just
//! name an object the host library owns.

use crate::component::ComponentId;
use crate::graph::{GraphHandle, GraphId};

/// A port's index into its owning graph's port table, tagged with that
/// graph's identity (spec invariant I-Graph-Same: both endpoints of a
/// connection must belong to the same graph). The tag lets
/// `Graph::connect_ports` reject a `PortId` minted by a different graph
/// with `GraphError::InvalidParams` instead of indexing into an unrelated
/// graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId {
    pub(crate) index: u32,
    pub(crate) graph: GraphId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone)]
pub(crate) struct PortEntry {
    pub id: PortId,
    pub name: String,
    pub direction: PortDirection,
    pub component: ComponentId,
    pub connection: Option<crate::connection::ConnectionId>,
}

/// Read-only view of a port, handed to the rest of the graph (e.g. the
/// other endpoint's `port_connected` callback).
#[derive(Clone)]
pub struct Port {
    pub(crate) graph: GraphHandle,
    pub(crate) id: PortId,
}

impl Port {
    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn name(&self) -> String {
        self.graph.with(|g| g.port(self.id).expect("a Port's own id always belongs to its own graph").name.clone())
    }

    pub fn direction(&self) -> PortDirection {
        self.graph.with(|g| g.port(self.id).expect("a Port's own id always belongs to its own graph").direction)
    }

    pub fn component(&self) -> ComponentId {
        self.graph.with(|g| g.port(self.id).expect("a Port's own id always belongs to its own graph").component)
    }

    pub fn is_connected(&self) -> bool {
        self.graph
            .with(|g| g.port(self.id).expect("a Port's own id always belongs to its own graph").connection.is_some())
    }
}

/// Write-capability handle to one of a component's own ports, valid only
/// inside that component's own callbacks.
pub struct SelfPort {
    pub(crate) graph: GraphHandle,
    pub(crate) id: PortId,
}

impl SelfPort {
    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn as_port(&self) -> Port {
        Port {
            graph: self.graph.clone(),
            id: self.id,
        }
    }
}
