//! Connections between an output port and an input port (spec §4.7,
//! invariant I-Graph-Bipartite).

use crate::graph::GraphHandle;
use crate::port::{Port, PortId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub(crate) u32);

/// Internal storage for one connection: exactly one upstream output port
/// and one downstream input port, plus the message iterators created
/// against it. A connection is considered ended once both of its
/// endpoint components finalize; this crate tracks that indirectly by
/// the component finalize calls dropping their iterators rather than
/// with a separate "ended" flag.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionEntry {
    pub id: ConnectionId,
    pub output: PortId,
    pub input: PortId,
}

/// Read-only handle to an established connection.
#[derive(Clone)]
pub struct Connection {
    pub(crate) graph: GraphHandle,
    pub(crate) id: ConnectionId,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn output_port(&self) -> Port {
        let port_id = self.graph.with(|g| g.connection(self.id).output);
        Port {
            graph: self.graph.clone(),
            id: port_id,
        }
    }

    pub fn input_port(&self) -> Port {
        let port_id = self.graph.with(|g| g.connection(self.id).input);
        Port {
            graph: self.graph.clone(),
            id: port_id,
        }
    }
}
