//! The FIFO round-robin scheduler that drives sink consumption (spec
//! §4.8, §5 "Scheduling model").
//!
//! Single-threaded and cooperative: every call into a graph from its
//! owner is serialized, there is no thread pool, and `AGAIN` is the
//! sole back-pressure signal. Fairness comes from always re-queuing a
//! sink at the tail rather than retrying it in place.

use crate::component::{ComponentId, SelfComponent};
use crate::error::record_error;
use crate::graph::{with_component_methods, GraphHandle};
use crate::log::{graph_log, LoggingLevel};
use crate::status::{ConsumeStatus, RunStatus};

enum Progress {
    Ended,
    Made,
    None,
    Error,
}

/// Pops the head sink, consumes it once, and re-queues it at the tail
/// unless it signaled `End`.
fn step(graph: &GraphHandle, id: ComponentId) -> Progress {
    let mut self_component = SelfComponent {
        graph: graph.clone(),
        id,
    };
    let result = with_component_methods(graph, id, |m| m.consume(&mut self_component));
    let result = match result {
        Ok(ConsumeStatus::Error) => Err(crate::error::GraphError::InvalidObject(
            "sink reported ConsumeStatus::Error".into(),
        )),
        other => other,
    };
    match result {
        Ok(ConsumeStatus::End) => Progress::Ended,
        Ok(ConsumeStatus::Ok) => {
            graph.with_mut(|g| g.push_back_sink(id));
            Progress::Made
        }
        Ok(ConsumeStatus::Again) => {
            graph.with_mut(|g| g.push_back_sink(id));
            Progress::None
        }
        Ok(ConsumeStatus::Error) => unreachable!("mapped to Err above"),
        Err(err) => {
            let name = graph.with(|g| g.component(id).name.clone());
            record_error!(err, name);
            let threshold = graph.with(|g| g.log_level());
            graph_log!(threshold, LoggingLevel::Error, "sink consume failed");
            Progress::Error
        }
    }
}

/// Executes exactly one head-sink `consume` call (spec §4.8 "step
/// variant").
pub fn run_once(graph: &GraphHandle) -> RunStatus {
    if graph.with(|g| g.is_canceled()) {
        return RunStatus::Canceled;
    }
    let Some(id) = graph.with_mut(|g| g.pop_front_sink()) else {
        return RunStatus::End;
    };
    match step(graph, id) {
        Progress::Ended => {
            if graph.with(|g| g.sink_queue_is_empty()) {
                RunStatus::End
            } else {
                RunStatus::Again
            }
        }
        Progress::Made => RunStatus::Again,
        Progress::None => RunStatus::Again,
        Progress::Error => RunStatus::Error,
    }
}

/// Drains sink progress until a terminal outcome (spec §4.8):
/// - every sink has ended -> `End`
/// - cancellation was requested -> `Canceled`
/// - a full round made no forward progress -> `Again`
/// - a sink errored -> `Error`
pub fn run(graph: &GraphHandle) -> RunStatus {
    loop {
        if graph.with(|g| g.is_canceled()) {
            return RunStatus::Canceled;
        }
        let round_len = graph.with(|g| g.sink_queue_len());
        if round_len == 0 {
            return RunStatus::End;
        }

        let mut progressed = false;
        for _ in 0..round_len {
            if graph.with(|g| g.is_canceled()) {
                return RunStatus::Canceled;
            }
            let Some(id) = graph.with_mut(|g| g.pop_front_sink()) else {
                break;
            };
            match step(graph, id) {
                Progress::Ended => progressed = true,
                Progress::Made => progressed = true,
                Progress::None => {}
                Progress::Error => return RunStatus::Error,
            }
        }

        if graph.with(|g| g.sink_queue_is_empty()) {
            return RunStatus::End;
        }
        if !progressed {
            return RunStatus::Again;
        }
    }
}
