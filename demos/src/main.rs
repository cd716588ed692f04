//! Minimal end-to-end pipeline: a source that emits a handful of
//! synthetic events on one stream, and a sink that pulls and counts
//! them through a message iterator. Exercises component assembly, port
//! connection, the graph scheduler, and the trace-IR/message layers
//! together.

use tracecore::component::{ComponentKind, ComponentMethods, MessageIteratorMethods, SelfComponent};
use tracecore::ir::class::TraceClass;
use tracecore::ir::instance::{EventPool, Trace};
use tracecore::iterator::IteratorOutcome;
use tracecore::message::Message;
use tracecore::pool::MessagePoolHandle;
use tracecore::port::{PortDirection, PortId};
use tracecore::status::ConsumeStatus;
use tracecore::value::Value;
use tracecore::Graph;

struct CountingSource {
    event_count: u64,
}

impl ComponentMethods for CountingSource {
    fn initialize(&mut self, self_component: &mut SelfComponent, _params: &Value) -> Result<(), tracecore::GraphError> {
        self_component.add_port(PortDirection::Output, "out")?;
        Ok(())
    }

    fn message_iterator_initialize(
        &mut self,
        self_component: &mut SelfComponent,
        _self_port: PortId,
    ) -> Result<Box<dyn MessageIteratorMethods>, tracecore::GraphError> {
        let trace_class = TraceClass::new();
        let stream_class = trace_class.create_stream_class(0)?;
        let event_class = stream_class.create_event_class(0)?;
        event_class.set_name("tick")?;
        let trace = Trace::new(trace_class);
        let stream = trace.create_stream(0, 0)?;
        Ok(Box::new(SourceIterator {
            stream,
            event_class,
            remaining: self.event_count,
            sent_beginning: false,
            sent_end: false,
            pool: self_component.message_pool(),
        }))
    }
}

struct SourceIterator {
    stream: tracecore::ir::instance::Stream,
    event_class: tracecore::ir::class::EventClass,
    remaining: u64,
    sent_beginning: bool,
    sent_end: bool,
    pool: MessagePoolHandle,
}

impl SourceIterator {
    /// Builds `message` through the graph's per-kind pool rather than a
    /// fresh heap allocation: the slot is handed straight back once its
    /// (cheap, Rc-backed) contents are cloned out for the caller, ready
    /// for the next message of the same kind to reuse.
    fn pooled(&self, message: Message) -> Message {
        let slot = self.pool.alloc(message);
        let out = slot.message().clone();
        self.pool.release(slot);
        out
    }
}

impl MessageIteratorMethods for SourceIterator {
    fn next(&mut self, capacity: usize) -> IteratorOutcome {
        if !self.sent_beginning {
            self.sent_beginning = true;
            return IteratorOutcome::Messages(vec![self.pooled(Message::StreamBeginning {
                stream: self.stream.clone(),
                clock_snapshot: None,
            })]);
        }
        if self.remaining == 0 {
            if self.sent_end {
                return IteratorOutcome::End;
            }
            self.sent_end = true;
            return IteratorOutcome::Messages(vec![self.pooled(Message::StreamEnd {
                stream: self.stream.clone(),
                clock_snapshot: None,
            })]);
        }
        let event_pool: std::cell::Ref<'_, EventPool> = self.stream.event_pool();
        let n = capacity.min(self.remaining as usize).max(1);
        let mut messages = Vec::with_capacity(n);
        for _ in 0..n {
            if self.remaining == 0 {
                break;
            }
            let event = event_pool
                .acquire(self.event_class.clone())
                .expect("event class is frozen by the time instances are acquired");
            let message = Message::Event {
                event: std::rc::Rc::new(event),
                clock_snapshot: None,
            };
            messages.push(self.pooled(message));
            self.remaining -= 1;
        }
        IteratorOutcome::Messages(messages)
    }
}

struct PrintingSink {
    input_port: Option<PortId>,
    iterator: Option<tracecore::iterator::MessageIterator>,
    seen: u64,
}

impl ComponentMethods for PrintingSink {
    fn initialize(&mut self, self_component: &mut SelfComponent, _params: &Value) -> Result<(), tracecore::GraphError> {
        let port = self_component.add_port(PortDirection::Input, "in")?;
        self.input_port = Some(port.id());
        Ok(())
    }

    fn graph_is_configured(&mut self, self_component: &mut SelfComponent) -> Result<(), tracecore::GraphError> {
        let port = self.input_port.expect("input port was added during initialize");
        self.iterator = Some(self_component.create_message_iterator(port)?);
        Ok(())
    }

    fn consume(&mut self, _self_component: &mut SelfComponent) -> Result<ConsumeStatus, tracecore::GraphError> {
        let iterator = self.iterator.as_ref().expect("graph_is_configured runs before the first consume");
        match iterator.next(4) {
            IteratorOutcome::Messages(messages) => {
                for message in &messages {
                    if matches!(message, Message::Event { .. }) {
                        self.seen += 1;
                    }
                    println!("{}", message.kind_name());
                }
                Ok(ConsumeStatus::Ok)
            }
            IteratorOutcome::Again => Ok(ConsumeStatus::Again),
            IteratorOutcome::End => {
                println!("done, saw {} events", self.seen);
                Ok(ConsumeStatus::End)
            }
            IteratorOutcome::Error => Err(tracecore::GraphError::InvalidObject("upstream iterator failed".into())),
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let graph = Graph::new();
    let source = graph
        .add_component(ComponentKind::Source, "counting_source", "source", Box::new(CountingSource { event_count: 10 }), &Value::Null)
        .expect("adding the source succeeds");
    let sink = graph
        .add_component(
            ComponentKind::Sink,
            "printing_sink",
            "sink",
            Box::new(PrintingSink {
                input_port: None,
                iterator: None,
                seen: 0,
            }),
            &Value::Null,
        )
        .expect("adding the sink succeeds");

    let output = source.output_ports().remove(0);
    let input = sink.input_ports().remove(0);
    graph.connect_ports(output.id(), input.id()).expect("connecting source to sink succeeds");

    match graph.run() {
        tracecore::RunStatus::End => println!("graph finished"),
        other => eprintln!("graph ended unexpectedly: {other:?}"),
    }
}
