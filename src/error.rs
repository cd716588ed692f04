//! Structured error chaining (spec component K).
//!
//! An append-only per-thread stack of `{component_or_plugin_name, file,
//! line, message}` records. Every point in `graph.rs`/`scheduler.rs`
//! where an error crosses from a component's own callback back into the
//! graph appends a cause, via [`record_error!`], before returning the
//! corresponding [`Status`](crate::status::Status) — matching spec §7's
//! "Graph-level `run` captures the offending component's name." The
//! stack is read by the owner after a failing call and cleared on
//! explicit release.

use crate::status::Status;
use std::cell::RefCell;
use std::fmt;

/// One frame of the error stack.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub component_or_plugin_name: Option<String>,
    pub file: &'static str,
    pub line: u32,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component_or_plugin_name {
            Some(name) => write!(f, "{name}: {} ({}:{})", self.message, self.file, self.line),
            None => write!(f, "{} ({}:{})", self.message, self.file, self.line),
        }
    }
}

thread_local! {
    static ERROR_STACK: RefCell<Vec<ErrorRecord>> = const { RefCell::new(Vec::new()) };
}

/// Appends a cause to the calling thread's error stack.
pub fn append(
    component_or_plugin_name: Option<String>,
    file: &'static str,
    line: u32,
    message: impl Into<String>,
) {
    ERROR_STACK.with(|stack| {
        stack.borrow_mut().push(ErrorRecord {
            component_or_plugin_name,
            file,
            line,
            message: message.into(),
        });
    });
}

/// A snapshot of the calling thread's current error stack, top (most
/// recent cause) first.
pub fn stack() -> Vec<ErrorRecord> {
    ERROR_STACK.with(|stack| {
        let mut frames = stack.borrow().clone();
        frames.reverse();
        frames
    })
}

/// Clears the calling thread's error stack. Called explicitly by the
/// owner once a failure has been observed and reported.
pub fn clear() {
    ERROR_STACK.with(|stack| stack.borrow_mut().clear());
}

/// The taxonomy of true errors (spec §7, items 1-5). `TryAgain`, `End`, and
/// `Canceled` are deliberately not part of this enum: they are successful
/// or cooperative terminations, never errors, and are represented purely
/// as [`Status`]/[`RunStatus`](crate::status::RunStatus) values.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("memory allocation failed")]
    Memory,

    #[error("integer/time conversion overflow")]
    Overflow,

    #[error("invalid object: {0}")]
    InvalidObject(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("plug-in loading or schema validation failed: {0}")]
    Loading(String),

    #[error("component `{component}` returned an error")]
    User {
        component: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl GraphError {
    /// Maps this error to the uniform status code it surfaces as.
    pub fn status(&self) -> Status {
        match self {
            GraphError::Memory => Status::MemoryError,
            GraphError::Overflow => Status::OverflowError,
            GraphError::InvalidObject(_) => Status::UnknownObject,
            GraphError::InvalidParams(_) => Status::UnknownObject,
            GraphError::Loading(_) => Status::Error,
            GraphError::User { .. } => Status::UserError,
        }
    }

    /// Appends this error to the thread-local stack at the given
    /// component/plug-in name and call site, as required by §7
    /// "Propagation". Called through [`record_error!`] so `file`/`line`
    /// are the real call site, not this method's.
    pub fn record_at(self, component_or_plugin_name: impl Into<String>, file: &'static str, line: u32) -> Self {
        append(Some(component_or_plugin_name.into()), file, line, self.to_string());
        self
    }
}

/// Appends `$err` to the error stack at the current call site, tagged
/// with the name of the component or plug-in that raised it, and yields
/// it back for further propagation — the mechanism behind spec §7's
/// "each layer that observes a failure from a deeper layer must append
/// a cause before returning". Used at every point in `graph.rs`/
/// `scheduler.rs` where a component callback's error crosses back into
/// the graph or the scheduler.
macro_rules! record_error {
    ($err:expr, $component:expr) => {
        $crate::error::GraphError::record_at($err, $component, file!(), line!())
    };
}
pub(crate) use record_error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_reads_most_recent_first() {
        clear();
        append(Some("src.a".into()), file!(), 1, "first");
        append(Some("src.b".into()), file!(), 2, "second");
        let frames = stack();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].message, "second");
        assert_eq!(frames[1].message, "first");
        clear();
        assert!(stack().is_empty());
    }

    #[test]
    fn error_kinds_map_to_their_status() {
        assert_eq!(GraphError::Memory.status(), Status::MemoryError);
        assert_eq!(GraphError::Overflow.status(), Status::OverflowError);
        assert_eq!(
            GraphError::InvalidParams("bad".into()).status(),
            Status::UnknownObject
        );
    }
}
