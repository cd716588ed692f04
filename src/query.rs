//! Out-of-band component-class queries (spec §6 "Query protocol",
//! component J).

use crate::component::ComponentClass;
use crate::error::GraphError;
use crate::status::Status;
use crate::value::Value;

/// The handle a component class's `query` method receives; currently a
/// thin marker, kept as its own type so a future cancellation/logging
/// context can be threaded through without changing every `query`
/// signature in the registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryExecutor {
    canceled: bool,
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn cancel(&mut self) {
        self.canceled = true;
    }
}

/// Runs `class`'s `query` method for `object` with `params`, translating
/// its result into the uniform status contract (spec §6): **OK** with a
/// `Value`, **AGAIN**, **UNKNOWN_OBJECT**, **INVALID_PARAMS**, or
/// **ERROR**.
pub fn execute_query(
    class: &ComponentClass,
    methods: &dyn crate::component::ComponentMethods,
    executor: &QueryExecutor,
    object: &str,
    params: &Value,
) -> Result<Value, GraphError> {
    if executor.is_canceled() {
        return Err(GraphError::InvalidObject("query executor was canceled".into()));
    }
    methods.query(class, executor, object, params)
}

/// Maps a query result to the fixed status code a caller across an FFI
/// or plug-in boundary would see (spec §6), via [`GraphError::status`].
pub fn query_status(result: &Result<Value, GraphError>) -> Status {
    match result {
        Ok(_) => Status::Ok,
        Err(err) => err.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentMethods};

    struct Answering;
    impl ComponentMethods for Answering {
        fn query(
            &self,
            _class: &ComponentClass,
            _executor: &QueryExecutor,
            object: &str,
            _params: &Value,
        ) -> Result<Value, GraphError> {
            match object {
                "supported-clock-classes" => Ok(Value::Array(Default::default())),
                _ => Err(GraphError::InvalidParams(format!("unknown object {object}"))),
            }
        }
    }

    struct Quiet;
    impl ComponentMethods for Quiet {}

    fn a_class() -> ComponentClass {
        ComponentClass {
            kind: ComponentKind::Source,
            name: "src".into(),
            description: None,
            help: None,
        }
    }

    #[test]
    fn unrecognized_query_object_on_the_default_method_is_an_error_status() {
        let result = execute_query(&a_class(), &Quiet, &QueryExecutor::new(), "anything", &Value::Null);
        assert!(result.is_err());
        assert_ne!(query_status(&result), Status::Ok);
    }

    #[test]
    fn a_recognized_object_returns_ok() {
        let result = execute_query(
            &a_class(),
            &Answering,
            &QueryExecutor::new(),
            "supported-clock-classes",
            &Value::Null,
        );
        assert_eq!(query_status(&result), Status::Ok);
    }

    #[test]
    fn a_canceled_executor_short_circuits() {
        let mut executor = QueryExecutor::new();
        executor.cancel();
        let result = execute_query(&a_class(), &Answering, &executor, "supported-clock-classes", &Value::Null);
        assert!(result.is_err());
    }
}
