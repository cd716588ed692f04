//! Trace IR — classes: the schema layer (spec component C).

pub mod event_class;
pub mod field_class;
pub mod stream_class;
pub mod trace_class;

pub use event_class::{EventClass, LogLevel};
pub use field_class::{
    DisplayBase, DynamicArrayFieldClass, FieldClass, FieldPath, IntegerFieldClass, IntegerRange,
    MappingLabels, OptionFieldClass, RealPrecision, ScopeRoot, Signedness, StaticArrayFieldClass,
    StructureFieldClass, StructureMember, VariantFieldClass, VariantOption,
};
pub use stream_class::{StreamClass, StreamClassPolicy};
pub use trace_class::{ByteOrder, EnvironmentValue, TraceClass};
