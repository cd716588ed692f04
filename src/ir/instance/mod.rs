//! Trace IR — instances: the runtime layer (spec component D).

pub mod event;
pub mod field;
pub mod packet;
pub mod stream;
pub mod trace;

pub use event::{Event, EventPool};
pub use field::{create_field, Field, FieldTypeError};
pub use packet::Packet;
pub use stream::Stream;
pub use trace::{DestructionListener, Trace};
