//! Message model shared by every participant on the broker socket.
//!
//! Each frame on the wire is one JSON object holding an interface tag, a
//! member name, a message kind, addressing metadata, and an ordered list of
//! typed fields. Field layouts per member are fixed; [`FieldReader`] decodes
//! them positionally and reports mismatches as [`ProtocolError`].

mod fields;
mod message;
mod names;

pub use fields::{FieldReader, ProtocolError};
pub use message::{Message, MessageKind, Value};
pub use names::{Interface, member};
