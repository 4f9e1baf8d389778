//! Passive routing state owned by the dispatcher.
//!
//! None of these stores talks to the transport or logs protocol decisions;
//! they only answer lookups and apply the mutations the dispatcher asks for.

mod channels;
mod correlation;
mod sources;

pub use channels::{ChannelCategory, ChannelRegistry};
pub use correlation::{AccessId, AccessIdGenerator, CorrelationRegistry, Exchange, JoinContext};
pub use sources::{AccessSource, SourceDirectory};
