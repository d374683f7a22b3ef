//! Event-stream adapter over the XML tokenizer.
//!
//! Everything downstream consumes [`SpannedEvent`]s and never touches the
//! tokenizer directly.

mod events;
mod stream;

#[cfg(test)]
mod tests;

pub use events::{Attribute, SpannedEvent, XmlEvent};
pub use stream::{split_qname, EventReader};
