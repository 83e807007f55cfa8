//! Flat key/value metadata namespace and its codec
//!
//! The embedded metadata store can only carry scalar key/value pairs, so
//! repeated resume sections use a counted-block encoding
//! (`experience_count`, `experience_0_company`, ...). This module owns the
//! key scheme and the bidirectional transform to `StructuredResume`.

pub mod codec;
pub mod key;

pub use key::{FlatKey, FlatRecord, FlatValue};
