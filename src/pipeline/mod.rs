//! Processing pipeline: state machine, record store, and attempt runner

pub mod record;
pub mod runner;
pub mod store;

pub use record::{ProcessingRecord, Status};
pub use runner::Pipeline;
pub use store::{MemoryStore, RecordStore};
