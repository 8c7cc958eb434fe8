//! The import engine: column reconciliation, value sanitizing and the
//! session that drives rows from the parser into a record store

pub mod reconcile;
pub mod record;
pub mod sanitize;
pub mod session;
pub mod stats;
pub mod store;

pub use reconcile::{Reconciliation, reconcile};
pub use record::{FieldCountMismatch, ImportRecord, WorkingSchema};
pub use session::{ImportSession, SessionResult, SessionStatus};
pub use stats::{ImportOutcome, ImportStats, Message, Severity};
pub use store::{RecordStore, SchemaProvider, StaticSchema};
