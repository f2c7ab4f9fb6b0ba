//! Shared data types: sync outcomes and the error taxonomy.

pub mod error;
pub mod report;

pub use error::{ParseCause, Side, SyncError};
pub use report::{SyncOutcome, SyncReport};
