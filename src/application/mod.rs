// Application layer - use cases on top of the two stores.

pub mod reporting;
pub mod service;

pub use crate::error::{LedgerError, Result};
pub use reporting::*;
pub use service::*;
