pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod storage;

pub use domain::*;
pub use error::{LedgerError, Result};
pub use storage::{DeliveryStore, PreferenceStore};
