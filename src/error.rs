use thiserror::Error;

use crate::domain::{
    DeliveryId, DeliveryValidationError, ParseYearMonthError, RateError, TotalsOverflow,
};

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Rejected before anything was written.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Delivery not found: {0}")]
    NotFound(DeliveryId),

    #[error("Storage failure: {0:#}")]
    StorageFailure(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidInput(message.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, LedgerError::InvalidInput(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

impl From<DeliveryValidationError> for LedgerError {
    fn from(err: DeliveryValidationError) -> Self {
        LedgerError::InvalidInput(err.to_string())
    }
}

impl From<RateError> for LedgerError {
    fn from(err: RateError) -> Self {
        LedgerError::InvalidInput(err.to_string())
    }
}

impl From<ParseYearMonthError> for LedgerError {
    fn from(err: ParseYearMonthError) -> Self {
        LedgerError::InvalidInput(err.to_string())
    }
}

impl From<TotalsOverflow> for LedgerError {
    fn from(err: TotalsOverflow) -> Self {
        LedgerError::InvalidInput(format!("{}; summarize a shorter period", err))
    }
}
