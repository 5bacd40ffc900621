use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a delivery. Never reused after deletion.
pub type DeliveryId = i64;

/// Largest quantity a single delivery may carry. Keeps period sums far
/// away from `i64` overflow.
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

/// Dates are persisted as whole milliseconds since the epoch.
pub fn to_storage_precision(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(3)
}

/// A delivery that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDelivery {
    pub date: DateTime<Utc>,
    pub quantity: i64,
    pub paid: bool,
}

impl NewDelivery {
    /// `date` is truncated to the millisecond, the precision it is stored at.
    pub fn new(date: DateTime<Utc>, quantity: i64) -> Self {
        Self {
            date: to_storage_precision(date),
            quantity,
            paid: false,
        }
    }

    pub fn with_paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    pub fn validate(&self) -> Result<(), DeliveryValidationError> {
        validate_quantity(self.quantity)
    }
}

/// A persisted delivery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub date: DateTime<Utc>,
    pub quantity: i64,
    pub paid: bool,
}

impl Delivery {
    pub fn from_new(id: DeliveryId, new: NewDelivery) -> Self {
        Self {
            id,
            date: to_storage_precision(new.date),
            quantity: new.quantity,
            paid: new.paid,
        }
    }

    /// Returns a copy with `paid` replaced; `date` and `quantity` are kept.
    pub fn with_paid(&self, paid: bool) -> Self {
        Self {
            paid,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), DeliveryValidationError> {
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: i64) -> Result<(), DeliveryValidationError> {
    if quantity < 1 {
        return Err(DeliveryValidationError::NonPositiveQuantity(quantity));
    }
    if quantity > MAX_QUANTITY {
        return Err(DeliveryValidationError::QuantityTooLarge(quantity));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryValidationError {
    #[error("quantity must be at least 1, got {0}")]
    NonPositiveQuantity(i64),
    #[error("quantity must be at most {max}, got {0}", max = MAX_QUANTITY)]
    QuantityTooLarge(i64),
}
