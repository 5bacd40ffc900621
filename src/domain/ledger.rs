use serde::{Deserialize, Serialize};

use super::Delivery;

/// Quantity and payment counts folded from a set of deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTotals {
    pub total_quantity: i64,
    pub delivery_count: i64,
    pub paid_count: i64,
    pub unpaid_count: i64,
    pub unpaid_quantity: i64,
}

impl DeliveryTotals {
    /// Count one more delivery. On overflow `self` is left unchanged.
    pub fn add(&mut self, delivery: &Delivery) -> Result<(), TotalsOverflow> {
        let (paid, unpaid, unpaid_quantity) = if delivery.paid {
            (1, 0, 0)
        } else {
            (0, 1, delivery.quantity)
        };
        *self = self.checked_merge(&DeliveryTotals {
            total_quantity: delivery.quantity,
            delivery_count: 1,
            paid_count: paid,
            unpaid_count: unpaid,
            unpaid_quantity,
        })?;
        Ok(())
    }

    /// Fold `other` in. On overflow `self` is left unchanged.
    pub fn merge(&mut self, other: &DeliveryTotals) -> Result<(), TotalsOverflow> {
        *self = self.checked_merge(other)?;
        Ok(())
    }

    fn checked_merge(&self, other: &DeliveryTotals) -> Result<Self, TotalsOverflow> {
        let sum = |a: i64, b: i64| a.checked_add(b).ok_or(TotalsOverflow);
        Ok(Self {
            total_quantity: sum(self.total_quantity, other.total_quantity)?,
            delivery_count: sum(self.delivery_count, other.delivery_count)?,
            paid_count: sum(self.paid_count, other.paid_count)?,
            unpaid_count: sum(self.unpaid_count, other.unpaid_count)?,
            unpaid_quantity: sum(self.unpaid_quantity, other.unpaid_quantity)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("delivery totals exceed the representable range")]
pub struct TotalsOverflow;

/// Fold deliveries into totals. Every delivery is counted as either paid or
/// unpaid, so `paid_count + unpaid_count == delivery_count`.
pub fn compute_totals<'a>(
    deliveries: impl IntoIterator<Item = &'a Delivery>,
) -> Result<DeliveryTotals, TotalsOverflow> {
    deliveries
        .into_iter()
        .try_fold(DeliveryTotals::default(), |mut totals, delivery| {
            totals.add(delivery)?;
            Ok(totals)
        })
}
