use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, DeliveryTotals, Rate, YearMonth};

/// Aggregate view of the deliveries in a period.
///
/// Costs are derived from the rate in effect when the summary was built;
/// nothing is rounded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub rate: f64,
    pub total_quantity: i64,
    pub total_cost: f64,
    pub delivery_count: i64,
    pub paid_count: i64,
    pub unpaid_count: i64,
    pub unpaid_quantity: i64,
    pub outstanding_cost: f64,
}

impl Summary {
    pub fn new(range: DateRange, totals: DeliveryTotals, rate: Rate) -> Self {
        Self {
            period_start: range.start,
            period_end: range.end,
            rate: rate.value(),
            total_quantity: totals.total_quantity,
            total_cost: rate.cost_of(totals.total_quantity),
            delivery_count: totals.delivery_count,
            paid_count: totals.paid_count,
            unpaid_count: totals.unpaid_count,
            unpaid_quantity: totals.unpaid_quantity,
            outstanding_cost: rate.cost_of(totals.unpaid_quantity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.delivery_count == 0
    }
}

/// One month's line in a yearly breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    pub summary: Summary,
}

impl MonthlySummary {
    pub fn new(month: YearMonth, summary: Summary) -> Self {
        Self {
            month: month.to_string(),
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: i32,
    pub months: Vec<MonthlySummary>,
    pub total: Summary,
}
