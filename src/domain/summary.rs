use crate::domain::payment::Payment;
use crate::domain::processor::ProcessorName;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_requests: u64,
    pub total_amount: Decimal,
}

impl PaymentSummary {
    pub fn of(total_requests: u64, total_amount: Decimal) -> PaymentSummary {
        PaymentSummary {
            total_requests,
            total_amount: rounded(total_amount),
        }
    }

    pub fn zero() -> PaymentSummary {
        PaymentSummary::of(0, Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsSummary {
    pub default: PaymentSummary,
    pub fallback: PaymentSummary,
}

/// Aggregates payments whose `created_at` falls within `[from, to]`
/// (inclusive; an absent bound leaves that side open), grouped by processor.
/// Rounding is applied once per aggregate, not per payment.
pub fn summarize(
    payments: impl IntoIterator<Item = Payment>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> PaymentsSummary {
    let mut default_count = 0u64;
    let mut default_amount = Decimal::ZERO;
    let mut fallback_count = 0u64;
    let mut fallback_amount = Decimal::ZERO;

    for payment in payments {
        if !within(payment.created_at, from, to) {
            continue;
        }
        match payment.processed_by {
            ProcessorName::Default => {
                default_count += 1;
                default_amount += payment.amount;
            }
            ProcessorName::Fallback => {
                fallback_count += 1;
                fallback_amount += payment.amount;
            }
        }
    }

    PaymentsSummary {
        default: PaymentSummary::of(default_count, default_amount),
        fallback: PaymentSummary::of(fallback_count, fallback_amount),
    }
}

fn within(
    created_at: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|from| created_at >= from) && to.is_none_or(|to| created_at <= to)
}

fn rounded(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointTowardZero)
}
