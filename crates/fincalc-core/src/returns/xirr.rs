use chrono::{Duration, Months, NaiveDate};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value;
use crate::types::*;
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XirrInput {
    /// Dated flows in any order. Negative = invested, positive = received.
    pub transactions: Vec<CashFlow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XirrOutput {
    /// Annualised return in percent, `None` when no rate could be solved.
    pub rate_percent: Option<Percent>,
    pub total_invested: Money,
    pub total_received: Money,
    pub net_gain: Money,
    pub transaction_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Interval between regular SIP installments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SipFrequency {
    #[serde(alias = "Bi-Weekly")]
    BiWeekly,
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "Half-Yearly")]
    HalfYearly,
    Yearly,
}

impl SipFrequency {
    /// Date of the `n`th installment (0-indexed) counted from `start`.
    ///
    /// Month steps are anchored on `start` and clamp to the month end, so a
    /// 31st start date does not drift after a short month.
    fn nth_date(&self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        let months = match self {
            SipFrequency::BiWeekly => {
                return start.checked_add_signed(Duration::days(14 * i64::from(n)));
            }
            SipFrequency::Monthly => n,
            SipFrequency::Quarterly => n.checked_mul(3)?,
            SipFrequency::HalfYearly => n.checked_mul(6)?,
            SipFrequency::Yearly => n.checked_mul(12)?,
        };
        start.checked_add_months(Months::new(months))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipTransactionsInput {
    pub amount: Money,
    #[serde(default)]
    pub frequency: SipFrequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Market value of the holding on `end_date`.
    pub current_value: Money,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// XIRR of `flows` in percent, or `None` when there are fewer than two flows
/// or the solver finds no rate.
pub fn xirr_percent(flows: &[CashFlow]) -> Option<Percent> {
    if flows.len() < 2 {
        return None;
    }
    match time_value::xirr(flows) {
        Ok(rate) => Some(rate * Decimal::ONE_HUNDRED),
        Err(e) => {
            warn!("xirr: no solution for {} flows: {e}", flows.len());
            None
        }
    }
}

/// Solve the annualised return of an irregular series of dated flows.
///
/// An unsolvable series is not an error: `rate_percent` is `None` and the
/// reason is reported in the warnings.
pub fn solve_xirr(input: &XirrInput) -> FinCalcResult<ComputationOutput<XirrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let flows = &input.transactions;
    for (i, flow) in flows.iter().enumerate() {
        if flow.amount.abs() > MAX_AMOUNT {
            return Err(FinCalcError::InvalidInput {
                field: format!("transactions[{i}].amount"),
                reason: format!("Amount must be within +/-{MAX_AMOUNT}"),
            });
        }
    }

    let rate_percent = if flows.len() < 2 {
        warnings.push("XIRR requires at least 2 transactions".into());
        None
    } else {
        match time_value::xirr(flows) {
            Ok(rate) => Some(rate * Decimal::ONE_HUNDRED),
            Err(e) => {
                warn!("xirr: {e}");
                warnings.push(format!("XIRR could not be solved: {e}"));
                None
            }
        }
    };

    let total_invested: Money = flows
        .iter()
        .filter(|f| f.amount < Decimal::ZERO)
        .map(|f| -f.amount)
        .sum();
    let total_received: Money = flows
        .iter()
        .filter(|f| f.amount > Decimal::ZERO)
        .map(|f| f.amount)
        .sum();

    let output = XirrOutput {
        rate_percent,
        total_invested,
        total_received,
        net_gain: total_received - total_invested,
        transaction_count: flows.len(),
        first_date: flows.iter().map(|f| f.date).min(),
        last_date: flows.iter().map(|f| f.date).max(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "XIRR: Newton-Raphson with bisection fallback, actual/365 from earliest flow",
        &serde_json::json!({
            "transactions": flows.len(),
            "day_count": "ACT/365",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Build the flow list of a regular SIP followed by its current value.
///
/// Installments run from `start_date` while the date is on or before
/// `end_date`, so an installment falling on `end_date` itself is included.
/// The last entry is the positive `current_value` on `end_date`. If
/// `start_date` is not before `end_date` only that final entry is returned.
pub fn generate_sip_transactions(input: &SipTransactionsInput) -> FinCalcResult<Vec<CashFlow>> {
    require_positive(input.amount, "amount")?;
    require_non_negative(input.current_value, "current_value")?;

    let redemption = CashFlow {
        date: input.end_date,
        amount: input.current_value,
        label: Some("Current value".into()),
    };

    if input.start_date >= input.end_date {
        return Ok(vec![redemption]);
    }

    let mut transactions = Vec::new();
    for n in 0.. {
        let date = input.frequency.nth_date(input.start_date, n).ok_or_else(|| {
            FinCalcError::DateError(format!(
                "installment {n} after {} is out of range",
                input.start_date
            ))
        })?;
        if date > input.end_date {
            break;
        }
        transactions.push(CashFlow {
            date,
            amount: -input.amount,
            label: Some("SIP installment".into()),
        });
    }
    debug!(
        "generated {} {:?} installments",
        transactions.len(),
        input.frequency
    );

    transactions.push(redemption);
    Ok(transactions)
}
