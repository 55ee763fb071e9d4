//! Period-by-period balance stepping shared by every simulator.
//!
//! A balance moves through a sequence of periods. Each period has a
//! contribution and a withdrawal request; interest accrues at a fixed
//! periodic rate either after the flows (`StartOfPeriod`) or before them
//! (`EndOfPeriod`). Withdrawals are always clamped so the balance never goes
//! negative, and the period in which the balance is exhausted is reported.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::types::{Money, Rate};
use crate::FinCalcResult;

/// When the period's cash flows hit the balance relative to interest accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowTiming {
    /// Flows first, then interest on the post-flow balance.
    StartOfPeriod,
    /// Interest on the opening balance first, then flows.
    EndOfPeriod,
}

/// Requested cash flows for a single period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodFlow {
    pub contribution: Money,
    pub withdrawal: Money,
}

impl PeriodFlow {
    pub fn contribution(amount: Money) -> Self {
        Self {
            contribution: amount,
            withdrawal: Decimal::ZERO,
        }
    }

    pub fn withdrawal(amount: Money) -> Self {
        Self {
            contribution: Decimal::ZERO,
            withdrawal: amount,
        }
    }
}

/// One period of a balance trajectory.
///
/// `closing_balance = opening_balance + contribution - withdrawal + interest`
/// and `closing_balance >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period: u32,
    pub opening_balance: Money,
    pub contribution: Money,
    /// Amount actually withdrawn, after clamping to the available balance.
    pub withdrawal: Money,
    pub interest: Money,
    pub closing_balance: Money,
}

/// Result of stepping one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodStep {
    pub snapshot: PeriodSnapshot,
    /// The withdrawal request consumed everything that was available.
    pub exhausted: bool,
}

/// A full run of the compounder.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub snapshots: Vec<PeriodSnapshot>,
    pub final_balance: Money,
    /// First period whose withdrawal exhausted the balance, if any.
    pub exhausted_at: Option<u32>,
}

impl Trajectory {
    pub fn total_contributed(&self) -> FinCalcResult<Money> {
        checked_total(self.snapshots.iter().map(|s| s.contribution), "total contributions")
    }

    pub fn total_withdrawn(&self) -> FinCalcResult<Money> {
        checked_total(self.snapshots.iter().map(|s| s.withdrawal), "total withdrawals")
    }

    pub fn total_interest(&self) -> FinCalcResult<Money> {
        checked_total(self.snapshots.iter().map(|s| s.interest), "total interest")
    }
}

fn checked_total(mut values: impl Iterator<Item = Money>, context: &str) -> FinCalcResult<Money> {
    values.try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or_else(|| FinCalcError::overflow(context))
    })
}

/// Cap a requested outflow to what is available. Never returns a negative amount.
pub fn clamp_to_balance(requested: Money, available: Money) -> Money {
    requested
        .max(Decimal::ZERO)
        .min(available.max(Decimal::ZERO))
}

/// Steps a balance at a fixed periodic rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicCompounder {
    rate: Rate,
    timing: FlowTiming,
}

impl PeriodicCompounder {
    pub fn new(rate: Rate, timing: FlowTiming) -> Self {
        Self { rate, timing }
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Advance `opening` by one period under `flow`.
    ///
    /// The closing balance is what was available less what was withdrawn, so
    /// a period that exhausts the balance closes at exactly zero.
    pub fn step(&self, period: u32, opening: Money, flow: &PeriodFlow) -> FinCalcResult<PeriodStep> {
        let overflow = || FinCalcError::overflow(&format!("balance in period {period}"));
        let contribution = flow.contribution.max(Decimal::ZERO);

        let (withdrawal, interest, exhausted, closing) = match self.timing {
            FlowTiming::StartOfPeriod => {
                let available = opening.checked_add(contribution).ok_or_else(overflow)?;
                let withdrawal = clamp_to_balance(flow.withdrawal, available);
                let exhausted = flow.withdrawal > Decimal::ZERO && flow.withdrawal >= available;
                let invested = available - withdrawal;
                let interest = invested.checked_mul(self.rate).ok_or_else(overflow)?;
                let closing = invested.checked_add(interest).ok_or_else(overflow)?;
                (withdrawal, interest, exhausted, closing)
            }
            FlowTiming::EndOfPeriod => {
                let interest = opening.checked_mul(self.rate).ok_or_else(overflow)?;
                let available = opening
                    .checked_add(interest)
                    .and_then(|b| b.checked_add(contribution))
                    .ok_or_else(overflow)?;
                let withdrawal = clamp_to_balance(flow.withdrawal, available);
                let exhausted = flow.withdrawal > Decimal::ZERO && flow.withdrawal >= available;
                (withdrawal, interest, exhausted, available - withdrawal)
            }
        };

        Ok(PeriodStep {
            snapshot: PeriodSnapshot {
                period,
                opening_balance: opening,
                contribution,
                withdrawal,
                interest,
                closing_balance: closing.max(Decimal::ZERO),
            },
            exhausted,
        })
    }

    /// Fold `periods` steps starting from `opening`.
    ///
    /// `schedule` supplies the flow for each 1-indexed period. `stop` is checked
    /// after every period; returning true ends the run early. A run also ends
    /// as soon as a withdrawal exhausts the balance. A balance that outgrows
    /// `Decimal` is an error rather than a panic.
    pub fn run<F, S>(
        &self,
        opening: Money,
        periods: u32,
        mut schedule: F,
        mut stop: S,
    ) -> FinCalcResult<Trajectory>
    where
        F: FnMut(u32) -> PeriodFlow,
        S: FnMut(&PeriodSnapshot) -> bool,
    {
        let mut snapshots = Vec::with_capacity(periods as usize);
        let mut balance = opening;
        let mut exhausted_at = None;

        for period in 1..=periods {
            let step = self.step(period, balance, &schedule(period))?;
            balance = step.snapshot.closing_balance;
            let halt = stop(&step.snapshot);
            snapshots.push(step.snapshot);
            if step.exhausted {
                exhausted_at = Some(period);
                break;
            }
            if halt {
                break;
            }
        }

        Ok(Trajectory {
            snapshots,
            final_balance: balance,
            exhausted_at,
        })
    }
}
