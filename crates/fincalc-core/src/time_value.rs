use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FinCalcError;
use crate::types::{CashFlow, Money, Rate};
use crate::FinCalcResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const RATE_TOLERANCE: Decimal = dec!(0.000000000001);
const MAX_XIRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const XIRR_GUESS: Rate = dec!(0.1);
const RATE_FLOOR: Rate = dec!(-0.999999);
const RATE_CAP: Rate = dec!(10);
const DAYS_PER_YEAR: Decimal = dec!(365);

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn compound(rate: Rate, n: u32) -> FinCalcResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| FinCalcError::overflow(&format!("(1 + {rate})^{n}")))?;
    }
    Ok(result)
}

/// Compute base^(numerator / denominator).
///
/// Whole multiples of the denominator are multiplied out exactly; only the
/// remaining fraction goes through `powd`.
pub fn fractional_compound(base: Decimal, numerator: u32, denominator: u32) -> FinCalcResult<Decimal> {
    if denominator == 0 {
        return Err(FinCalcError::DivisionByZero {
            context: "fractional compounding exponent".into(),
        });
    }
    if base == Decimal::ONE {
        return Ok(Decimal::ONE);
    }
    let whole = compound(base - Decimal::ONE, numerator / denominator)?;
    let remainder = numerator % denominator;
    if remainder == 0 {
        return Ok(whole);
    }
    let exponent = Decimal::from(remainder) / Decimal::from(denominator);
    whole
        .checked_mul(base.checked_powd(exponent).ok_or_else(|| {
            FinCalcError::FinancialImpossibility(format!("{base}^{exponent} is not representable"))
        })?)
        .ok_or_else(|| FinCalcError::overflow(&format!("{base}^({numerator}/{denominator})")))
}

/// Level payment that amortises `principal` over `periods` at `rate` per period.
///
/// `P·r·(1+r)^n / ((1+r)^n − 1)`, or `P / n` when the rate is zero.
pub fn level_payment(principal: Money, rate: Rate, periods: u32) -> FinCalcResult<Money> {
    if periods == 0 {
        return Err(FinCalcError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = compound(rate, periods)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|x| x.checked_mul(factor))
        .and_then(|x| x.checked_div(denominator))
        .ok_or_else(|| FinCalcError::overflow("level payment"))
}

/// Years between `base` and `date` on an actual/365 basis.
fn year_fraction(base: NaiveDate, date: NaiveDate) -> Decimal {
    Decimal::from((date - base).num_days()) / DAYS_PER_YEAR
}

/// NPV of dated flows and its derivative with respect to the rate.
///
/// Returns `None` when any term cannot be represented
/// (rate too close to -100% or horizon too long for the rate).
fn xnpv_and_derivative(flows: &[CashFlow], base: NaiveDate, rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    for flow in flows {
        let years = year_fraction(base, flow.date);
        let discount = if rate.is_zero() {
            Decimal::ONE
        } else {
            one_plus_r.checked_powd(years)?
        };
        if discount.is_zero() {
            return None;
        }
        let pv = flow.amount.checked_div(discount)?;
        npv = npv.checked_add(pv)?;
        dnpv = dnpv.checked_sub(years.checked_mul(pv)?.checked_div(one_plus_r)?)?;
    }
    Some((npv, dnpv))
}

/// Extended IRR for irregular cash flow dates.
///
/// Newton-Raphson from a 10% guess, falling back to bisection on
/// [-99.9999%, 1000%] when Newton stalls. Flows need not be sorted; the
/// earliest date is the valuation base.
pub fn xirr(flows: &[CashFlow]) -> FinCalcResult<Rate> {
    if flows.len() < 2 {
        return Err(FinCalcError::InsufficientData(
            "XIRR requires at least 2 cash flows".into(),
        ));
    }
    let has_negative = flows.iter().any(|f| f.amount < Decimal::ZERO);
    let has_positive = flows.iter().any(|f| f.amount > Decimal::ZERO);
    if !has_negative || !has_positive {
        return Err(FinCalcError::FinancialImpossibility(
            "XIRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    let base = flows.iter().map(|f| f.date).min().unwrap_or(flows[0].date);
    let mut rate = XIRR_GUESS;

    for i in 0..MAX_XIRR_ITERATIONS {
        let Some((npv_val, dnpv)) = xnpv_and_derivative(flows, base, rate) else {
            debug!("xirr: discount factor overflow at rate {rate}, switching to bisection");
            break;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            debug!("xirr: newton converged after {i} iterations");
            return Ok(rate);
        }
        if dnpv.is_zero() {
            break;
        }

        let Some(next) = npv_val.checked_div(dnpv).and_then(|d| rate.checked_sub(d)) else {
            break;
        };
        let next = next.clamp(RATE_FLOOR, RATE_CAP);
        if next == rate && (next == RATE_FLOOR || next == RATE_CAP) {
            debug!("xirr: newton pinned at {next}, switching to bisection");
            break;
        }
        if (next - rate).abs() < RATE_TOLERANCE {
            debug!("xirr: newton step stalled after {i} iterations");
            return Ok(next);
        }
        rate = next;
    }

    xirr_bisection(flows, base)
}

/// Bisection fallback. Endpoints that cannot be evaluated are pulled
/// towards zero until they can.
fn xirr_bisection(flows: &[CashFlow], base: NaiveDate) -> FinCalcResult<Rate> {
    let npv_at = |r: Rate| xnpv_and_derivative(flows, base, r).map(|(npv, _)| npv);

    let mut low = RATE_FLOOR;
    let mut npv_low = npv_at(low);
    while npv_low.is_none() && low < dec!(-0.0001) {
        low /= dec!(2);
        npv_low = npv_at(low);
    }
    let mut high = RATE_CAP;
    let mut npv_high = npv_at(high);
    while npv_high.is_none() && high > dec!(0.0001) {
        high /= dec!(2);
        npv_high = npv_at(high);
    }

    let (Some(mut npv_low), Some(npv_high)) = (npv_low, npv_high) else {
        return Err(FinCalcError::ConvergenceFailure {
            function: "XIRR".into(),
            iterations: 0,
            last_delta: Decimal::ZERO,
        });
    };
    if npv_low.is_sign_negative() == npv_high.is_sign_negative() {
        return Err(FinCalcError::ConvergenceFailure {
            function: "XIRR".into(),
            iterations: 0,
            last_delta: npv_low,
        });
    }

    let mut last_delta = npv_low;
    for i in 0..MAX_BISECTION_ITERATIONS {
        let mid = (low + high) / dec!(2);
        let Some(npv_mid) = npv_at(mid) else {
            break;
        };
        last_delta = npv_mid;
        if npv_mid.abs() < CONVERGENCE_THRESHOLD || (high - low) / dec!(2) < RATE_TOLERANCE {
            debug!("xirr: bisection converged after {i} iterations");
            return Ok(mid);
        }
        if npv_mid.is_sign_negative() == npv_low.is_sign_negative() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }

    Err(FinCalcError::ConvergenceFailure {
        function: "XIRR".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(y: i32, m: u32, d: u32, amount: Decimal) -> CashFlow {
        CashFlow {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            amount,
            label: None,
        }
    }

    #[test]
    fn test_compound_basic() {
        assert_eq!(compound(dec!(0.1), 2).unwrap(), dec!(1.21));
        assert_eq!(compound(dec!(0.1), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_compound_overflow_is_an_error() {
        // 11^30 is far beyond 7.9e28
        match compound(dec!(10), 30) {
            Err(FinCalcError::FinancialImpossibility(_)) => {}
            other => panic!("Expected FinancialImpossibility, got {other:?}"),
        }
        assert!(fractional_compound(dec!(1.25), 1200, 3).is_err());
        assert!(level_payment(dec!(1_000_000), dec!(1) / dec!(12), 1200).is_err());
    }

    #[test]
    fn test_fractional_compound_whole_quarters_exact() {
        // 6 months = 2 quarters, no powd involved
        let f = fractional_compound(dec!(1.0175), 6, 3).unwrap();
        assert_eq!(f, dec!(1.0175) * dec!(1.0175));
    }

    #[test]
    fn test_fractional_compound_partial() {
        // 1.0175^(1/3) cubed should round-trip to 1.0175
        let f = fractional_compound(dec!(1.0175), 1, 3).unwrap();
        assert!((f * f * f - dec!(1.0175)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_level_payment_zero_rate() {
        let pmt = level_payment(dec!(120000), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(10000));
    }

    #[test]
    fn test_level_payment_known_emi() {
        // 10L at 10% p.a. for 10 years: EMI ~13,215
        let pmt = level_payment(dec!(1000000), dec!(10) / dec!(1200), 120).unwrap();
        assert!((pmt - dec!(13215.07)).abs() < dec!(0.5), "got {pmt}");
    }

    #[test]
    fn test_level_payment_zero_periods_rejected() {
        assert!(level_payment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_xirr_one_year_ten_percent() {
        let flows = vec![
            flow(2023, 1, 1, dec!(-1000)),
            flow(2024, 1, 1, dec!(1100)),
        ];
        let r = xirr(&flows).unwrap();
        assert!((r - dec!(0.10)).abs() < dec!(0.0001), "got {r}");
    }

    #[test]
    fn test_xirr_unsorted_input() {
        let flows = vec![
            flow(2024, 1, 1, dec!(1100)),
            flow(2023, 1, 1, dec!(-1000)),
        ];
        let r = xirr(&flows).unwrap();
        assert!((r - dec!(0.10)).abs() < dec!(0.0001), "got {r}");
    }

    #[test]
    fn test_xirr_same_sign_rejected() {
        let flows = vec![
            flow(2023, 1, 1, dec!(-1000)),
            flow(2024, 1, 1, dec!(-1100)),
        ];
        assert!(xirr(&flows).is_err());
    }

    #[test]
    fn test_xirr_negative_return() {
        let flows = vec![
            flow(2023, 1, 1, dec!(-1000)),
            flow(2024, 1, 1, dec!(800)),
        ];
        let r = xirr(&flows).unwrap();
        assert!((r - dec!(-0.20)).abs() < dec!(0.0001), "got {r}");
    }

    #[test]
    fn test_npv_at_zero_rate_is_sum() {
        let flows = vec![
            flow(2023, 1, 1, dec!(-100)),
            flow(2023, 6, 1, dec!(50)),
            flow(2024, 1, 1, dec!(70)),
        ];
        let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let (npv, _) = xnpv_and_derivative(&flows, base, Decimal::ZERO).unwrap();
        assert_eq!(npv, dec!(20));
    }

    #[test]
    fn test_npv_overflow_is_none() {
        let flows = vec![
            flow(2000, 1, 1, dec!(-1)),
            flow(2050, 1, 1, dec!(50_000_000_000_000_000_000_000_000)),
        ];
        let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(xnpv_and_derivative(&flows, base, dec!(-0.999)), None);
    }

    #[test]
    fn test_xirr_total_loss_below_minus_99_percent() {
        // 5 back on 1000 after exactly a year: -99.5%
        let flows = vec![
            flow(2023, 1, 1, dec!(-1000)),
            flow(2024, 1, 1, dec!(5)),
        ];
        let r = xirr(&flows).unwrap();
        assert!((r - dec!(-0.995)).abs() < dec!(0.0001), "got {r}");
    }
}
