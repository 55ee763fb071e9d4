use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::amortization::emi;
use crate::error::FinCalcError;
use crate::types::*;
use crate::FinCalcResult;

/// How the new lender's processing fee is quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingFeeType {
    /// Percentage of the outstanding principal.
    #[default]
    Percentage,
    /// Fixed currency amount.
    Flat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTransferInput {
    pub outstanding_principal: Money,
    pub existing_rate_percent: Percent,
    pub new_rate_percent: Percent,
    pub remaining_tenure_years: u32,
    #[serde(default)]
    pub processing_fee: Decimal,
    #[serde(default)]
    pub processing_fee_type: ProcessingFeeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceTransferOutput {
    pub old_emi: Money,
    pub new_emi: Money,
    pub total_interest_old: Money,
    pub total_interest_new: Money,
    pub total_amount_old: Money,
    pub total_amount_new: Money,
    pub processing_fee_amount: Money,
    pub monthly_savings: Money,
    /// Reduction in total repayment, net of the processing fee.
    pub net_savings: Money,
    /// Months of EMI savings needed to recover the fee. `None` if the new EMI is not lower.
    pub break_even_months: Option<u32>,
    pub is_profitable: bool,
}

/// Compare keeping a loan with moving the outstanding balance to a cheaper lender.
pub fn evaluate_balance_transfer(
    input: &BalanceTransferInput,
) -> FinCalcResult<ComputationOutput<BalanceTransferOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_positive(input.outstanding_principal, "outstanding_principal")?;
    RateSchedule::monthly(input.existing_rate_percent).validate("existing_rate_percent")?;
    RateSchedule::monthly(input.new_rate_percent).validate("new_rate_percent")?;
    require_years(input.remaining_tenure_years, "remaining_tenure_years")?;
    require_non_negative(input.processing_fee, "processing_fee")?;
    if input.processing_fee_type == ProcessingFeeType::Percentage
        && input.processing_fee > Decimal::ONE_HUNDRED
    {
        return Err(FinCalcError::invalid(
            "processing_fee",
            "Percentage fee must be <= 100",
        ));
    }

    let months = input.remaining_tenure_years * 12;
    let n = Decimal::from(months);
    let principal = input.outstanding_principal;

    let old_emi = emi(
        principal,
        RateSchedule::monthly(input.existing_rate_percent).periodic_rate(),
        months,
    )?;
    let new_emi = emi(
        principal,
        RateSchedule::monthly(input.new_rate_percent).periodic_rate(),
        months,
    )?;

    let total_amount_old = old_emi * n;
    let total_amount_new = new_emi * n;

    let processing_fee_amount = match input.processing_fee_type {
        ProcessingFeeType::Percentage => principal * input.processing_fee / dec!(100),
        ProcessingFeeType::Flat => input.processing_fee,
    };

    let net_savings = total_amount_old - total_amount_new - processing_fee_amount;
    let monthly_savings = old_emi - new_emi;

    let break_even_months = if monthly_savings > Decimal::ZERO {
        (processing_fee_amount / monthly_savings).ceil().to_u32()
    } else {
        warnings.push("New EMI is not lower than the existing EMI; the fee is never recovered".into());
        None
    };

    if let Some(m) = break_even_months {
        if m > months {
            warnings.push(format!(
                "Break-even after {m} months exceeds the remaining tenure of {months} months"
            ));
        }
    }

    let output = BalanceTransferOutput {
        old_emi,
        new_emi,
        total_interest_old: total_amount_old - principal,
        total_interest_new: total_amount_new - principal,
        total_amount_old,
        total_amount_new,
        processing_fee_amount,
        monthly_savings,
        net_savings,
        break_even_months,
        is_profitable: net_savings > Decimal::ZERO,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan balance transfer: EMI comparison over remaining tenure net of processing fee",
        &serde_json::json!({
            "outstanding_principal": principal.to_string(),
            "existing_rate_percent": input.existing_rate_percent.to_string(),
            "new_rate_percent": input.new_rate_percent.to_string(),
            "remaining_tenure_years": input.remaining_tenure_years,
            "processing_fee_type": input.processing_fee_type,
        }),
        warnings,
        elapsed,
        output,
    ))
}
