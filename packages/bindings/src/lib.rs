use napi::Result as NapiResult;
use napi_derive::napi;

use fincalc_core::{deposits, investments, loans, returns, scenarios};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize_loan(input_json: String) -> NapiResult<String> {
    let input: loans::amortization::LoanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loans::amortization::amortize_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn balance_transfer(input_json: String) -> NapiResult<String> {
    let input: loans::balance_transfer::BalanceTransferInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loans::balance_transfer::evaluate_balance_transfer(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Deposits
// ---------------------------------------------------------------------------

#[napi]
pub fn recurring_deposit(input_json: String) -> NapiResult<String> {
    let input: deposits::recurring::RdInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deposits::recurring::simulate_rd(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn fixed_deposit(input_json: String) -> NapiResult<String> {
    let input: deposits::fixed::FdInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deposits::fixed::calculate_fd(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn public_provident_fund(input_json: String) -> NapiResult<String> {
    let input: deposits::ppf::PpfInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deposits::ppf::calculate_ppf(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sukanya_samriddhi(input_json: String) -> NapiResult<String> {
    let input: deposits::ssy::SsyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = deposits::ssy::calculate_ssy(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investments
// ---------------------------------------------------------------------------

#[napi]
pub fn goal_sip(input_json: String) -> NapiResult<String> {
    let input: investments::goal::GoalInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = investments::goal::solve_goal_sip(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_sip(input_json: String) -> NapiResult<String> {
    let input: investments::sip::SipInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = investments::sip::project_sip(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn systematic_withdrawal(input_json: String) -> NapiResult<String> {
    let input: investments::withdrawal::SwpInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = investments::withdrawal::simulate_swp(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[napi]
pub fn xirr(input_json: String) -> NapiResult<String> {
    let input: returns::xirr::XirrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = returns::xirr::solve_xirr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Returns a bare JSON array of dated flows, not a computation envelope.
#[napi]
pub fn sip_transactions(input_json: String) -> NapiResult<String> {
    let input: returns::xirr::SipTransactionsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let flows = returns::xirr::generate_sip_transactions(&input).map_err(to_napi_error)?;
    serde_json::to_string(&flows).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn sensitivity_matrix(input_json: String) -> NapiResult<String> {
    let input: scenarios::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scenarios::sensitivity::run_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
