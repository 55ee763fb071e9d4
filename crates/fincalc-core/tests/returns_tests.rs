use chrono::NaiveDate;
use fincalc_core::returns::xirr::{
    generate_sip_transactions, solve_xirr, xirr_percent, SipFrequency, SipTransactionsInput,
    XirrInput,
};
use fincalc_core::types::CashFlow;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn flow(y: i32, m: u32, d: u32, amount: Decimal) -> CashFlow {
    CashFlow {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        amount,
        label: None,
    }
}

// ===========================================================================
// XIRR
// ===========================================================================

#[test]
fn test_xirr_round_trip_one_year() {
    let flows = vec![flow(2023, 1, 1, dec!(-1000)), flow(2024, 1, 1, dec!(1100))];
    let rate = xirr_percent(&flows).unwrap();
    assert!(
        (rate - dec!(10)).abs() <= dec!(0.1),
        "Expected ~10%, got {}",
        rate
    );
}

#[test]
fn test_xirr_insufficient() {
    assert_eq!(xirr_percent(&[flow(2023, 1, 1, dec!(-1000))]), None);
    let result = solve_xirr(&XirrInput {
        transactions: vec![],
    })
    .unwrap();
    assert_eq!(result.result.rate_percent, None);
    assert_eq!(result.result.transaction_count, 0);
}

#[test]
fn test_xirr_order_independent() {
    let sorted = vec![
        flow(2022, 3, 15, dec!(-20000)),
        flow(2022, 9, 1, dec!(-15000)),
        flow(2023, 4, 10, dec!(5000)),
        flow(2024, 6, 30, dec!(38000)),
    ];
    let mut shuffled = sorted.clone();
    shuffled.reverse();
    let a = xirr_percent(&sorted).unwrap();
    let b = xirr_percent(&shuffled).unwrap();
    assert!((a - b).abs() < dec!(0.0001), "{a} vs {b}");
}

#[test]
fn test_xirr_loss() {
    let flows = vec![flow(2023, 1, 1, dec!(-1000)), flow(2024, 1, 1, dec!(800))];
    let rate = xirr_percent(&flows).unwrap();
    assert!((rate - dec!(-20)).abs() < dec!(0.1), "got {rate}");
}

#[test]
fn test_xirr_all_inflows_is_none() {
    let flows = vec![flow(2023, 1, 1, dec!(1000)), flow(2024, 1, 1, dec!(1100))];
    assert_eq!(xirr_percent(&flows), None);
}

// ===========================================================================
// SIP transaction generator
// ===========================================================================

#[test]
fn test_generated_sip_inclusive_end() {
    let txs = generate_sip_transactions(&SipTransactionsInput {
        amount: dec!(5000),
        frequency: SipFrequency::Monthly,
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        current_value: dec!(65000),
    })
    .unwrap();
    assert_eq!(txs.len(), 14);
    assert_eq!(txs.iter().filter(|t| t.amount < Decimal::ZERO).count(), 13);
}

#[test]
fn test_generated_sip_yearly_and_half_yearly() {
    let base = SipTransactionsInput {
        amount: dec!(12000),
        frequency: SipFrequency::Yearly,
        start_date: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 5, 31).unwrap(),
        current_value: dec!(45000),
    };
    let yearly = generate_sip_transactions(&base).unwrap();
    assert_eq!(yearly.len(), 4);

    let half = generate_sip_transactions(&SipTransactionsInput {
        frequency: SipFrequency::HalfYearly,
        ..base
    })
    .unwrap();
    assert_eq!(half.len(), 7);
}

#[test]
fn test_generated_sip_xirr_positive() {
    // 12 monthly installments of 10k, worth 1.3L on the last one
    let txs = generate_sip_transactions(&SipTransactionsInput {
        amount: dec!(10000),
        frequency: SipFrequency::Monthly,
        start_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 12, 20).unwrap(),
        current_value: dec!(130000),
    })
    .unwrap();
    let result = solve_xirr(&XirrInput { transactions: txs }).unwrap();
    let out = &result.result;
    assert_eq!(out.total_invested, dec!(120000));
    let rate = out.rate_percent.unwrap();
    assert!(rate > dec!(10) && rate < dec!(30), "got {rate}");
}

#[test]
fn test_solve_xirr_idempotent() {
    let input = XirrInput {
        transactions: vec![
            flow(2021, 1, 1, dec!(-50000)),
            flow(2021, 7, 1, dec!(-25000)),
            flow(2023, 12, 31, dec!(98000)),
        ],
    };
    let a = solve_xirr(&input).unwrap();
    let b = solve_xirr(&input).unwrap();
    assert_eq!(a.result, b.result);
}
