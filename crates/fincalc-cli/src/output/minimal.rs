use serde_json::Value;

use super::{cell, result_body};

/// Headline figure of each calculator, checked in order.
const HEADLINE_KEYS: [&str; 9] = [
    "monthly_emi",
    "net_savings",
    "maturity_amount",
    "maturity_corpus",
    "monthly_sip",
    "total_value",
    "final_value",
    "rate_percent",
    "base_case_value",
];

/// Print only the headline number of a result.
///
/// Generated transaction lists print one `date,amount` line per flow.
pub fn print_minimal(value: &Value) {
    let body = result_body(value);

    match body {
        Value::Object(map) => {
            for key in HEADLINE_KEYS {
                match map.get(key) {
                    Some(Value::Null) => {
                        // XIRR with no solution
                        println!("n/a");
                        return;
                    }
                    Some(val) => {
                        println!("{}", cell(val));
                        return;
                    }
                    None => {}
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, cell(val));
            }
        }
        Value::Array(flows) => {
            for flow in flows {
                let date = flow.get("date").map(cell).unwrap_or_default();
                let amount = flow.get("amount").map(cell).unwrap_or_default();
                println!("{},{}", date, amount);
            }
        }
        other => println!("{}", cell(other)),
    }
}
