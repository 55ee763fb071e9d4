use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::deposits::{fixed, ppf, recurring, ssy};
use crate::error::FinCalcError;
use crate::investments::{goal, sip, withdrawal};
use crate::loans::{amortization, balance_transfer};
use crate::types::*;
use crate::FinCalcResult;

/// Calculator a sensitivity sweep runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calculator {
    Loan,
    BalanceTransfer,
    Rd,
    Fd,
    Ppf,
    Ssy,
    Goal,
    Sip,
    Swp,
}

/// Input for a 1- or 2-way sensitivity sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub calculator: Calculator,
    /// Base case calculator input (same JSON shape the calculator accepts)
    pub base_inputs: serde_json::Value,
    /// Input field to sweep along the rows. Dotted paths reach nested fields.
    pub variable_1: SensitivityVariable,
    /// Optional input field to sweep along the columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_2: Option<SensitivityVariable>,
    /// Output field to record, e.g. `monthly_emi` or `savings.interest_saved`
    pub output_metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: String,
    pub variable_2_name: Option<String>,
    pub variable_1_values: Vec<Decimal>,
    /// Empty for a 1-way sweep.
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: String,
    /// `matrix[i][j]` is the metric at `variable_1_values[i]`, `variable_2_values[j]`.
    /// A 1-way sweep has a single column. Cells whose evaluation failed are `None`.
    pub matrix: Vec<Vec<Option<Decimal>>>,
    pub base_case_value: Option<Decimal>,
    /// Cell closest to the midpoint of each range.
    pub base_case_position: (usize, usize),
}

/// Upper bound on the values along one axis of a sweep.
pub const MAX_SWEEP_POINTS: usize = 1000;

fn generate_sweep_values(var: &SensitivityVariable) -> FinCalcResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(FinCalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(FinCalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(FinCalcError::InvalidInput {
                field: format!("variable:{}", var.name),
                reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} values"),
            });
        }
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Include max when the step overshoots it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Set a (possibly dotted) field on a JSON object.
///
/// Whole numbers are written as JSON integers so integer fields such as
/// `tenure_years` still deserialize; everything else is written as a
/// decimal string.
pub fn set_input_field(
    base: &serde_json::Value,
    path: &str,
    value: Decimal,
) -> FinCalcResult<serde_json::Value> {
    let mut out = base.clone();
    let mut cursor = &mut out;
    let mut parts = path.split('.').peekable();

    while let Some(part) = parts.next() {
        let obj = cursor.as_object_mut().ok_or_else(|| FinCalcError::InvalidInput {
            field: path.into(),
            reason: format!("'{part}' is not inside a JSON object"),
        })?;
        if parts.peek().is_none() {
            let json = if value.fract().is_zero() {
                let whole = value.trunc().to_string();
                serde_json::from_str(&whole).unwrap_or(serde_json::Value::String(whole))
            } else {
                serde_json::Value::String(value.normalize().to_string())
            };
            obj.insert(part.to_string(), json);
            return Ok(out);
        }
        cursor = obj
            .entry(part.to_string())
            .or_insert_with(|| serde_json::json!({}));
    }

    Err(FinCalcError::invalid("variable", "Empty field path"))
}

/// Read a numeric metric from a serialized result by dotted path.
pub fn extract_metric(result: &serde_json::Value, path: &str) -> FinCalcResult<Decimal> {
    let pointer = format!("/{}", path.replace('.', "/"));
    let value = result.pointer(&pointer).ok_or_else(|| FinCalcError::InvalidInput {
        field: "output_metric".into(),
        reason: format!("'{path}' not found in result"),
    })?;
    let parsed = match value {
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        serde_json::Value::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        _ => None,
    };
    parsed.ok_or_else(|| FinCalcError::InvalidInput {
        field: "output_metric".into(),
        reason: format!("'{path}' is not numeric"),
    })
}

fn run_calculator<I, O>(
    inputs: serde_json::Value,
    f: impl Fn(&I) -> FinCalcResult<ComputationOutput<O>>,
) -> FinCalcResult<serde_json::Value>
where
    I: serde::de::DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_value(inputs)?;
    let output = f(&input)?;
    Ok(serde_json::to_value(&output.result)?)
}

/// Run one of the built-in calculators on JSON input and return its result as JSON.
pub fn evaluate_calculator(
    calculator: Calculator,
    inputs: serde_json::Value,
) -> FinCalcResult<serde_json::Value> {
    match calculator {
        Calculator::Loan => run_calculator(inputs, amortization::amortize_loan),
        Calculator::BalanceTransfer => {
            run_calculator(inputs, balance_transfer::evaluate_balance_transfer)
        }
        Calculator::Rd => run_calculator(inputs, recurring::simulate_rd),
        Calculator::Fd => run_calculator(inputs, fixed::calculate_fd),
        Calculator::Ppf => run_calculator(inputs, ppf::calculate_ppf),
        Calculator::Ssy => run_calculator(inputs, ssy::calculate_ssy),
        Calculator::Goal => run_calculator(inputs, goal::solve_goal_sip),
        Calculator::Sip => run_calculator(inputs, sip::project_sip),
        Calculator::Swp => run_calculator(inputs, withdrawal::simulate_swp),
    }
}

/// Evaluate a sensitivity grid with a caller-supplied model.
///
/// `eval_fn` receives the base inputs with the swept fields overwritten and
/// returns the metric. Cells are evaluated in parallel; a failing cell is
/// left empty and reported as a warning.
pub fn evaluate_sensitivity<F>(
    input: &SensitivityInput,
    eval_fn: F,
) -> FinCalcResult<ComputationOutput<SensitivityOutput>>
where
    F: Fn(&serde_json::Value) -> FinCalcResult<Decimal> + Sync,
{
    let start = Instant::now();

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = match &input.variable_2 {
        Some(v) => generate_sweep_values(v)?,
        None => Vec::new(),
    };
    let cols = v2_values.len().max(1);

    let cells: Vec<(usize, usize)> = (0..v1_values.len())
        .flat_map(|i| (0..cols).map(move |j| (i, j)))
        .collect();

    let evaluated: Vec<FinCalcResult<Decimal>> = cells
        .par_iter()
        .map(|&(i, j)| {
            let mut inputs =
                set_input_field(&input.base_inputs, &input.variable_1.name, v1_values[i])?;
            if let Some(v2) = &input.variable_2 {
                inputs = set_input_field(&inputs, &v2.name, v2_values[j])?;
            }
            eval_fn(&inputs)
        })
        .collect();

    let mut warnings: Vec<String> = Vec::new();
    let mut matrix = vec![vec![None; cols]; v1_values.len()];
    for (&(i, j), value) in cells.iter().zip(evaluated) {
        match value {
            Ok(v) => matrix[i][j] = Some(v),
            Err(e) => {
                let at = match v2_values.get(j) {
                    Some(v2) => format!("({}, {v2})", v1_values[i]),
                    None => format!("({})", v1_values[i]),
                };
                warnings.push(format!("Evaluation failed at {at}: {e}"));
            }
        }
    }

    let mid1 = (input.variable_1.min + input.variable_1.max) / dec!(2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = match &input.variable_2 {
        Some(v2) => closest_index(&v2_values, (v2.min + v2.max) / dec!(2)),
        None => 0,
    };
    let base_case_value = matrix[base_row][base_col];

    let output = SensitivityOutput {
        variable_1_name: input.variable_1.name.clone(),
        variable_2_name: input.variable_2.as_ref().map(|v| v.name.clone()),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        output_metric: input.output_metric.clone(),
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sensitivity sweep (parallel grid evaluation)",
        &serde_json::json!({
            "calculator": input.calculator,
            "variable_1": input.variable_1.name,
            "variable_2": input.variable_2.as_ref().map(|v| &v.name),
            "output_metric": input.output_metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Sweep one of the built-in calculators and record `output_metric`.
pub fn run_sensitivity(input: &SensitivityInput) -> FinCalcResult<ComputationOutput<SensitivityOutput>> {
    evaluate_sensitivity(input, |inputs| {
        let result = evaluate_calculator(input.calculator, inputs.clone())?;
        extract_metric(&result, &input.output_metric)
    })
}
