use serde_json::Value;
use std::io;

use super::{cell, result_body, split_rows};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write a result as CSV.
///
/// Calculators with a breakdown emit its rows (the monthly schedule is
/// preferred over yearly rows when both are present). Sensitivity results
/// emit the matrix. Anything else becomes `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match result_body(value) {
        Value::Object(map) => {
            if let Some(matrix) = map.get("matrix").and_then(Value::as_array) {
                write_matrix(&mut wtr, map.get("variable_1_values"), map.get("variable_2_values"), matrix)
            } else {
                let (scalars, tables) = split_rows(map);
                let preferred = tables
                    .iter()
                    .find(|(name, _)| name.starts_with("monthly"))
                    .or_else(|| tables.first());
                match preferred {
                    Some((_, rows)) => write_rows(&mut wtr, rows),
                    None => write_pairs(&mut wtr, &scalars),
                }
            }
        }
        Value::Array(rows) => write_rows(&mut wtr, rows),
        other => wtr.write_record([cell(other)]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("failed to write CSV: {}", e);
    }
}

fn write_pairs(wtr: &mut StdoutWriter<'_>, pairs: &[(&str, &Value)]) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in pairs {
        wtr.write_record([key.to_string(), cell(val)])?;
    }
    Ok(())
}

fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            wtr.write_record([cell(row)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(cell).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}

/// First column holds the variable 1 sweep, header row the variable 2 sweep.
fn write_matrix(
    wtr: &mut StdoutWriter<'_>,
    var1: Option<&Value>,
    var2: Option<&Value>,
    matrix: &[Value],
) -> csv::Result<()> {
    let var1_values: Vec<String> = var1
        .and_then(Value::as_array)
        .map(|v| v.iter().map(cell).collect())
        .unwrap_or_default();
    let var2_values: Vec<String> = var2
        .and_then(Value::as_array)
        .filter(|v| !v.is_empty())
        .map(|v| v.iter().map(cell).collect())
        .unwrap_or_else(|| vec!["value".to_string()]);

    let mut header = vec![String::new()];
    header.extend(var2_values);
    wtr.write_record(&header)?;

    for (i, row) in matrix.iter().enumerate() {
        let mut record = vec![var1_values.get(i).cloned().unwrap_or_default()];
        if let Some(cells) = row.as_array() {
            record.extend(cells.iter().map(cell));
        }
        wtr.write_record(&record)?;
    }
    Ok(())
}
