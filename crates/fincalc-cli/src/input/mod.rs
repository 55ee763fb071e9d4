pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve calculator input from `--input <file>` first, then piped stdin.
///
/// Returns `None` when neither is present so the caller can fall back to flags.
pub fn load_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => {
            let parsed = serde_json::from_value(value)
                .map_err(|e| format!("Invalid JSON on stdin: {}", e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
