use serde_json::{json, Value};
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format.
///
/// In JSON mode the fields of `data` are merged next to `success`/`message`;
/// in text mode only the message is printed.
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_body(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a bare value: the raw string in text mode, a JSON document otherwise.
pub fn output_value(output_format: &OutputFormat, key: &str, value: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), json!(value));
            println!("{}", serde_json::to_string_pretty(&Value::Object(body))?);
        }
        OutputFormat::Text => {
            println!("{}", value);
        }
    }
    Ok(())
}

fn success_body(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
        target.extend(extra);
    }

    response
}
