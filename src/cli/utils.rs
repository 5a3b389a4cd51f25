use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print a JSON collection, or a header plus one formatted line per item
pub fn output_collection<T>(
    output_format: OutputFormat,
    collection_name: &str,
    items: &[T],
    to_json: impl Fn(&T) -> Value,
    header: &str,
    to_line: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let values: Vec<Value> = items.iter().map(to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: values }))?);
        }
        OutputFormat::Text => {
            println!("{}", header);
            println!("{}", "-".repeat(header.len().max(40)));
            for item in items {
                println!("{}", to_line(item));
            }
        }
    }
    Ok(())
}

/// `—` repeated once per hierarchy level, followed by a space when indented
pub fn level_indent(level: i32) -> String {
    match level {
        l if l <= 0 => String::new(),
        l => format!("{} ", "—".repeat(l as usize)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_by_level() {
        assert_eq!(level_indent(0), "");
        assert_eq!(level_indent(2), "—— ");
    }
}
