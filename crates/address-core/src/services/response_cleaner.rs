//! Isolation of the JSON payload in LLM chat output

use crate::error::{Result, ScannerError};

/// Strip Markdown code fences and return the first balanced `{...}` block.
///
/// Models regularly wrap the requested object in ```json fences or add a
/// sentence before it. Output without any object is an error.
pub fn extract_json_object(content: &str) -> Result<&str> {
    let unfenced = strip_code_fences(content);

    let start = unfenced.find('{').ok_or_else(|| {
        ScannerError::Processing(format!("No JSON object in model response: {}", preview(content)))
    })?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in unfenced[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&unfenced[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(ScannerError::Processing(format!(
        "Unterminated JSON object in model response: {}",
        preview(content)
    )))
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn preview(content: &str) -> String {
    content.chars().take(120).collect()
}
