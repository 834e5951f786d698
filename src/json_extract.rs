//! Best-effort JSON sanitizer for structured-output deserialization.
//!
//! Strips `<think>...</think>` reasoning spans, unwraps a fenced code block
//! tagged for JSON, and otherwise falls back to the substring between the
//! first `{` and the last `}`. A pure function, kept separate from the
//! retry loop that calls it — per §9's "separate the sanitize + deserialize
//! step as a pure function."

/// Sanitizes `raw` model output into a string suitable for
/// `serde_json::from_str`. Does not itself validate JSON.
pub fn extract_json(raw: &str) -> String {
    let without_think = strip_think_tags(raw);
    let unfenced = unwrap_fenced_code_block(&without_think);
    let trimmed = unfenced.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed.to_string();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start <= end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

fn strip_think_tags(s: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";
    let mut result = String::new();
    let mut rest = s;
    while let Some(start) = rest.find(OPEN) {
        result.push_str(&rest[..start]);
        rest = &rest[start + OPEN.len()..];
        match rest.find(CLOSE) {
            Some(end) => rest = &rest[end + CLOSE.len()..],
            None => rest = "",
        }
    }
    result.push_str(rest);
    result
}

fn unwrap_fenced_code_block(s: &str) -> String {
    let trimmed = s.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let body = match body.find('\n') {
        Some(newline) => {
            let (first_line, remainder) = body.split_at(newline);
            if first_line.trim().is_empty() || first_line.trim().eq_ignore_ascii_case("json") {
                &remainder[1..]
            } else {
                body
            }
        }
        None => body,
    };

    match body.rfind("```") {
        Some(end) => body[..end].to_string(),
        None => body.to_string(),
    }
}
