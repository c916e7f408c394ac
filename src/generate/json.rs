//! Locating the JSON object inside a model response.

use serde_json::Value;

/// Pull a JSON object out of text that may wrap it in prose or code fences.
///
/// Looks at a fenced block first (```` ```json ```` or a bare fence holding
/// an object), then at each `{` in turn for a balanced, parseable object.
pub fn extract_json(response: &str) -> Option<String> {
    if let Some(fenced) = fenced_block(response)
        && serde_json::from_str::<Value>(fenced).is_ok()
    {
        return Some(fenced.to_string());
    }

    response
        .match_indices('{')
        .filter_map(|(start, _)| balanced_object(&response[start..]))
        .find(|candidate| serde_json::from_str::<Value>(candidate).is_ok())
        .map(str::to_string)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let end = after.find("```")?;
    let inner = after[..end].strip_prefix("json").unwrap_or(&after[..end]).trim();
    inner.starts_with('{').then_some(inner)
}

/// Slice from the leading `{` to its matching `}`, honoring string literals.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
