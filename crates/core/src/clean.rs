//! Strips markdown code fences from model replies so the remainder can be
//! parsed as JSON.

/// Removes a wrapping markdown code fence, if any. The json-tagged fence is
/// checked before the bare fence; already-clean input passes through
/// unchanged, so the transform is idempotent.
pub fn strip_markdown_fences(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start();
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text.to_string()
}
