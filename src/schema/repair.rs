//! Repair truncated JSON into the largest parseable prefix
//!
//! A streamed response is a growing prefix of one JSON object. To render it
//! before it is finished we close any open string, drop a dangling key, a
//! trailing comma or an unfinished literal, and close the open containers.
//! The result only ever contains values that actually arrived.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    /// Output length at the end of the last complete member
    checkpoint: usize,
    /// Inside an object: next string is a key
    expect_key: bool,
}

/// Strip markdown code fences and any chatter before the first `{`
fn strip_preamble(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.find('{').map(|start| &trimmed[start..])
}

/// Close a truncated JSON object so it parses. Returns `None` until the
/// opening brace has arrived.
pub fn repair_json(text: &str) -> Option<String> {
    let body = strip_preamble(text)?;

    let mut out = String::with_capacity(body.len() + 8);
    let mut stack: Vec<Frame> = Vec::new();
    let mut in_string = false;
    let mut string_is_key = false;
    let mut escape_next = false;
    let mut scalar_start: Option<usize> = None;

    for c in body.chars() {
        if in_string {
            out.push(c);
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
                if !string_is_key {
                    if let Some(top) = stack.last_mut() {
                        top.checkpoint = out.len();
                    }
                }
            }
            continue;
        }

        if scalar_start.is_some() && is_delimiter(c) {
            scalar_start = None;
            if let Some(top) = stack.last_mut() {
                top.checkpoint = out.len();
            }
        }

        match c {
            '{' | '[' => {
                out.push(c);
                stack.push(Frame {
                    container: if c == '{' {
                        Container::Object
                    } else {
                        Container::Array
                    },
                    checkpoint: out.len(),
                    expect_key: c == '{',
                });
            }
            '}' | ']' => {
                out.push(c);
                stack.pop();
                match stack.last_mut() {
                    Some(parent) => parent.checkpoint = out.len(),
                    // Root closed: anything after it is not ours
                    None => return Some(out),
                }
            }
            '"' => {
                out.push(c);
                in_string = true;
                string_is_key = matches!(
                    stack.last(),
                    Some(Frame {
                        container: Container::Object,
                        expect_key: true,
                        ..
                    })
                );
            }
            ':' => {
                out.push(c);
                if let Some(top) = stack.last_mut() {
                    top.expect_key = false;
                }
            }
            ',' => {
                out.push(c);
                if let Some(top) = stack.last_mut() {
                    top.expect_key = top.container == Container::Object;
                }
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                if scalar_start.is_none() {
                    scalar_start = Some(out.len());
                }
                out.push(c);
            }
        }
    }

    if stack.is_empty() {
        return Some(out);
    }

    if in_string {
        if string_is_key {
            truncate_to_checkpoint(&mut out, &stack);
        } else {
            if escape_next {
                out.pop();
            }
            drop_partial_unicode_escape(&mut out);
            out.push('"');
        }
    } else if let Some(start) = scalar_start {
        if serde_json::from_str::<Value>(&out[start..]).is_err() {
            truncate_to_checkpoint(&mut out, &stack);
        }
    } else {
        truncate_to_checkpoint(&mut out, &stack);
    }

    for frame in stack.iter().rev() {
        out.push(match frame.container {
            Container::Object => '}',
            Container::Array => ']',
        });
    }

    Some(out)
}

/// Repair and parse in one step.
pub fn parse_partial_json(text: &str) -> Option<Value> {
    let repaired = repair_json(text)?;
    match serde_json::from_str(&repaired) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "repaired prefix still unparseable");
            None
        }
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ',' | '}' | ']' | ':') || c.is_whitespace()
}

fn truncate_to_checkpoint(out: &mut String, stack: &[Frame]) {
    if let Some(top) = stack.last() {
        out.truncate(top.checkpoint);
        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        if out.ends_with(',') {
            out.pop();
        }
    }
}

/// A `\u12` cut mid-escape would not parse once the string is closed
fn drop_partial_unicode_escape(out: &mut String) {
    if let Some(pos) = out.rfind("\\u") {
        let hex = &out[pos + 2..];
        // `\\u` is an escaped backslash followed by a plain `u`
        let backslashes = out[..=pos].chars().rev().take_while(|c| *c == '\\').count();
        if backslashes % 2 == 1 && hex.len() < 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            out.truncate(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nothing_before_opening_brace() {
        assert_eq!(repair_json(""), None);
        assert_eq!(repair_json("```json\n"), None);
        assert_eq!(parse_partial_json("{"), Some(json!({})));
    }

    #[test]
    fn test_dangling_key_is_dropped() {
        assert_eq!(parse_partial_json(r#"{"type": "SAFE", "summ"#), Some(json!({"type": "SAFE"})));
        assert_eq!(
            parse_partial_json(r#"{"type": "SAFE", "summary":"#),
            Some(json!({"type": "SAFE"}))
        );
        assert_eq!(
            parse_partial_json(r#"{"type": "SAFE",  "#),
            Some(json!({"type": "SAFE"}))
        );
    }

    #[test]
    fn test_open_string_value_is_closed() {
        assert_eq!(
            parse_partial_json(r#"{"type": "SAFE", "summary": "Looks fi"#),
            Some(json!({"type": "SAFE", "summary": "Looks fi"}))
        );
        assert_eq!(
            parse_partial_json(r#"{"type": "RI"#),
            Some(json!({"type": "RI"}))
        );
    }

    #[test]
    fn test_cut_escape_sequences() {
        assert_eq!(
            parse_partial_json(r#"{"rawText": "line\"#),
            Some(json!({"rawText": "line"}))
        );
        assert_eq!(
            parse_partial_json(r#"{"rawText": "caf\u00"#),
            Some(json!({"rawText": "caf"}))
        );
    }

    #[test]
    fn test_unfinished_literal_is_dropped() {
        assert_eq!(
            parse_partial_json(r#"{"type": "SAFE", "safeBadge": tr"#),
            Some(json!({"type": "SAFE"}))
        );
        assert_eq!(
            parse_partial_json(r#"{"type": "SAFE", "safeBadge": true"#),
            Some(json!({"type": "SAFE", "safeBadge": true}))
        );
    }

    #[test]
    fn test_nested_arrays_close_in_order() {
        let prefix = r#"{"type":"RISK","riskHierarchy":[{"ingredient":"Sugar","severity":"high"},{"ingredient":"Ho"#;
        assert_eq!(
            parse_partial_json(prefix),
            Some(json!({
                "type": "RISK",
                "riskHierarchy": [
                    {"ingredient": "Sugar", "severity": "high"},
                    {"ingredient": "Ho"}
                ]
            }))
        );

        let after_comma = r#"{"type":"RISK","riskHierarchy":[{"ingredient":"Sugar"},"#;
        assert_eq!(
            parse_partial_json(after_comma),
            Some(json!({"type": "RISK", "riskHierarchy": [{"ingredient": "Sugar"}]}))
        );

        let open_element = r#"{"type":"RISK","riskHierarchy":[{"#;
        assert_eq!(
            parse_partial_json(open_element),
            Some(json!({"type": "RISK", "riskHierarchy": [{}]}))
        );
    }

    #[test]
    fn test_every_prefix_of_a_document_parses() {
        let doc = r#"```json
{"type":"DECISION","question":"Swap for \"oat\" milk?","options":["Yes, swap","No, keep dairy"]}
```"#;
        let full: Value = parse_partial_json(doc).unwrap();
        assert_eq!(full["options"][1], "No, keep dairy");

        for end in 0..=doc.len() {
            if !doc.is_char_boundary(end) {
                continue;
            }
            let prefix = &doc[..end];
            if prefix.contains('{') {
                assert!(
                    parse_partial_json(prefix).is_some(),
                    "prefix failed to repair: {:?}",
                    prefix
                );
            }
        }
    }

    #[test]
    fn test_trailing_text_after_root_is_ignored() {
        assert_eq!(
            parse_partial_json(r#"{"type":"SAFE"} and some chatter"#),
            Some(json!({"type": "SAFE"}))
        );
    }
}
