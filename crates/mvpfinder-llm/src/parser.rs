//! Lenient extraction of an [`AnalysisResult`] from free-form model output.
//!
//! Small local models wrap their JSON in prose or code fences, break lines
//! inside strings, emit stray backslashes and use typographic quotes. The
//! text is repaired in a fixed sequence of steps, parsed into a
//! [`serde_json::Value`] and then sanitized field by field.

use std::sync::LazyLock;

use mvpfinder_core::AnalysisResult;
use regex::Regex;
use serde_json::{Map, Value};

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

pub const MAX_SUMMARY_CHARS: usize = 200;
pub const MAX_PROBLEM_CHARS: usize = 500;
pub const MAX_MVP_IDEA_CHARS: usize = 500;
pub const MAX_TARGET_AUDIENCE_CHARS: usize = 200;
pub const MAX_TAGS: usize = 5;
pub const DEFAULT_SCORE: i32 = 5;

/// Parses model output into a sanitized [`AnalysisResult`].
///
/// Returns `None` when no JSON object can be recovered or when every text
/// field is empty. Never panics.
#[must_use]
pub fn parse_analysis(text: &str) -> Option<AnalysisResult> {
    let Some(candidate) = extract_object(text) else {
        tracing::debug!("no JSON object in model output");
        return None;
    };

    let collapsed = WHITESPACE_RE.replace_all(candidate, " ");
    let escaped = strip_invalid_escapes(&collapsed);
    let repaired = normalize_quotes(&escaped);

    let object = match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::debug!("model output is JSON but not an object");
            return None;
        }
        Err(e) => {
            tracing::debug!(error = %e, "model output is not valid JSON after repair");
            return None;
        }
    };

    let result = sanitize(&object);
    if [
        &result.summary,
        &result.problem,
        &result.mvp_idea,
        &result.target_audience,
    ]
    .iter()
    .all(|s| s.is_empty())
    {
        tracing::debug!("model output has no text fields");
        return None;
    }
    Some(result)
}

/// Slice from the first `{` to the last `}` of the trimmed text.
fn extract_object(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

/// Drops backslashes that do not begin a legal JSON escape.
///
/// `\\` pairs are copied through untouched so an escaped backslash followed by
/// a letter is not mistaken for an escape. `\u` counts as legal only with four
/// hex digits.
fn strip_invalid_escapes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }

        match chars.get(i + 1).copied() {
            Some(next @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {
                out.push('\\');
                out.push(next);
                i += 2;
            }
            Some('u')
                if chars.len() >= i + 6 && chars[i + 2..i + 6].iter().all(char::is_ascii_hexdigit) =>
            {
                out.push('\\');
                i += 1;
            }
            // stray backslash
            _ => i += 1,
        }
    }
    out
}

fn normalize_quotes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        })
        .collect()
}

fn sanitize(object: &Map<String, Value>) -> AnalysisResult {
    AnalysisResult {
        summary: text_field(object, "summary", MAX_SUMMARY_CHARS),
        problem: text_field(object, "problem", MAX_PROBLEM_CHARS),
        mvp_idea: text_field(object, "mvp_idea", MAX_MVP_IDEA_CHARS),
        target_audience: text_field(object, "target_audience", MAX_TARGET_AUDIENCE_CHARS),
        potential_score: score_field(object.get("potential_score")),
        tags: tags_field(object.get("tags")),
    }
}

fn text_field(object: &Map<String, Value>, key: &str, max_chars: usize) -> String {
    let raw = match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    raw.chars().take(max_chars).collect()
}

/// Integer, truncated float or numeric string, clamped to `1..=10`.
#[allow(clippy::cast_possible_truncation)]
fn score_field(value: Option<&Value>) -> i32 {
    let clamp_f64 = |f: f64| -> Option<i32> {
        f.is_finite().then(|| f.trunc().clamp(1.0, 10.0) as i32)
    };

    let score = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|i| i.clamp(1, 10) as i32)
            .or_else(|| n.as_f64().and_then(clamp_f64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .map(|i| i.clamp(1, 10) as i32)
                .or_else(|| s.parse::<f64>().ok().and_then(clamp_f64))
        }
        _ => None,
    };
    score.unwrap_or(DEFAULT_SCORE)
}

/// List or comma-separated string, normalized to lowercase hyphenated tokens.
fn tags_field(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(ToString::to_string).collect(),
        _ => Vec::new(),
    };

    raw.iter()
        .map(|tag| {
            tag.split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
                .to_lowercase()
        })
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .collect()
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
