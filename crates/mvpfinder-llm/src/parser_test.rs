use super::*;

fn parse(text: &str) -> AnalysisResult {
    parse_analysis(text).unwrap_or_else(|| panic!("expected a result for {text:?}"))
}

// -----------------------------------------------------------------------
// extraction and repair
// -----------------------------------------------------------------------

#[test]
fn parses_clean_object() {
    let result = parse(
        r#"{"summary":"S","problem":"P","mvp_idea":"M","target_audience":"T","potential_score":8,"tags":["saas","b2b"]}"#,
    );
    assert_eq!(result.summary, "S");
    assert_eq!(result.problem, "P");
    assert_eq!(result.mvp_idea, "M");
    assert_eq!(result.target_audience, "T");
    assert_eq!(result.potential_score, 8);
    assert_eq!(result.tags, vec!["saas", "b2b"]);
}

#[test]
fn sanitized_result_round_trips() {
    let expected = AnalysisResult {
        summary: "A scheduling tool for clinics".to_owned(),
        problem: "Clinics lose revenue to no-shows".to_owned(),
        mvp_idea: "SMS reminders with one-tap rescheduling".to_owned(),
        target_audience: "Small clinic managers".to_owned(),
        potential_score: 7,
        tags: vec!["healthcare".to_owned(), "sms".to_owned()],
    };
    let text = serde_json::to_string(&expected).unwrap();
    assert_eq!(parse_analysis(&text), Some(expected));
}

#[test]
fn ignores_prose_and_code_fences_around_object() {
    let text = "Sure! Here is the analysis:\n```json\n{\"summary\": \"Tool\", \"potential_score\": 6}\n```\nHope it helps.";
    let result = parse(text);
    assert_eq!(result.summary, "Tool");
    assert_eq!(result.potential_score, 6);
}

#[test]
fn newlines_inside_strings_are_collapsed() {
    let text = "{\"summary\": \"line one\n   line two\", \"problem\": \"p\"}";
    assert_eq!(parse(text).summary, "line one line two");
}

#[test]
fn stray_backslashes_are_dropped() {
    let result = parse(r#"{"summary": "matches \d+ digits", "problem": "p"}"#);
    assert_eq!(result.summary, "matches d+ digits");
}

#[test]
fn escaped_backslash_pairs_are_preserved() {
    let result = parse(r#"{"summary": "dir C:\\new", "problem": "p"}"#);
    assert_eq!(result.summary, r"dir C:\new");
}

#[test]
fn legal_escapes_survive() {
    let result = parse(r#"{"summary": "say \"hi\" to caf\u00e9", "problem": "p"}"#);
    assert_eq!(result.summary, "say \"hi\" to café");
}

#[test]
fn unicode_escape_without_hex_digits_is_dropped() {
    let result = parse(r#"{"summary": "\user data", "problem": "p"}"#);
    assert_eq!(result.summary, "user data");
}

#[test]
fn typographic_quotes_are_normalized() {
    let text = "{\u{201C}summary\u{201D}: \u{201C}It\u{2019}s a tool\u{201D}, \u{201C}potential_score\u{201D}: 4}";
    let result = parse(text);
    assert_eq!(result.summary, "It's a tool");
    assert_eq!(result.potential_score, 4);
}

#[test]
fn missing_and_null_text_fields_become_empty() {
    let result = parse(r#"{"summary": "S", "problem": null}"#);
    assert_eq!(result.problem, "");
    assert_eq!(result.mvp_idea, "");
    assert!(result.tags.is_empty());
}

// -----------------------------------------------------------------------
// rejection
// -----------------------------------------------------------------------

#[test]
fn rejects_empty_input() {
    assert_eq!(parse_analysis(""), None);
    assert_eq!(parse_analysis("   \n\t"), None);
}

#[test]
fn rejects_plain_prose() {
    assert_eq!(parse_analysis("I cannot analyze this product."), None);
}

#[test]
fn rejects_truncated_object() {
    assert_eq!(parse_analysis(r#"{"summary": "cut off mid"#), None);
    assert_eq!(parse_analysis(r#"{"summary": "cut off", "tags": ["a", }"#), None);
}

#[test]
fn rejects_reversed_braces() {
    assert_eq!(parse_analysis("} nothing here {"), None);
}

#[test]
fn rejects_object_without_text_fields() {
    assert_eq!(
        parse_analysis(r#"{"potential_score": 9, "tags": ["ai"]}"#),
        None
    );
    assert_eq!(parse_analysis("{}"), None);
}

#[test]
fn never_panics_on_awkward_input() {
    let inputs = [
        "{",
        "}",
        "{}}",
        "{{{{",
        "\\",
        "{\"summary\": \"trailing backslash \\",
        "{\"summary\": \"\\u12\"}",
        "{\"summary\": \"🚀 emoji \u{201C}\"}",
        "{\"potential_score\": 1e400, \"summary\": \"x\"}",
        "{\"tags\": {\"nested\": true}, \"summary\": 5}",
    ];
    for input in inputs {
        let _ = parse_analysis(input);
    }
}

// -----------------------------------------------------------------------
// potential_score
// -----------------------------------------------------------------------

fn score_of(raw: &str) -> i32 {
    parse(&format!(r#"{{"summary": "s", "potential_score": {raw}}}"#)).potential_score
}

#[test]
fn score_is_clamped_high() {
    assert_eq!(score_of("15"), 10);
}

#[test]
fn score_is_clamped_low() {
    assert_eq!(score_of("0"), 1);
    assert_eq!(score_of("-3"), 1);
}

#[test]
fn score_accepts_numeric_string() {
    assert_eq!(score_of(r#""7""#), 7);
    assert_eq!(score_of(r#"" 8.5 ""#), 8);
}

#[test]
fn score_truncates_float() {
    assert_eq!(score_of("7.9"), 7);
}

#[test]
fn score_defaults_when_missing_or_unusable() {
    assert_eq!(parse(r#"{"summary": "s"}"#).potential_score, DEFAULT_SCORE);
    assert_eq!(score_of(r#""high""#), DEFAULT_SCORE);
    assert_eq!(score_of("null"), DEFAULT_SCORE);
    assert_eq!(score_of("true"), DEFAULT_SCORE);
}

// -----------------------------------------------------------------------
// tags
// -----------------------------------------------------------------------

fn tags_of(raw: &str) -> Vec<String> {
    parse(&format!(r#"{{"summary": "s", "tags": {raw}}}"#)).tags
}

#[test]
fn tags_from_comma_separated_string() {
    assert_eq!(
        tags_of(r#""AI Tools, Machine Learning""#),
        vec!["ai-tools", "machine-learning"]
    );
}

#[test]
fn tags_from_list_are_normalized() {
    assert_eq!(
        tags_of(r#"["  Developer Tools ", "SaaS", "", "open  source"]"#),
        vec!["developer-tools", "saas", "open-source"]
    );
}

#[test]
fn scalar_tags_in_list_are_stringified() {
    assert_eq!(
        tags_of(r#"["SaaS", 2024, true, null, ["nested"]]"#),
        vec!["saas", "2024", "true"]
    );
}

#[test]
fn tags_are_capped_at_five() {
    assert_eq!(
        tags_of(r#"["a", "b", "c", "d", "e", "f", "g"]"#),
        vec!["a", "b", "c", "d", "e"]
    );
}

#[test]
fn tags_of_wrong_type_are_empty() {
    assert!(tags_of("42").is_empty());
    assert!(tags_of(r#"{"x": 1}"#).is_empty());
}

// -----------------------------------------------------------------------
// text truncation
// -----------------------------------------------------------------------

#[test]
fn text_fields_are_truncated_by_characters() {
    let long = "é".repeat(600);
    let text = format!(
        r#"{{"summary": "{long}", "problem": "{long}", "mvp_idea": "{long}", "target_audience": "{long}"}}"#
    );
    let result = parse(&text);
    assert_eq!(result.summary.chars().count(), MAX_SUMMARY_CHARS);
    assert_eq!(result.problem.chars().count(), MAX_PROBLEM_CHARS);
    assert_eq!(result.mvp_idea.chars().count(), MAX_MVP_IDEA_CHARS);
    assert_eq!(
        result.target_audience.chars().count(),
        MAX_TARGET_AUDIENCE_CHARS
    );
}
