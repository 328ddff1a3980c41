/// Fills the analysis template for one item.
///
/// The JSON keys named in the template are what [`crate::parse_analysis`]
/// reads back.
#[must_use]
pub fn render_prompt(title: &str, tagline: &str, body: &str) -> String {
    format!(
        r#"Analyze this product or post and answer with valid JSON only.

PRODUCT: {title}
TAGLINE: {tagline}
DESCRIPTION: {body}

INSTRUCTIONS:
- summary: 2-3 sentences explaining what it does
- problem: 3-4 sentences on the problem it solves and why it matters
- mvp_idea: 3-4 sentences with an MVP you could build inspired by it
- target_audience: 2-3 sentences describing who it is for (role, context, needs)
- potential_score: integer from 1 to 10 for market potential
- tags: 4-5 relevant lowercase keywords

Answer ONLY with a single JSON object like this:
{{"summary":"...","problem":"...","mvp_idea":"...","target_audience":"...","potential_score":7,"tags":["tag1","tag2","tag3","tag4"]}}

JSON:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_item_fields() {
        let prompt = render_prompt("Launchpad", "Ship faster", "A deploy tool.");
        assert!(prompt.contains("PRODUCT: Launchpad"));
        assert!(prompt.contains("TAGLINE: Ship faster"));
        assert!(prompt.contains("DESCRIPTION: A deploy tool."));
    }

    #[test]
    fn prompt_names_every_result_key() {
        let prompt = render_prompt("t", "", "");
        for key in [
            "summary",
            "problem",
            "mvp_idea",
            "target_audience",
            "potential_score",
            "tags",
        ] {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing key {key}");
        }
        assert!(prompt.trim_end().ends_with("JSON:"));
    }
}
