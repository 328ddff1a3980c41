/// Decides when an upstream username is not a usable author name.
///
/// Product Hunt hides maker usernames behind a placeholder for some accounts;
/// those are replaced with the maker's display name during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRedaction {
    markers: Vec<String>,
}

impl AuthorRedaction {
    /// Builds a predicate from case-insensitive marker strings.
    #[must_use]
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// True for blank usernames or usernames equal to a marker, ignoring case
    /// and surrounding whitespace.
    #[must_use]
    pub fn is_redacted(&self, username: &str) -> bool {
        let username = username.trim();
        if username.is_empty() {
            return true;
        }
        let lowered = username.to_lowercase();
        self.markers.iter().any(|m| *m == lowered)
    }
}

impl Default for AuthorRedaction {
    fn default() -> Self {
        Self::new(["[REDACTED]"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_blank_and_marker() {
        let redaction = AuthorRedaction::default();
        assert!(redaction.is_redacted(""));
        assert!(redaction.is_redacted("   "));
        assert!(redaction.is_redacted("[REDACTED]"));
        assert!(redaction.is_redacted("[redacted]"));
        assert!(!redaction.is_redacted("rrhoover"));
    }

    #[test]
    fn custom_markers_replace_default() {
        let redaction = AuthorRedaction::new(["hidden", " "]);
        assert!(redaction.is_redacted(" HIDDEN "));
        assert!(!redaction.is_redacted("[REDACTED]"));
    }

    #[test]
    fn username_containing_marker_is_kept() {
        let redaction = AuthorRedaction::new(["anon"]);
        assert!(!redaction.is_redacted("anonymouse"));
        assert!(redaction.is_redacted("ANON"));
        assert!(!AuthorRedaction::default().is_redacted("[REDACTED]_fan"));
    }
}
