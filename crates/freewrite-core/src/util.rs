//! Small text helpers shared by configuration and the journal service client.

/// Longest server error body kept in an [`crate::remote::ApiError`].
const MAX_ERROR_BODY_CHARS: usize = 180;

/// Trimmed value of an optional setting; blank counts as unset.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Whether a configured URL carries a scheme `reqwest` can talk to.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Shorten a response body for logs and error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_and_blank_settings_are_none() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \t\n".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" http://localhost:8000/api ".to_string())),
            Some("http://localhost:8000/api".to_string())
        );
    }

    #[test]
    fn only_http_schemes_count_as_urls() {
        assert!(is_http_url("http://localhost:8000/api"));
        assert!(is_http_url("https://journal.example.com"));
        assert!(!is_http_url("ftp://journal.example.com"));
        assert!(!is_http_url("localhost:8000/api"));
    }

    #[test]
    fn long_error_bodies_are_cut() {
        let long = format!("  {}  ", "x".repeat(300));
        assert_eq!(compact_text(&long).chars().count(), MAX_ERROR_BODY_CHARS);
        assert_eq!(compact_text(" Journal not found "), "Journal not found");
    }
}
