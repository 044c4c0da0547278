use std::time::Duration;

use reqwest::Client;

/// Fixed per-request timeout shared by every skill's client.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client a skill instance owns for its lifetime.
pub(crate) fn client() -> Client {
    // The builder only fails when the TLS backend cannot initialize; fall
    // back to the default client rather than unwind.
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Cap upstream response bodies quoted in error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;

    if body.chars().count() > MAX_CHARS {
        let truncated: String = body.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_unchanged() {
        assert_eq!(truncate_body("{\"cod\":401}"), "{\"cod\":401}");
    }

    #[test]
    fn long_body_truncated_at_char_boundary() {
        let body = "天".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
    }
}
