//! Completion URL patterns.
//!
//! A checkout is complete once the browser reaches one of a handful of known
//! URL shapes. Matching is plain substring containment against the raw URL,
//! which keeps interop with the existing backend and provider redirects
//! exact. All pattern lists are configurable; the defaults match the
//! production KibraConnect deployment with Paystack as the provider.

use serde::{Deserialize, Serialize};

/// Deep link the provider redirects to when returning to the app.
pub const DEFAULT_APP_CALLBACK: &str = "kibraconnect://payment-callback";

/// Query fragment the backend appends to successful redirects.
pub const DEFAULT_SUCCESS_MARKER: &str = "success=true";

/// Backend callback routes.
pub const DEFAULT_CALLBACK_PATHS: [&str; 2] = [
    "/api/payments/callback/",
    "/api/marketplace/payments/callback/",
];

/// Provider-hosted success page.
pub const DEFAULT_PROVIDER_SUCCESS: &str = "paystack.co/success";

/// The set of URL substrings that signal a finished provider checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionPatterns {
    /// Custom app-scheme callbacks.
    pub app_callbacks: Vec<String>,
    /// Query fragments that mark a successful redirect.
    pub success_markers: Vec<String>,
    /// Backend callback paths. These also qualify a 404 load error as a
    /// completion signal.
    pub callback_paths: Vec<String>,
    /// Provider-hosted success pages.
    pub provider_success: Vec<String>,
}

impl Default for CompletionPatterns {
    fn default() -> Self {
        Self {
            app_callbacks: vec![DEFAULT_APP_CALLBACK.to_owned()],
            success_markers: vec![DEFAULT_SUCCESS_MARKER.to_owned()],
            callback_paths: DEFAULT_CALLBACK_PATHS.iter().map(|&p| p.to_owned()).collect(),
            provider_success: vec![DEFAULT_PROVIDER_SUCCESS.to_owned()],
        }
    }
}

impl CompletionPatterns {
    /// Returns `true` if a navigation to `url` means the provider flow is done.
    #[must_use]
    pub fn is_completion(&self, url: &str) -> bool {
        self.app_callbacks
            .iter()
            .chain(&self.success_markers)
            .chain(&self.callback_paths)
            .chain(&self.provider_success)
            .any(|p| contains(url, p))
    }

    /// Returns `true` if `url` points at one of the backend callback routes.
    #[must_use]
    pub fn is_callback(&self, url: &str) -> bool {
        self.callback_paths.iter().any(|p| contains(url, p))
    }

    /// Replaces the app callback deep links.
    #[must_use]
    pub fn with_app_callback(mut self, callback: impl Into<String>) -> Self {
        self.app_callbacks = vec![callback.into()];
        self
    }

    /// Replaces the provider success pages.
    #[must_use]
    pub fn with_provider_success(mut self, page: impl Into<String>) -> Self {
        self.provider_success = vec![page.into()];
        self
    }

    /// Adds a backend callback path.
    #[must_use]
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_paths.push(path.into());
        self
    }
}

// Empty patterns from a sparse config must never match everything.
fn contains(url: &str, pattern: &str) -> bool {
    !pattern.is_empty() && url.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_match_known_shapes() {
        let p = CompletionPatterns::default();
        assert!(p.is_completion("kibraconnect://payment-callback?reference=abc"));
        assert!(p.is_completion("https://api.kibra.example/return?success=true&x=1"));
        assert!(p.is_completion("https://api.kibra.example/api/payments/callback/?reference=abc"));
        assert!(p.is_completion(
            "https://api.kibra.example/api/marketplace/payments/callback/?trxref=abc"
        ));
        assert!(p.is_completion("https://paystack.co/success/abc"));
    }

    #[test]
    fn test_default_patterns_ignore_checkout_pages() {
        let p = CompletionPatterns::default();
        assert!(!p.is_completion("https://checkout.paystack.com/0peioxfhpn"));
        assert!(!p.is_completion("https://api.kibra.example/return?success=false"));
        assert!(!p.is_completion("about:blank"));
    }

    #[test]
    fn test_is_callback_only_covers_backend_paths() {
        let p = CompletionPatterns::default();
        assert!(p.is_callback("https://api.kibra.example/api/payments/callback/?reference=x"));
        assert!(!p.is_callback("kibraconnect://payment-callback?reference=x"));
        assert!(!p.is_callback("https://paystack.co/success"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let p = CompletionPatterns {
            app_callbacks: vec![String::new()],
            success_markers: vec![],
            callback_paths: vec![],
            provider_success: vec![],
        };
        assert!(!p.is_completion("https://anything.example/"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let p: CompletionPatterns =
            serde_json::from_str(r#"{"provider_success":["flutterwave.com/success"]}"#).unwrap();
        assert!(p.is_completion("https://flutterwave.com/success?tx=1"));
        assert!(!p.is_completion("https://paystack.co/success"));
        assert!(p.is_completion("kibraconnect://payment-callback"));
    }
}
