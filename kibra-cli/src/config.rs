//! CLI configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! api_url = "https://api.kibraconnect.example/api/"
//! timeout_secs = 10
//! verify_timeout_secs = 30
//! token = "$KIBRA_ACCESS_TOKEN"
//!
//! [patterns]
//! app_callbacks = ["kibraconnect://payment-callback"]
//! provider_success = ["paystack.co/success", "checkout.flutterwave.com/success"]
//! ```
//!
//! # Environment Variables
//!
//! - `KIBRA_CONFIG` - Path to configuration file (default: `kibra.toml`)
//! - `KIBRA_API_URL` - Override the API base URL
//! - `KIBRA_TOKEN` - Override the access token

use std::path::Path;
use std::time::Duration;

use kibra::CompletionPatterns;
use kibra_http::ApiConfig;
use kibra_http::constants::DEFAULT_API_URL;
use serde::{Deserialize, Serialize};

/// Default config file name.
pub const DEFAULT_CONFIG_PATH: &str = "kibra.toml";

/// Top-level CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on a payment verification in seconds.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,

    /// Preset access token. Supports `$VAR` / `${VAR}`.
    #[serde(default)]
    pub token: Option<String>,

    /// Completion patterns used by checkout replays.
    #[serde(default)]
    pub patterns: CompletionPatterns,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            verify_timeout_secs: default_verify_timeout_secs(),
            token: None,
            patterns: CompletionPatterns::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_owned()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_verify_timeout_secs() -> u64 {
    30
}

impl CliConfig {
    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults. String values are expanded from
    /// the process environment, then `KIBRA_API_URL` and `KIBRA_TOKEN`
    /// override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut config = Self::parse(&content, |name| std::env::var(name).ok())?;

        if let Ok(api_url) = std::env::var("KIBRA_API_URL") {
            if !api_url.is_empty() {
                config.api_url = api_url;
            }
        }
        if let Ok(token) = std::env::var("KIBRA_TOKEN") {
            config.token = Some(token);
        }
        config.token = config.token.filter(|t| !t.is_empty() && !t.starts_with('$'));

        Ok(config)
    }

    /// Parses TOML `content`, expanding variables through `lookup` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the expanded text is not valid configuration.
    pub fn parse(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, toml::de::Error> {
        toml::from_str(&expand_vars(content, lookup))
    }

    /// Returns the REST client configuration.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.api_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_user_agent(concat!("kibra-cli/", env!("CARGO_PKG_VERSION")))
    }

    /// Returns the verification timeout.
    #[must_use]
    pub const fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string using `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty() && (closed || !braced)) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
