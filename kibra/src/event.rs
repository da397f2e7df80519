//! Events emitted by the embedded browser surface.
//!
//! Both event types are transient: the host constructs one per browser
//! callback and hands it to the handshake, which never stores it.

use serde::{Deserialize, Serialize};

/// HTTP status reported by a browser when the callback route is unreachable.
pub const STATUS_NOT_FOUND: u16 = 404;

/// The browser surface changed location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    /// The new location.
    pub url: String,
}

impl NavigationEvent {
    /// Creates a navigation event for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// The browser surface failed to load a page.
///
/// Covers both transport failures (no status code) and HTTP error pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadErrorEvent {
    /// The URL that failed to load.
    pub url: String,

    /// HTTP status of the failed load, if the failure was an HTTP error.
    #[serde(default)]
    pub status_code: Option<u16>,

    /// Browser-provided description of the failure.
    #[serde(default)]
    pub description: String,
}

impl LoadErrorEvent {
    /// Creates a load error event.
    #[must_use]
    pub fn new(url: impl Into<String>, status_code: Option<u16>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code,
            description: description.into(),
        }
    }

    /// Returns `true` if the page load failed with HTTP 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(STATUS_NOT_FOUND)
    }
}

/// Either kind of browser event, as recorded by hosts for later replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserEvent {
    /// A location change.
    Navigation(NavigationEvent),
    /// A failed page load.
    LoadError(LoadErrorEvent),
}
