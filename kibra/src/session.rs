//! Checkout session input.
//!
//! The backend creates a checkout session when the user initiates payment
//! for a cart. The session is handed to the client once, used for a single
//! handshake, and discarded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CheckoutError;

/// A payment session issued by the backend for one cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Provider-hosted checkout page the browser surface must load.
    #[serde(default)]
    pub authorization_url: Option<String>,

    /// Transaction reference issued with the session. Used only when the
    /// completion URL does not carry its own `reference` parameter.
    #[serde(default)]
    pub reference: Option<String>,

    /// Cart being paid for.
    #[serde(default)]
    pub cart_id: Option<u64>,

    /// Total shown to the user while the checkout page loads.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub expected_total: Option<Decimal>,
}

impl CheckoutSession {
    /// Creates a session for the given authorization URL and reference.
    #[must_use]
    pub fn new(authorization_url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            authorization_url: Some(authorization_url.into()),
            reference: Some(reference.into()),
            cart_id: None,
            expected_total: None,
        }
    }

    /// Sets the cart identifier.
    #[must_use]
    pub const fn with_cart(mut self, cart_id: u64) -> Self {
        self.cart_id = Some(cart_id);
        self
    }

    /// Sets the display total.
    #[must_use]
    pub const fn with_total(mut self, total: Decimal) -> Self {
        self.expected_total = Some(total);
        self
    }

    /// Returns the fallback reference, treating an empty string as absent.
    #[must_use]
    pub fn fallback_reference(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.is_empty())
    }

    /// Checks that the authorization URL is present, well formed and uses
    /// `https`, and returns it parsed.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] describing why the URL cannot be loaded.
    pub fn authorization_url(&self) -> Result<Url, CheckoutError> {
        let raw = self
            .authorization_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(CheckoutError::MissingAuthorizationUrl)?;

        let url = Url::parse(raw).map_err(|e| CheckoutError::InvalidAuthorizationUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "https" {
            return Err(CheckoutError::InsecureAuthorizationUrl {
                scheme: url.scheme().to_owned(),
            });
        }
        if url.host_str().is_none() {
            return Err(CheckoutError::InvalidAuthorizationUrl {
                url: raw.to_owned(),
                reason: "missing host".to_owned(),
            });
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_authorization_url_accepts_https() {
        let session = CheckoutSession::new("https://checkout.paystack.com/abc", "ref-1");
        let url = session.authorization_url().unwrap();
        assert_eq!(url.host_str(), Some("checkout.paystack.com"));
    }

    #[test]
    fn test_authorization_url_missing() {
        let session = CheckoutSession::default();
        assert_eq!(
            session.authorization_url(),
            Err(CheckoutError::MissingAuthorizationUrl)
        );

        let blank = CheckoutSession::new("   ", "ref-1");
        assert_eq!(
            blank.authorization_url(),
            Err(CheckoutError::MissingAuthorizationUrl)
        );
    }

    #[test]
    fn test_authorization_url_rejects_plain_http() {
        let session = CheckoutSession::new("http://checkout.paystack.com/abc", "ref-1");
        assert_eq!(
            session.authorization_url(),
            Err(CheckoutError::InsecureAuthorizationUrl {
                scheme: "http".to_owned()
            })
        );
    }

    #[test]
    fn test_authorization_url_rejects_garbage() {
        let session = CheckoutSession::new("not a url", "ref-1");
        assert!(matches!(
            session.authorization_url(),
            Err(CheckoutError::InvalidAuthorizationUrl { .. })
        ));
    }

    #[test]
    fn test_fallback_reference_ignores_empty() {
        let mut session = CheckoutSession::new("https://example.com", "");
        assert_eq!(session.fallback_reference(), None);
        session.reference = Some("abc".to_owned());
        assert_eq!(session.fallback_reference(), Some("abc"));
    }

    #[test]
    fn test_deserialize_from_route_params() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{
                "authorizationUrl": "https://checkout.paystack.com/xyz",
                "reference": "T12345",
                "cartId": 9,
                "expectedTotal": "1500.50"
            }"#,
        )
        .unwrap();
        assert_eq!(session.cart_id, Some(9));
        assert_eq!(
            session.expected_total,
            Some(Decimal::from_str("1500.50").unwrap())
        );
        assert_eq!(session.fallback_reference(), Some("T12345"));
    }
}
