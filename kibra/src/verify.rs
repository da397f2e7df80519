//! Payment verification results and the verifier seam.
//!
//! The backend's verification endpoint is the single source of truth for a
//! payment outcome. [`PaymentVerifier`] abstracts that call so the handshake
//! driver can run against the HTTP implementation in `kibra-http` or a test
//! double.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::error::VerifyError;

/// Status string the backend uses for a confirmed payment.
pub const STATUS_SUCCESS: &str = "success";

/// Message used when the backend rejects a payment without explaining why.
pub const UNKNOWN_FAILURE: &str = "Unknown failure.";

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identifier of an order created by a confirmed payment.
///
/// The backend serializes it as a JSON number; string-encoded ids are
/// accepted too.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Authoritative outcome of a payment, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The payment went through and an order was created.
    Success {
        /// The new order.
        order_id: OrderId,
    },
    /// The payment was declined or could not be matched.
    Failure {
        /// User-visible reason.
        error_message: String,
    },
}

impl VerificationResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(order_id: impl Into<OrderId>) -> Self {
        Self::Success {
            order_id: order_id.into(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(error_message: impl Into<String>) -> Self {
        Self::Failure {
            error_message: error_message.into(),
        }
    }

    /// Returns `true` for [`VerificationResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Wire body returned by the verification endpoint.
///
/// `{ "status": "success", "order_id": 42 }` on success,
/// `{ "status": "failure", "error": "card declined" }` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    /// Outcome status. Anything other than `"success"` is a rejection.
    #[serde(default)]
    pub status: String,

    /// Order created by the payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,

    /// Server-provided failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TryFrom<VerifyPaymentResponse> for VerificationResult {
    type Error = VerifyError;

    fn try_from(body: VerifyPaymentResponse) -> Result<Self, Self::Error> {
        if body.status == STATUS_SUCCESS {
            return body
                .order_id
                .map(Self::success)
                .ok_or_else(|| {
                    VerifyError::transport("verification succeeded without an order_id")
                });
        }
        let error_message = body
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| UNKNOWN_FAILURE.to_owned());
        Ok(Self::Failure { error_message })
    }
}

/// Asks the backend for the outcome of a payment.
///
/// Implementations must not retry on their own; a failed call is terminal
/// for the handshake that issued it.
pub trait PaymentVerifier: Send + Sync {
    /// Verifies the payment identified by `reference`.
    ///
    /// An explicit rejection from the backend is `Ok(VerificationResult::Failure)`;
    /// `Err` means no authoritative answer could be obtained.
    fn verify<'a>(
        &'a self,
        reference: &'a str,
    ) -> BoxFuture<'a, Result<VerificationResult, VerifyError>>;
}

impl<T: PaymentVerifier + ?Sized> PaymentVerifier for &T {
    fn verify<'a>(
        &'a self,
        reference: &'a str,
    ) -> BoxFuture<'a, Result<VerificationResult, VerifyError>> {
        (**self).verify(reference)
    }
}

impl<T: PaymentVerifier + ?Sized> PaymentVerifier for std::sync::Arc<T> {
    fn verify<'a>(
        &'a self,
        reference: &'a str,
    ) -> BoxFuture<'a, Result<VerificationResult, VerifyError>> {
        (**self).verify(reference)
    }
}

impl<T: PaymentVerifier + ?Sized> PaymentVerifier for Box<T> {
    fn verify<'a>(
        &'a self,
        reference: &'a str,
    ) -> BoxFuture<'a, Result<VerificationResult, VerifyError>> {
        (**self).verify(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_body() {
        let body: VerifyPaymentResponse =
            serde_json::from_str(r#"{"status":"success","order_id":42}"#).unwrap();
        assert_eq!(
            VerificationResult::try_from(body).unwrap(),
            VerificationResult::success(42)
        );
    }

    #[test]
    fn test_success_body_with_string_order_id() {
        let body: VerifyPaymentResponse =
            serde_json::from_str(r#"{"status":"success","order_id":"1007"}"#).unwrap();
        assert_eq!(body.order_id, Some(OrderId(1007)));
    }

    #[test]
    fn test_success_without_order_id_is_an_error() {
        let body = VerifyPaymentResponse {
            status: STATUS_SUCCESS.to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            VerificationResult::try_from(body),
            Err(VerifyError::Transport(_))
        ));
    }

    #[test]
    fn test_failure_body_keeps_server_text() {
        let body: VerifyPaymentResponse =
            serde_json::from_str(r#"{"status":"failure","error":"card declined"}"#).unwrap();
        assert_eq!(
            VerificationResult::try_from(body).unwrap(),
            VerificationResult::failure("card declined")
        );
    }

    #[test]
    fn test_other_status_without_error_text() {
        let body: VerifyPaymentResponse =
            serde_json::from_str(r#"{"status":"abandoned"}"#).unwrap();
        assert_eq!(
            VerificationResult::try_from(body).unwrap(),
            VerificationResult::failure(UNKNOWN_FAILURE)
        );
    }

    #[test]
    fn test_status_match_is_exact() {
        let body: VerifyPaymentResponse =
            serde_json::from_str(r#"{"status":"Success","order_id":1}"#).unwrap();
        assert!(!VerificationResult::try_from(body).unwrap().is_success());
    }
}
