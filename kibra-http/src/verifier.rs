//! [`PaymentVerifier`] backed by the KibraConnect payment verification
//! endpoint.

use kibra::VerifyError;
use kibra::verify::{BoxFuture, PaymentVerifier, VerificationResult};

use crate::client::ApiClient;
use crate::error::ApiError;

/// Verifies payments through [`ApiClient::verify_payment`].
///
/// A 2xx body is taken at its word: `"success"` with an order id confirms the
/// order, any other status is a decline. Error responses that carry an
/// `error` or `detail` message become [`VerifyError::Server`], everything
/// else is a [`VerifyError::Transport`].
#[derive(Debug, Clone)]
pub struct HttpPaymentVerifier {
    client: ApiClient,
}

impl HttpPaymentVerifier {
    /// Creates a verifier using `client` and its session.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl From<ApiClient> for HttpPaymentVerifier {
    fn from(client: ApiClient) -> Self {
        Self::new(client)
    }
}

impl PaymentVerifier for HttpPaymentVerifier {
    fn verify<'a>(
        &'a self,
        reference: &'a str,
    ) -> BoxFuture<'a, Result<VerificationResult, VerifyError>> {
        Box::pin(async move {
            match self.client.verify_payment(reference).await {
                Ok(body) => VerificationResult::try_from(body),
                Err(err) => Err(to_verify_error(&err)),
            }
        })
    }
}

fn to_verify_error(err: &ApiError) -> VerifyError {
    match (err.status(), err.server_message()) {
        (Some(status), Some(message)) => VerifyError::Server {
            status: status.as_u16(),
            message,
        },
        _ => VerifyError::transport(err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kibra::OrderId;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::ApiConfig;
    use crate::session::Session;

    async fn verifier_with(response: ResponseTemplate) -> (MockServer, HttpPaymentVerifier) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/marketplace/payments/verify/"))
            .and(query_param("reference", "ref-1"))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        let client = ApiClient::new(
            ApiConfig::new(format!("{}/api/", server.uri())),
            Arc::new(Session::with_token("tok")),
        )
        .unwrap();
        (server, HttpPaymentVerifier::new(client))
    }

    #[tokio::test]
    async fn test_success_with_order_id() {
        let (_server, verifier) = verifier_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "success", "order_id": "42"})),
        )
        .await;
        let result = verifier.verify("ref-1").await.unwrap();
        assert_eq!(
            result,
            VerificationResult::Success {
                order_id: OrderId(42)
            }
        );
    }

    #[tokio::test]
    async fn test_failure_body_is_decline() {
        let (_server, verifier) = verifier_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "failed", "error": "card declined"})),
        )
        .await;
        let result = verifier.verify("ref-1").await.unwrap();
        assert_eq!(result, VerificationResult::failure("card declined"));
    }

    #[tokio::test]
    async fn test_error_status_with_message_is_server_error() {
        let (_server, verifier) = verifier_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "card declined"})),
        )
        .await;
        let err = verifier.verify("ref-1").await.unwrap_err();
        assert_eq!(
            err,
            VerifyError::Server {
                status: 400,
                message: "card declined".to_owned()
            }
        );
        assert_eq!(err.to_string(), "card declined");
    }

    #[tokio::test]
    async fn test_error_status_without_message_is_transport() {
        let (_server, verifier) =
            verifier_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
                .await;
        let err = verifier.verify("ref-1").await.unwrap_err();
        assert!(matches!(err, VerifyError::Transport(_)));
    }

    #[tokio::test]
    async fn test_success_without_order_id_is_transport() {
        let (_server, verifier) = verifier_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
        )
        .await;
        let err = verifier.verify("ref-1").await.unwrap_err();
        assert!(matches!(err, VerifyError::Transport(_)));
    }
}
