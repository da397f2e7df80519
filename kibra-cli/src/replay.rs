//! Replays recorded browser events through a checkout.
//!
//! Hosts can record the navigation and load-error events their embedded
//! browser emitted during a checkout. Feeding such a recording back through
//! a [`Checkout`] reproduces what the app decided, against a live verifier.

use kibra::checkout::{Checkout, Outcome};
use kibra::handshake::Rejection;
use kibra::hooks::CheckoutHooks;
use kibra::verify::{BoxFuture, OrderId, PaymentVerifier};
use kibra::BrowserEvent;

/// Parses a recording: either a JSON array of events or one event per line.
///
/// Blank lines are skipped in the line-delimited form.
///
/// # Errors
///
/// Returns the first event that fails to parse.
pub fn parse_events(content: &str) -> Result<Vec<BrowserEvent>, serde_json::Error> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed);
    }
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str)
        .collect()
}

/// Summary of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Final outcome of the checkout.
    pub outcome: Outcome,
    /// Events fed to the checkout.
    pub events: usize,
    /// Events that arrived after the checkout had left the browser.
    pub ignored: usize,
    /// Whether the recording ended before the checkout finished.
    pub abandoned: bool,
}

/// Starts `checkout`, feeds it every event, and abandons it if the
/// recording ends while the checkout is still waiting for a redirect.
///
/// # Errors
///
/// Returns an error if the checkout cannot start.
pub async fn replay<V: PaymentVerifier>(
    checkout: &mut Checkout<V>,
    events: &[BrowserEvent],
) -> Result<ReplayReport, kibra::CheckoutError> {
    let url = checkout.start()?;
    tracing::info!(%url, events = events.len(), "Replaying checkout");

    let mut outcome = Outcome::Pending;
    let mut ignored = 0;
    for (index, event) in events.iter().enumerate() {
        match checkout.on_event(event).await {
            Outcome::Ignored => {
                tracing::debug!(index, "Event ignored");
                ignored += 1;
            }
            Outcome::Pending => tracing::debug!(index, "Checkout still pending"),
            terminal => {
                tracing::info!(index, outcome = ?terminal, "Checkout finished");
                outcome = terminal;
            }
        }
    }

    let abandoned = outcome == Outcome::Pending;
    if abandoned {
        tracing::warn!("Recording ended before the checkout finished");
        outcome = checkout.abandon().await;
    }

    Ok(ReplayReport {
        outcome,
        events: events.len(),
        ignored,
        abandoned,
    })
}

/// Logs checkout transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl CheckoutHooks for LoggingHooks {
    fn on_verifying<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            tracing::info!(reference, "Verifying payment");
        })
    }

    fn on_confirmed(&self, order_id: OrderId) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            tracing::info!(%order_id, "Payment confirmed");
        })
    }

    fn on_rejected<'a>(&'a self, rejection: &'a Rejection) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            tracing::warn!(title = rejection.title(), message = %rejection.message(), "Checkout rejected");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kibra::{CheckoutSession, VerificationResult, VerifyError};

    use super::*;

    #[derive(Default)]
    struct FixedVerifier {
        calls: AtomicUsize,
    }

    impl PaymentVerifier for FixedVerifier {
        fn verify<'a>(
            &'a self,
            reference: &'a str,
        ) -> BoxFuture<'a, Result<VerificationResult, VerifyError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if reference == "good" {
                    Ok(VerificationResult::success(7))
                } else {
                    Ok(VerificationResult::failure("card declined"))
                }
            })
        }
    }

    fn checkout(verifier: Arc<FixedVerifier>) -> Checkout<Arc<FixedVerifier>> {
        let session = CheckoutSession::new("https://checkout.paystack.com/abc", "session-ref");
        Checkout::new(session, verifier)
            .unwrap()
            .with_hook(LoggingHooks)
    }

    #[test]
    fn test_parse_json_lines() {
        let events = parse_events(
            r#"
            {"type":"navigation","url":"https://checkout.paystack.com/abc"}

            {"type":"load_error","url":"https://api.kibra.example/api/payments/callback/?reference=x","statusCode":404}
            "#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], BrowserEvent::LoadError(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_parse_json_array() {
        let events = parse_events(r#" [{"type":"navigation","url":"https://a.example/"}]"#).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(parse_events(r#"{"type":"scroll","url":"x"}"#).is_err());
    }

    #[tokio::test]
    async fn test_replay_confirms_once() {
        let verifier = Arc::new(FixedVerifier::default());
        let mut checkout = checkout(Arc::clone(&verifier));
        let events = parse_events(
            r#"[
                {"type":"navigation","url":"https://checkout.paystack.com/abc"},
                {"type":"navigation","url":"kibraconnect://payment-callback?reference=good"},
                {"type":"navigation","url":"kibraconnect://payment-callback?reference=good"}
            ]"#,
        )
        .unwrap();

        let report = replay(&mut checkout, &events).await.unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Confirmed {
                order_id: OrderId(7)
            }
        );
        assert_eq!(report.ignored, 1);
        assert!(!report.abandoned);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replay_declined() {
        let verifier = Arc::new(FixedVerifier::default());
        let mut checkout = checkout(verifier);
        let events = parse_events(
            r#"{"type":"navigation","url":"https://paystack.co/success?reference=bad"}"#,
        )
        .unwrap();

        let report = replay(&mut checkout, &events).await.unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Rejected {
                title: "Payment Failed",
                message: "card declined".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_replay_abandons_unfinished_checkout() {
        let verifier = Arc::new(FixedVerifier::default());
        let mut checkout = checkout(Arc::clone(&verifier));
        let events =
            parse_events(r#"{"type":"navigation","url":"https://checkout.paystack.com/abc/pin"}"#)
                .unwrap();

        let report = replay(&mut checkout, &events).await.unwrap();
        assert!(report.abandoned);
        assert_eq!(
            report.outcome,
            Outcome::Rejected {
                title: "Error",
                message: "Checkout cancelled".to_owned()
            }
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }
}
