//! The payment confirmation handshake state machine.
//!
//! [`Handshake`] is a sans-IO state machine: the host feeds it browser events
//! and verification results, and it answers each with a [`Directive`] telling
//! the host what to do next. It never performs I/O itself; see
//! [`Checkout`](crate::Checkout) for a driver that runs the verification call.
//!
//! ```text
//!  Idle ──start──▶ AwaitingRedirect ──completion──▶ Verifying ──success──▶ Confirmed
//!                        │                              │
//!                        └──load error──▶ Rejected ◀────┘ failure / error
//! ```
//!
//! Leaving `AwaitingRedirect` is a one-way gate. A redirect chain can fire
//! several completion-matching navigations back to back; only the first one
//! is acted on and every later event is answered with [`Directive::Ignore`].

use url::Url;

use crate::error::{CheckoutError, VerifyError};
use crate::event::{LoadErrorEvent, NavigationEvent};
use crate::patterns::CompletionPatterns;
use crate::reference::resolve_reference;
use crate::session::CheckoutSession;
use crate::verify::{OrderId, VerificationResult};

#[cfg(feature = "telemetry")]
use tracing::{debug, info, warn};

/// Shown when a page fails to load without a browser description.
pub const MSG_PAGE_LOAD_FAILED: &str = "Failed to load payment page";
/// Shown when a completion URL carries no reference and the session has none.
pub const MSG_MISSING_REFERENCE: &str = "No reference found in callback URL";
/// Shown when verification fails without any usable error text.
pub const MSG_VERIFICATION_FAILED: &str = "Payment verification failed";
/// Shown when the user leaves the checkout before it finishes.
pub const MSG_CANCELLED: &str = "Checkout cancelled";

/// Where a handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Browser surface not shown yet.
    Idle,
    /// Browser surface shows the provider checkout; events are processed.
    AwaitingRedirect,
    /// A completion signal was seen; the verification call is in flight.
    Verifying {
        /// Reference being verified.
        reference: String,
    },
    /// Terminal: the backend confirmed the payment.
    Confirmed {
        /// Order created by the payment.
        order_id: OrderId,
    },
    /// Terminal: the checkout failed.
    Rejected(Rejection),
}

impl HandshakeState {
    /// Returns `true` for [`HandshakeState::Confirmed`] and [`HandshakeState::Rejected`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Rejected(_))
    }
}

/// Why a checkout ended without an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The browser failed to load a page unrelated to the callback routes.
    Browser {
        /// Browser-provided description, possibly empty.
        description: String,
    },
    /// A completion signal was seen but no reference could be found.
    MissingReference,
    /// The backend reported the payment as failed.
    Declined {
        /// Server-provided reason.
        message: String,
    },
    /// The verification call itself failed.
    Verification(VerifyError),
    /// The user left the checkout.
    Cancelled,
}

impl Rejection {
    /// Alert title for this rejection.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Browser { .. } => "WebView Error",
            Self::Declined { .. } => "Payment Failed",
            Self::MissingReference | Self::Verification(_) | Self::Cancelled => "Error",
        }
    }

    /// User-visible message for this rejection.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Browser { description } => non_empty_or(description, MSG_PAGE_LOAD_FAILED),
            Self::MissingReference => MSG_MISSING_REFERENCE.to_owned(),
            Self::Declined { message } => message.clone(),
            Self::Verification(err) => match err {
                VerifyError::Server { message, .. } | VerifyError::Transport(message) => {
                    non_empty_or(message, MSG_VERIFICATION_FAILED)
                }
                VerifyError::Timeout(_) => err.to_string(),
            },
            Self::Cancelled => MSG_CANCELLED.to_owned(),
        }
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_owned()
    } else {
        text.to_owned()
    }
}

/// What the host must do after feeding an event into a [`Handshake`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Nothing to do.
    Ignore,
    /// Hide the browser surface and verify `reference`.
    Verify {
        /// Reference to verify.
        reference: String,
    },
    /// Replace the checkout with the order-success view.
    ShowOrderSuccess {
        /// Order to show.
        order_id: OrderId,
    },
    /// Alert the user, then return to the previous view.
    ShowError(Rejection),
}

/// One checkout attempt.
#[derive(Debug, Clone)]
pub struct Handshake {
    session: CheckoutSession,
    authorization_url: Url,
    patterns: CompletionPatterns,
    state: HandshakeState,
}

impl Handshake {
    /// Creates a handshake for `session` using the default completion patterns.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the session's authorization URL is
    /// missing, malformed or not `https`.
    pub fn new(session: CheckoutSession) -> Result<Self, CheckoutError> {
        Self::with_patterns(session, CompletionPatterns::default())
    }

    /// Creates a handshake for `session` with custom completion patterns.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the session's authorization URL is
    /// missing, malformed or not `https`.
    pub fn with_patterns(
        session: CheckoutSession,
        patterns: CompletionPatterns,
    ) -> Result<Self, CheckoutError> {
        let authorization_url = session.authorization_url()?;
        Ok(Self {
            session,
            authorization_url,
            patterns,
            state: HandshakeState::Idle,
        })
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Returns the session this handshake was created for.
    #[must_use]
    pub const fn session(&self) -> &CheckoutSession {
        &self.session
    }

    /// Returns the validated authorization URL.
    #[must_use]
    pub const fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// Returns `true` while browser events are still being processed.
    #[must_use]
    pub const fn is_browser_visible(&self) -> bool {
        matches!(self.state, HandshakeState::AwaitingRedirect)
    }

    /// Marks the browser surface ready and returns the URL it must load.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadyStarted`] unless the handshake is `Idle`.
    pub fn start(&mut self) -> Result<&Url, CheckoutError> {
        if self.state != HandshakeState::Idle {
            return Err(CheckoutError::AlreadyStarted);
        }
        self.state = HandshakeState::AwaitingRedirect;
        #[cfg(feature = "telemetry")]
        info!(
            url = %self.authorization_url,
            cart_id = ?self.session.cart_id,
            "Checkout started"
        );
        Ok(&self.authorization_url)
    }

    /// Handles a browser location change.
    pub fn on_navigation(&mut self, event: &NavigationEvent) -> Directive {
        if !self.is_browser_visible() {
            return Directive::Ignore;
        }
        #[cfg(feature = "telemetry")]
        debug!(url = %event.url, "Checkout navigation");

        if !self.patterns.is_completion(&event.url) {
            return Directive::Ignore;
        }
        self.complete(&event.url)
    }

    /// Handles a failed page load.
    ///
    /// A 404 on a backend callback route means the redirect reached the
    /// backend even though the route is unreachable from the device, and is
    /// treated as a completion signal. Every other load failure ends the
    /// checkout.
    pub fn on_load_error(&mut self, event: &LoadErrorEvent) -> Directive {
        if !self.is_browser_visible() {
            return Directive::Ignore;
        }
        #[cfg(feature = "telemetry")]
        warn!(
            url = %event.url,
            status = ?event.status_code,
            description = %event.description,
            "Checkout page failed to load"
        );

        if event.is_not_found() && self.patterns.is_callback(&event.url) {
            return self.complete(&event.url);
        }
        self.reject(Rejection::Browser {
            description: event.description.clone(),
        })
    }

    /// Records the outcome of the verification call requested by
    /// [`Directive::Verify`].
    pub fn on_verification(
        &mut self,
        outcome: Result<VerificationResult, VerifyError>,
    ) -> Directive {
        if !matches!(self.state, HandshakeState::Verifying { .. }) {
            return Directive::Ignore;
        }
        match outcome {
            Ok(VerificationResult::Success { order_id }) => {
                #[cfg(feature = "telemetry")]
                info!(%order_id, "Payment confirmed");
                self.state = HandshakeState::Confirmed { order_id };
                Directive::ShowOrderSuccess { order_id }
            }
            Ok(VerificationResult::Failure { error_message }) => self.reject(Rejection::Declined {
                message: error_message,
            }),
            Err(err) => self.reject(Rejection::Verification(err)),
        }
    }

    /// Ends a checkout the user walked away from.
    ///
    /// Returns `false` if the handshake had already reached a terminal state.
    pub fn abandon(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = HandshakeState::Rejected(Rejection::Cancelled);
        true
    }

    fn complete(&mut self, url: &str) -> Directive {
        match resolve_reference(url, self.session.fallback_reference()) {
            Some(reference) => {
                #[cfg(feature = "telemetry")]
                info!(%reference, "Completion detected, verifying payment");
                self.state = HandshakeState::Verifying {
                    reference: reference.clone(),
                };
                Directive::Verify { reference }
            }
            None => self.reject(Rejection::MissingReference),
        }
    }

    fn reject(&mut self, rejection: Rejection) -> Directive {
        #[cfg(feature = "telemetry")]
        warn!(reason = %rejection.message(), "Checkout rejected");
        self.state = HandshakeState::Rejected(rejection.clone());
        Directive::ShowError(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const CALLBACK: &str = "https://api.kibra.example/api/payments/callback/";

    fn started(reference: Option<&str>) -> Handshake {
        let mut session = CheckoutSession::new("https://checkout.paystack.com/abc", "");
        session.reference = reference.map(ToOwned::to_owned);
        let mut handshake = Handshake::new(session).unwrap();
        handshake.start().unwrap();
        handshake
    }

    #[test]
    fn test_new_rejects_insecure_url() {
        let session = CheckoutSession::new("http://checkout.paystack.com/abc", "r");
        assert!(matches!(
            Handshake::new(session),
            Err(CheckoutError::InsecureAuthorizationUrl { .. })
        ));
    }

    #[test]
    fn test_start_only_once() {
        let mut handshake = started(Some("r"));
        assert_eq!(handshake.start(), Err(CheckoutError::AlreadyStarted));
    }

    #[test]
    fn test_events_ignored_before_start() {
        let session = CheckoutSession::new("https://checkout.paystack.com/abc", "r");
        let mut handshake = Handshake::new(session).unwrap();
        let directive = handshake.on_navigation(&NavigationEvent::new(
            "https://a.example/?success=true",
        ));
        assert_eq!(directive, Directive::Ignore);
        assert_eq!(handshake.state(), &HandshakeState::Idle);
    }

    #[test]
    fn test_non_matching_navigation_is_ignored() {
        let mut handshake = started(Some("r"));
        let directive =
            handshake.on_navigation(&NavigationEvent::new("https://checkout.paystack.com/abc/card"));
        assert_eq!(directive, Directive::Ignore);
        assert_eq!(handshake.state(), &HandshakeState::AwaitingRedirect);
    }

    #[test]
    fn test_success_marker_verifies_exactly_once() {
        let mut handshake = started(Some("fallback"));
        let urls = [
            "https://api.kibra.example/return?success=true&reference=first",
            "https://api.kibra.example/return?success=true&reference=second",
            "https://api.kibra.example/return?success=true",
        ];
        let directives: Vec<_> = urls
            .iter()
            .map(|u| handshake.on_navigation(&NavigationEvent::new(*u)))
            .collect();
        assert_eq!(
            directives,
            vec![
                Directive::Verify {
                    reference: "first".to_owned()
                },
                Directive::Ignore,
                Directive::Ignore,
            ]
        );
        assert_eq!(
            handshake.state(),
            &HandshakeState::Verifying {
                reference: "first".to_owned()
            }
        );
    }

    #[test]
    fn test_reference_from_marketplace_callback() {
        let mut handshake = started(Some("fallback"));
        let directive = handshake.on_navigation(&NavigationEvent::new(
            "https://api.kibra.example/api/marketplace/payments/callback/?reference=abc123&foo=bar",
        ));
        assert_eq!(
            directive,
            Directive::Verify {
                reference: "abc123".to_owned()
            }
        );
    }

    #[test]
    fn test_missing_reference_rejects() {
        let mut handshake = started(None);
        let directive = handshake.on_navigation(&NavigationEvent::new("https://paystack.co/success"));
        assert_eq!(directive, Directive::ShowError(Rejection::MissingReference));
        assert_eq!(Rejection::MissingReference.message(), MSG_MISSING_REFERENCE);
        assert!(handshake.state().is_terminal());
    }

    #[test]
    fn test_callback_404_falls_back_to_session_reference() {
        let mut handshake = started(Some("session-ref"));
        let directive =
            handshake.on_load_error(&LoadErrorEvent::new(CALLBACK, Some(404), "Not Found"));
        assert_eq!(
            directive,
            Directive::Verify {
                reference: "session-ref".to_owned()
            }
        );
    }

    #[test]
    fn test_callback_404_prefers_url_reference() {
        let mut handshake = started(Some("session-ref"));
        let url = format!("{CALLBACK}?reference=from-url");
        let directive = handshake.on_load_error(&LoadErrorEvent::new(url, Some(404), "Not Found"));
        assert_eq!(
            directive,
            Directive::Verify {
                reference: "from-url".to_owned()
            }
        );
    }

    #[test]
    fn test_callback_non_404_is_browser_error() {
        let mut handshake = started(Some("r"));
        let directive =
            handshake.on_load_error(&LoadErrorEvent::new(CALLBACK, Some(502), "Bad Gateway"));
        assert_eq!(
            directive,
            Directive::ShowError(Rejection::Browser {
                description: "Bad Gateway".to_owned()
            })
        );
    }

    #[test]
    fn test_unrelated_500_rejects_without_verification() {
        let mut handshake = started(Some("r"));
        let directive = handshake.on_load_error(&LoadErrorEvent::new(
            "https://checkout.paystack.com/abc/assets.js",
            Some(500),
            "Internal Server Error",
        ));
        let Directive::ShowError(rejection) = directive else {
            panic!("expected rejection, got {directive:?}");
        };
        assert_eq!(rejection.title(), "WebView Error");
        assert_eq!(rejection.message(), "Internal Server Error");
        assert!(matches!(handshake.state(), HandshakeState::Rejected(_)));
    }

    #[test]
    fn test_unrelated_404_is_not_a_completion() {
        let mut handshake = started(Some("r"));
        let directive = handshake.on_load_error(&LoadErrorEvent::new(
            "https://checkout.paystack.com/missing",
            Some(404),
            "",
        ));
        let Directive::ShowError(rejection) = directive else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.message(), MSG_PAGE_LOAD_FAILED);
    }

    #[test]
    fn test_success_result_confirms() {
        let mut handshake = started(Some("r"));
        handshake.on_navigation(&NavigationEvent::new("kibraconnect://payment-callback"));
        let directive = handshake.on_verification(Ok(VerificationResult::success(42)));
        assert_eq!(
            directive,
            Directive::ShowOrderSuccess {
                order_id: OrderId(42)
            }
        );
        assert_eq!(
            handshake.state(),
            &HandshakeState::Confirmed {
                order_id: OrderId(42)
            }
        );
    }

    #[test]
    fn test_failure_result_surfaces_server_text() {
        let mut handshake = started(Some("r"));
        handshake.on_navigation(&NavigationEvent::new("kibraconnect://payment-callback"));
        let directive = handshake.on_verification(Ok(VerificationResult::failure("card declined")));
        let Directive::ShowError(rejection) = directive else {
            panic!("expected rejection");
        };
        assert_eq!(rejection.title(), "Payment Failed");
        assert_eq!(rejection.message(), "card declined");
    }

    #[test]
    fn test_verification_error_messages() {
        let server = Rejection::Verification(VerifyError::Server {
            status: 400,
            message: "reference not found".to_owned(),
        });
        assert_eq!(server.message(), "reference not found");

        let transport = Rejection::Verification(VerifyError::Transport("connection reset".to_owned()));
        assert_eq!(transport.message(), "connection reset");

        let blank = Rejection::Verification(VerifyError::Transport(String::new()));
        assert_eq!(blank.message(), MSG_VERIFICATION_FAILED);

        let timeout = Rejection::Verification(VerifyError::Timeout(Duration::from_secs(30)));
        assert_eq!(timeout.message(), "Payment verification timed out after 30s");
    }

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let mut handshake = started(Some("r"));
        handshake.on_navigation(&NavigationEvent::new("https://paystack.co/success"));
        handshake.on_verification(Ok(VerificationResult::success(7)));

        assert_eq!(
            handshake.on_navigation(&NavigationEvent::new("https://paystack.co/success")),
            Directive::Ignore
        );
        assert_eq!(
            handshake.on_load_error(&LoadErrorEvent::new(CALLBACK, Some(404), "")),
            Directive::Ignore
        );
        assert_eq!(
            handshake.on_verification(Ok(VerificationResult::success(8))),
            Directive::Ignore
        );
        assert_eq!(
            handshake.state(),
            &HandshakeState::Confirmed { order_id: OrderId(7) }
        );
    }

    #[test]
    fn test_verification_result_without_request_is_ignored() {
        let mut handshake = started(Some("r"));
        assert_eq!(
            handshake.on_verification(Ok(VerificationResult::success(1))),
            Directive::Ignore
        );
        assert_eq!(handshake.state(), &HandshakeState::AwaitingRedirect);
    }

    #[test]
    fn test_abandon() {
        let mut handshake = started(Some("r"));
        assert!(handshake.abandon());
        assert_eq!(
            handshake.state(),
            &HandshakeState::Rejected(Rejection::Cancelled)
        );
        assert!(!handshake.abandon());
        assert_eq!(
            handshake.on_navigation(&NavigationEvent::new("https://paystack.co/success")),
            Directive::Ignore
        );
    }
}
