//! Async driver for a checkout handshake.
//!
//! [`Checkout`] owns a [`Handshake`] and a [`PaymentVerifier`]. Browser event
//! handlers call into it and await the returned [`Outcome`]; when an event
//! completes the provider flow, the verification request runs inline, bounded
//! by a timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{CheckoutError, VerifyError};
use crate::event::{BrowserEvent, LoadErrorEvent, NavigationEvent};
use crate::handshake::{Directive, Handshake, HandshakeState, Rejection};
use crate::hooks::CheckoutHooks;
use crate::session::CheckoutSession;
use crate::verify::{OrderId, PaymentVerifier};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// What the host should do after an event was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The checkout is still in progress; keep the browser surface up.
    Pending,
    /// The event arrived after the checkout left the browser stage and had no effect.
    Ignored,
    /// Navigate to the order-success view.
    Confirmed {
        /// Order created by the payment.
        order_id: OrderId,
    },
    /// Show an alert, then return to the previous view.
    Rejected {
        /// Alert title.
        title: &'static str,
        /// Alert message.
        message: String,
    },
}

impl From<&Rejection> for Outcome {
    fn from(rejection: &Rejection) -> Self {
        Self::Rejected {
            title: rejection.title(),
            message: rejection.message(),
        }
    }
}

/// A checkout handshake wired to a verifier.
pub struct Checkout<V> {
    handshake: Handshake,
    verifier: V,
    timeout: Duration,
    hooks: Vec<Arc<dyn CheckoutHooks>>,
}

impl<V> fmt::Debug for Checkout<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("handshake", &self.handshake)
            .field("timeout", &self.timeout)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<V: PaymentVerifier> Checkout<V> {
    /// Default upper bound on the verification request.
    pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a checkout for `session` with the default completion patterns.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the session cannot start a handshake.
    pub fn new(session: CheckoutSession, verifier: V) -> Result<Self, CheckoutError> {
        Ok(Self::from_handshake(Handshake::new(session)?, verifier))
    }

    /// Wraps an existing handshake.
    pub fn from_handshake(handshake: Handshake, verifier: V) -> Self {
        Self {
            handshake,
            verifier,
            timeout: Self::DEFAULT_VERIFY_TIMEOUT,
            hooks: Vec::new(),
        }
    }

    /// Sets the verification timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers a lifecycle hook.
    #[must_use]
    pub fn with_hook(mut self, hook: impl CheckoutHooks + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Returns the current handshake state.
    #[must_use]
    pub const fn state(&self) -> &HandshakeState {
        self.handshake.state()
    }

    /// Returns the underlying handshake.
    #[must_use]
    pub const fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Marks the browser surface ready and returns the URL it must load.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadyStarted`] if called twice.
    pub fn start(&mut self) -> Result<Url, CheckoutError> {
        self.handshake.start().cloned()
    }

    /// Handles a browser location change.
    pub async fn on_navigation(&mut self, event: &NavigationEvent) -> Outcome {
        let directive = self.handshake.on_navigation(event);
        self.apply(directive).await
    }

    /// Handles a failed page load.
    pub async fn on_load_error(&mut self, event: &LoadErrorEvent) -> Outcome {
        let directive = self.handshake.on_load_error(event);
        self.apply(directive).await
    }

    /// Handles either kind of browser event.
    pub async fn on_event(&mut self, event: &BrowserEvent) -> Outcome {
        match event {
            BrowserEvent::Navigation(nav) => self.on_navigation(nav).await,
            BrowserEvent::LoadError(err) => self.on_load_error(err).await,
        }
    }

    /// Ends the checkout because the user left it.
    ///
    /// Returns the rejection outcome, or [`Outcome::Ignored`] if the checkout
    /// had already finished.
    pub async fn abandon(&mut self) -> Outcome {
        if !self.handshake.abandon() {
            return Outcome::Ignored;
        }
        self.finish(Directive::ShowError(Rejection::Cancelled)).await
    }

    async fn apply(&mut self, directive: Directive) -> Outcome {
        match directive {
            Directive::Verify { reference } => {
                let next = self.verify(&reference).await;
                self.finish(next).await
            }
            other => self.finish(other).await,
        }
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "kibra.checkout.verify", skip(self), fields(timeout = ?self.timeout))
    )]
    async fn verify(&mut self, reference: &str) -> Directive {
        for hook in &self.hooks {
            hook.on_verifying(reference).await;
        }
        let result = tokio::time::timeout(self.timeout, self.verifier.verify(reference))
            .await
            .unwrap_or(Err(VerifyError::Timeout(self.timeout)));
        self.handshake.on_verification(result)
    }

    async fn finish(&self, directive: Directive) -> Outcome {
        match directive {
            Directive::Ignore => {
                if self.handshake.is_browser_visible() {
                    Outcome::Pending
                } else {
                    Outcome::Ignored
                }
            }
            Directive::ShowOrderSuccess { order_id } => {
                for hook in &self.hooks {
                    hook.on_confirmed(order_id).await;
                }
                Outcome::Confirmed { order_id }
            }
            Directive::ShowError(rejection) => {
                for hook in &self.hooks {
                    hook.on_rejected(&rejection).await;
                }
                Outcome::from(&rejection)
            }
            // `apply` resolves verification before calling here.
            Directive::Verify { .. } => Outcome::Pending,
        }
    }
}
