//! Lifecycle hooks for checkout handshakes.
//!
//! Hooks observe the transitions a [`Checkout`](crate::Checkout) goes
//! through, e.g. to record analytics or persist the pending reference so a
//! crashed app can ask the backend about it later. They cannot alter the
//! outcome.
//!
//! All methods have default no-op implementations. Multiple hooks run in
//! registration order.

use crate::handshake::Rejection;
use crate::verify::{BoxFuture, OrderId};

/// Observer for checkout lifecycle transitions.
pub trait CheckoutHooks: Send + Sync {
    /// Called right before the verification request is sent.
    fn on_verifying<'a>(&'a self, _reference: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// Called once the backend confirmed the payment.
    fn on_confirmed(&self, _order_id: OrderId) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }

    /// Called once the checkout ended without an order.
    fn on_rejected<'a>(&'a self, _rejection: &'a Rejection) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}
