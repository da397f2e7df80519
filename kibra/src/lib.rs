#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for KibraConnect clients.
//!
//! This crate holds everything a client needs that does not touch the network
//! directly: the platform data model, and the payment confirmation handshake
//! that turns a provider-hosted checkout into a verified order.
//!
//! # Overview
//!
//! A checkout starts server-side, which hands the client a [`CheckoutSession`]
//! containing the provider's authorization URL. The client shows that URL in
//! an embedded browser and feeds every navigation and load-error event into a
//! [`Handshake`]. Once an event matches one of the [`CompletionPatterns`], the
//! handshake extracts the transaction reference and asks a [`PaymentVerifier`]
//! for the authoritative outcome, exactly once.
//!
//! # Modules
//!
//! - [`session`] - Checkout session input and its validation
//! - [`event`] - Browser navigation and load-error events
//! - [`patterns`] - Completion URL patterns
//! - [`reference`] - Transaction reference extraction
//! - [`handshake`] - The handshake state machine
//! - [`verify`] - Verification results and the [`PaymentVerifier`] seam
//! - [`checkout`] - Async driver running a handshake against a verifier
//! - [`hooks`] - Lifecycle hooks for observing checkout transitions
//! - [`model`] - Accounts, feed and marketplace wire types
//! - [`error`] - Error types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod checkout;
pub mod error;
pub mod event;
pub mod handshake;
pub mod hooks;
pub mod model;
pub mod patterns;
pub mod reference;
pub mod session;
pub mod verify;

pub use checkout::{Checkout, Outcome};
pub use error::{CheckoutError, VerifyError};
pub use event::{BrowserEvent, LoadErrorEvent, NavigationEvent};
pub use handshake::{Directive, Handshake, HandshakeState, Rejection};
pub use patterns::CompletionPatterns;
pub use session::CheckoutSession;
pub use verify::{OrderId, PaymentVerifier, VerificationResult};
