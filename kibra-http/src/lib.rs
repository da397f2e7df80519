#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP client for the KibraConnect REST API.
//!
//! Provides an authenticated [`ApiClient`] covering accounts, profiles, the
//! feed and the marketplace, plus [`HttpPaymentVerifier`], which plugs the
//! payment verification endpoint into a [`kibra::Checkout`].
//!
//! # Modules
//!
//! - [`constants`] - Endpoint paths and client defaults
//! - [`session`] - Shared access token and the bearer-token middleware
//! - [`client`] - The REST client
//! - [`verifier`] - Payment verification over HTTP
//! - [`error`] - HTTP error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kibra::{Checkout, CheckoutSession};
//! use kibra_http::{ApiClient, ApiConfig, HttpPaymentVerifier, Session};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ApiConfig::default(), Arc::new(Session::new()))?;
//! client.login("amina@kibra.example", "secret").await?;
//!
//! let session = CheckoutSession::new("https://checkout.paystack.com/abc", "ref-1");
//! let mut checkout = Checkout::new(session, HttpPaymentVerifier::new(client))?;
//! let url = checkout.start()?;
//! // show `url` in a browser and feed its events to `checkout`
//! # let _ = url;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod client;
pub mod constants;
pub mod error;
pub mod session;
pub mod verifier;

pub use client::{ApiClient, ApiConfig};
pub use error::ApiError;
pub use session::{BearerAuth, Session};
pub use verifier::HttpPaymentVerifier;
