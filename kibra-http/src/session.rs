//! Session credentials and the bearer-token middleware.
//!
//! The access token lives in a [`Session`] that the application creates and
//! injects into the client at construction. [`BearerAuth`] reads it on every
//! request, so logging in or out through any clone of the client takes
//! effect immediately. There is no automatic refresh: a rejected token comes
//! back to the caller as a 401.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use http::Extensions;
use http::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;

#[cfg(feature = "telemetry")]
use tracing::trace;

/// Credentials shared by every request of a client.
#[derive(Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    /// Creates an anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    /// Returns the current access token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the access token. Empty tokens clear the session.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            (!token.is_empty()).then_some(token);
    }

    /// Forgets the access token.
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns `true` if a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Middleware that sets `Authorization: Bearer <token>` from a [`Session`].
///
/// Requests go out unauthenticated while the session holds no token.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    session: Arc<Session>,
}

impl BearerAuth {
    /// Creates the middleware for `session`.
    #[must_use]
    pub const fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl rqm::Middleware for BearerAuth {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| rqm::Error::Middleware(e.into()))?;
            value.set_sensitive(true);
            req.headers_mut().insert(AUTHORIZATION, value);
            #[cfg(feature = "telemetry")]
            trace!(url = %req.url(), "Attached bearer token");
        }
        next.run(req, extensions).await
    }
}
