//! REST client for the KibraConnect API.
//!
//! [`ApiClient`] wraps a `reqwest` client with the [`BearerAuth`] middleware
//! and exposes one method per backend endpoint the app uses.
//!
//! ## Error Handling
//!
//! Every method returns [`ApiError`]. Non-2xx responses become
//! [`ApiError::HttpStatus`] carrying the raw body, so callers can pull out
//! server-provided messages with [`ApiError::server_message`]. Nothing is
//! retried.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use kibra::model::{
    Acknowledgement, Ad, AuthTokens, Comment, NewProfile, Order, Post, Profile, ProfilePicture,
    ProfileUpdate, User,
};
use kibra::verify::VerifyPaymentResponse;
use reqwest::multipart::{Form, Part};
use reqwest_middleware as rqm;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::constants::{
    ADS_PATH, DEFAULT_API_URL, DEFAULT_TIMEOUT, FORGOT_PASSWORD_PATH, LOGIN_PATH, ORDERS_PATH,
    POSTS_PATH, PROFILE_BY_USER_PATH, PROFILES_PATH, REGISTER_PATH, RESET_PASSWORD_PATH,
    USERS_PATH, VERIFY_EMAIL_PATH, VERIFY_PAYMENT_PATH,
};
use crate::error::ApiError;
use crate::session::{BearerAuth, Session};

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

/// Configuration for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API base URL, e.g. `https://api.kibraconnect.example/api/`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Optional `User-Agent` header value.
    pub user_agent: Option<String>,

    /// Path of the payment verification endpoint, relative to `base_url`.
    pub verify_payment_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            verify_payment_path: VERIFY_PAYMENT_PATH.to_owned(),
        }
    }
}

impl ApiConfig {
    /// Creates a config with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Overrides the payment verification path.
    #[must_use]
    pub fn with_verify_payment_path(mut self, path: impl Into<String>) -> Self {
        self.verify_payment_path = path.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password1: &'a str,
    password2: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyEmailBody<'a> {
    verification_code: &'a str,
}

#[derive(Debug, Serialize)]
struct ForgotPasswordBody<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetPasswordBody<'a> {
    email: &'a str,
    verification_code: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    text: &'a str,
}

/// Client for the KibraConnect REST API.
///
/// Cheap to clone; clones share the connection pool and the [`Session`].
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    verify_payment_url: Url,
    client: rqm::ClientWithMiddleware,
    session: Arc<Session>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client from `config`, attaching tokens from `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: ApiConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        // Url::join drops the last segment of a base without a trailing slash.
        let mut normalized = config.base_url.trim_end_matches('/').to_owned();
        normalized.push('/');
        let base_url = Url::parse(&normalized).map_err(|e| ApiError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        let verify_payment_url =
            base_url
                .join(&config.verify_payment_path)
                .map_err(|e| ApiError::UrlParse {
                    context: "Failed to construct payment verification URL",
                    source: e,
                })?;

        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let inner = builder.build().map_err(|e| ApiError::Http {
            context: "Failed to build HTTP client",
            source: e.into(),
        })?;
        let client = rqm::ClientBuilder::new(inner)
            .with(BearerAuth::new(Arc::clone(&session)))
            .build();

        Ok(Self {
            base_url,
            verify_payment_url,
            client,
            session,
        })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the session whose token is attached to requests.
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Logs in and stores the returned access token in the session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-2xx answer (bad
    /// credentials come back as 400/401), or an unreadable body.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "kibra.api.login",
            skip_all,
            err,
            fields(
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty
            )
        )
    )]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        const CONTEXT: &str = "POST accounts/login/";
        let url = self.endpoint(LOGIN_PATH, CONTEXT)?;
        let req = self.client.post(url).json(&LoginBody { email, password });
        let tokens: AuthTokens = self.send_json(req, CONTEXT).await?;
        self.session.set_token(tokens.access.as_str());
        Ok(tokens)
    }

    /// Forgets the session token. The backend is not contacted.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the backend rejects it.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password1: &str,
        password2: &str,
    ) -> Result<Acknowledgement, ApiError> {
        const CONTEXT: &str = "POST auth/registration/";
        let url = self.endpoint(REGISTER_PATH, CONTEXT)?;
        let req = self.client.post(url).json(&RegisterBody {
            username,
            email,
            password1,
            password2,
        });
        self.send_ack(req, CONTEXT).await
    }

    /// Confirms an email address with the code sent to it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the code is rejected.
    pub async fn verify_email(&self, verification_code: &str) -> Result<Acknowledgement, ApiError> {
        const CONTEXT: &str = "POST auth/verify-email/";
        let url = self.endpoint(VERIFY_EMAIL_PATH, CONTEXT)?;
        let req = self
            .client
            .post(url)
            .json(&VerifyEmailBody { verification_code });
        self.send_ack(req, CONTEXT).await
    }

    /// Requests a password reset code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn forgot_password(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        const CONTEXT: &str = "POST accounts/forgot-password/";
        let url = self.endpoint(FORGOT_PASSWORD_PATH, CONTEXT)?;
        let req = self.client.post(url).json(&ForgotPasswordBody { email });
        self.send_ack(req, CONTEXT).await
    }

    /// Sets a new password using a reset code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the code is rejected.
    pub async fn reset_password(
        &self,
        email: &str,
        verification_code: &str,
        new_password: &str,
    ) -> Result<Acknowledgement, ApiError> {
        const CONTEXT: &str = "POST accounts/reset-password/";
        let url = self.endpoint(RESET_PASSWORD_PATH, CONTEXT)?;
        let req = self.client.post(url).json(&ResetPasswordBody {
            email,
            verification_code,
            new_password,
        });
        self.send_ack(req, CONTEXT).await
    }

    /// Fetches a user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn user(&self, user_id: u64) -> Result<User, ApiError> {
        const CONTEXT: &str = "GET accounts/users/{id}/";
        let url = self.endpoint(&format!("{USERS_PATH}{user_id}/"), CONTEXT)?;
        self.send_json(self.client.get(url), CONTEXT).await
    }

    /// Fetches the profile of a user, or `None` if they have not created one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails with anything but 404.
    pub async fn profile_by_user_id(&self, user_id: u64) -> Result<Option<Profile>, ApiError> {
        const CONTEXT: &str = "GET accounts/profiles/user/{id}/";
        let url = self.endpoint(&format!("{PROFILE_BY_USER_PATH}{user_id}/"), CONTEXT)?;
        match self.send_json(self.client.get(url), CONTEXT).await {
            Ok(profile) => Ok(Some(profile)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetches the profiles of several users concurrently.
    ///
    /// Duplicate ids are looked up once. Users without a profile are left out
    /// of the map. The first failed lookup fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns the first [`ApiError`] among the lookups.
    pub async fn profiles_for_users(
        &self,
        user_ids: impl IntoIterator<Item = u64>,
    ) -> Result<HashMap<u64, Profile>, ApiError> {
        let unique: BTreeSet<u64> = user_ids.into_iter().collect();
        let lookups = unique.into_iter().map(|id| async move {
            self.profile_by_user_id(id)
                .await
                .map(|profile| profile.map(|p| (id, p)))
        });
        let found = try_join_all(lookups).await?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Creates a profile. Sent as multipart when a picture is attached,
    /// JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn create_profile(&self, profile: NewProfile) -> Result<Profile, ApiError> {
        const CONTEXT: &str = "POST accounts/profiles/";
        let url = self.endpoint(PROFILES_PATH, CONTEXT)?;
        let NewProfile {
            user,
            bio,
            location,
            picture,
        } = profile;
        let req = match picture {
            Some(picture) => {
                let form = Form::new()
                    .text("user", user.to_string())
                    .text("bio", bio)
                    .text("location", location)
                    .part("profile_picture", picture_part(picture, CONTEXT)?);
                self.client.post(url).multipart(form)
            }
            None => self.client.post(url).json(&NewProfile {
                user,
                bio,
                location,
                picture: None,
            }),
        };
        self.send_json(req, CONTEXT).await
    }

    /// Updates a profile with a multipart `PATCH`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn update_profile(
        &self,
        profile_id: u64,
        update: ProfileUpdate,
    ) -> Result<Profile, ApiError> {
        const CONTEXT: &str = "PATCH accounts/profiles/{id}/";
        let url = self.endpoint(&format!("{PROFILES_PATH}{profile_id}/"), CONTEXT)?;
        let mut form = Form::new();
        if let Some(bio) = update.bio {
            form = form.text("bio", bio);
        }
        if let Some(location) = update.location {
            form = form.text("location", location);
        }
        if let Some(picture) = update.picture {
            form = form.part("profile_picture", picture_part(picture, CONTEXT)?);
        }
        self.send_json(self.client.patch(url).multipart(form), CONTEXT)
            .await
    }

    /// Fetches the home feed posts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn posts(&self) -> Result<Vec<Post>, ApiError> {
        const CONTEXT: &str = "GET posts/posts/";
        let url = self.endpoint(POSTS_PATH, CONTEXT)?;
        self.send_json(self.client.get(url), CONTEXT).await
    }

    /// Fetches the ads shown in the feed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn ads(&self) -> Result<Vec<Ad>, ApiError> {
        const CONTEXT: &str = "GET ads/ads/";
        let url = self.endpoint(ADS_PATH, CONTEXT)?;
        self.send_json(self.client.get(url), CONTEXT).await
    }

    /// Fetches the comments on a post.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn comments_for_post(&self, post_id: u64) -> Result<Vec<Comment>, ApiError> {
        const CONTEXT: &str = "GET posts/posts/{id}/comments/";
        let url = self.endpoint(&format!("{POSTS_PATH}{post_id}/comments/"), CONTEXT)?;
        self.send_json(self.client.get(url), CONTEXT).await
    }

    /// Adds a comment to a post. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] for a blank comment, otherwise
    /// [`ApiError`] if the request fails.
    pub async fn add_comment(&self, post_id: u64, text: &str) -> Result<Comment, ApiError> {
        const CONTEXT: &str = "POST posts/posts/{id}/comments/";
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::InvalidInput {
                context: CONTEXT,
                reason: "comment text is empty",
            });
        }
        let url = self.endpoint(&format!("{POSTS_PATH}{post_id}/comments/"), CONTEXT)?;
        let req = self.client.post(url).json(&CommentBody { text });
        self.send_json(req, CONTEXT).await
    }

    /// Fetches the caller's orders.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        const CONTEXT: &str = "GET marketplace/orders/";
        let url = self.endpoint(ORDERS_PATH, CONTEXT)?;
        self.send_json(self.client.get(url), CONTEXT).await
    }

    /// Asks the backend for the outcome of the payment identified by
    /// `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-2xx answer, or an
    /// unreadable body. A 2xx body with a non-success status is returned as is.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "kibra.api.verify_payment",
            skip(self),
            err,
            fields(
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty
            )
        )
    )]
    pub async fn verify_payment(&self, reference: &str) -> Result<VerifyPaymentResponse, ApiError> {
        const CONTEXT: &str = "GET marketplace/payments/verify/";
        let mut url = self.verify_payment_url.clone();
        url.query_pairs_mut().append_pair("reference", reference);
        self.send_json(self.client.get(url), CONTEXT).await
    }

    fn endpoint(&self, path: &str, context: &'static str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::UrlParse { context, source: e })
    }

    /// Sends a request and fails on any non-2xx status.
    async fn send(
        &self,
        req: rqm::RequestBuilder,
        context: &'static str,
    ) -> Result<reqwest::Response, ApiError> {
        let http_response = req
            .send()
            .await
            .map_err(|e| ApiError::Http { context, source: e })?;

        let status = http_response.status();
        if status.is_success() {
            return Ok(http_response);
        }
        let body = http_response
            .text()
            .await
            .map_err(|e| ApiError::ResponseBodyRead { context, source: e })?;
        Err(ApiError::HttpStatus {
            context,
            status,
            body,
        })
    }

    /// Sends a request and decodes a JSON body.
    async fn send_json<R>(
        &self,
        req: rqm::RequestBuilder,
        context: &'static str,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let result = match self.send(req, context).await {
            Ok(response) => response
                .json::<R>()
                .await
                .map_err(|e| ApiError::JsonDeserialization { context, source: e }),
            Err(err) => Err(err),
        };

        record_result_on_span(&result);

        result
    }

    /// Sends a request whose body, if any, is informational only.
    async fn send_ack(
        &self,
        req: rqm::RequestBuilder,
        context: &'static str,
    ) -> Result<Acknowledgement, ApiError> {
        let result = match self.send(req, context).await {
            Ok(response) => response
                .text()
                .await
                .map_err(|e| ApiError::ResponseBodyRead { context, source: e })
                .map(|text| serde_json::from_str(&text).unwrap_or_default()),
            Err(err) => Err(err),
        };

        record_result_on_span(&result);

        result
    }
}

fn picture_part(picture: ProfilePicture, context: &'static str) -> Result<Part, ApiError> {
    Part::bytes(picture.bytes)
        .file_name(picture.file_name)
        .mime_str(&picture.mime_type)
        .map_err(|e| ApiError::Http {
            context,
            source: e.into(),
        })
}

/// Records the outcome of a request on the current tracing span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: fmt::Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to KibraConnect API failed");
        }
    }
}

/// Records the outcome of a request on the current tracing span.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: fmt::Display>(_result: &Result<R, E>) {}
