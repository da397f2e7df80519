//! Endpoint paths and client defaults.
//!
//! Paths are relative to the API base URL and keep the backend's trailing
//! slashes; the backend redirects slash-less paths, which drops the body of
//! POST requests.

use std::time::Duration;

/// Base URL of a local backend.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `POST` - email/password login.
pub const LOGIN_PATH: &str = "accounts/login/";
/// `POST` - account registration.
pub const REGISTER_PATH: &str = "auth/registration/";
/// `POST` - email verification code.
pub const VERIFY_EMAIL_PATH: &str = "auth/verify-email/";
/// `POST` - start a password reset.
pub const FORGOT_PASSWORD_PATH: &str = "accounts/forgot-password/";
/// `POST` - finish a password reset.
pub const RESET_PASSWORD_PATH: &str = "accounts/reset-password/";
/// `GET` - users, followed by `{id}/`.
pub const USERS_PATH: &str = "accounts/users/";
/// `POST` to create; `PATCH` `{id}/` to update.
pub const PROFILES_PATH: &str = "accounts/profiles/";
/// `GET` - profile lookup by user, followed by `{user_id}/`.
pub const PROFILE_BY_USER_PATH: &str = "accounts/profiles/user/";
/// `GET` - home feed posts. Comments live under `{id}/comments/`.
pub const POSTS_PATH: &str = "posts/posts/";
/// `GET` - ads.
pub const ADS_PATH: &str = "ads/ads/";
/// `GET` - the caller's orders.
pub const ORDERS_PATH: &str = "marketplace/orders/";
/// `GET` with `?reference=` - payment verification.
pub const VERIFY_PAYMENT_PATH: &str = "marketplace/payments/verify/";
