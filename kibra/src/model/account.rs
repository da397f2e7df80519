//! Accounts and profiles.

use serde::{Deserialize, Serialize};

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: u64,
    /// Public handle.
    #[serde(default)]
    pub username: String,
    /// Login email.
    #[serde(default)]
    pub email: String,
}

/// The `user` field of a profile: the backend sends a bare id on create and
/// an embedded user on reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileUser {
    /// Embedded user record.
    User(User),
    /// User id only.
    Id(u64),
}

impl ProfileUser {
    /// Returns the user id in either representation.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::User(user) => user.id,
            Self::Id(id) => *id,
        }
    }
}

/// A user's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile id (distinct from the user id).
    pub id: u64,
    /// Owner.
    pub user: ProfileUser,
    /// Free-form bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// Free-form location.
    #[serde(default)]
    pub location: Option<String>,
    /// Absolute URL of the profile picture.
    #[serde(default, alias = "profile_image")]
    pub profile_picture: Option<String>,
}

/// An image attached to a profile create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePicture {
    /// File name sent in the multipart part.
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl ProfilePicture {
    /// A JPEG picture named `profile.jpg`, as the mobile app uploads them.
    #[must_use]
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            file_name: "profile.jpg".to_owned(),
            mime_type: "image/jpeg".to_owned(),
            bytes,
        }
    }
}

/// Body of a profile creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    /// Owner's user id.
    pub user: u64,
    /// Bio text.
    pub bio: String,
    /// Location text.
    pub location: String,
    /// Optional picture; switches the request to multipart.
    #[serde(skip)]
    pub picture: Option<ProfilePicture>,
}

/// Fields changed by a profile update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProfileUpdate {
    /// New bio text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// New location text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New picture.
    #[serde(skip)]
    pub picture: Option<ProfilePicture>,
}

/// Generic acknowledgement returned by account actions such as
/// registration or password reset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Acknowledgement {
    /// Human-readable status text.
    #[serde(default, alias = "message")]
    pub detail: Option<String>,
}

/// Tokens returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthTokens {
    /// Bearer token for subsequent requests.
    #[serde(alias = "access_token", alias = "key")]
    pub access: String,
    /// Refresh token, if the backend issues one.
    #[serde(default, alias = "refresh_token")]
    pub refresh: Option<String>,
    /// Logged-in user, if the backend embeds it.
    #[serde(default)]
    pub user: Option<User>,
}
