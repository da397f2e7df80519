//! Wire types for the KibraConnect REST API.
//!
//! All types deserialize from the backend's snake_case JSON and ignore
//! fields they do not know about.
//!
//! - [`account`] - users, profiles, authentication payloads
//! - [`feed`] - posts, ads, comments
//! - [`market`] - orders and product summaries

pub mod account;
pub mod feed;
pub mod market;

pub use account::{Acknowledgement, AuthTokens, NewProfile, Profile, ProfilePicture, ProfileUpdate, ProfileUser, User};
pub use feed::{Ad, Comment, Post, PostAuthor};
pub use market::{Order, ProductSummary};
