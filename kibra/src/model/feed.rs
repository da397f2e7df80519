//! Social feed: posts, ads and comments.

use serde::{Deserialize, Serialize};

use super::account::User;

/// Author block embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostAuthor {
    /// Author id, when the backend embeds it.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name.
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// A post in the home feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id.
    pub id: u64,
    /// Author.
    #[serde(default)]
    pub user: PostAuthor,
    /// Text body.
    #[serde(default)]
    pub content: Option<String>,
    /// Attached image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// ISO-8601 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Like counter.
    #[serde(default)]
    pub likes_count: u64,
    /// Comment counter.
    #[serde(default)]
    pub comments_count: u64,
}

/// A sponsored entry shown between posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    /// Ad id.
    pub id: u64,
    /// Headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Body text.
    #[serde(default)]
    pub description: Option<String>,
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Click-through URL.
    #[serde(default)]
    pub link: Option<String>,
    /// ISO-8601 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub id: u64,
    /// Author.
    pub user: User,
    /// Comment text.
    pub text: String,
    /// ISO-8601 creation time.
    #[serde(default)]
    pub created_at: Option<String>,
}
