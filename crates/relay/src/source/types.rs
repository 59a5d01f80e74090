//! Post data types.

/// A post scraped from a profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Stable identifier (status id when available, otherwise the link).
    pub id: String,
    /// Absolute link to the post.
    pub url: String,
    /// Post text content.
    pub text: String,
    /// When the post was published, as reported by the page.
    pub timestamp: Option<String>,
}

impl Post {
    /// Create a post without a timestamp.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            text: text.into(),
            timestamp: None,
        }
    }

    /// Attach a publication timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}
