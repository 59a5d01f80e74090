//! Profile page sources.
//!
//! A source turns a profile identifier into the posts visible on that
//! profile, newest first.

mod browser;
mod parser;
mod types;

pub use browser::{BrowserSettings, BrowserSource};
pub use parser::PostParser;
pub use types::Post;

use async_trait::async_trait;

use crate::error::RelayError;

/// Anything that can list the posts currently shown on a profile.
///
/// Implementations must return posts in page order: index 0 is the newest,
/// later indices are strictly older.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch the posts visible on `account`'s profile.
    async fn fetch(&self, account: &str) -> Result<Vec<Post>, RelayError>;
}
