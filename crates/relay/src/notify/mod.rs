//! Notification delivery.
//!
//! - [`Notifier`] is the delivery port used by the relay
//! - [`WebhookNotifier`] posts `{"content": ...}` JSON to a webhook
//! - [`format_message`] renders a post into the delivered text

mod webhook;

pub use webhook::WebhookNotifier;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::source::Post;

/// Trait for notification targets.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the name of this notifier.
    fn name(&self) -> &'static str;

    /// Deliver a single text message.
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Notifier that only logs what would have been delivered.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        tracing::info!(channel = self.name(), message, "Would deliver");
        Ok(())
    }
}

/// Render a post as a notification message.
///
/// The message is the trimmed post text followed by its link on a new line,
/// or just the link for posts without text. Posts without a link point at
/// the profile page instead.
#[must_use]
pub fn format_message(post: &Post, profile_url: &str) -> String {
    let text = post.text.trim();
    let link = if post.url.trim().is_empty() {
        profile_url
    } else {
        post.url.trim()
    };

    if text.is_empty() {
        link.to_string()
    } else {
        format!("{text}\n{link}")
    }
}
