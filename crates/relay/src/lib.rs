//! Profile-to-webhook relay.
//!
//! This crate provides:
//! - Profile page scraping using browser automation
//! - New-post detection against a persisted "last seen" marker
//! - Serial delivery of new posts to a JSON webhook
//!
//! A run is one-shot; an external scheduler provides the polling loop.

pub mod config;
pub mod diff;
pub mod error;
pub mod marker;
pub mod notify;
pub mod relay;
pub mod source;

// Re-export main types
pub use config::{FailurePolicy, RelayConfig};
pub use diff::{compute_new_items, NewItems};
pub use error::{DeliveryError, RelayError};
pub use marker::{FileMarkerStore, MarkerStore, MemoryMarkerStore};
pub use notify::{format_message, LogNotifier, Notifier, WebhookNotifier};
pub use relay::{DeliverySummary, Relay, RunOutcome};
pub use source::{BrowserSettings, BrowserSource, Post, PostParser, PostSource};
