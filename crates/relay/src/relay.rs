//! Relay run - orchestrates the fetch, diff, deliver flow.

use std::sync::Arc;

use crate::config::{FailurePolicy, RelayConfig};
use crate::diff::compute_new_items;
use crate::error::RelayError;
use crate::marker::MarkerStore;
use crate::notify::{format_message, Notifier};
use crate::source::PostSource;

/// Delivery counts for a run that had new posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    /// Posts delivered successfully.
    pub sent: usize,
    /// Posts whose delivery failed.
    pub failed: usize,
    /// Posts never attempted because the batch halted.
    pub pending: usize,
    /// Marker value after the run.
    pub marker: Option<String>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The page had no posts (empty page or login wall).
    NoPosts,
    /// First run: marker initialised, nothing delivered.
    Bootstrapped { marker: String },
    /// The newest post was already handled.
    UpToDate,
    /// New posts were found and delivery attempted.
    Delivered(DeliverySummary),
}

/// Relay orchestrator.
pub struct Relay {
    config: RelayConfig,
    source: Arc<dyn PostSource>,
    notifier: Arc<dyn Notifier>,
}

impl Relay {
    #[must_use]
    pub fn new(
        config: RelayConfig,
        source: Arc<dyn PostSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            source,
            notifier,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run a single poll: fetch the profile, deliver new posts oldest first
    /// and keep `store` pointing at the last handled post.
    pub async fn run(&self, store: &dyn MarkerStore) -> Result<RunOutcome, RelayError> {
        let account = &self.config.account;
        tracing::info!(account = %account, "Starting relay run");

        let fetched = self.source.fetch(account).await?;
        let Some(newest) = fetched.first() else {
            tracing::warn!(account = %account, "No posts extracted (page empty or login required)");
            return Ok(RunOutcome::NoPosts);
        };
        tracing::debug!(count = fetched.len(), newest = %newest.id, "Fetched posts");

        let marker = store.load()?;
        let new_items = compute_new_items(&fetched, marker.as_deref());

        if new_items.bootstrap {
            store.save(&newest.id)?;
            tracing::info!(
                marker = %newest.id,
                "Initialised marker - nothing is sent on the first run"
            );
            return Ok(RunOutcome::Bootstrapped {
                marker: newest.id.clone(),
            });
        }

        if new_items.is_empty() {
            tracing::info!(marker = ?marker, "No new posts");
            return Ok(RunOutcome::UpToDate);
        }

        if marker.as_deref().is_some_and(|m| !fetched.iter().any(|p| p.id == m)) {
            tracing::warn!(
                marker = ?marker,
                "Marker not on the page anymore - only the newest post is sent"
            );
        }

        let profile_url = self.config.profile_url();
        let total = new_items.items.len();
        let mut summary = DeliverySummary {
            marker,
            ..DeliverySummary::default()
        };

        for (index, post) in new_items.items.iter().enumerate() {
            if index > 0 && !self.config.send_delay.is_zero() {
                tokio::time::sleep(self.config.send_delay).await;
            }

            let message = format_message(post, &profile_url);
            match self.notifier.deliver(&message).await {
                Ok(()) => {
                    store.save(&post.id)?;
                    summary.sent += 1;
                    summary.marker = Some(post.id.clone());
                    tracing::info!(id = %post.id, channel = self.notifier.name(), "Sent post");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        id = %post.id,
                        channel = self.notifier.name(),
                        error = %e,
                        policy = %self.config.failure_policy,
                        "Failed to deliver post"
                    );
                    match self.config.failure_policy {
                        FailurePolicy::Halt => {
                            summary.pending = total - index - 1;
                            break;
                        }
                        FailurePolicy::Skip => {
                            store.save(&post.id)?;
                            summary.marker = Some(post.id.clone());
                        }
                    }
                }
            }
        }

        tracing::info!(
            sent = summary.sent,
            failed = summary.failed,
            pending = summary.pending,
            marker = ?summary.marker,
            "Relay run complete"
        );

        Ok(RunOutcome::Delivered(summary))
    }
}
