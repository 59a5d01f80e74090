//! New-post detection.
//!
//! Compares a freshly fetched page (newest first) with the stored marker and
//! decides which posts still have to be delivered, oldest first.

use crate::source::Post;

/// Posts that have to be delivered after a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItems {
    /// Posts to deliver, in delivery (oldest-first) order.
    pub items: Vec<Post>,
    /// No marker existed yet. Nothing is delivered; the caller initialises
    /// the marker with the newest fetched post.
    pub bootstrap: bool,
}

impl NewItems {
    /// Whether there is nothing to deliver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Compute the posts newer than `marker`.
///
/// When the marker has scrolled out of the fetched window only the newest
/// post is returned; missed posts in the gap are not recovered.
#[must_use]
pub fn compute_new_items(fetched: &[Post], marker: Option<&str>) -> NewItems {
    let Some(marker) = marker else {
        return NewItems {
            items: Vec::new(),
            bootstrap: true,
        };
    };

    let items = match fetched.iter().position(|post| post.id == marker) {
        None => fetched.first().cloned().into_iter().collect(),
        Some(index) => fetched[..index].iter().rev().cloned().collect(),
    };

    NewItems {
        items,
        bootstrap: false,
    }
}
