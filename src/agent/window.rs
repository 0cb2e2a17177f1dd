//! Bounded artifact window
//!
//! Keeps the total artifacts resident in a conversation at or below a fixed
//! ceiling by evicting the oldest attachment-bearing messages whole, and
//! selects a representative temporal spread of new frames to admit.

use crate::agent::conversation::ConversationState;
use crate::core::Artifact;

/// Enforces the per-conversation artifact budget.
///
/// Engines without a documented limit construct the window with no ceiling;
/// admission then passes every candidate through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactWindow {
    ceiling: Option<usize>,
}

impl ArtifactWindow {
    pub fn new(ceiling: Option<usize>) -> Self {
        Self { ceiling }
    }

    /// Decide how many of `candidate_count` new artifacts may enter the
    /// conversation, evicting oldest-first until they fit.
    ///
    /// After this returns, appending up to the returned budget of artifacts
    /// cannot push the conversation above the ceiling.
    pub fn admit(&self, conversation: &mut ConversationState, candidate_count: usize) -> usize {
        let Some(ceiling) = self.ceiling else {
            return candidate_count;
        };

        let mut current = conversation.resident_artifacts();
        while current > 0 && current + candidate_count > ceiling {
            match conversation.evict_oldest_attachments() {
                Some(removed) => current -= removed,
                None => break,
            }
        }

        ceiling.saturating_sub(current).min(candidate_count)
    }
}

/// Deterministic stride-based downsampling of ordered artifacts.
///
/// `interval = max(1, n / budget)`; take every interval-th artifact starting
/// at index 0, truncated to the first `budget` selected.
pub fn select_artifacts(artifacts: Vec<Artifact>, budget: usize) -> Vec<Artifact> {
    if budget == 0 || artifacts.is_empty() {
        return Vec::new();
    }

    let interval = std::cmp::max(1, artifacts.len() / budget);
    artifacts
        .into_iter()
        .step_by(interval)
        .take(budget)
        .collect()
}
