//! Research tree - completed technologies and the single in-progress slot

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// The technology currently being researched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveResearch {
    pub tech: String,
    pub remaining: u32,
    pub total: u32,
}

/// Tracks researched technologies and at most one in-progress research
///
/// Knowledge cost is paid when research starts and is never refunded;
/// cancelling forfeits all progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchTree {
    completed: AHashSet<String>,
    active: Option<ActiveResearch>,
}

impl ResearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_researched(&self, key: &str) -> bool {
        self.completed.contains(key)
    }

    pub fn completed_count(&self) -> u32 {
        self.completed.len() as u32
    }

    pub fn completed(&self) -> impl Iterator<Item = &String> {
        self.completed.iter()
    }

    pub fn active(&self) -> Option<&ActiveResearch> {
        self.active.as_ref()
    }

    pub fn in_progress(&self) -> bool {
        self.active.is_some()
    }

    /// Occupy the research slot; preconditions are checked by the caller
    pub fn begin(&mut self, tech: &str, ticks: u32) {
        self.active = Some(ActiveResearch {
            tech: tech.to_string(),
            remaining: ticks,
            total: ticks,
        });
    }

    /// Drop the active research, forfeiting progress
    pub fn cancel(&mut self) -> Option<ActiveResearch> {
        self.active.take()
    }

    /// Decrement the active slot; returns the tech key on completion
    pub fn advance(&mut self) -> Option<String> {
        let active = self.active.as_mut()?;
        active.remaining = active.remaining.saturating_sub(1);
        if active.remaining == 0 {
            let finished = self.active.take().map(|a| a.tech);
            if let Some(tech) = &finished {
                self.completed.insert(tech.clone());
            }
            finished
        } else {
            None
        }
    }

    /// Record a completed technology directly (save restore)
    pub fn mark_researched(&mut self, key: &str) {
        self.completed.insert(key.to_string());
    }
}
