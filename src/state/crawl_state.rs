/// Crawl state definitions for tracking discovery progress
///
/// Every identity moves `frontier -> in flight -> visited` and never back.
use crate::url::DocumentId;
use crate::MedusaError;
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlPhase {
    /// Created but not seeded
    #[default]
    Idle,

    /// Seeded, frontier may still grow
    Running,

    /// Frontier exhausted, visited set is final
    Done,
}

impl CrawlPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Done => "done",
        }
    }

    /// Returns true if moving from `self` to `to` is allowed
    pub fn can_transition_to(&self, to: CrawlPhase) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running) | (Self::Running, Self::Done)
        )
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identities a processed document added to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierExpansion {
    pub source: DocumentId,
    /// Newly admitted identities, sorted
    pub admitted: Vec<DocumentId>,
}

/// Frontier and visited bookkeeping of one crawl
///
/// Invariants:
/// - `frontier`, `in_flight` and `visited` are pairwise disjoint
/// - an identity is handed out by [`CrawlState::next_batch`] at most once
/// - a document never admits itself
#[derive(Debug, Default)]
pub struct CrawlState {
    phase: CrawlPhase,
    frontier: BTreeSet<DocumentId>,
    in_flight: BTreeSet<DocumentId>,
    visited: BTreeSet<DocumentId>,
    trace: Vec<FrontierExpansion>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn transition(&mut self, to: CrawlPhase) -> Result<(), MedusaError> {
        if !self.phase.can_transition_to(to) {
            return Err(MedusaError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Starts the crawl with `start` as the only frontier entry
    pub fn seed(&mut self, start: DocumentId) -> Result<(), MedusaError> {
        self.seed_all([start])
    }

    /// Starts the crawl with every identity of `seeds` on the frontier
    ///
    /// The empty identity of the server root is dropped.
    pub fn seed_all<I>(&mut self, seeds: I) -> Result<(), MedusaError>
    where
        I: IntoIterator<Item = DocumentId>,
    {
        self.transition(CrawlPhase::Running)?;
        self.frontier.extend(seeds.into_iter().filter(|id| !id.is_empty()));
        Ok(())
    }

    /// Takes up to `max` identities off the frontier and marks them in flight
    ///
    /// Identities are handed out in sorted order. Returns an empty batch
    /// unless the crawl is running.
    pub fn next_batch(&mut self, max: usize) -> Vec<DocumentId> {
        if self.phase != CrawlPhase::Running {
            return Vec::new();
        }

        let mut batch = Vec::with_capacity(max.min(self.frontier.len()));
        while batch.len() < max {
            let Some(id) = self.frontier.pop_first() else {
                break;
            };
            self.in_flight.insert(id.clone());
            batch.push(id);
        }
        batch
    }

    /// Records that `current` was processed and admits its link targets
    ///
    /// Targets already visited, in flight or on the frontier are dropped, as
    /// are `current` itself and the empty identity of the server root.
    ///
    /// # Returns
    ///
    /// The expansion recorded in the trace
    pub fn complete<I>(&mut self, current: DocumentId, targets: I) -> &FrontierExpansion
    where
        I: IntoIterator<Item = DocumentId>,
    {
        if !self.in_flight.remove(&current) {
            tracing::warn!("{} completed without being scheduled", current);
            self.frontier.remove(&current);
        }
        self.visited.insert(current.clone());

        let mut admitted = BTreeSet::new();
        for target in targets {
            if target.is_empty() {
                tracing::debug!("ignored link to the server root in {}", current);
                continue;
            }
            if target == current {
                tracing::debug!("ignored circular link in {}", current);
                continue;
            }
            if self.visited.contains(&target)
                || self.in_flight.contains(&target)
                || self.frontier.contains(&target)
            {
                continue;
            }
            admitted.insert(target);
        }

        self.frontier.extend(admitted.iter().cloned());
        if !admitted.is_empty() {
            tracing::debug!("{} admitted {} new documents", current, admitted.len());
        }

        self.trace.push(FrontierExpansion {
            source: current,
            admitted: admitted.into_iter().collect(),
        });
        &self.trace[self.trace.len() - 1]
    }

    /// True once nothing is left on the frontier or in flight
    pub fn is_exhausted(&self) -> bool {
        self.frontier.is_empty() && self.in_flight.is_empty()
    }

    /// Marks the crawl as done
    pub fn finish(&mut self) -> Result<(), MedusaError> {
        if !self.is_exhausted() {
            tracing::warn!(
                "Finishing crawl with {} documents left on the frontier",
                self.frontier.len() + self.in_flight.len()
            );
        }
        self.transition(CrawlPhase::Done)
    }

    pub fn frontier(&self) -> &BTreeSet<DocumentId> {
        &self.frontier
    }

    pub fn visited(&self) -> &BTreeSet<DocumentId> {
        &self.visited
    }

    pub fn trace(&self) -> &[FrontierExpansion] {
        &self.trace
    }

    /// Consumes the state, returning the visited set and the trace
    pub fn into_parts(self) -> (BTreeSet<DocumentId>, Vec<FrontierExpansion>) {
        (self.visited, self.trace)
    }
}
