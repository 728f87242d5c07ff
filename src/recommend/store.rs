//! Persistence of recommendation lists.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::model::ElementId;

use super::{ProfileRecommendations, ScoredListing};

/// Sink for per-profile recommendation lists.
///
/// Each profile is replaced wholesale: `delete_all` followed by one `insert`
/// per retained listing. Profiles are independent, so implementations never
/// need to coordinate across profiles.
pub trait RecommendationStore: Send + Sync {
    /// Removes every stored recommendation for `profile`.
    fn delete_all(&self, profile: &ElementId) -> Result<()>;

    /// Stores one recommendation.
    fn insert(&self, profile: &ElementId, listing: &ElementId, score: f64) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    // Profiles in first-write order; `slots` indexes into it.
    rows: Vec<(ElementId, Vec<ScoredListing>)>,
    slots: FxHashMap<ElementId, usize>,
    deletes: usize,
    inserts: usize,
}

impl MemoryState {
    fn rows_mut(&mut self, profile: &ElementId) -> &mut Vec<ScoredListing> {
        let slot = match self.slots.get(profile) {
            Some(&slot) => slot,
            None => {
                self.rows.push((profile.clone(), Vec::new()));
                self.slots.insert(profile.clone(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[slot].1
    }
}

/// Store kept in process memory.
///
/// Clones share the same rows, so a caller can hand one clone to a
/// recommender and read results back through another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored listings for `profile`, in insertion order.
    pub fn recommendations_for(&self, profile: &ElementId) -> Vec<ScoredListing> {
        let state = self.inner.lock();
        state
            .slots
            .get(profile)
            .map(|&slot| state.rows[slot].1.clone())
            .unwrap_or_default()
    }

    /// Every profile with at least one stored listing, in the order profiles
    /// were first written.
    pub fn snapshot(&self) -> Vec<ProfileRecommendations> {
        self.inner
            .lock()
            .rows
            .iter()
            .filter(|(_, listings)| !listings.is_empty())
            .map(|(profile, listings)| ProfileRecommendations {
                profile: profile.clone(),
                listings: listings.clone(),
            })
            .collect()
    }

    /// Number of `delete_all` calls received.
    pub fn deletes(&self) -> usize {
        self.inner.lock().deletes
    }

    /// Number of `insert` calls received.
    pub fn inserts(&self) -> usize {
        self.inner.lock().inserts
    }

    /// Total write calls of either kind.
    pub fn writes(&self) -> usize {
        let state = self.inner.lock();
        state.deletes + state.inserts
    }
}

impl RecommendationStore for MemoryStore {
    fn delete_all(&self, profile: &ElementId) -> Result<()> {
        let mut state = self.inner.lock();
        state.rows_mut(profile).clear();
        state.deletes += 1;
        Ok(())
    }

    fn insert(&self, profile: &ElementId, listing: &ElementId, score: f64) -> Result<()> {
        let mut state = self.inner.lock();
        state.rows_mut(profile).push(ScoredListing {
            listing: listing.clone(),
            score,
        });
        state.inserts += 1;
        Ok(())
    }
}
