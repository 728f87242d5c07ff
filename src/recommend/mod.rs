//! Recommendation strategies over the bookmark graph.
//!
//! A strategy implements [`Recommender`]: it prepares its state in
//! [`Recommender::initiate`], fills a per-profile score table in
//! [`Recommender::recommendation_logic`], and [`Recommender::recommend`]
//! ranks and persists each table through the injected
//! [`RecommendationStore`].

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::info;

use crate::config::RecommenderConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::model::ElementId;

mod catalog;
mod graph_cf;
mod popularity;
mod registry;
mod store;

pub use catalog::ListingCatalog;
pub use graph_cf::GraphCollaborativeFilter;
pub use popularity::PopularityRecommender;
pub use registry::{BatchReport, BatchRunner, RecommenderRegistry, StrategyConstructor};
pub use store::{MemoryStore, RecommendationStore};

/// Collaborators handed to every strategy constructor.
#[derive(Clone)]
pub struct RecommenderContext {
    /// Read-only graph built for this batch.
    pub graph: Arc<Graph>,
    /// Destination for ranked lists.
    pub store: Arc<dyn RecommendationStore>,
    /// Run settings.
    pub config: RecommenderConfig,
}

/// One recommended listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredListing {
    /// Listing vertex id.
    pub listing: ElementId,
    /// Strategy-specific score; higher ranks first.
    pub score: f64,
}

/// Ranked listings for one profile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileRecommendations {
    /// Profile vertex id.
    pub profile: ElementId,
    /// Listings, best first.
    pub listings: Vec<ScoredListing>,
}

/// Listing scores for one profile, remembering first-seen order.
#[derive(Clone, Debug, Default)]
pub struct ScoreTable {
    order: Vec<ElementId>,
    scores: FxHashMap<ElementId, f64>,
}

impl ScoreTable {
    /// Sets the score of `listing`, or adds to it when `accumulate` is set.
    pub fn add(&mut self, listing: ElementId, score: f64, accumulate: bool) {
        match self.scores.get_mut(&listing) {
            Some(current) if accumulate => *current += score,
            Some(current) => *current = score,
            None => {
                self.order.push(listing.clone());
                self.scores.insert(listing, score);
            }
        }
    }

    /// Whether `listing` has a score.
    pub fn contains(&self, listing: &ElementId) -> bool {
        self.scores.contains_key(listing)
    }

    /// Number of scored listings.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been scored.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Best `top_n` listings: score descending, ties in first-seen order.
    pub fn ranked(&self, top_n: usize) -> Vec<ScoredListing> {
        let mut ranked: Vec<ScoredListing> = self
            .order
            .iter()
            .map(|listing| ScoredListing {
                listing: listing.clone(),
                score: self.scores[listing],
            })
            .collect();
        // stable: equal scores keep first-seen order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);
        ranked
    }
}

/// `profile → {listing: score}` mapping filled by a strategy, in the order
/// profiles were processed.
#[derive(Clone, Debug, Default)]
pub struct ProfileScores {
    profiles: Vec<(ElementId, ScoreTable)>,
    index: FxHashMap<ElementId, usize>,
}

impl ProfileScores {
    /// Table for `profile`, created empty on first use.
    pub fn entry(&mut self, profile: &ElementId) -> &mut ScoreTable {
        let slot = match self.index.get(profile) {
            Some(&slot) => slot,
            None => {
                self.profiles.push((profile.clone(), ScoreTable::default()));
                self.index.insert(profile.clone(), self.profiles.len() - 1);
                self.profiles.len() - 1
            }
        };
        &mut self.profiles[slot].1
    }

    /// Table for `profile`, if it was processed.
    pub fn get(&self, profile: &ElementId) -> Option<&ScoreTable> {
        self.index.get(profile).map(|&slot| &self.profiles[slot].1)
    }

    /// Processed profiles and their tables.
    pub fn iter(&self) -> impl Iterator<Item = (&ElementId, &ScoreTable)> {
        self.profiles.iter().map(|(profile, table)| (profile, table))
    }

    /// Number of processed profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile was processed.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Drops every table.
    pub fn clear(&mut self) {
        self.profiles.clear();
        self.index.clear();
    }
}

/// Outcome of one strategy's `recommend()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Strategy name.
    pub strategy: String,
    /// Profiles whose lists were replaced.
    pub profiles: usize,
    /// Profiles that received at least one listing.
    pub profiles_with_results: usize,
    /// Listings inserted into the store.
    pub entries_written: usize,
    /// Profiles whose traversal failed and were given an empty list.
    pub failed_profiles: usize,
    /// Wall-clock time of the run.
    pub elapsed_ms: u64,
}

/// State shared by every strategy: injected collaborators plus the score
/// tables being filled.
pub struct RecommenderBase {
    graph: Arc<Graph>,
    store: Arc<dyn RecommendationStore>,
    config: RecommenderConfig,
    scores: ProfileScores,
    failed_profiles: usize,
}

impl RecommenderBase {
    /// Wraps the collaborators from `ctx`.
    pub fn new(ctx: &RecommenderContext) -> Self {
        Self {
            graph: Arc::clone(&ctx.graph),
            store: Arc::clone(&ctx.store),
            config: ctx.config.clone(),
            scores: ProfileScores::default(),
            failed_profiles: 0,
        }
    }

    /// Graph being recommended over.
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Run settings.
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Scores collected so far.
    pub fn scores(&self) -> &ProfileScores {
        &self.scores
    }

    /// Mutable scores, for the strategy's logic.
    pub fn scores_mut(&mut self) -> &mut ProfileScores {
        &mut self.scores
    }

    /// Records that `profile` could not be scored; it is persisted with an
    /// empty list.
    pub fn mark_failed(&mut self, profile: &ElementId) {
        self.scores.entry(profile);
        self.failed_profiles += 1;
    }

    /// Ranked top-N lists for every processed profile.
    pub fn ranked(&self) -> Vec<ProfileRecommendations> {
        let top_n = self.config.top_n;
        self.scores
            .iter()
            .map(|(profile, table)| ProfileRecommendations {
                profile: profile.clone(),
                listings: table.ranked(top_n),
            })
            .collect()
    }

    /// Replaces every processed profile's stored list with its ranked top-N.
    pub fn persist(&self, strategy: &str, started: Instant) -> Result<RunSummary> {
        let mut summary = RunSummary {
            strategy: strategy.to_owned(),
            failed_profiles: self.failed_profiles,
            ..RunSummary::default()
        };
        for entry in self.ranked() {
            self.store.delete_all(&entry.profile)?;
            for scored in &entry.listings {
                self.store.insert(&entry.profile, &scored.listing, scored.score)?;
            }
            summary.profiles += 1;
            summary.entries_written += entry.listings.len();
            if !entry.listings.is_empty() {
                summary.profiles_with_results += 1;
            }
        }
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(summary)
    }

    fn reset(&mut self) {
        self.scores.clear();
        self.failed_profiles = 0;
    }
}

/// A recommendation strategy.
pub trait Recommender {
    /// Registry name, e.g. `graph_cf`.
    fn name(&self) -> &str;

    /// Shared state.
    fn base(&self) -> &RecommenderBase;

    /// Shared state, mutably.
    fn base_mut(&mut self) -> &mut RecommenderBase;

    /// Prepares strategy-specific state. Called once per `recommend()`.
    fn initiate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Fills the `profile → {listing: score}` tables in [`Self::base_mut`].
    fn recommendation_logic(&mut self) -> Result<()>;

    /// Ranked lists computed by the last run.
    fn results(&self) -> Vec<ProfileRecommendations> {
        self.base().ranked()
    }

    /// Runs the strategy end to end and persists its results.
    fn recommend(&mut self) -> Result<RunSummary> {
        let started = Instant::now();
        let name = self.name().to_owned();
        info!(strategy = %name, "recommender.start");
        self.base_mut().reset();
        self.initiate()?;
        self.recommendation_logic()?;
        let summary = self.base().persist(&name, started)?;
        info!(
            strategy = %name,
            profiles = summary.profiles,
            with_results = summary.profiles_with_results,
            entries = summary.entries_written,
            failed = summary.failed_profiles,
            elapsed_ms = summary.elapsed_ms,
            "recommender.finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_breaks_ties_by_first_seen() {
        let mut table = ScoreTable::default();
        table.add("l-3".into(), 1.0, true);
        table.add("l-1".into(), 1.0, true);
        table.add("l-2".into(), 1.0, true);
        table.add("l-2".into(), 1.0, true);
        let ranked: Vec<_> = table.ranked(10).into_iter().map(|s| s.listing).collect();
        assert_eq!(
            ranked,
            vec![ElementId::from("l-2"), "l-3".into(), "l-1".into()]
        );
    }

    #[test]
    fn non_accumulating_add_overwrites() {
        let mut table = ScoreTable::default();
        table.add("l-1".into(), 1.0, false);
        table.add("l-1".into(), 1.0, false);
        assert_eq!(table.ranked(1)[0].score, 1.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ranked_truncates_to_top_n() {
        let mut table = ScoreTable::default();
        for (i, listing) in ["a", "b", "c", "d"].into_iter().enumerate() {
            table.add(listing.into(), i as f64, false);
        }
        let ranked: Vec<_> = table.ranked(2).into_iter().map(|s| s.listing).collect();
        assert_eq!(ranked, vec![ElementId::from("d"), "c".into()]);
        assert!(table.ranked(0).is_empty());
    }

    #[test]
    fn profile_scores_keep_processing_order() {
        let mut scores = ProfileScores::default();
        scores.entry(&"p-2".into()).add("l-1".into(), 1.0, true);
        scores.entry(&"p-1".into());
        scores.entry(&"p-2".into()).add("l-1".into(), 1.0, true);
        let order: Vec<_> = scores.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(order, vec![ElementId::from("p-2"), "p-1".into()]);
        assert_eq!(scores.get(&"p-2".into()).unwrap().ranked(1)[0].score, 2.0);
        assert!(scores.get(&"p-1".into()).unwrap().is_empty());
    }
}
