//! Most-bookmarked listings, minus what the profile already has.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::factory::labels;
use crate::graph::Graph;
use crate::model::{ElementId, VertexIdx};

use super::catalog::{agencies_of, ListingCatalog};
use super::{Recommender, RecommenderBase, RecommenderContext, ScoreTable};

/// Scores every listing by how many distinct profiles bookmarked it.
///
/// Profiles with no bookmarks still receive the global favourites, which
/// makes this a cold-start companion to
/// [`GraphCollaborativeFilter`](super::GraphCollaborativeFilter).
pub struct PopularityRecommender {
    base: RecommenderBase,
    profiles: Vec<ElementId>,
    catalog: ListingCatalog,
    ranked: Vec<(VertexIdx, f64)>,
}

impl PopularityRecommender {
    /// Registry name.
    pub const NAME: &'static str = "popularity";

    /// Creates the strategy over the context's graph and store.
    pub fn new(ctx: &RecommenderContext) -> Self {
        Self {
            base: RecommenderBase::new(ctx),
            profiles: Vec::new(),
            catalog: ListingCatalog::default(),
            ranked: Vec::new(),
        }
    }

    fn score_profile(
        graph: &Graph,
        catalog: &ListingCatalog,
        ranked: &[(VertexIdx, f64)],
        top_n: usize,
        profile: &ElementId,
    ) -> Result<ScoreTable> {
        let own: FxHashSet<ElementId> = graph
            .query()
            .v([profile])
            .out(labels::BOOKMARKED)
            .to_id_list()?
            .into_iter()
            .collect();
        let agencies = agencies_of(graph, profile)?;
        let mut table = ScoreTable::default();
        for &(listing, score) in ranked {
            if table.len() >= top_n {
                break;
            }
            let Some(id) = catalog.id(listing) else {
                continue;
            };
            if own.contains(id) || !catalog.visible_to(listing, &agencies) {
                continue;
            }
            table.add(id.clone(), score, false);
        }
        Ok(table)
    }
}

impl Recommender for PopularityRecommender {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &RecommenderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RecommenderBase {
        &mut self.base
    }

    fn initiate(&mut self) -> Result<()> {
        let graph = self.base.graph();
        self.profiles = graph
            .query()
            .vertices()
            .has_label(labels::PROFILE)
            .to_id_list()?;
        self.catalog = ListingCatalog::build(graph, self.base.config().respect_visibility);

        self.ranked.clear();
        for &listing in self.catalog.listings() {
            let Some(id) = self.catalog.id(listing) else {
                continue;
            };
            let bookmarks = graph
                .query()
                .v([id])
                .in_(labels::BOOKMARKED)
                .distinct()
                .count()?;
            if bookmarks > 0 {
                self.ranked.push((listing, bookmarks as f64));
            }
        }
        self.ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        debug!(listings = self.ranked.len(), "popularity.ranked");
        Ok(())
    }

    fn recommendation_logic(&mut self) -> Result<()> {
        let graph = Arc::clone(self.base.graph());
        let top_n = self.base.config().top_n;
        for profile in &self.profiles {
            match Self::score_profile(&graph, &self.catalog, &self.ranked, top_n, profile) {
                Ok(table) => *self.base.scores_mut().entry(profile) = table,
                Err(err) => {
                    warn!(strategy = Self::NAME, profile = %profile, error = %err, "recommender.profile_failed");
                    self.base.mark_failed(profile);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommenderConfig;
    use crate::model::PropertyMap;
    use crate::recommend::MemoryStore;

    #[test]
    fn recommends_most_bookmarked_unseen_listings() {
        let mut graph = Graph::new();
        for p in ["p-1", "p-2", "p-3", "p-4"] {
            graph.add_vertex("profile", PropertyMap::new(), Some(p.into())).unwrap();
        }
        for l in ["l-1", "l-2", "l-3", "l-4"] {
            graph.add_vertex("listing", PropertyMap::new(), Some(l.into())).unwrap();
        }
        for (p, l) in [
            ("p-1", "l-2"),
            ("p-2", "l-2"),
            ("p-2", "l-2"),
            ("p-3", "l-2"),
            ("p-2", "l-3"),
            ("p-3", "l-3"),
            ("p-3", "l-1"),
        ] {
            graph
                .add_edge_between("bookmarked", &p.into(), &l.into(), PropertyMap::new())
                .unwrap();
        }
        let store = MemoryStore::new();
        let ctx = RecommenderContext {
            graph: Arc::new(graph),
            store: Arc::new(store.clone()),
            config: RecommenderConfig {
                top_n: 2,
                ..RecommenderConfig::default()
            },
        };
        let mut popularity = PopularityRecommender::new(&ctx);
        let summary = popularity.recommend().unwrap();

        let for_p1: Vec<_> = store
            .recommendations_for(&"p-1".into())
            .into_iter()
            .map(|s| (s.listing.to_string(), s.score))
            .collect();
        assert_eq!(for_p1, vec![("l-3".to_owned(), 2.0), ("l-1".to_owned(), 1.0)]);

        let cold: Vec<_> = store
            .recommendations_for(&"p-4".into())
            .into_iter()
            .map(|s| (s.listing.to_string(), s.score))
            .collect();
        // p-2 bookmarked l-2 twice; it counts once
        assert_eq!(cold, vec![("l-2".to_owned(), 3.0), ("l-3".to_owned(), 2.0)]);

        assert_eq!(summary.profiles, 4);
        // p-3 has bookmarked every popular listing
        assert_eq!(summary.profiles_with_results, 3);
    }
}
