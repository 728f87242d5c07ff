//! "People who bookmarked what you bookmarked" collaborative filtering.

use tracing::{debug, warn};

use crate::config::ScoreWeighting;
use crate::error::Result;
use crate::graph::factory::labels;
use crate::graph::Graph;
use crate::model::ElementId;

use super::catalog::{agencies_of, ListingCatalog};
use super::{Recommender, RecommenderBase, RecommenderContext, ScoreTable};

/// Graph-based collaborative filtering.
///
/// For each profile `p`, the similar profiles are
/// `v(p).out(bookmarked).in_(bookmarked).distinct().exclude_ids([p])`, and
/// every listing a similar profile bookmarked that `p` has not is a
/// candidate. Candidates score 1.0 each ([`ScoreWeighting::Uniform`]) or the
/// number of similar profiles that reached them
/// ([`ScoreWeighting::Frequency`]).
pub struct GraphCollaborativeFilter {
    base: RecommenderBase,
    profiles: Vec<ElementId>,
    catalog: ListingCatalog,
}

impl GraphCollaborativeFilter {
    /// Registry name.
    pub const NAME: &'static str = "graph_cf";

    /// Creates the strategy over the context's graph and store.
    pub fn new(ctx: &RecommenderContext) -> Self {
        Self {
            base: RecommenderBase::new(ctx),
            profiles: Vec::new(),
            catalog: ListingCatalog::default(),
        }
    }

    fn score_profile(
        graph: &Graph,
        catalog: &ListingCatalog,
        weighting: ScoreWeighting,
        profile: &ElementId,
    ) -> Result<ScoreTable> {
        let own = graph
            .query()
            .v([profile])
            .out(labels::BOOKMARKED)
            .distinct()
            .to_id_list()?;
        let agencies = agencies_of(graph, profile)?;
        let similar = graph
            .query()
            .v([profile])
            .out(labels::BOOKMARKED)
            .in_(labels::BOOKMARKED)
            .distinct()
            .exclude_ids([profile])
            .to_id_list()?;

        let accumulate = weighting == ScoreWeighting::Frequency;
        let mut table = ScoreTable::default();
        for other in &similar {
            let candidates = graph
                .query()
                .v([other])
                .out(labels::BOOKMARKED)
                .distinct()
                .exclude_ids(&own)
                .to_list()?;
            for candidate in candidates {
                let Some(listing) = candidate.as_vertex() else {
                    continue;
                };
                if !catalog.visible_to(listing, &agencies) {
                    continue;
                }
                table.add(graph.vertex(listing).id.clone(), 1.0, accumulate);
            }
        }
        debug!(
            profile = %profile,
            own = own.len(),
            similar = similar.len(),
            candidates = table.len(),
            "graph_cf.profile"
        );
        Ok(table)
    }
}

impl Recommender for GraphCollaborativeFilter {
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
        Ok(())
    }

    fn recommendation_logic(&mut self) -> Result<()> {
        let graph = std::sync::Arc::clone(self.base.graph());
        let weighting = self.base.config().weighting;
        for profile in &self.profiles {
            match Self::score_profile(&graph, &self.catalog, weighting, profile) {
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
