use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Result;
use crate::graph::factory::labels;
use crate::graph::Graph;
use crate::model::{Direction, ElementId, PropertyValue, Vertex, VertexIdx};

#[derive(Clone, Debug)]
struct ListingInfo {
    id: ElementId,
    recommendable: bool,
    private: bool,
    agencies: Vec<ElementId>,
}

/// Visibility facts for every listing vertex, gathered once per run.
#[derive(Clone, Debug, Default)]
pub struct ListingCatalog {
    listings: Vec<VertexIdx>,
    info: FxHashMap<VertexIdx, ListingInfo>,
    respect_visibility: bool,
}

impl ListingCatalog {
    /// Scans the listing vertices of `graph`. With `respect_visibility` off
    /// every listing is reported visible.
    pub fn build(graph: &Graph, respect_visibility: bool) -> Self {
        let mut catalog = Self {
            respect_visibility,
            ..Self::default()
        };
        for idx in graph.vertices_with_label(labels::LISTING) {
            let vertex = graph.vertex(idx);
            let agencies = graph
                .get_edges(idx, Direction::Out, &[labels::IN_AGENCY])
                .into_iter()
                .map(|edge| graph.vertex(graph.edge(edge).in_vertex).id.clone())
                .collect();
            catalog.listings.push(idx);
            catalog.info.insert(
                idx,
                ListingInfo {
                    id: vertex.id.clone(),
                    recommendable: is_recommendable(vertex),
                    private: flag(vertex, "is_private", false),
                    agencies,
                },
            );
        }
        catalog
    }

    /// Listing vertices in graph order.
    pub fn listings(&self) -> &[VertexIdx] {
        &self.listings
    }

    /// Public id of a listing vertex.
    pub fn id(&self, listing: VertexIdx) -> Option<&ElementId> {
        self.info.get(&listing).map(|info| &info.id)
    }

    /// Whether `listing` may be shown to a member of `profile_agencies`.
    /// Non-listing vertices are never visible.
    pub fn visible_to(&self, listing: VertexIdx, profile_agencies: &FxHashSet<ElementId>) -> bool {
        let Some(info) = self.info.get(&listing) else {
            return false;
        };
        if !self.respect_visibility {
            return true;
        }
        if !info.recommendable {
            return false;
        }
        !info.private || info.agencies.iter().any(|a| profile_agencies.contains(a))
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the graph has no listings.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Agencies `profile` belongs to.
pub(crate) fn agencies_of(graph: &Graph, profile: &ElementId) -> Result<FxHashSet<ElementId>> {
    Ok(graph
        .query()
        .v([profile])
        .out(labels::IN_AGENCY)
        .to_id_list()?
        .into_iter()
        .collect())
}

fn flag(vertex: &Vertex, key: &str, default: bool) -> bool {
    vertex
        .property(key)
        .and_then(PropertyValue::as_bool)
        .unwrap_or(default)
}

fn is_recommendable(vertex: &Vertex) -> bool {
    let approved = vertex
        .property("approval_status")
        .and_then(PropertyValue::as_str)
        .map_or(true, |status| status == "APPROVED");
    flag(vertex, "is_enabled", true) && !flag(vertex, "is_deleted", false) && approved
}
