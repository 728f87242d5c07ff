//! Builds a [`Graph`] from a snapshot of marketplace domain data.
//!
//! Vertex ids are namespaced by entity type (`p-` profiles, `l-` listings,
//! `c-` categories, `a-` agencies) so that numeric ids of different entity
//! tables never collide.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Graph;
use crate::error::Result;
use crate::model::{ElementId, PropertyMap, PropertyValue, VertexIdx};

/// Vertex and edge labels produced by the factory.
pub mod labels {
    /// Profile (user) vertices.
    pub const PROFILE: &str = "profile";
    /// Listing vertices.
    pub const LISTING: &str = "listing";
    /// Category vertices.
    pub const CATEGORY: &str = "category";
    /// Agency vertices.
    pub const AGENCY: &str = "agency";
    /// profile -> listing.
    pub const BOOKMARKED: &str = "bookmarked";
    /// profile -> agency membership and listing -> owning agency.
    pub const IN_AGENCY: &str = "agency";
    /// profile -> agency the profile is a steward for.
    pub const STEWARD_FOR: &str = "stewardFor";
    /// listing -> category.
    pub const LISTING_CATEGORY: &str = "listingCategory";
}

/// Vertex id of a profile.
pub fn profile_vertex_id(id: u64) -> ElementId {
    ElementId::Name(format!("p-{id}"))
}

/// Vertex id of a listing.
pub fn listing_vertex_id(id: u64) -> ElementId {
    ElementId::Name(format!("l-{id}"))
}

/// Vertex id of a category.
pub fn category_vertex_id(id: u64) -> ElementId {
    ElementId::Name(format!("c-{id}"))
}

/// Vertex id of an agency.
pub fn agency_vertex_id(id: u64) -> ElementId {
    ElementId::Name(format!("a-{id}"))
}

/// Profile row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Primary key.
    pub id: u64,
    /// Login name.
    pub username: String,
    /// Highest role held (`USER`, `ORG_STEWARD`, `APPS_MALL_STEWARD`).
    #[serde(default)]
    pub role: Option<String>,
    /// Agencies the profile belongs to.
    #[serde(default)]
    pub organizations: Vec<u64>,
    /// Agencies the profile is a steward for.
    #[serde(default)]
    pub stewarded_organizations: Vec<u64>,
}

/// Agency row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyRecord {
    /// Primary key.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Abbreviation.
    #[serde(default)]
    pub short_name: String,
}

/// Category row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Primary key.
    pub id: u64,
    /// Display title.
    pub title: String,
}

/// Listing row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Primary key.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Listing is switched on by its owners.
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Listing has been soft-deleted.
    #[serde(default)]
    pub is_deleted: bool,
    /// Listing is featured on the storefront.
    #[serde(default)]
    pub is_featured: bool,
    /// Listing is visible only inside its agency.
    #[serde(default)]
    pub is_private: bool,
    /// Review workflow state; only `APPROVED` listings are recommendable.
    #[serde(default = "default_approval")]
    pub approval_status: String,
    /// Category memberships.
    #[serde(default)]
    pub categories: Vec<u64>,
    /// Owning agency.
    #[serde(default)]
    pub agency: Option<u64>,
}

impl Default for ListingRecord {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            description: None,
            is_enabled: true,
            is_deleted: false,
            is_featured: false,
            is_private: false,
            approval_status: default_approval(),
            categories: Vec::new(),
            agency: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_approval() -> String {
    "APPROVED".to_owned()
}

/// Library entry: a profile bookmarked a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    /// Bookmarking profile.
    pub profile: u64,
    /// Bookmarked listing.
    pub listing: u64,
}

/// Read-only bulk access to the domain tables the graph is built from.
pub trait DomainSource {
    /// All profiles.
    fn profiles(&self) -> Result<Vec<ProfileRecord>>;
    /// All agencies.
    fn agencies(&self) -> Result<Vec<AgencyRecord>>;
    /// All categories.
    fn categories(&self) -> Result<Vec<CategoryRecord>>;
    /// All listings.
    fn listings(&self) -> Result<Vec<ListingRecord>>;
    /// All bookmark (library) entries.
    fn bookmarks(&self) -> Result<Vec<BookmarkRecord>>;
}

/// In-memory copy of every domain table, loadable from JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    /// Profiles.
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    /// Agencies.
    #[serde(default)]
    pub agencies: Vec<AgencyRecord>,
    /// Categories.
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    /// Listings.
    #[serde(default)]
    pub listings: Vec<ListingRecord>,
    /// Bookmarks.
    #[serde(default)]
    pub bookmarks: Vec<BookmarkRecord>,
}

impl DomainSnapshot {
    /// Parses a snapshot from any JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads a snapshot from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl DomainSource for DomainSnapshot {
    fn profiles(&self) -> Result<Vec<ProfileRecord>> {
        Ok(self.profiles.clone())
    }

    fn agencies(&self) -> Result<Vec<AgencyRecord>> {
        Ok(self.agencies.clone())
    }

    fn categories(&self) -> Result<Vec<CategoryRecord>> {
        Ok(self.categories.clone())
    }

    fn listings(&self) -> Result<Vec<ListingRecord>> {
        Ok(self.listings.clone())
    }

    fn bookmarks(&self) -> Result<Vec<BookmarkRecord>> {
        Ok(self.bookmarks.clone())
    }
}

/// Counters collected while building a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Vertices inserted.
    pub vertices: usize,
    /// Edges inserted.
    pub edges: usize,
    /// References to unknown profiles, listings, agencies or categories that
    /// were dropped.
    pub skipped_references: usize,
}

/// Turns a [`DomainSource`] into a [`Graph`].
#[derive(Debug, Default)]
pub struct GraphFactory {
    report: BuildReport,
}

impl GraphFactory {
    /// Builds a graph, discarding the report.
    pub fn build(source: &dyn DomainSource) -> Result<Graph> {
        Ok(Self::build_with_report(source)?.0)
    }

    /// Builds a graph and returns the construction counters alongside it.
    ///
    /// Duplicate ids abort construction. Dangling references (a bookmark of a
    /// listing missing from the snapshot, say) are logged and skipped.
    pub fn build_with_report(source: &dyn DomainSource) -> Result<(Graph, BuildReport)> {
        let started = Instant::now();
        let mut factory = GraphFactory::default();
        let mut graph = Graph::new();

        for agency in source.agencies()? {
            let mut props = PropertyMap::new();
            props.insert("title".into(), agency.title.into());
            props.insert("short_name".into(), agency.short_name.into());
            factory.vertex(&mut graph, labels::AGENCY, props, agency_vertex_id(agency.id))?;
        }

        for category in source.categories()? {
            let mut props = PropertyMap::new();
            props.insert("title".into(), category.title.into());
            factory.vertex(
                &mut graph,
                labels::CATEGORY,
                props,
                category_vertex_id(category.id),
            )?;
        }

        for profile in source.profiles()? {
            let mut props = PropertyMap::new();
            props.insert("username".into(), profile.username.into());
            if let Some(role) = profile.role {
                props.insert("role".into(), role.into());
            }
            let idx = factory.vertex(
                &mut graph,
                labels::PROFILE,
                props,
                profile_vertex_id(profile.id),
            )?;
            for agency in profile.organizations {
                factory.edge(&mut graph, labels::IN_AGENCY, idx, &agency_vertex_id(agency))?;
            }
            for agency in profile.stewarded_organizations {
                factory.edge(&mut graph, labels::STEWARD_FOR, idx, &agency_vertex_id(agency))?;
            }
        }

        for listing in source.listings()? {
            let mut props = PropertyMap::new();
            props.insert("title".into(), listing.title.into());
            props.insert(
                "description".into(),
                listing
                    .description
                    .map(PropertyValue::from)
                    .unwrap_or(PropertyValue::Null),
            );
            props.insert("is_enabled".into(), listing.is_enabled.into());
            props.insert("is_deleted".into(), listing.is_deleted.into());
            props.insert("is_featured".into(), listing.is_featured.into());
            props.insert("is_private".into(), listing.is_private.into());
            props.insert("approval_status".into(), listing.approval_status.into());
            let idx = factory.vertex(
                &mut graph,
                labels::LISTING,
                props,
                listing_vertex_id(listing.id),
            )?;
            for category in listing.categories {
                factory.edge(
                    &mut graph,
                    labels::LISTING_CATEGORY,
                    idx,
                    &category_vertex_id(category),
                )?;
            }
            if let Some(agency) = listing.agency {
                factory.edge(&mut graph, labels::IN_AGENCY, idx, &agency_vertex_id(agency))?;
            }
        }

        for bookmark in source.bookmarks()? {
            let profile = profile_vertex_id(bookmark.profile);
            match graph.get_vertex(&profile) {
                Ok(idx) => {
                    factory.edge(
                        &mut graph,
                        labels::BOOKMARKED,
                        idx,
                        &listing_vertex_id(bookmark.listing),
                    )?;
                }
                Err(_) => factory.skip(labels::BOOKMARKED, &profile),
            }
        }

        info!(
            vertices = factory.report.vertices,
            edges = factory.report.edges,
            skipped = factory.report.skipped_references,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "graph.factory.built"
        );
        Ok((graph, factory.report))
    }

    fn vertex(
        &mut self,
        graph: &mut Graph,
        label: &str,
        props: PropertyMap,
        id: ElementId,
    ) -> Result<VertexIdx> {
        let idx = graph.add_vertex(label, props, Some(id))?;
        self.report.vertices += 1;
        Ok(idx)
    }

    fn edge(
        &mut self,
        graph: &mut Graph,
        label: &str,
        from: VertexIdx,
        to: &ElementId,
    ) -> Result<()> {
        match graph.get_vertex(to) {
            Ok(to) => {
                graph.add_edge(label, from, to, PropertyMap::new())?;
                self.report.edges += 1;
            }
            Err(_) => self.skip(label, to),
        }
        Ok(())
    }

    fn skip(&mut self, label: &str, missing: &ElementId) {
        warn!(edge = label, missing = %missing, "graph.factory.dangling_reference");
        self.report.skipped_references += 1;
    }
}
