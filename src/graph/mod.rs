//! In-memory property graph.
//!
//! The graph is an arena: it owns every [`Vertex`] and [`Edge`], and the two
//! refer to each other only through [`VertexIdx`]/[`EdgeIdx`] indices. Vertices
//! keep per-label edge lists in insertion order, which is what gives traversals
//! their deterministic output order.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::model::{
    Direction, Edge, EdgeIdx, Element, ElementId, PropertyMap, PropertyValue, Vertex, VertexIdx,
};
use crate::query::Query;

pub mod factory;

#[cfg(test)]
mod tests;

pub use factory::{BuildReport, DomainSnapshot, DomainSource, GraphFactory};

/// Append-only graph snapshot.
#[derive(Debug)]
pub struct Graph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    ids: FxHashMap<ElementId, VertexIdx>,
    next_vertex_id: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            ids: FxHashMap::default(),
            next_vertex_id: 1,
        }
    }

    /// Inserts a vertex. Without an explicit id the next free sequential integer
    /// is assigned.
    pub fn add_vertex(
        &mut self,
        label: impl Into<String>,
        properties: PropertyMap,
        id: Option<ElementId>,
    ) -> Result<VertexIdx> {
        let id = match id {
            Some(id) => {
                if self.ids.contains_key(&id) {
                    return Err(GraphError::DuplicateId(id));
                }
                id
            }
            None => self.next_free_id(),
        };
        let idx = VertexIdx(arena_slot(self.vertices.len())?);
        trace!(vertex = %id, "graph.add_vertex");
        self.ids.insert(id.clone(), idx);
        self.vertices.push(Vertex::new(id, label.into(), properties));
        Ok(idx)
    }

    fn next_free_id(&mut self) -> ElementId {
        loop {
            let candidate = ElementId::Int(self.next_vertex_id);
            self.next_vertex_id += 1;
            if !self.ids.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Resolves a public vertex id to its arena index.
    pub fn get_vertex(&self, id: &ElementId) -> Result<VertexIdx> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    /// Registers a directed edge `from -> to`. Parallel edges are kept.
    pub fn add_edge(
        &mut self,
        label: impl Into<String>,
        from: VertexIdx,
        to: VertexIdx,
        properties: PropertyMap,
    ) -> Result<EdgeIdx> {
        if from.0 as usize >= self.vertices.len() || to.0 as usize >= self.vertices.len() {
            return Err(GraphError::invalid_state(format!(
                "edge endpoints {from:?} -> {to:?} are not vertices of this graph"
            )));
        }
        let label = label.into();
        let idx = EdgeIdx(arena_slot(self.edges.len())?);
        self.vertices[from.0 as usize].out_edges.push(&label, idx);
        self.vertices[to.0 as usize].in_edges.push(&label, idx);
        self.edges.push(Edge {
            id: ElementId::Int(idx.0 as u64 + 1),
            label,
            properties,
            out_vertex: from,
            in_vertex: to,
        });
        Ok(idx)
    }

    /// Convenience wrapper over [`Graph::add_edge`] resolving public ids first.
    pub fn add_edge_between(
        &mut self,
        label: impl Into<String>,
        from: &ElementId,
        to: &ElementId,
        properties: PropertyMap,
    ) -> Result<EdgeIdx> {
        let from = self.get_vertex(from)?;
        let to = self.get_vertex(to)?;
        self.add_edge(label, from, to, properties)
    }

    /// Edges incident to `vertex`.
    ///
    /// Labels are visited in argument order (all labels in first-use order when
    /// `labels` is empty) and edges within a label in insertion order. `Both`
    /// yields the outgoing edges before the incoming ones.
    pub fn get_edges<S: AsRef<str>>(
        &self,
        vertex: VertexIdx,
        direction: Direction,
        labels: &[S],
    ) -> Vec<EdgeIdx> {
        let v = self.vertex(vertex);
        let mut out = Vec::new();
        let sides = match direction {
            Direction::Out => [Some(&v.out_edges), None],
            Direction::In => [Some(&v.in_edges), None],
            Direction::Both => [Some(&v.out_edges), Some(&v.in_edges)],
        };
        for lists in sides.into_iter().flatten() {
            if labels.is_empty() {
                out.extend(lists.all());
            } else {
                for label in labels {
                    out.extend_from_slice(lists.get(label.as_ref()));
                }
            }
        }
        out
    }

    /// Vertex stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` was not issued by this graph.
    pub fn vertex(&self, idx: VertexIdx) -> &Vertex {
        &self.vertices[idx.0 as usize]
    }

    /// Edge stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` was not issued by this graph.
    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx.0 as usize]
    }

    /// All vertex indices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexIdx> + '_ {
        (0..self.vertices.len() as u32).map(VertexIdx)
    }

    /// Vertex indices carrying `label`, in insertion order.
    pub fn vertices_with_label<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = VertexIdx> + 'a {
        self.vertices().filter(move |idx| self.vertex(*idx).label == label)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Public id of a graph element, or the projected id carried by it.
    pub fn id_of(&self, element: &Element) -> Option<ElementId> {
        match element {
            Element::Vertex(idx) => Some(self.vertex(*idx).id.clone()),
            Element::Edge(idx) => Some(self.edge(*idx).id.clone()),
            Element::Id(id) => Some(id.clone()),
            Element::Properties(map) => match map.get("_id")? {
                PropertyValue::String(name) => Some(self.projected_name(name)),
                PropertyValue::Integer(id) => u64::try_from(*id).ok().map(ElementId::Int),
                _ => None,
            },
        }
    }

    // Integer ids above `i64::MAX` are projected as decimal strings.
    fn projected_name(&self, name: &str) -> ElementId {
        let named = ElementId::Name(name.to_owned());
        if self.ids.contains_key(&named) {
            return named;
        }
        match name.parse::<u64>() {
            Ok(id) if i64::try_from(id).is_err() => ElementId::Int(id),
            _ => named,
        }
    }

    /// Label of a vertex or edge element.
    pub fn label_of(&self, element: &Element) -> Option<&str> {
        match element {
            Element::Vertex(idx) => Some(&self.vertex(*idx).label),
            Element::Edge(idx) => Some(&self.edge(*idx).label),
            _ => None,
        }
    }

    /// Property map of a vertex or edge element.
    pub fn properties_of<'a>(&'a self, element: &'a Element) -> Option<&'a PropertyMap> {
        match element {
            Element::Vertex(idx) => Some(&self.vertex(*idx).properties),
            Element::Edge(idx) => Some(&self.edge(*idx).properties),
            Element::Properties(map) => Some(map),
            Element::Id(_) => None,
        }
    }

    /// Starts a traversal over this graph.
    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    /// Element counts per vertex and edge label.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            vertices: self.vertices.len(),
            edges: self.edges.len(),
            ..GraphStats::default()
        };
        for v in &self.vertices {
            *stats.vertex_labels.entry(v.label.clone()).or_insert(0) += 1;
        }
        for e in &self.edges {
            *stats.edge_labels.entry(e.label.clone()).or_insert(0) += 1;
        }
        stats
    }
}

/// Summary counts reported by [`Graph::stats`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Total vertices.
    pub vertices: usize,
    /// Total edges.
    pub edges: usize,
    /// Vertices per label.
    pub vertex_labels: BTreeMap<String, usize>,
    /// Edges per label.
    pub edge_labels: BTreeMap<String, usize>,
}

fn arena_slot(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| GraphError::invalid_state("graph arena is full"))
}
