//! Fluent traversal builder.
//!
//! Every builder call appends exactly one pipe to the underlying
//! [`Pipeline`]. Problems found while building (an unknown start id, a step
//! before the start, a second start) are remembered and returned by the
//! terminal call, so chains read straight through without `?` at each hop.
//!
//! ```
//! use gremlite::graph::Graph;
//! use gremlite::model::PropertyMap;
//!
//! let mut graph = Graph::new();
//! let a = graph.add_vertex("profile", PropertyMap::new(), Some("p-1".into())).unwrap();
//! let b = graph.add_vertex("listing", PropertyMap::new(), Some("l-1".into())).unwrap();
//! graph.add_edge("bookmarked", a, b, PropertyMap::new()).unwrap();
//!
//! let ids = graph.query().v(["p-1"]).out("bookmarked").to_id_list().unwrap();
//! assert_eq!(ids, vec!["l-1".into()]);
//! ```

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::model::{Direction, Element, ElementId, PropertyValue};
use crate::pipe::{
    AdjacentVerticesStep, DistinctStep, EdgeSide, EdgeVertexStep, ElementSource, ExcludeIdsStep,
    HasLabelStep, HasStep, IdStep, IdentityStep, IncidentEdgesStep, LimitStep, Pipe,
    PropertiesStep, SideEffectStep, Step,
};
use crate::pipeline::Pipeline;

#[cfg(test)]
mod tests;

/// Edge label filter; empty means every label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(Vec<String>);

impl Labels {
    /// Matches every label.
    pub fn any() -> Self {
        Self::default()
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Labels {
    fn from(value: &str) -> Self {
        Labels(vec![value.to_owned()])
    }
}

impl From<String> for Labels {
    fn from(value: String) -> Self {
        Labels(vec![value])
    }
}

impl From<&[&str]> for Labels {
    fn from(value: &[&str]) -> Self {
        Labels(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Labels {
    fn from(value: [&str; N]) -> Self {
        Labels(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl From<Vec<String>> for Labels {
    fn from(value: Vec<String>) -> Self {
        Labels(value)
    }
}

/// Traversal under construction over a borrowed graph.
pub struct Query<'g> {
    graph: &'g Graph,
    pipeline: Pipeline<'g>,
    started: bool,
    error: Option<GraphError>,
}

impl<'g> Query<'g> {
    /// Creates an empty traversal. Use [`Graph::query`] in application code.
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            pipeline: Pipeline::new(),
            started: false,
            error: None,
        }
    }

    /// Starts from every vertex of the graph, in insertion order (Gremlin `V()`).
    pub fn vertices(mut self) -> Self {
        let source = self.graph.vertices().map(Element::Vertex).collect();
        self.start(source);
        self
    }

    /// Starts from the given vertex ids, in argument order.
    pub fn v<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ElementId>,
    {
        if self.error.is_some() {
            return self;
        }
        let mut source = Vec::new();
        for id in ids {
            match self.graph.get_vertex(&id.into()) {
                Ok(idx) => source.push(Element::Vertex(idx)),
                Err(err) => {
                    self.error = Some(err);
                    return self;
                }
            }
        }
        self.start(ElementSource::new(source));
        self
    }

    fn start(&mut self, source: ElementSource) {
        if self.error.is_some() {
            return;
        }
        if self.started {
            self.error = Some(GraphError::invalid_state(
                "a traversal can only have one start",
            ));
            return;
        }
        self.started = true;
        self.pipeline.set_starts(source);
        self.pipeline.add_pipe(Pipe::new(IdentityStep));
    }

    fn push<S: Step<'g> + 'g>(mut self, step: S) -> Self {
        if self.error.is_some() {
            return self;
        }
        if !self.started {
            self.error = Some(GraphError::invalid_state(format!(
                "{}() called before vertices() or v(..)",
                step.name()
            )));
            return self;
        }
        self.pipeline.add_pipe(Pipe::new(step));
        self
    }

    /// Follows outgoing edges to their in-vertices.
    pub fn out(self, labels: impl Into<Labels>) -> Self {
        self.adjacent(Direction::Out, labels.into())
    }

    /// Follows incoming edges to their out-vertices.
    pub fn in_(self, labels: impl Into<Labels>) -> Self {
        self.adjacent(Direction::In, labels.into())
    }

    /// Follows edges in both directions to the opposite endpoint.
    pub fn both(self, labels: impl Into<Labels>) -> Self {
        self.adjacent(Direction::Both, labels.into())
    }

    fn adjacent(self, direction: Direction, labels: Labels) -> Self {
        let graph = self.graph;
        self.push(AdjacentVerticesStep::new(graph, direction, labels.into_vec()))
    }

    /// Emits outgoing edges.
    pub fn out_e(self, labels: impl Into<Labels>) -> Self {
        self.incident(Direction::Out, labels.into())
    }

    /// Emits incoming edges.
    pub fn in_e(self, labels: impl Into<Labels>) -> Self {
        self.incident(Direction::In, labels.into())
    }

    /// Emits outgoing then incoming edges.
    pub fn both_e(self, labels: impl Into<Labels>) -> Self {
        self.incident(Direction::Both, labels.into())
    }

    fn incident(self, direction: Direction, labels: Labels) -> Self {
        let graph = self.graph;
        self.push(IncidentEdgesStep::new(graph, direction, labels.into_vec()))
    }

    /// Projects edges to the vertex they terminate at.
    pub fn in_v(self) -> Self {
        let graph = self.graph;
        self.push(EdgeVertexStep::new(graph, EdgeSide::In))
    }

    /// Projects edges to the vertex they originate from.
    pub fn out_v(self) -> Self {
        let graph = self.graph;
        self.push(EdgeVertexStep::new(graph, EdgeSide::Out))
    }

    /// Projects elements to their ids.
    pub fn id(self) -> Self {
        let graph = self.graph;
        self.push(IdStep::new(graph))
    }

    /// Projects elements to a copy of their property map; `internal` adds
    /// `_id` and `_label`.
    pub fn properties(self, internal: bool) -> Self {
        let graph = self.graph;
        self.push(PropertiesStep::new(graph, internal))
    }

    /// Projects elements to their property map.
    pub fn to_dict(self) -> Self {
        self.properties(false)
    }

    /// Keeps at most the first `n` elements.
    pub fn limit(self, n: usize) -> Self {
        self.push(LimitStep::new(n))
    }

    /// Drops repeated elements, keeping first-seen order.
    pub fn distinct(self) -> Self {
        self.push(DistinctStep::new())
    }

    /// Drops elements whose id is in `ids`.
    pub fn exclude_ids<I, T>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ElementId>,
    {
        let graph = self.graph;
        self.push(ExcludeIdsStep::new(graph, ids.into_iter().map(Into::into)))
    }

    /// Keeps elements whose `key` property equals `value`.
    pub fn has(self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let graph = self.graph;
        self.push(HasStep::new(graph, key.into(), value.into()))
    }

    /// Keeps vertices and edges carrying one of `labels`.
    pub fn has_label(self, labels: impl Into<Labels>) -> Self {
        let graph = self.graph;
        self.push(HasLabelStep::new(graph, labels.into().into_vec()))
    }

    /// Calls `callback` on every element passing this point.
    pub fn side_effect<F>(self, callback: F) -> Self
    where
        F: FnMut(&Element) + 'g,
    {
        self.push(SideEffectStep::new(callback))
    }

    /// Finishes building and hands out the pipeline for streaming consumption.
    pub fn into_pipeline(self) -> Result<Pipeline<'g>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.pipeline),
        }
    }

    /// Drains the traversal into a list.
    pub fn to_list(self) -> Result<Vec<Element>> {
        let mut pipeline = self.into_pipeline()?;
        let out = pipeline.to_list()?;
        debug!(steps = %pipeline.describe(), results = out.len(), "query.to_list");
        Ok(out)
    }

    /// Appends `id()` and drains the traversal into a list of ids.
    pub fn to_id_list(self) -> Result<Vec<ElementId>> {
        self.id()
            .to_list()?
            .into_iter()
            .map(|element| {
                element.into_id().ok_or_else(|| {
                    GraphError::invalid_state("id() produced a non-id element")
                })
            })
            .collect()
    }

    /// Drains the traversal, returning the number of elements.
    pub fn count(self) -> Result<usize> {
        self.into_pipeline()?.count()
    }

    /// Drains the traversal for its side effects.
    pub fn iterate(self) -> Result<()> {
        self.into_pipeline()?.iterate()
    }
}
