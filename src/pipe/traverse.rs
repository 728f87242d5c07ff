use super::{Starts, Step};
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::model::{Direction, EdgeIdx, Element, VertexIdx};

/// Pass-through step placed after the pipeline source by `V()` and `v(..)`.
#[derive(Debug, Default)]
pub struct IdentityStep;

impl<'g> Step<'g> for IdentityStep {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        starts.pull()
    }
}

/// Walks the edges of one upstream vertex at a time.
#[derive(Debug)]
struct EdgeCursor<'g> {
    graph: &'g Graph,
    direction: Direction,
    labels: Vec<String>,
    step: &'static str,
    current: Option<VertexIdx>,
    edges: Vec<EdgeIdx>,
    pos: usize,
}

impl<'g> EdgeCursor<'g> {
    fn new(graph: &'g Graph, direction: Direction, labels: Vec<String>, step: &'static str) -> Self {
        Self {
            graph,
            direction,
            labels,
            step,
            current: None,
            edges: Vec::new(),
            pos: 0,
        }
    }

    /// Next `(source vertex, edge)` pair, advancing upstream only once the
    /// current vertex's edge list is exhausted.
    fn advance(&mut self, starts: &mut Starts<'g>) -> Result<Option<(VertexIdx, EdgeIdx)>> {
        loop {
            if let Some(vertex) = self.current {
                if let Some(edge) = self.edges.get(self.pos).copied() {
                    self.pos += 1;
                    return Ok(Some((vertex, edge)));
                }
            }
            let Some(element) = starts.pull()? else {
                self.current = None;
                return Ok(None);
            };
            let vertex = element.as_vertex().ok_or_else(|| {
                GraphError::invalid_state(format!(
                    "{} expects vertices, got {}",
                    self.step,
                    element.kind()
                ))
            })?;
            self.edges = self.graph.get_edges(vertex, self.direction, &self.labels);
            self.pos = 0;
            self.current = Some(vertex);
        }
    }

    fn reset(&mut self) {
        self.current = None;
        self.edges.clear();
        self.pos = 0;
    }
}

/// Vertices -> vertices: emits the far endpoint of every matching edge.
#[derive(Debug)]
pub struct AdjacentVerticesStep<'g> {
    cursor: EdgeCursor<'g>,
}

impl<'g> AdjacentVerticesStep<'g> {
    /// Follows `direction` edges carrying any of `labels` (all labels when empty).
    pub fn new(graph: &'g Graph, direction: Direction, labels: Vec<String>) -> Self {
        let name = match direction {
            Direction::Out => "out",
            Direction::In => "in",
            Direction::Both => "both",
        };
        Self {
            cursor: EdgeCursor::new(graph, direction, labels, name),
        }
    }
}

impl<'g> Step<'g> for AdjacentVerticesStep<'g> {
    fn name(&self) -> &'static str {
        self.cursor.step
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        let Some((vertex, edge)) = self.cursor.advance(starts)? else {
            return Ok(None);
        };
        let edge = self.cursor.graph.edge(edge);
        let far = match self.cursor.direction {
            Direction::Out => edge.in_vertex,
            Direction::In => edge.out_vertex,
            Direction::Both => edge.other_end(vertex),
        };
        Ok(Some(Element::Vertex(far)))
    }

    fn reset(&mut self) {
        self.cursor.reset();
    }
}

/// Vertices -> edges: emits every matching incident edge.
#[derive(Debug)]
pub struct IncidentEdgesStep<'g> {
    cursor: EdgeCursor<'g>,
}

impl<'g> IncidentEdgesStep<'g> {
    /// Emits `direction` edges carrying any of `labels` (all labels when empty).
    pub fn new(graph: &'g Graph, direction: Direction, labels: Vec<String>) -> Self {
        let name = match direction {
            Direction::Out => "out_e",
            Direction::In => "in_e",
            Direction::Both => "both_e",
        };
        Self {
            cursor: EdgeCursor::new(graph, direction, labels, name),
        }
    }
}

impl<'g> Step<'g> for IncidentEdgesStep<'g> {
    fn name(&self) -> &'static str {
        self.cursor.step
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        Ok(self
            .cursor
            .advance(starts)?
            .map(|(_, edge)| Element::Edge(edge)))
    }

    fn reset(&mut self) {
        self.cursor.reset();
    }
}

/// Which endpoint [`EdgeVertexStep`] projects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EdgeSide {
    /// The vertex the edge terminates at.
    In,
    /// The vertex the edge originates from.
    Out,
}

/// Edges -> vertices: projects one endpoint of each upstream edge.
#[derive(Debug)]
pub struct EdgeVertexStep<'g> {
    graph: &'g Graph,
    side: EdgeSide,
}

impl<'g> EdgeVertexStep<'g> {
    /// Projects the `side` endpoint.
    pub fn new(graph: &'g Graph, side: EdgeSide) -> Self {
        Self { graph, side }
    }
}

impl<'g> Step<'g> for EdgeVertexStep<'g> {
    fn name(&self) -> &'static str {
        match self.side {
            EdgeSide::In => "in_v",
            EdgeSide::Out => "out_v",
        }
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        let Some(element) = starts.pull()? else {
            return Ok(None);
        };
        let edge = element.as_edge().ok_or_else(|| {
            GraphError::invalid_state(format!(
                "{} expects edges, got {}",
                self.name(),
                element.kind()
            ))
        })?;
        let edge = self.graph.edge(edge);
        let vertex = match self.side {
            EdgeSide::In => edge.in_vertex,
            EdgeSide::Out => edge.out_vertex,
        };
        Ok(Some(Element::Vertex(vertex)))
    }
}
