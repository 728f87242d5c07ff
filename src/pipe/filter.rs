use rustc_hash::FxHashSet;

use super::{Starts, Step};
use crate::error::Result;
use crate::graph::Graph;
use crate::model::{Element, ElementId, PropertyValue};

/// Passes the first `limit` elements, then reports end of sequence for good.
#[derive(Debug)]
pub struct LimitStep {
    limit: usize,
    emitted: usize,
}

impl LimitStep {
    /// Caps the stream at `limit` elements.
    pub fn new(limit: usize) -> Self {
        Self { limit, emitted: 0 }
    }
}

impl<'g> Step<'g> for LimitStep {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        if self.emitted >= self.limit {
            return Ok(None);
        }
        let next = starts.pull()?;
        if next.is_some() {
            self.emitted += 1;
        }
        Ok(next)
    }

    fn reset(&mut self) {
        self.emitted = 0;
    }
}

/// Drops elements equal to one already emitted; first occurrence wins.
#[derive(Debug, Default)]
pub struct DistinctStep {
    seen: FxHashSet<Element>,
}

impl DistinctStep {
    /// Creates a step with an empty seen-set.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'g> Step<'g> for DistinctStep {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        while let Some(element) = starts.pull()? {
            if self.seen.insert(element.clone()) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.seen.clear();
    }
}

/// Drops elements whose id is in the exclusion set. Elements without an id
/// pass through.
#[derive(Debug)]
pub struct ExcludeIdsStep<'g> {
    graph: &'g Graph,
    ids: FxHashSet<ElementId>,
}

impl<'g> ExcludeIdsStep<'g> {
    /// Excludes every id in `ids`.
    pub fn new(graph: &'g Graph, ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            graph,
            ids: ids.into_iter().collect(),
        }
    }
}

impl<'g> Step<'g> for ExcludeIdsStep<'g> {
    fn name(&self) -> &'static str {
        "exclude_ids"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        while let Some(element) = starts.pull()? {
            match self.graph.id_of(&element) {
                Some(id) if self.ids.contains(&id) => continue,
                _ => return Ok(Some(element)),
            }
        }
        Ok(None)
    }
}

/// Keeps vertices, edges and property maps whose `key` property equals `value`.
#[derive(Debug)]
pub struct HasStep<'g> {
    graph: &'g Graph,
    key: String,
    value: PropertyValue,
}

impl<'g> HasStep<'g> {
    /// Filters on `key == value`.
    pub fn new(graph: &'g Graph, key: String, value: PropertyValue) -> Self {
        Self { graph, key, value }
    }
}

impl<'g> Step<'g> for HasStep<'g> {
    fn name(&self) -> &'static str {
        "has"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        while let Some(element) = starts.pull()? {
            let matches = self
                .graph
                .properties_of(&element)
                .and_then(|props| props.get(&self.key))
                .is_some_and(|v| *v == self.value);
            if matches {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

/// Keeps vertices and edges carrying one of the given labels.
#[derive(Debug)]
pub struct HasLabelStep<'g> {
    graph: &'g Graph,
    labels: Vec<String>,
}

impl<'g> HasLabelStep<'g> {
    /// Filters on label membership.
    pub fn new(graph: &'g Graph, labels: Vec<String>) -> Self {
        Self { graph, labels }
    }
}

impl<'g> Step<'g> for HasLabelStep<'g> {
    fn name(&self) -> &'static str {
        "has_label"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        while let Some(element) = starts.pull()? {
            let matches = self
                .graph
                .label_of(&element)
                .is_some_and(|label| self.labels.iter().any(|l| l == label));
            if matches {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}
