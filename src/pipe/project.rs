use std::fmt;

use super::{Starts, Step};
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::model::{Element, PropertyValue};

/// Projects each element to its id.
#[derive(Debug)]
pub struct IdStep<'g> {
    graph: &'g Graph,
}

impl<'g> IdStep<'g> {
    /// Resolves ids against `graph`.
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }
}

impl<'g> Step<'g> for IdStep<'g> {
    fn name(&self) -> &'static str {
        "id"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        let Some(element) = starts.pull()? else {
            return Ok(None);
        };
        match self.graph.id_of(&element) {
            Some(id) => Ok(Some(Element::Id(id))),
            None => Err(GraphError::invalid_state(format!(
                "id() cannot project a {} without an id",
                element.kind()
            ))),
        }
    }
}

/// Projects vertices and edges to a copy of their property map.
#[derive(Debug)]
pub struct PropertiesStep<'g> {
    graph: &'g Graph,
    internal: bool,
}

impl<'g> PropertiesStep<'g> {
    /// With `internal`, the projected map also carries `_id` and `_label`.
    pub fn new(graph: &'g Graph, internal: bool) -> Self {
        Self { graph, internal }
    }
}

impl<'g> Step<'g> for PropertiesStep<'g> {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        let Some(element) = starts.pull()? else {
            return Ok(None);
        };
        let mut map = self
            .graph
            .properties_of(&element)
            .cloned()
            .ok_or_else(|| {
                GraphError::invalid_state(format!(
                    "properties() cannot project a {}",
                    element.kind()
                ))
            })?;
        if self.internal {
            if let Some(id) = self.graph.id_of(&element) {
                map.insert("_id".into(), PropertyValue::from(&id));
            }
            if let Some(label) = self.graph.label_of(&element) {
                map.insert("_label".into(), label.into());
            }
        }
        Ok(Some(Element::Properties(map)))
    }
}

/// Runs a callback on every element and passes it through untouched.
pub struct SideEffectStep<'g> {
    callback: Box<dyn FnMut(&Element) + 'g>,
}

impl<'g> SideEffectStep<'g> {
    /// Wraps `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&Element) + 'g,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for SideEffectStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SideEffectStep")
    }
}

impl<'g> Step<'g> for SideEffectStep<'g> {
    fn name(&self) -> &'static str {
        "side_effect"
    }

    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>> {
        let next = starts.pull()?;
        if let Some(element) = &next {
            (self.callback)(element);
        }
        Ok(next)
    }
}
