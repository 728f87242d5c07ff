//! Lazy, pull-based traversal pipes.
//!
//! A [`Pipe`] pairs a [`Step`] (the transformation) with its upstream
//! [`Starts`] and a single-slot [`LookAhead`] buffer. Nothing is computed until
//! a consumer calls [`Pipe::has_next`] or [`Pipe::next`]; `has_next` computes at
//! most one element ahead and parks it in the buffer until `next` takes it.
//! End of sequence is an `Ok(None)` from the step, never an error.

use std::fmt;

use crate::error::{GraphError, Result};
use crate::model::Element;

mod filter;
mod project;
mod traverse;

#[cfg(test)]
mod tests;

pub use filter::{DistinctStep, ExcludeIdsStep, HasLabelStep, HasStep, LimitStep};
pub use project::{IdStep, PropertiesStep, SideEffectStep};
pub use traverse::{AdjacentVerticesStep, EdgeSide, EdgeVertexStep, IdentityStep, IncidentEdgesStep};

/// The transformation performed by one pipe.
///
/// Implementations pull from `starts` as needed and return the next produced
/// element, or `Ok(None)` once they have nothing left to emit.
pub trait Step<'g> {
    /// Step name used when describing a pipeline.
    fn name(&self) -> &'static str;

    /// Produces the next element or signals end of sequence.
    fn process_next_start(&mut self, starts: &mut Starts<'g>) -> Result<Option<Element>>;

    /// Clears per-run state such as counters, seen-sets and edge cursors.
    fn reset(&mut self) {}
}

/// Raw sequence adapter used as the source of the first pipe.
#[derive(Clone, Debug, Default)]
pub struct ElementSource {
    items: Vec<Element>,
    pos: usize,
}

impl ElementSource {
    /// Wraps an ordered list of elements.
    pub fn new(items: Vec<Element>) -> Self {
        Self { items, pos: 0 }
    }

    /// Whether another element remains.
    pub fn has_next(&self) -> bool {
        self.pos < self.items.len()
    }

    /// Returns the next element, or `None` exactly once the list is consumed.
    pub fn next_element(&mut self) -> Option<Element> {
        let item = self.items.get(self.pos).cloned()?;
        self.pos += 1;
        Some(item)
    }

    /// Rewinds to the first element.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Number of elements in the underlying list.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the underlying list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Element> for ElementSource {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Upstream of a pipe.
#[derive(Default)]
pub enum Starts<'g> {
    /// Nothing bound yet; pulling fails with `InvalidState`.
    #[default]
    Unbound,
    /// A raw element sequence.
    Source(ElementSource),
    /// Another pipe.
    Pipe(Box<Pipe<'g>>),
}

impl<'g> Starts<'g> {
    /// Pulls the next upstream element.
    pub fn pull(&mut self) -> Result<Option<Element>> {
        match self {
            Starts::Unbound => Err(GraphError::invalid_state(
                "pipe pulled before its starts were bound",
            )),
            Starts::Source(source) => Ok(source.next_element()),
            Starts::Pipe(pipe) => pipe.next(),
        }
    }

    fn reset(&mut self) {
        match self {
            Starts::Unbound => {}
            Starts::Source(source) => source.rewind(),
            Starts::Pipe(pipe) => pipe.reset(),
        }
    }

    fn is_bound(&self) -> bool {
        match self {
            Starts::Unbound => false,
            Starts::Source(_) => true,
            Starts::Pipe(pipe) => pipe.starts.is_bound(),
        }
    }
}

impl fmt::Debug for Starts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Starts::Unbound => f.write_str("Unbound"),
            Starts::Source(source) => write!(f, "Source({} elements)", source.len()),
            Starts::Pipe(pipe) => write!(f, "Pipe({})", pipe.name()),
        }
    }
}

/// Single-slot look-ahead buffer of a pipe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LookAhead {
    /// Nothing computed ahead of the consumer.
    #[default]
    Empty,
    /// One element computed by `has_next` and not yet taken.
    Buffered(Element),
    /// The step reported end of sequence.
    Exhausted,
}

/// One lazy transformation stage.
pub struct Pipe<'g> {
    step: Box<dyn Step<'g> + 'g>,
    starts: Starts<'g>,
    state: LookAhead,
}

impl<'g> Pipe<'g> {
    /// Wraps a step into an unbound pipe.
    pub fn new<S: Step<'g> + 'g>(step: S) -> Self {
        Self {
            step: Box::new(step),
            starts: Starts::Unbound,
            state: LookAhead::Empty,
        }
    }

    /// Name of the wrapped step.
    pub fn name(&self) -> &'static str {
        self.step.name()
    }

    /// Binds the upstream of this pipe, replacing any previous binding.
    pub fn set_starts(&mut self, starts: Starts<'g>) {
        self.starts = starts;
        self.state = LookAhead::Empty;
    }

    /// Current look-ahead state.
    pub fn look_ahead(&self) -> &LookAhead {
        &self.state
    }

    /// Whether another element is available, computing it if necessary.
    pub fn has_next(&mut self) -> Result<bool> {
        match self.state {
            LookAhead::Buffered(_) => Ok(true),
            LookAhead::Exhausted => Ok(false),
            LookAhead::Empty => match self.step.process_next_start(&mut self.starts)? {
                Some(element) => {
                    self.state = LookAhead::Buffered(element);
                    Ok(true)
                }
                None => {
                    self.state = LookAhead::Exhausted;
                    Ok(false)
                }
            },
        }
    }

    /// Takes the buffered element, or computes the next one directly.
    pub fn next(&mut self) -> Result<Option<Element>> {
        match std::mem::take(&mut self.state) {
            LookAhead::Buffered(element) => Ok(Some(element)),
            LookAhead::Exhausted => {
                self.state = LookAhead::Exhausted;
                Ok(None)
            }
            LookAhead::Empty => {
                let produced = self.step.process_next_start(&mut self.starts)?;
                if produced.is_none() {
                    self.state = LookAhead::Exhausted;
                }
                Ok(produced)
            }
        }
    }

    /// Clears buffered and step state here and in every upstream pipe, and
    /// rewinds the raw source.
    pub fn reset(&mut self) {
        self.state = LookAhead::Empty;
        self.step.reset();
        self.starts.reset();
    }

    /// Binds `source` to the innermost pipe of the chain ending at `self`.
    pub(crate) fn bind_source(&mut self, source: ElementSource) {
        match &mut self.starts {
            Starts::Pipe(inner) => inner.bind_source(source),
            _ => self.set_starts(Starts::Source(source)),
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.starts.is_bound()
    }

    /// Step names from the first pipe of the chain to this one.
    pub(crate) fn collect_names(&self, out: &mut Vec<&'static str>) {
        if let Starts::Pipe(inner) = &self.starts {
            inner.collect_names(out);
        }
        out.push(self.name());
    }
}

impl fmt::Debug for Pipe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("step", &self.name())
            .field("starts", &self.starts)
            .field("state", &self.state)
            .finish()
    }
}
