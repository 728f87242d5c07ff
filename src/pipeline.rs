//! Linear composition of pipes.

use std::fmt;

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::Element;
use crate::pipe::{ElementSource, Pipe, Starts};

/// Chain of pipes where each pipe reads the output of the one before it.
///
/// The pipeline owns its chain through the last pipe: every pipe owns its
/// upstream pipe as its starts, and the first pipe owns the raw source.
#[derive(Default)]
pub struct Pipeline<'g> {
    end: Option<Pipe<'g>>,
    pending_source: Option<ElementSource>,
    len: usize,
}

impl<'g> Pipeline<'g> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the externally supplied source to the first pipe of the chain.
    /// When no pipe has been added yet, the source is kept until one is.
    pub fn set_starts(&mut self, source: ElementSource) {
        match &mut self.end {
            Some(end) => end.bind_source(source),
            None => self.pending_source = Some(source),
        }
    }

    /// Appends `pipe`, wiring its starts to the current end of the chain.
    pub fn add_pipe(&mut self, mut pipe: Pipe<'g>) {
        match self.end.take() {
            Some(previous) => pipe.set_starts(Starts::Pipe(Box::new(previous))),
            None => {
                if let Some(source) = self.pending_source.take() {
                    pipe.set_starts(Starts::Source(source));
                }
            }
        }
        self.end = Some(pipe);
        self.len += 1;
    }

    /// Number of pipes in the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no pipe has been added.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Step names from first to last, e.g. `identity -> out -> id`.
    pub fn describe(&self) -> String {
        let mut names = Vec::with_capacity(self.len);
        if let Some(end) = &self.end {
            end.collect_names(&mut names);
        }
        names.join(" -> ")
    }

    fn end_pipe(&mut self) -> Result<&mut Pipe<'g>> {
        let end = self
            .end
            .as_mut()
            .ok_or_else(|| GraphError::invalid_state("pipeline has no pipes"))?;
        if !end.is_bound() {
            return Err(GraphError::invalid_state("pipeline has no bound starts"));
        }
        Ok(end)
    }

    /// Whether the last pipe has another element.
    pub fn has_next(&mut self) -> Result<bool> {
        self.end_pipe()?.has_next()
    }

    /// Next element of the last pipe, `None` at end of sequence.
    pub fn next(&mut self) -> Result<Option<Element>> {
        self.end_pipe()?.next()
    }

    /// Drains every remaining element in order.
    pub fn to_list(&mut self) -> Result<Vec<Element>> {
        debug!(steps = %self.describe(), "pipeline.drain");
        let end = self.end_pipe()?;
        let mut out = Vec::new();
        while end.has_next()? {
            if let Some(element) = end.next()? {
                out.push(element);
            }
        }
        Ok(out)
    }

    /// Drains every remaining element, returning only how many there were.
    pub fn count(&mut self) -> Result<usize> {
        let end = self.end_pipe()?;
        let mut count = 0;
        while end.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Drains every remaining element for its side effects.
    pub fn iterate(&mut self) -> Result<()> {
        self.count().map(|_| ())
    }

    /// Clears all look-ahead and step state and rewinds the source so the
    /// pipeline can be drained again.
    pub fn reset(&mut self) {
        if let Some(end) = &mut self.end {
            end.reset();
        }
    }

    /// Borrowing iterator over the remaining elements.
    pub fn iter(&mut self) -> PipelineIter<'_, 'g> {
        PipelineIter { pipeline: self }
    }
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.describe())
            .field("pending_source", &self.pending_source.is_some())
            .finish()
    }
}

/// Iterator returned by [`Pipeline::iter`].
pub struct PipelineIter<'p, 'g> {
    pipeline: &'p mut Pipeline<'g>,
}

impl Iterator for PipelineIter<'_, '_> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pipeline.next().transpose()
    }
}
