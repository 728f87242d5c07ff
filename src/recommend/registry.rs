//! Strategy lookup by name and batch execution.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::RecommenderConfig;
use crate::error::{GraphError, Result};
use crate::graph::{BuildReport, DomainSource, GraphFactory};

use super::{
    GraphCollaborativeFilter, PopularityRecommender, RecommendationStore, Recommender,
    RecommenderContext, RunSummary,
};

/// Builds a strategy from the batch collaborators.
pub type StrategyConstructor =
    Box<dyn Fn(&RecommenderContext) -> Result<Box<dyn Recommender>> + Send + Sync>;

/// Name → constructor table.
pub struct RecommenderRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl Default for RecommenderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl RecommenderRegistry {
    /// Registry with no strategies.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry holding `graph_cf` and `popularity`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(GraphCollaborativeFilter::NAME, |ctx| {
            Ok(Box::new(GraphCollaborativeFilter::new(ctx)))
        });
        registry.register(PopularityRecommender::NAME, |ctx| {
            Ok(Box::new(PopularityRecommender::new(ctx)))
        });
        registry
    }

    /// Adds or replaces the strategy called `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&RecommenderContext) -> Result<Box<dyn Recommender>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Instantiates the strategy called `name`.
    pub fn create(&self, name: &str, ctx: &RecommenderContext) -> Result<Box<dyn Recommender>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| GraphError::UnknownStrategy(name.to_owned()))?;
        constructor(ctx)
    }
}

/// Result of a whole batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Graph construction counters.
    pub build: BuildReport,
    /// One summary per strategy, in run order.
    pub strategies: Vec<RunSummary>,
}

impl BatchReport {
    /// Listings inserted across every strategy.
    pub fn entries_written(&self) -> usize {
        self.strategies.iter().map(|s| s.entries_written).sum()
    }
}

/// Builds the graph once and runs the configured strategies over it.
pub struct BatchRunner {
    registry: RecommenderRegistry,
    config: RecommenderConfig,
}

impl BatchRunner {
    /// Runner over the built-in strategies.
    pub fn new(config: RecommenderConfig) -> Self {
        Self::with_registry(RecommenderRegistry::with_builtins(), config)
    }

    /// Runner over a caller-supplied registry.
    pub fn with_registry(registry: RecommenderRegistry, config: RecommenderConfig) -> Self {
        Self { registry, config }
    }

    /// Registry in use.
    pub fn registry(&self) -> &RecommenderRegistry {
        &self.registry
    }

    /// Runs every configured strategy, in order.
    ///
    /// Strategy names are checked before the graph is built, so a typo fails
    /// without touching the store. Any strategy error aborts the batch.
    pub fn run(
        &self,
        source: &dyn DomainSource,
        store: Arc<dyn RecommendationStore>,
    ) -> Result<BatchReport> {
        if let Some(unknown) = self
            .config
            .strategies
            .iter()
            .find(|name| !self.registry.contains(name))
        {
            return Err(GraphError::UnknownStrategy(unknown.clone()));
        }

        let started = Instant::now();
        info!(strategies = ?self.config.strategies, top_n = self.config.top_n, "batch.start");
        let (graph, build) = GraphFactory::build_with_report(source)?;
        let ctx = RecommenderContext {
            graph: Arc::new(graph),
            store,
            config: self.config.clone(),
        };

        let mut report = BatchReport {
            build,
            strategies: Vec::with_capacity(self.config.strategies.len()),
        };
        for name in &self.config.strategies {
            let mut strategy = self.registry.create(name, &ctx)?;
            report.strategies.push(strategy.recommend()?);
        }
        info!(
            strategies = report.strategies.len(),
            entries = report.entries_written(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch.finished"
        );
        Ok(report)
    }
}
