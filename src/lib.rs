//! In-memory property graph with a lazy, pull-based traversal DSL and
//! collaborative-filtering recommenders built on top of it.
//!
//! ```
//! use gremlite::{Graph, PropertyMap};
//!
//! let mut graph = Graph::new();
//! let p = graph.add_vertex("profile", PropertyMap::new(), Some("p-1".into())).unwrap();
//! let l = graph.add_vertex("listing", PropertyMap::new(), Some("l-1".into())).unwrap();
//! graph.add_edge("bookmarked", p, l, PropertyMap::new()).unwrap();
//!
//! let fans = graph.query().v(["l-1"]).in_("bookmarked").to_id_list().unwrap();
//! assert_eq!(fans, vec!["p-1".into()]);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod model;
pub mod pipe;
pub mod pipeline;
pub mod query;
pub mod recommend;

pub use config::{RecommenderConfig, ScoreWeighting};
pub use error::{GraphError, Result};
pub use graph::{DomainSnapshot, DomainSource, Graph, GraphFactory};
pub use model::{Direction, Element, ElementId, PropertyMap, PropertyValue};
pub use pipeline::Pipeline;
pub use query::{Labels, Query};
pub use recommend::{BatchRunner, MemoryStore, RecommendationStore, Recommender};
