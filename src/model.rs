//! Element model shared by the graph arena and the traversal engine.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Property map attached to vertices and edges.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Public identifier of a vertex or edge.
///
/// Vertices built from domain data carry names such as `"p-1"`; vertices added
/// without an explicit id receive the next sequential integer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    /// Engine-assigned sequential id.
    Int(u64),
    /// Externally supplied id.
    Name(String),
}

impl ElementId {
    /// Returns the id as a string slice when it is a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ElementId::Name(name) => Some(name),
            ElementId::Int(_) => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Int(id) => write!(f, "{id}"),
            ElementId::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        ElementId::Name(value.to_owned())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        ElementId::Name(value)
    }
}

impl From<&String> for ElementId {
    fn from(value: &String) -> Self {
        ElementId::Name(value.clone())
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        ElementId::Int(value)
    }
}

impl From<&ElementId> for ElementId {
    fn from(value: &ElementId) -> Self {
        value.clone()
    }
}

/// Scalar or list value stored in a property map.
///
/// Floats compare and hash by bit pattern so that whole property maps can be
/// deduplicated by `distinct()`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Missing or explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns the contained string, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained boolean, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained integer, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::List(a), PropertyValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PropertyValue::Null => {}
            PropertyValue::Bool(b) => b.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::List(items) => items.hash(state),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&ElementId> for PropertyValue {
    fn from(value: &ElementId) -> Self {
        match value {
            ElementId::Int(id) => match i64::try_from(*id) {
                Ok(id) => PropertyValue::Integer(id),
                Err(_) => PropertyValue::String(id.to_string()),
            },
            ElementId::Name(name) => PropertyValue::String(name.clone()),
        }
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("null"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::String(s) => write!(f, "\"{s}\""),
            PropertyValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Arena index of a vertex inside its [`Graph`](crate::graph::Graph).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexIdx(pub u32);

/// Arena index of an edge inside its [`Graph`](crate::graph::Graph).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeIdx(pub u32);

/// Edge direction relative to a vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges leaving the vertex.
    Out,
    /// Edges arriving at the vertex.
    In,
    /// Outgoing edges followed by incoming edges.
    Both,
}

/// Edge indices of one vertex grouped by label, labels kept in first-use order.
#[derive(Clone, Debug, Default)]
pub struct EdgeLists {
    lists: Vec<(String, Vec<EdgeIdx>)>,
}

impl EdgeLists {
    pub(crate) fn push(&mut self, label: &str, edge: EdgeIdx) {
        match self.lists.iter_mut().find(|(l, _)| l == label) {
            Some((_, edges)) => edges.push(edge),
            None => self.lists.push((label.to_owned(), vec![edge])),
        }
    }

    /// Edges registered under `label`, in insertion order.
    pub fn get(&self, label: &str) -> &[EdgeIdx] {
        self.lists
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, edges)| edges.as_slice())
            .unwrap_or(&[])
    }

    /// Labels in the order they were first used.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.lists.iter().map(|(l, _)| l.as_str())
    }

    /// All edges, grouped by label in first-use order.
    pub fn all(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        self.lists.iter().flat_map(|(_, edges)| edges.iter().copied())
    }

    /// Total number of edges across all labels.
    pub fn len(&self) -> usize {
        self.lists.iter().map(|(_, edges)| edges.len()).sum()
    }

    /// Whether no edge is registered.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// Labeled, property-bearing node.
#[derive(Clone, Debug)]
pub struct Vertex {
    /// Public id, unique within the graph.
    pub id: ElementId,
    /// Category tag such as `profile` or `listing`.
    pub label: String,
    /// Property map.
    pub properties: PropertyMap,
    pub(crate) out_edges: EdgeLists,
    pub(crate) in_edges: EdgeLists,
}

impl Vertex {
    pub(crate) fn new(id: ElementId, label: String, properties: PropertyMap) -> Self {
        Self {
            id,
            label,
            properties,
            out_edges: EdgeLists::default(),
            in_edges: EdgeLists::default(),
        }
    }

    /// Outgoing edges grouped by label.
    pub fn out_edges(&self) -> &EdgeLists {
        &self.out_edges
    }

    /// Incoming edges grouped by label.
    pub fn in_edges(&self) -> &EdgeLists {
        &self.in_edges
    }

    /// Looks up a single property.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Labeled, directed relation between two vertices of the same graph.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Public id, sequential within the graph.
    pub id: ElementId,
    /// Relation name such as `bookmarked`.
    pub label: String,
    /// Property map.
    pub properties: PropertyMap,
    /// Vertex the edge originates from.
    pub out_vertex: VertexIdx,
    /// Vertex the edge terminates at.
    pub in_vertex: VertexIdx,
}

impl Edge {
    /// Endpoint opposite to `from`; for self-loops this is `from` itself.
    pub fn other_end(&self, from: VertexIdx) -> VertexIdx {
        if self.out_vertex == from {
            self.in_vertex
        } else {
            self.out_vertex
        }
    }
}

/// Value flowing between pipes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// Reference to a graph vertex.
    Vertex(VertexIdx),
    /// Reference to a graph edge.
    Edge(EdgeIdx),
    /// Projected element id.
    Id(ElementId),
    /// Projected property map.
    Properties(PropertyMap),
}

impl Element {
    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Vertex(_) => "vertex",
            Element::Edge(_) => "edge",
            Element::Id(_) => "id",
            Element::Properties(_) => "properties",
        }
    }

    /// Returns the vertex index when the element is a vertex.
    pub fn as_vertex(&self) -> Option<VertexIdx> {
        match self {
            Element::Vertex(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Returns the edge index when the element is an edge.
    pub fn as_edge(&self) -> Option<EdgeIdx> {
        match self {
            Element::Edge(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Returns the projected id when the element is an id.
    pub fn as_id(&self) -> Option<&ElementId> {
        match self {
            Element::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Consumes the element, returning the projected id if it is one.
    pub fn into_id(self) -> Option<ElementId> {
        match self {
            Element::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Consumes the element, returning the projected property map if it is one.
    pub fn into_properties(self) -> Option<PropertyMap> {
        match self {
            Element::Properties(map) => Some(map),
            _ => None,
        }
    }
}
