//! Parse-tree data model for DOT documents.
//!
//! The tree mirrors the statement structure of the source: statement order
//! inside a container matches source order, which is what lets the editor
//! walk tree and text in lockstep. The tree never records byte offsets;
//! text positions are rediscovered by matching tokens against the source.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Graph ───────────────────────────────────────────────────────────────

/// Whether the document is an undirected `graph` or a `digraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    Graph,
    Digraph,
}

impl GraphKind {
    /// The keyword that introduces the document.
    pub fn keyword(self) -> &'static str {
        match self {
            GraphKind::Graph => "graph",
            GraphKind::Digraph => "digraph",
        }
    }

    /// The edge operator allowed in this kind of graph.
    pub fn edge_op(self) -> &'static str {
        match self {
            GraphKind::Graph => "--",
            GraphKind::Digraph => "->",
        }
    }
}

/// Root of a parsed DOT document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub strict: bool,
    pub kind: GraphKind,
    pub id: Option<String>,
    pub children: Vec<Statement>,
}

impl Graph {
    /// An empty, non-strict, anonymous graph of the given kind.
    pub fn new(kind: GraphKind) -> Self {
        Self {
            strict: false,
            kind,
            id: None,
            children: Vec::new(),
        }
    }
}

// ─── Statements ──────────────────────────────────────────────────────────

/// One declaration inside a graph or subgraph body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Node(NodeStatement),
    Edge(EdgeStatement),
    Attr(AttrStatement),
    Subgraph(Subgraph),
}

/// `subgraph id { ... }`, `subgraph { ... }` or an anonymous `{ ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub id: Option<String>,
    pub children: Vec<Statement>,
}

/// `a:port [k=v]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatement {
    pub node: NodeRef,
    pub attrs: Vec<Attribute>,
}

/// `a -> b -> { c d } [k=v]`
///
/// A chain always has at least two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStatement {
    pub endpoints: SmallVec<[Endpoint; 2]>,
    pub attrs: Vec<Attribute>,
}

/// One link of an edge chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Endpoint {
    Node(NodeRef),
    Subgraph(Subgraph),
}

/// `graph [..]`, `node [..]`, `edge [..]`, or the bare `k = v` form, which
/// is recorded with target `Graph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrStatement {
    pub target: AttrTarget,
    pub attrs: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrTarget {
    Graph,
    Node,
    Edge,
}

impl AttrTarget {
    pub fn keyword(self) -> &'static str {
        match self {
            AttrTarget::Graph => "graph",
            AttrTarget::Node => "node",
            AttrTarget::Edge => "edge",
        }
    }
}

// ─── Node references & attributes ────────────────────────────────────────

/// A node identifier with an optional port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
    pub port: Option<Port>,
}

impl NodeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            port: None,
        }
    }

    /// `id`, `id:port` or `id:port:compass`.
    pub fn qualified(&self) -> String {
        match &self.port {
            None => self.id.clone(),
            Some(Port { id, compass: None }) => format!("{}:{id}", self.id),
            Some(Port {
                id,
                compass: Some(compass),
            }) => format!("{}:{id}:{compass}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub compass: Option<String>,
}

/// `key = value` inside an attribute list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: AttrValue,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AttrValue::Text(value.into()),
        }
    }
}

/// An attribute value: plain text, or an identifier that may be an
/// HTML-bracketed label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    Text(String),
    Id(Id),
}

impl AttrValue {
    /// The unescaped value text, without quotes or HTML brackets.
    pub fn as_str(&self) -> &str {
        match self {
            AttrValue::Text(text) | AttrValue::Id(Id { text, .. }) => text,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, AttrValue::Id(Id { html: true, .. }))
    }
}

/// Atomic identifier; `html` marks a `<...>` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Id {
    pub text: String,
    pub html: bool,
}
