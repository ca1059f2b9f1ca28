//! Graph index: node and edge attribute maps derived from a parse tree.
//!
//! The index is rebuilt wholesale after every parse; nothing is patched
//! incrementally. Edge chains are expanded pairwise and a subgraph used as
//! an endpoint stands for every node mentioned inside it, so
//! `a -> { b c }` yields `a->b` and `a->c`. An edge statement's attribute
//! list is copied onto every edge it implies.

use crate::model::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute key → value, in first-seen order.
pub type Attributes = IndexMap<String, AttrValue>;

/// Node and edge attribute maps for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphIndex {
    pub kind: GraphKind,
    pub nodes: IndexMap<String, Attributes>,
    /// Keyed `left<op>right`, endpoints in written order.
    pub edges: IndexMap<String, Attributes>,
}

impl GraphIndex {
    /// Walk `graph` once and collect every node and edge it declares.
    pub fn build(graph: &Graph) -> Self {
        let mut builder = IndexBuilder {
            index: GraphIndex {
                kind: graph.kind,
                nodes: IndexMap::new(),
                edges: IndexMap::new(),
            },
        };
        let mut mentioned = Vec::new();
        builder.visit_statements(&graph.children, &mut mentioned);
        builder.index
    }

    pub fn node(&self, name: &str) -> Option<&Attributes> {
        self.nodes.get(name)
    }

    pub fn edge(&self, key: &str) -> Option<&Attributes> {
        self.edges.get(key)
    }

    /// The key under which the edge `from → to` is stored.
    pub fn edge_key(&self, from: &str, to: &str) -> String {
        format!("{from}{}{to}", self.kind.edge_op())
    }
}

struct IndexBuilder {
    index: GraphIndex,
}

impl IndexBuilder {
    /// Visit `statements`, pushing every node id seen onto `mentioned`.
    fn visit_statements(&mut self, statements: &[Statement], mentioned: &mut Vec<String>) {
        for statement in statements {
            match statement {
                Statement::Node(stmt) => {
                    let attrs = self.register_node(&stmt.node.id, mentioned);
                    merge(attrs, &stmt.attrs);
                }
                Statement::Edge(stmt) => self.visit_edge(stmt, mentioned),
                Statement::Subgraph(sub) => self.visit_statements(&sub.children, mentioned),
                Statement::Attr(_) => {}
            }
        }
    }

    fn visit_edge(&mut self, stmt: &EdgeStatement, mentioned: &mut Vec<String>) {
        let mut previous: Vec<String> = Vec::new();
        for (i, endpoint) in stmt.endpoints.iter().enumerate() {
            let heads = self.visit_endpoint(endpoint, mentioned);
            if i > 0 {
                for left in &previous {
                    for right in &heads {
                        let key = self.index.edge_key(left, right);
                        merge(self.index.edges.entry(key).or_default(), &stmt.attrs);
                    }
                }
            }
            previous = heads;
        }
    }

    /// Register the nodes an endpoint stands for and return their ids.
    fn visit_endpoint(&mut self, endpoint: &Endpoint, mentioned: &mut Vec<String>) -> Vec<String> {
        match endpoint {
            Endpoint::Node(node) => {
                self.register_node(&node.id, mentioned);
                vec![node.id.clone()]
            }
            Endpoint::Subgraph(sub) => {
                let mut inner = Vec::new();
                self.visit_statements(&sub.children, &mut inner);
                mentioned.extend(inner.iter().cloned());
                let mut heads: Vec<String> = Vec::with_capacity(inner.len());
                for id in inner {
                    if !heads.contains(&id) {
                        heads.push(id);
                    }
                }
                heads
            }
        }
    }

    fn register_node(&mut self, id: &str, mentioned: &mut Vec<String>) -> &mut Attributes {
        mentioned.push(id.to_string());
        self.index.nodes.entry(id.to_string()).or_default()
    }
}

/// Later attributes override earlier ones with the same key.
fn merge(into: &mut Attributes, attrs: &[Attribute]) {
    for attr in attrs {
        into.insert(attr.key.clone(), attr.value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_graph;

    fn index(input: &str) -> GraphIndex {
        GraphIndex::build(&parse_graph(input).expect("parse failed"))
    }

    #[test]
    fn chain_yields_pairwise_edges() {
        let idx = index("digraph { a -> b -> c }");
        let keys: Vec<_> = idx.edges.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a->b", "b->c"]);
        let nodes: Vec<_> = idx.nodes.keys().map(String::as_str).collect();
        assert_eq!(nodes, ["a", "b", "c"]);
    }

    #[test]
    fn edge_direction_is_not_normalized() {
        let idx = index("graph { a -- b; b -- a }");
        assert!(idx.edge("a--b").is_some());
        assert!(idx.edge("b--a").is_some());
        assert_eq!(idx.edges.len(), 2);
    }

    #[test]
    fn node_attributes_merge_left_to_right() {
        let idx = index("digraph { a [color=red shape=box]; b -> a; a [color=blue] }");
        let attrs = idx.node("a").expect("node a");
        assert_eq!(attrs["color"].as_str(), "blue");
        assert_eq!(attrs["shape"].as_str(), "box");
        assert!(idx.node("b").expect("node b").is_empty());
    }

    #[test]
    fn edge_attributes_are_copied_to_every_implied_edge() {
        let idx = index("digraph { a -> b -> c [color=red] }");
        assert_eq!(idx.edge("a->b").expect("a->b")["color"].as_str(), "red");
        assert_eq!(idx.edge("b->c").expect("b->c")["color"].as_str(), "red");
    }

    #[test]
    fn subgraph_endpoint_expands_to_its_nodes() {
        let idx = index("digraph { a -> { b c } }");
        assert!(idx.edge("a->b").is_some());
        assert!(idx.edge("a->c").is_some());
        assert_eq!(idx.edges.len(), 2);
    }

    #[test]
    fn nested_subgraph_statements_are_indexed() {
        let idx = index("graph { subgraph s { x -- y; subgraph {} } }");
        assert!(idx.node("x").is_some());
        assert!(idx.edge("x--y").is_some());
    }

    #[test]
    fn attr_statements_are_ignored() {
        let idx = index("digraph { node [shape=box]; rankdir=LR }");
        assert!(idx.nodes.is_empty());
        assert!(idx.edges.is_empty());
    }

    #[test]
    fn ports_are_not_part_of_edge_keys() {
        let idx = index("digraph { a:out -> b:in:n }");
        assert!(idx.edge("a->b").is_some());
    }

    #[test]
    fn index_serializes_to_json() {
        let idx = index("digraph { a [label=\"hi\"] }");
        let json = serde_json::to_value(&idx).expect("serialize");
        assert_eq!(json["nodes"]["a"]["label"]["Text"], "hi");
    }
}
