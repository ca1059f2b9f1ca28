//! Editing facade: DOT text, its parse tree and the derived index, kept in
//! step.
//!
//! The text is the source of truth. Every structural edit runs the splice
//! engine over a copy of the text, re-parses the result and re-builds the
//! index; only when all of that succeeds are the three replaced together.
//! A failed edit leaves the last committed state untouched.

use crate::config::EditorConfig;
use crate::error::EditError;
use crate::splice::{self, Target};
use dot_core::{Attributes, Graph, GraphIndex, emit_graph, parse_graph, quote_id_if_necessary};
use std::fmt;

/// Empty attribute list for `insert_node` / `insert_edge`.
pub const NO_ATTRS: [(&str, Option<&str>); 0] = [];

/// A DOT document open for editing.
#[derive(Debug, Clone)]
pub struct DotGraph {
    text: String,
    tree: Graph,
    index: GraphIndex,
    config: EditorConfig,
}

impl DotGraph {
    /// Parse `text` with the default configuration.
    pub fn new(text: impl Into<String>) -> Result<Self, EditError> {
        Self::with_config(text, EditorConfig::default())
    }

    pub fn with_config(text: impl Into<String>, config: EditorConfig) -> Result<Self, EditError> {
        let text = text.into();
        let tree = parse_graph(&text)?;
        let index = GraphIndex::build(&tree);
        Ok(Self {
            text,
            tree,
            index,
            config,
        })
    }

    /// Re-parse the current text and rebuild the index.
    pub fn reparse(&mut self) -> Result<(), EditError> {
        let text = self.text.clone();
        self.commit(text)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Current source text, byte for byte.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Graph {
        &self.tree
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn node_attributes(&self, name: &str) -> Option<&Attributes> {
        self.index.node(name)
    }

    /// Attributes of the edge keyed `from->to` (`from--to` in an
    /// undirected graph).
    pub fn edge_attributes(&self, key: &str) -> Option<&Attributes> {
        self.index.edge(key)
    }

    // ─── Insertion ───────────────────────────────────────────────────────

    /// Append a node statement before the closing brace of the root graph.
    ///
    /// Attributes whose value is `None` are left out.
    pub fn insert_node<I, K, V>(&mut self, name: &str, attrs: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: fmt::Display,
        V: fmt::Display,
    {
        let statement = format!(
            "{}{}{}\n",
            self.config.indent,
            quote_id_if_necessary(name),
            attribute_list(attrs)
        );
        self.insert_statement(&statement)
    }

    /// Append an edge statement, using `->` or `--` to match the graph.
    pub fn insert_edge<I, K, V>(&mut self, from: &str, to: &str, attrs: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: fmt::Display,
        V: fmt::Display,
    {
        let statement = format!(
            "{}{} {} {}{}\n",
            self.config.indent,
            quote_id_if_necessary(from),
            self.tree.kind.edge_op(),
            quote_id_if_necessary(to),
            attribute_list(attrs)
        );
        self.insert_statement(&statement)
    }

    fn insert_statement(&mut self, statement: &str) -> Result<(), EditError> {
        let text = splice::insert_at_end(
            &self.text,
            &self.tree,
            statement,
            self.config.fresh_line_inserts,
        )?;
        self.commit(text)?;
        log::debug!("inserted `{}`", statement.trim());
        Ok(())
    }

    // ─── Deletion ────────────────────────────────────────────────────────

    /// Erase every declaration of `name` and every edge that touches it.
    ///
    /// Returns the number of node statements, endpoints and edge operators
    /// erased; `0` means the node was not found and nothing changed.
    pub fn delete_node(&mut self, name: &str) -> Result<usize, EditError> {
        self.delete(Target::Node(name))
    }

    /// Erase the edge named `A->B` or `A--B`, splitting any chain it is
    /// part of. Either side may carry a port (`a:out->b`).
    pub fn delete_edge(&mut self, spec: &str) -> Result<usize, EditError> {
        let (from, to) =
            split_edge_spec(spec).ok_or_else(|| EditError::InvalidEdgeSpec(spec.to_string()))?;
        self.delete(Target::Edge { from, to })
    }

    fn delete(&mut self, target: Target<'_>) -> Result<usize, EditError> {
        let outcome = splice::delete(&self.text, &self.tree, target)?;
        if outcome.erased == 0 {
            return Ok(0);
        }
        self.commit(outcome.text)?;
        log::debug!("deleted {target:?}: {} elements erased", outcome.erased);
        Ok(outcome.erased)
    }

    fn commit(&mut self, text: String) -> Result<(), EditError> {
        let tree = parse_graph(&text)?;
        self.index = GraphIndex::build(&tree);
        self.tree = tree;
        self.text = text;
        Ok(())
    }
}

impl fmt::Display for DotGraph {
    /// Canonical single-line rendering of the current tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&emit_graph(&self.tree))
    }
}

/// ` [k=v k2=v2]`, or nothing when no attribute has a value.
fn attribute_list<I, K, V>(attrs: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: fmt::Display,
    V: fmt::Display,
{
    let entries: Vec<String> = attrs
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.to_string();
            Some(format!(
                "{}={}",
                quote_id_if_necessary(&key.to_string()),
                quote_id_if_necessary(&value)
            ))
        })
        .collect();
    if entries.is_empty() {
        String::new()
    } else {
        format!(" [{}]", entries.join(" "))
    }
}

/// Split `A--B` or `A->B` into its endpoint names.
fn split_edge_spec(spec: &str) -> Option<(&str, &str)> {
    ["--", "->"].into_iter().find_map(|op| {
        let (from, to) = spec.split_once(op)?;
        let (from, to) = (from.trim(), to.trim());
        let valid = !from.is_empty() && !to.is_empty() && !to.contains(op);
        valid.then_some((from, to))
    })
}
