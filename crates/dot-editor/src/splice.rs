//! Structural edits: walk a parse tree and the text it came from in lockstep,
//! erasing or inserting at the matching source positions.
//!
//! Every byte the walk does not touch survives, so comments, blank lines and
//! the author's layout are kept.

use crate::cursor::{Cursor, SkipOptions, Token};
use crate::error::EditError;
use dot_core::{
    AttrStatement, AttrTarget, AttrValue, Attribute, EdgeStatement, Endpoint, Graph, Id,
    NodeRef, NodeStatement, Statement, Subgraph,
};

/// What a walk erases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// Walk without erasing; the text comes back unchanged.
    Nothing,
    /// Every node statement declaring this id, and every edge endpoint that
    /// names it.
    Node(&'a str),
    /// The edge between two adjacent endpoints. Each side matches a bare id
    /// or `id:port[:compass]`.
    Edge { from: &'a str, to: &'a str },
}

impl Target<'_> {
    fn is_node(&self, id: &str) -> bool {
        matches!(self, Target::Node(name) if *name == id)
    }

    fn is_edge(&self, left: &NodeRef, right: &NodeRef) -> bool {
        let names = |node: &NodeRef, name: &str| node.id == name || node.qualified() == name;
        matches!(self, Target::Edge { from, to } if names(left, from) && names(right, to))
    }
}

/// Outcome of an erasing walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub text: String,
    /// Node statements, endpoints and edge operators erased.
    pub erased: usize,
}

/// Erase `target` from `text`, which `graph` must have been parsed from.
pub fn delete(text: &str, graph: &Graph, target: Target<'_>) -> Result<Splice, EditError> {
    let mut cursor = Cursor::new(text);
    let walker = Walker::new(graph, target);
    walker.open(&mut cursor, graph)?;
    walker.statements(&mut cursor, &graph.children)?;
    cursor.skip(Token::Punct("}"), false, SkipOptions::NONE)?;

    let erased = cursor.erased();
    Ok(Splice {
        text: cursor.into_text(),
        erased,
    })
}

/// Insert `snippet` right before the closing `}` of the root graph.
///
/// With `fresh_line`, a newline is added first unless the snippet would
/// already start a line.
pub fn insert_at_end(text: &str, graph: &Graph, snippet: &str, fresh_line: bool) -> Result<String, EditError> {
    let mut cursor = Cursor::new(text);
    let walker = Walker::new(graph, Target::Nothing);
    walker.open(&mut cursor, graph)?;
    walker.statements(&mut cursor, &graph.children)?;
    cursor.seek(Token::Punct("}"))?;

    if fresh_line && !cursor.follows_newline() {
        cursor.insert("\n");
    }
    cursor.insert(snippet);
    Ok(cursor.into_text())
}

// ─── Walker ──────────────────────────────────────────────────────────────

struct Walker<'t> {
    target: Target<'t>,
    edge_op: &'static str,
}

impl<'t> Walker<'t> {
    fn new(graph: &Graph, target: Target<'t>) -> Self {
        Self {
            target,
            edge_op: graph.kind.edge_op(),
        }
    }

    /// `[strict] graph|digraph [id] {`
    fn open(&self, cur: &mut Cursor, graph: &Graph) -> Result<(), EditError> {
        if graph.strict {
            cur.skip(Token::Keyword("strict"), false, SkipOptions::NONE)?;
        }
        cur.skip(Token::Keyword(graph.kind.keyword()), false, SkipOptions::NONE)?;
        if let Some(id) = &graph.id {
            cur.skip(Token::Ident(id), false, SkipOptions::NONE)?;
        }
        cur.skip(Token::Punct("{"), false, SkipOptions::NONE)?;
        Ok(())
    }

    fn statements(&self, cur: &mut Cursor, statements: &[Statement]) -> Result<(), EditError> {
        for statement in statements {
            let erased_statement = match statement {
                Statement::Attr(stmt) => {
                    self.attr_statement(cur, stmt)?;
                    false
                }
                Statement::Node(stmt) => self.node_statement(cur, stmt)?,
                Statement::Edge(stmt) => self.edge_statement(cur, stmt)?,
                Statement::Subgraph(sub) => {
                    self.subgraph(cur, sub)?;
                    false
                }
            };
            cur.skip_separators(erased_statement, SkipOptions::STATEMENT);
        }
        cur.trim_after_last_match();
        Ok(())
    }

    fn attr_statement(&self, cur: &mut Cursor, stmt: &AttrStatement) -> Result<(), EditError> {
        // `k=v` at statement level parses as a graph attribute statement
        let opts = if stmt.target == AttrTarget::Graph {
            SkipOptions::OPTIONAL
        } else {
            SkipOptions::NONE
        };
        cur.skip(Token::Keyword(stmt.target.keyword()), false, opts)?;
        self.attributes(cur, &stmt.attrs, false)
    }

    fn node_statement(&self, cur: &mut Cursor, stmt: &NodeStatement) -> Result<bool, EditError> {
        let erase = self.target.is_node(&stmt.node.id);
        self.node_ref(cur, &stmt.node, erase)?;
        self.attributes(cur, &stmt.attrs, erase)?;
        if erase {
            cur.count_erased();
        }
        Ok(erase)
    }

    /// Returns whether every endpoint was erased, in which case the
    /// statement's separator goes too.
    fn edge_statement(&self, cur: &mut Cursor, stmt: &EdgeStatement) -> Result<bool, EditError> {
        let mut erased_everything = true;
        let mut erased_left = false;
        let mut erased_last_op = false;
        let mut any_op_erased = false;
        // whether the last surviving endpoint is still reached by a kept operator
        let mut survivor_linked = false;

        for (i, endpoint) in stmt.endpoints.iter().enumerate() {
            let erase_endpoint = match endpoint {
                Endpoint::Node(node) => self.target.is_node(&node.id),
                Endpoint::Subgraph(_) => false,
            };

            if i > 0 {
                let split = match (&stmt.endpoints[i - 1], endpoint) {
                    (Endpoint::Node(left), Endpoint::Node(right)) => self.target.is_edge(left, right),
                    _ => false,
                };
                let erase_op = erase_endpoint || erased_left || erased_everything || split;
                cur.skip(Token::Punct(self.edge_op), erase_op, SkipOptions::NONE)?;
                if erase_op {
                    cur.count_erased();
                    // keep the surviving neighbours apart: `a->b->c` minus
                    // `a->b` is `a b->c`, not `ab->c`
                    if !erased_everything && !erase_endpoint && !cur.follows_separator() {
                        cur.insert(" ");
                    }
                }
                erased_last_op = erase_op;
                any_op_erased |= erase_op;
            }
            let linked = i > 0 && !erased_last_op;

            match endpoint {
                Endpoint::Node(node) => {
                    self.node_ref(cur, node, erase_endpoint)?;
                    if erase_endpoint {
                        cur.count_erased();
                    } else {
                        erased_everything = false;
                        survivor_linked = linked;
                    }
                }
                Endpoint::Subgraph(sub) => {
                    self.subgraph(cur, sub)?;
                    erased_everything = false;
                    survivor_linked = linked;
                }
            }
            erased_left = erase_endpoint;
        }

        // the list stays while some edge of the chain survives
        self.attributes(cur, &stmt.attrs, any_op_erased && !survivor_linked)?;
        if erased_last_op {
            cur.trim_after_last_match();
        }
        Ok(erased_everything)
    }

    fn subgraph(&self, cur: &mut Cursor, sub: &Subgraph) -> Result<(), EditError> {
        cur.skip(Token::Keyword("subgraph"), false, SkipOptions::OPTIONAL)?;
        if let Some(id) = &sub.id {
            cur.skip(Token::Ident(id), false, SkipOptions::NONE)?;
        }
        cur.skip(Token::Punct("{"), false, SkipOptions::NONE)?;
        self.statements(cur, &sub.children)?;
        cur.skip(Token::Punct("}"), false, SkipOptions::NONE)?;
        Ok(())
    }

    fn node_ref(&self, cur: &mut Cursor, node: &NodeRef, erase: bool) -> Result<(), EditError> {
        cur.skip(Token::Ident(&node.id), erase, SkipOptions::NONE)?;
        if let Some(port) = &node.port {
            cur.skip(Token::Punct(":"), erase, SkipOptions::NONE)?;
            cur.skip(Token::Ident(&port.id), erase, SkipOptions::NONE)?;
            if let Some(compass) = &port.compass {
                cur.skip(Token::Punct(":"), erase, SkipOptions::NONE)?;
                cur.skip(Token::Ident(compass), erase, SkipOptions::NONE)?;
            }
        }
        Ok(())
    }

    /// Walk one or more bracketed lists holding `attrs`, including empty
    /// `[]` lists the tree does not record.
    fn attributes(&self, cur: &mut Cursor, attrs: &[Attribute], erase: bool) -> Result<(), EditError> {
        for attr in attrs {
            self.empty_attr_lists(cur, erase)?;
            cur.skip(Token::Punct("["), erase, SkipOptions::OPTIONAL)?;
            cur.skip(Token::Ident(&attr.key), erase, SkipOptions::LIST)?;
            cur.skip(Token::Punct("="), erase, SkipOptions::NONE)?;
            cur.skip(value_token(&attr.value), erase, SkipOptions::NONE)?;
            cur.skip(Token::Punct("]"), erase, SkipOptions::LIST.optional())?;
        }
        self.empty_attr_lists(cur, erase)
    }

    fn empty_attr_lists(&self, cur: &mut Cursor, erase: bool) -> Result<(), EditError> {
        while cur.at_empty_attr_list() {
            cur.skip(Token::Punct("["), erase, SkipOptions::NONE)?;
            cur.skip(Token::Punct("]"), erase, SkipOptions::NONE)?;
        }
        Ok(())
    }
}

fn value_token(value: &AttrValue) -> Token<'_> {
    match value {
        AttrValue::Id(Id { text, html: true }) => Token::Html(text),
        AttrValue::Text(text) | AttrValue::Id(Id { text, html: false }) => Token::Ident(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dot_core::parse_graph;
    use pretty_assertions::assert_eq;

    fn erase(text: &str, target: Target<'_>) -> Splice {
        let graph = parse_graph(text).expect("parse failed");
        delete(text, &graph, target).expect("walk failed")
    }

    #[test]
    fn walk_without_target_is_identity() {
        let text = "/* c */ strict DiGraph \"g\" {\n  node [shape=box];\n  a:p:n -> b [x=1, y=\"2\"] [];\n  k=v\n  subgraph s { c # hash\n }\n  d -> {e f}\n}\n";
        let splice = erase(text, Target::Nothing);
        assert_eq!(splice.text, text);
        assert_eq!(splice.erased, 0);
    }

    #[test]
    fn delete_node_line() {
        let splice = erase("digraph {\n  a\n  b\n}", Target::Node("a"));
        assert_eq!(splice.text, "digraph {\n  b\n}");
        assert_eq!(splice.erased, 1);
    }

    #[test]
    fn delete_node_with_attributes() {
        let splice = erase("digraph {\n  a [color=red, shape=box];\n  b\n}", Target::Node("a"));
        assert_eq!(splice.text, "digraph {\n  b\n}");
    }

    #[test]
    fn delete_middle_of_chain() {
        let splice = erase("digraph {a->x->c}", Target::Node("x"));
        assert_eq!(splice.text, "digraph {a c}");
        assert_eq!(splice.erased, 3);
    }

    #[test]
    fn delete_middle_of_chain_with_attributes() {
        let splice = erase("digraph {\n  a -> x -> c [color=red];\n}", Target::Node("x"));
        assert_eq!(splice.text, "digraph {\n  a c;\n}");
    }

    #[test]
    fn delete_chain_tail_keeps_attributes() {
        let splice = erase("digraph {\n  a -> b -> x [color=red];\n}", Target::Node("x"));
        assert_eq!(splice.text, "digraph {\n  a -> b [color=red];\n}");
        assert_eq!(splice.erased, 2);
    }

    #[test]
    fn delete_inside_long_chain_keeps_attributes_on_tail() {
        let splice = erase("digraph { a -> b -> x -> c -> d [color=red] }", Target::Node("x"));
        assert_eq!(splice.text, "digraph { a -> b c -> d [color=red] }");
        assert_eq!(splice.erased, 3);
    }

    #[test]
    fn delete_first_endpoint() {
        let splice = erase("digraph { x -> a }", Target::Node("x"));
        assert_eq!(splice.text, "digraph { a }");
    }

    #[test]
    fn delete_self_loop_statement() {
        let splice = erase("digraph {\n  a -> a;\n  b\n}", Target::Node("a"));
        assert_eq!(splice.text, "digraph {\n  b\n}");
        assert_eq!(splice.erased, 3);
    }

    #[test]
    fn delete_before_subgraph_endpoint() {
        let splice = erase("digraph { a -> x -> {b} }", Target::Node("x"));
        assert_eq!(splice.text, "digraph { a {b} }");
    }

    #[test]
    fn split_edge_inserts_space_when_needed() {
        let splice = erase("digraph{a->b->c}", Target::Edge { from: "a", to: "b" });
        assert_eq!(splice.text, "digraph{a b->c}");
        assert_eq!(splice.erased, 1);
    }

    #[test]
    fn split_edge_matches_ports() {
        let text = "digraph { a:out -> b }";
        let qualified = erase(text, Target::Edge { from: "a:out", to: "b" });
        assert_eq!(qualified.text, "digraph { a:out b }");
        let bare = erase(text, Target::Edge { from: "a", to: "b" });
        assert_eq!(bare.text, qualified.text);
    }

    #[test]
    fn node_inside_subgraph() {
        let splice = erase("graph { subgraph s {\n  x\n  y\n} }", Target::Node("y"));
        assert_eq!(splice.text, "graph { subgraph s {\n  x\n} }");
    }

    #[test]
    fn quoted_ids_match() {
        let splice = erase("digraph { \"my node\"; b }", Target::Node("my node"));
        assert_eq!(splice.text, "digraph { b }");
    }

    #[test]
    fn mismatched_tree_is_reported() {
        let graph = parse_graph("digraph { b }").unwrap();
        let err = delete("digraph { a }", &graph, Target::Nothing).unwrap_err();
        assert_eq!(
            err,
            EditError::StructuralMismatch {
                expected: "b".into(),
                found: "a }".into(),
            }
        );
    }

    #[test]
    fn insert_goes_before_closing_brace() {
        let text = "digraph {\n  a\n} // tail";
        let graph = parse_graph(text).unwrap();
        let out = insert_at_end(text, &graph, "  b\n", true).unwrap();
        assert_eq!(out, "digraph {\n  a\n  b\n} // tail");
    }

    #[test]
    fn insert_starts_fresh_line() {
        let text = "digraph { a }";
        let graph = parse_graph(text).unwrap();
        assert_eq!(
            insert_at_end(text, &graph, "b\n", true).unwrap(),
            "digraph { a \nb\n}"
        );
        assert_eq!(
            insert_at_end(text, &graph, "b; ", false).unwrap(),
            "digraph { a b; }"
        );
    }
}
