//! Emitter: parse tree → canonical DOT text.
//!
//! Produces a normalized single-line rendering that ignores the original
//! formatting. Used for display and round-trip checks, never for editing.

use crate::model::*;
use crate::quote::quote_id_if_necessary;
use std::fmt::Write;

/// Render `graph` in canonical form.
#[must_use]
pub fn emit_graph(graph: &Graph) -> String {
    let mut out = String::with_capacity(256);
    if graph.strict {
        out.push_str("strict ");
    }
    out.push_str(graph.kind.keyword());
    out.push(' ');
    if let Some(id) = &graph.id {
        out.push_str(&quote_id_if_necessary(id));
        out.push(' ');
    }
    out.push('{');
    emit_statements(&mut out, &graph.children, graph.kind.edge_op());
    out.push('}');
    out
}

fn emit_statements(out: &mut String, statements: &[Statement], op: &str) {
    let mut first = true;
    let mut after_subgraph = false;
    for statement in statements {
        // An anonymous empty subgraph right after another subgraph is a
        // parser artifact, not content.
        if let Statement::Subgraph(sub) = statement
            && after_subgraph
            && sub.id.is_none()
            && sub.children.is_empty()
        {
            continue;
        }
        if !first {
            out.push(' ');
        }
        first = false;
        after_subgraph = matches!(statement, Statement::Subgraph(_));
        emit_statement(out, statement, op);
    }
}

fn emit_statement(out: &mut String, statement: &Statement, op: &str) {
    match statement {
        Statement::Node(stmt) => {
            emit_node_ref(out, &stmt.node);
            emit_attr_list(out, &stmt.attrs);
        }
        Statement::Edge(stmt) => {
            for (i, endpoint) in stmt.endpoints.iter().enumerate() {
                if i > 0 {
                    write!(out, " {op} ").unwrap();
                }
                match endpoint {
                    Endpoint::Node(node) => emit_node_ref(out, node),
                    Endpoint::Subgraph(sub) => emit_subgraph(out, sub, op),
                }
            }
            emit_attr_list(out, &stmt.attrs);
        }
        Statement::Attr(stmt) => {
            out.push_str(stmt.target.keyword());
            emit_attr_list(out, &stmt.attrs);
        }
        Statement::Subgraph(sub) => emit_subgraph(out, sub, op),
    }
}

fn emit_subgraph(out: &mut String, sub: &Subgraph, op: &str) {
    // the keyword is only written for a named subgraph
    if let Some(id) = &sub.id {
        write!(out, "subgraph {} ", quote_id_if_necessary(id)).unwrap();
    }
    out.push('{');
    emit_statements(out, &sub.children, op);
    out.push('}');
}

fn emit_node_ref(out: &mut String, node: &NodeRef) {
    out.push_str(&quote_id_if_necessary(&node.id));
    if let Some(port) = &node.port {
        write!(out, ":{}", quote_id_if_necessary(&port.id)).unwrap();
        if let Some(compass) = &port.compass {
            write!(out, ":{}", quote_id_if_necessary(compass)).unwrap();
        }
    }
}

fn emit_attr_list(out: &mut String, attrs: &[Attribute]) {
    if attrs.is_empty() {
        return;
    }
    out.push_str(" [");
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write!(out, "{}=", quote_id_if_necessary(&attr.key)).unwrap();
        emit_value(out, &attr.value);
    }
    out.push(']');
}

fn emit_value(out: &mut String, value: &AttrValue) {
    match value {
        AttrValue::Id(Id { text, html: true }) => write!(out, "<{text}>").unwrap(),
        AttrValue::Text(text) | AttrValue::Id(Id { text, html: false }) => {
            out.push_str(&quote_id_if_necessary(text));
        }
    }
}
