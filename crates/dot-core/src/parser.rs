//! Parser for DOT source text → parse tree.
//!
//! Built on `winnow` 0.7. Handles: `strict`, `graph`/`digraph`, node, edge,
//! attribute and subgraph statements, ports, attribute lists, bare, numeral,
//! quoted and HTML identifiers, and `/* */`, `//` and `#` comments.
//!
//! Quoted identifiers are stored unescaped, but only `\"` is an escape;
//! every other backslash pair is kept verbatim so the identifier can be
//! re-quoted into exactly the text it came from.

use crate::error::ParseError;
use crate::model::*;
use crate::quote::KEYWORDS;
use smallvec::smallvec;
use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, cut_err, fail, opt};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// Parse a DOT document into a [`Graph`].
#[must_use = "parsing result should be used"]
pub fn parse_graph(source: &str) -> Result<Graph, ParseError> {
    let mut rest = source;
    let graph = parse_root(&mut rest).map_err(|e| ParseError::at(source, rest, describe(e, rest)))?;
    log::trace!(
        "parsed {} with {} top-level statements",
        graph.kind.keyword(),
        graph.children.len()
    );
    Ok(graph)
}

fn describe(err: ErrMode<ContextError>, rest: &str) -> String {
    let context = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx.to_string(),
        ErrMode::Incomplete(_) => String::new(),
    };
    let found = if rest.is_empty() {
        "end of input".to_string()
    } else {
        format!("{:?}", rest.chars().take(20).collect::<String>())
    };
    if context.is_empty() {
        format!("unexpected {found}")
    } else {
        format!("{context}, found {found}")
    }
}

// ─── Document structure ──────────────────────────────────────────────────

fn parse_root(input: &mut &str) -> ModalResult<Graph> {
    skip_ws_and_comments(input);
    let strict = eat_keyword(input, "strict");
    skip_ws_and_comments(input);

    let kind = if eat_keyword(input, "digraph") {
        GraphKind::Digraph
    } else if eat_keyword(input, "graph") {
        GraphKind::Graph
    } else {
        return expected(input, "`graph` or `digraph`");
    };

    skip_ws_and_comments(input);
    let id = if input.starts_with('{') {
        None
    } else {
        Some(parse_id(input)?)
    };

    skip_ws_and_comments(input);
    expect_char(input, '{', "`{`")?;
    let children = parse_stmt_list(input, kind)?;
    expect_char(input, '}', "`}`")?;

    skip_ws_and_comments(input);
    if !input.is_empty() {
        return expected(input, "end of input");
    }

    Ok(Graph {
        strict,
        kind,
        id,
        children,
    })
}

fn parse_stmt_list(input: &mut &str, kind: GraphKind) -> ModalResult<Vec<Statement>> {
    let mut statements = Vec::new();
    loop {
        skip_ws_and_comments(input);
        if input.is_empty() || input.starts_with('}') {
            break;
        }
        statements.push(parse_statement(input, kind)?);
        skip_ws_and_comments(input);
        if input.starts_with(';') {
            *input = &input[1..];
        }
    }
    Ok(statements)
}

fn parse_statement(input: &mut &str, kind: GraphKind) -> ModalResult<Statement> {
    for target in [AttrTarget::Graph, AttrTarget::Node, AttrTarget::Edge] {
        if eat_keyword(input, target.keyword()) {
            skip_ws_and_comments(input);
            if !input.starts_with('[') {
                return expected(input, "`[`");
            }
            let attrs = parse_attr_lists(input)?;
            return Ok(Statement::Attr(AttrStatement { target, attrs }));
        }
    }

    if peek_keyword(input, "subgraph") || input.starts_with('{') {
        let subgraph = parse_subgraph(input, kind)?;
        return parse_edge_tail(input, kind, Endpoint::Subgraph(subgraph));
    }

    let id = parse_id(input)?;
    skip_ws_and_comments(input);
    if input.starts_with('=') {
        *input = &input[1..];
        skip_ws_and_comments(input);
        let value = parse_attr_value(input)?;
        return Ok(Statement::Attr(AttrStatement {
            target: AttrTarget::Graph,
            attrs: vec![Attribute { key: id, value }],
        }));
    }

    let node = parse_port(input, id)?;
    parse_edge_tail(input, kind, Endpoint::Node(node))
}

/// Parse any `-> endpoint` links following `first`, then the trailing
/// attribute lists. A lone endpoint becomes a node or subgraph statement.
fn parse_edge_tail(input: &mut &str, kind: GraphKind, first: Endpoint) -> ModalResult<Statement> {
    let mut endpoints = smallvec![first];
    loop {
        skip_ws_and_comments(input);
        if !(input.starts_with("->") || input.starts_with("--")) {
            break;
        }
        if !input.starts_with(kind.edge_op()) {
            return match kind {
                GraphKind::Digraph => expected(input, "`->` in a digraph"),
                GraphKind::Graph => expected(input, "`--` in an undirected graph"),
            };
        }
        *input = &input[2..];
        skip_ws_and_comments(input);
        endpoints.push(parse_endpoint(input, kind)?);
    }

    if endpoints.len() > 1 {
        let attrs = parse_attr_lists(input)?;
        return Ok(Statement::Edge(EdgeStatement { endpoints, attrs }));
    }

    match endpoints.pop() {
        Some(Endpoint::Node(node)) => {
            let attrs = parse_attr_lists(input)?;
            Ok(Statement::Node(NodeStatement { node, attrs }))
        }
        Some(Endpoint::Subgraph(subgraph)) => Ok(Statement::Subgraph(subgraph)),
        None => expected(input, "node or subgraph"),
    }
}

fn parse_endpoint(input: &mut &str, kind: GraphKind) -> ModalResult<Endpoint> {
    if peek_keyword(input, "subgraph") || input.starts_with('{') {
        return parse_subgraph(input, kind).map(Endpoint::Subgraph);
    }
    let id = parse_id(input)?;
    parse_port(input, id).map(Endpoint::Node)
}

fn parse_subgraph(input: &mut &str, kind: GraphKind) -> ModalResult<Subgraph> {
    let mut id = None;
    if eat_keyword(input, "subgraph") {
        skip_ws_and_comments(input);
        if !input.starts_with('{') {
            id = Some(parse_id(input)?);
            skip_ws_and_comments(input);
        }
    }
    expect_char(input, '{', "`{`")?;
    let children = parse_stmt_list(input, kind)?;
    expect_char(input, '}', "`}`")?;
    Ok(Subgraph { id, children })
}

/// Optional `:port` and `:port:compass` after a node id.
fn parse_port(input: &mut &str, id: String) -> ModalResult<NodeRef> {
    let checkpoint = *input;
    skip_ws_and_comments(input);
    if !input.starts_with(':') {
        *input = checkpoint;
        return Ok(NodeRef { id, port: None });
    }
    *input = &input[1..];
    skip_ws_and_comments(input);
    let port_id = parse_id(input)?;

    let checkpoint = *input;
    skip_ws_and_comments(input);
    let compass = if input.starts_with(':') {
        *input = &input[1..];
        skip_ws_and_comments(input);
        Some(parse_id(input)?)
    } else {
        *input = checkpoint;
        None
    };

    Ok(NodeRef {
        id,
        port: Some(Port {
            id: port_id,
            compass,
        }),
    })
}

// ─── Attribute lists ─────────────────────────────────────────────────────

/// Zero or more `[ k=v, ... ]` groups, flattened in source order.
fn parse_attr_lists(input: &mut &str) -> ModalResult<Vec<Attribute>> {
    let mut attrs = Vec::new();
    loop {
        skip_ws_and_comments(input);
        if !input.starts_with('[') {
            break;
        }
        *input = &input[1..];
        loop {
            skip_ws_and_comments(input);
            if input.starts_with(']') {
                *input = &input[1..];
                break;
            }
            let key = parse_id(input)?;
            skip_ws_and_comments(input);
            expect_char(input, '=', "`=`")?;
            skip_ws_and_comments(input);
            let value = parse_attr_value(input)?;
            attrs.push(Attribute { key, value });
            // at most one separator, and only after an entry
            skip_ws_and_comments(input);
            if input.starts_with([',', ';']) {
                *input = &input[1..];
            }
        }
    }
    Ok(attrs)
}

fn parse_attr_value(input: &mut &str) -> ModalResult<AttrValue> {
    if input.starts_with('<') {
        let text = parse_html(input)?;
        return Ok(AttrValue::Id(Id { text, html: true }));
    }
    parse_id(input).map(AttrValue::Text)
}

// ─── Identifiers ─────────────────────────────────────────────────────────

fn parse_id(input: &mut &str) -> ModalResult<String> {
    if input.starts_with('"') {
        return parse_quoted(input);
    }
    if input.starts_with(|c: char| c == '-' || c == '.' || c.is_ascii_digit()) {
        return parse_numeral(input).map(str::to_string);
    }
    let rest: &str = input;
    if KEYWORDS.iter().any(|keyword| peek_keyword(rest, keyword)) {
        return expected(input, "identifier (keywords must be quoted)");
    }
    parse_bare(input).map(str::to_string)
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_id_char(c: char) -> bool {
    is_id_start(c) || c.is_ascii_digit()
}

fn parse_bare<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (one_of(is_id_start), take_while(0.., is_id_char))
        .take()
        .context(StrContext::Expected(StrContextValue::Description(
            "identifier",
        )))
        .parse_next(input)
}

fn parse_numeral<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        opt('-'),
        alt((('.', digit1).void(), (digit1, opt(('.', digit0))).void())),
    )
        .take()
        .context(StrContext::Expected(StrContextValue::Description("numeral")))
        .parse_next(input)
}

fn take_until_quote_or_escape<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(0.., ['"', '\\']).parse_next(input)
}

fn parse_quoted(input: &mut &str) -> ModalResult<String> {
    expect_char(input, '"', "`\"`")?;
    let mut text = String::new();
    loop {
        text.push_str(take_until_quote_or_escape(input)?);
        if input.starts_with('"') {
            *input = &input[1..];
            return Ok(text);
        }
        if !input.starts_with('\\') {
            break;
        }
        *input = &input[1..];
        match input.chars().next() {
            Some('"') => text.push('"'),
            Some(c) => {
                text.push('\\');
                text.push(c);
            }
            None => break,
        }
        let skipped = input.chars().next().map_or(0, char::len_utf8);
        *input = &input[skipped..];
    }
    expected(input, "closing `\"`")
}

/// `<...>` with balanced inner angle brackets; returns the inner text.
fn parse_html(input: &mut &str) -> ModalResult<String> {
    let source = *input;
    let mut depth = 0usize;
    for (pos, c) in source.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    *input = &source[pos + 1..];
                    return Ok(source[1..pos].to_string());
                }
            }
            _ => {}
        }
    }
    expected(input, "closing `>`")
}

// ─── Low-level helpers ───────────────────────────────────────────────────

/// Whitespace is exactly space, tab, CR and LF.
fn skip_ws_and_comments(input: &mut &str) {
    loop {
        let before = input.len();
        *input = input.trim_start_matches([' ', '\t', '\r', '\n']);
        let rest = *input;
        if rest.starts_with("//") || rest.starts_with('#') {
            *input = rest.find('\n').map_or("", |pos| &rest[pos + 1..]);
        } else if rest.starts_with("/*") {
            *input = rest[2..].find("*/").map_or("", |pos| &rest[pos + 4..]);
        }
        if input.len() == before {
            break;
        }
    }
}

/// Case-insensitive keyword match that stops at an identifier boundary.
fn peek_keyword(input: &str, word: &str) -> bool {
    input.len() >= word.len()
        && input.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
        && !input[word.len()..].starts_with(is_id_char)
}

fn eat_keyword(input: &mut &str, word: &str) -> bool {
    if peek_keyword(input, word) {
        *input = &input[word.len()..];
        true
    } else {
        false
    }
}

fn expect_char(input: &mut &str, c: char, what: &'static str) -> ModalResult<()> {
    if input.starts_with(c) {
        *input = &input[c.len_utf8()..];
        Ok(())
    } else {
        expected(input, what)
    }
}

fn expected<T>(input: &mut &str, what: &'static str) -> ModalResult<T> {
    cut_err(fail)
        .context(StrContext::Expected(StrContextValue::Description(what)))
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_statement(input: &str) -> Statement {
        let graph = parse_graph(input).expect("parse failed");
        assert_eq!(graph.children.len(), 1, "expected one statement");
        graph.children.into_iter().next().unwrap()
    }

    #[test]
    fn parse_minimal_digraph() {
        let graph = parse_graph("digraph { a -> b }").expect("parse failed");
        assert_eq!(graph.kind, GraphKind::Digraph);
        assert!(!graph.strict);
        assert_eq!(graph.id, None);
        match &graph.children[0] {
            Statement::Edge(edge) => {
                assert_eq!(edge.endpoints.len(), 2);
                assert!(edge.attrs.is_empty());
            }
            other => panic!("expected edge, got {other:?}"),
        }
    }

    #[test]
    fn parse_strict_graph_with_id() {
        let graph = parse_graph("strict graph \"my graph\" { a -- b; }").expect("parse failed");
        assert!(graph.strict);
        assert_eq!(graph.kind, GraphKind::Graph);
        assert_eq!(graph.id.as_deref(), Some("my graph"));
    }

    #[test]
    fn parse_keywords_case_insensitively() {
        let graph = parse_graph("DiGraph { Node [shape=box] }").expect("parse failed");
        assert_eq!(graph.kind, GraphKind::Digraph);
        assert!(matches!(
            graph.children[0],
            Statement::Attr(AttrStatement {
                target: AttrTarget::Node,
                ..
            })
        ));
    }

    #[test]
    fn parse_node_with_port_and_attributes() {
        match only_statement("digraph { a:p:ne [color=red, label=\"x y\"; shape=box] }") {
            Statement::Node(node) => {
                assert_eq!(node.node.qualified(), "a:p:ne");
                let keys: Vec<_> = node.attrs.iter().map(|a| a.key.as_str()).collect();
                assert_eq!(keys, ["color", "label", "shape"]);
                assert_eq!(node.attrs[1].value.as_str(), "x y");
            }
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn parse_repeated_and_empty_attribute_lists() {
        match only_statement("graph { a [] [x=1][y=2] }") {
            Statement::Node(node) => assert_eq!(node.attrs.len(), 2),
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn parse_one_trailing_separator_per_entry() {
        match only_statement("digraph { a [x=1;] [y=2 ,] }") {
            Statement::Node(node) => assert_eq!(node.attrs.len(), 2),
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn reject_separator_without_entry() {
        for input in [
            "digraph { a [,] }",
            "digraph { a [;] }",
            "digraph { a [x=1,,y=2] }",
            "digraph { a [, x=1] }",
        ] {
            assert!(parse_graph(input).is_err(), "accepted {input}");
        }
    }

    #[test]
    fn parse_bare_assignment_as_graph_attribute() {
        match only_statement("digraph { rankdir = LR }") {
            Statement::Attr(attr) => {
                assert_eq!(attr.target, AttrTarget::Graph);
                assert_eq!(attr.attrs, vec![Attribute::new("rankdir", "LR")]);
            }
            other => panic!("expected attr statement, got {other:?}"),
        }
    }

    #[test]
    fn parse_subgraphs_as_statements_and_endpoints() {
        let graph =
            parse_graph("digraph { subgraph cluster_0 { a } b -> { c d } -> e }").expect("parse failed");
        assert_eq!(graph.children.len(), 2);
        match &graph.children[0] {
            Statement::Subgraph(sub) => {
                assert_eq!(sub.id.as_deref(), Some("cluster_0"));
                assert_eq!(sub.children.len(), 1);
            }
            other => panic!("expected subgraph, got {other:?}"),
        }
        match &graph.children[1] {
            Statement::Edge(edge) => {
                assert_eq!(edge.endpoints.len(), 3);
                assert!(matches!(edge.endpoints[1], Endpoint::Subgraph(_)));
            }
            other => panic!("expected edge, got {other:?}"),
        }
    }

    #[test]
    fn parse_skips_all_comment_styles() {
        let input = "/* head */ digraph {\n  // line\n  # shell\n  a /* inline */ -> b\n}\n";
        let graph = parse_graph(input).expect("parse failed");
        assert_eq!(graph.children.len(), 1);
    }

    #[test]
    fn parse_quoted_ids_unescape_only_quotes() {
        match only_statement(r#"digraph { "a\"b\n" }"#) {
            Statement::Node(node) => assert_eq!(node.node.id, "a\"b\\n"),
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn parse_html_label_with_nesting() {
        match only_statement("digraph { a [label=<<b>bold</b>>] }") {
            Statement::Node(node) => {
                assert!(node.attrs[0].value.is_html());
                assert_eq!(node.attrs[0].value.as_str(), "<b>bold</b>");
            }
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn parse_numerals_as_ids() {
        match only_statement("graph { -1.5 -- .5 -- 42 }") {
            Statement::Edge(edge) => {
                let ids: Vec<_> = edge
                    .endpoints
                    .iter()
                    .map(|e| match e {
                        Endpoint::Node(n) => n.id.clone(),
                        Endpoint::Subgraph(_) => String::new(),
                    })
                    .collect();
                assert_eq!(ids, ["-1.5", ".5", "42"]);
            }
            other => panic!("expected edge, got {other:?}"),
        }
    }

    #[test]
    fn reject_wrong_edge_operator() {
        let err = parse_graph("digraph {\n  a -- b\n}").unwrap_err();
        let ParseError::Syntax { line, message, .. } = err;
        assert_eq!(line, 2);
        assert!(message.contains("->"), "message: {message}");
    }

    #[test]
    fn reject_unterminated_string() {
        assert!(parse_graph("digraph { \"abc }").is_err());
    }

    #[test]
    fn reject_trailing_garbage() {
        assert!(parse_graph("digraph { a } b").is_err());
    }

    #[test]
    fn reject_bare_keyword_as_node() {
        assert!(parse_graph("digraph { a -> node }").is_err());
    }

    #[test]
    fn parse_empty_graph() {
        let graph = parse_graph("graph{}").expect("parse failed");
        assert!(graph.children.is_empty());
    }
}
