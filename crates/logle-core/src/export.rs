//! # Graph Export Module
//!
//! Renders a [`LabeledGraph`] as text.
//!
//! - [`DotPrinter`]: GraphViz DOT with default visualizations for files,
//!   URLs, IP addresses and temporal edges. Callers may swap the node or edge
//!   attribute function for a custom one.
//! - [`PbtxtExporter`]: a text-proto `GraphDef` listing every node with the
//!   names of its predecessors as inputs.
//!
//! Both renderers walk the graph in id order, so the same graph always
//! renders to the same bytes.

use crate::graph::{Edge, Label, LabelValue, LabeledGraph, NodeId};
use crate::primitives::{FILE_TAG, IP_ADDRESS_TAG, PRECEDES_TAG, URL_TAG};
use chrono::DateTime;
use std::collections::BTreeMap;

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Render microseconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SS+00:00`.
///
/// Values outside chrono's range fall back to the raw number.
#[must_use]
pub fn format_timestamp(micros: i64) -> String {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S+00:00").to_string())
        .unwrap_or_else(|| micros.to_string())
}

// =============================================================================
// DOT STYLES
// =============================================================================

/// Name of a DOT graph when the analyzer does not choose one.
pub const DEFAULT_GRAPH_NAME: &str = "logle_graph";

const TABLE_HEADER: &str =
    r##"<table border="0"  cellborder="0" cellpadding="1" bgcolor="#F8F8F8">"##;

/// Folder-shaped node for files.
pub const FILE_STYLE: &str =
    "shape=folder,style=filled,fillcolor=wheat,fontname=Courier,fontsize=10";

/// Component-shaped node for URLs and IP addresses.
pub const REMOTE_ADDRESS_STYLE: &str =
    "shape=component,style=filled,fillcolor=lightsteelblue,fontname=Arial,fontsize=10";

/// Default node style.
pub const ROUNDED_BOX_STYLE: &str = r##"shape=box,style="rounded,filled",fillcolor="#F8F8F8""##;

/// Default edge style.
pub const DASHED_GRAY_EDGE: &str =
    "penwidth=.5,arrowsize=.5,arrowhead=onormal,color=gray,style=dashed";

/// Temporal edges are laid out but not drawn.
pub const PRECEDES_STYLE: &str = "style=invis";

/// Produces the bracketed DOT attribute list for a label.
pub type AttributeFn = fn(&str, &LabelValue) -> String;

/// Replace `&`, `<` and `>` with entities. `&` goes first.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `[style, label="..."]`, or `[style, label=<...>]` for HTML-like labels.
fn join_attributes(style: &str, label: &str, html_like: bool) -> String {
    if html_like {
        format!("[{style}, label=<{label}>]")
    } else {
        format!("[{style}, label=\"{label}\"]")
    }
}

/// A value as an HTML-like label: containers become one table row per element.
fn html_label(value: &LabelValue, indent: usize) -> String {
    match value {
        LabelValue::Tuple(items) | LabelValue::List(items) => {
            let rows: Vec<String> = items
                .iter()
                .map(|item| html_label(item, indent.saturating_add(2)))
                .collect();
            format!(
                "{TABLE_HEADER}\n<tr><td>{}</td></tr>\n</table>",
                rows.join("</td></tr>\n<tr><td>")
            )
        }
        primitive => format!("{}{}", " ".repeat(indent), escape_html(&primitive.to_string())),
    }
}

// =============================================================================
// DOT PRINTER
// =============================================================================

/// Renders nodes, edges and whole graphs in GraphViz DOT.
#[derive(Debug, Clone, Copy)]
pub struct DotPrinter {
    node_attribute: AttributeFn,
    edge_attribute: AttributeFn,
}

impl Default for DotPrinter {
    fn default() -> Self {
        Self::new(Self::node_attribute, Self::edge_attribute)
    }
}

impl DotPrinter {
    /// A printer using custom attribute functions. The functions must produce
    /// well-formed DOT attribute lists.
    #[must_use]
    pub fn new(node_attribute: AttributeFn, edge_attribute: AttributeFn) -> Self {
        Self {
            node_attribute,
            edge_attribute,
        }
    }

    /// A file `tuple(list(dir), filename)`, one path component per line.
    #[must_use]
    pub fn file_attribute(value: &LabelValue) -> String {
        let (Some(LabelValue::List(dirs)), Some(filename)) = (value.field(0), value.field(1))
        else {
            return join_attributes(FILE_STYLE, "", false);
        };

        let mut text = dirs.first().map(ToString::to_string).unwrap_or_default();
        for (i, dir) in dirs.iter().enumerate().skip(1) {
            text.push_str(r"/\l");
            text.push_str(&" ".repeat(i.saturating_mul(2)));
            text.push('\u{21b3}');
            text.push_str(&dir.to_string());
        }
        if let LabelValue::Str(name) = filename {
            text.push_str(r"/\l");
            text.push_str(&" ".repeat(dirs.len().saturating_mul(2)));
            text.push('\u{21b3}');
            text.push_str(name);
        }
        join_attributes(FILE_STYLE, &text, false)
    }

    /// A URL or IP address.
    #[must_use]
    pub fn remote_address_attribute(value: &LabelValue) -> String {
        join_attributes(REMOTE_ADDRESS_STYLE, &value.to_string(), false)
    }

    /// Predefined attribute for files, URLs and IP addresses; a rounded box
    /// with the value as an HTML-like label otherwise.
    #[must_use]
    pub fn node_attribute(tag: &str, value: &LabelValue) -> String {
        match tag {
            FILE_TAG => Self::file_attribute(value),
            IP_ADDRESS_TAG | URL_TAG => Self::remote_address_attribute(value),
            _ => join_attributes(ROUNDED_BOX_STYLE, &html_label(value, 0), true),
        }
    }

    /// Invisible for temporal edges; dashed gray otherwise, with a label only
    /// when the edge carries data.
    #[must_use]
    pub fn edge_attribute(tag: &str, value: &LabelValue) -> String {
        if tag == PRECEDES_TAG {
            return join_attributes(PRECEDES_STYLE, "", false);
        }
        if *value == LabelValue::Null {
            return join_attributes(DASHED_GRAY_EDGE, "", false);
        }
        join_attributes(DASHED_GRAY_EDGE, &html_label(value, 0), true)
    }

    /// `<id> [attributes];`
    #[must_use]
    pub fn dot_node(&self, id: NodeId, label: &Label) -> String {
        format!("{id} {};", (self.node_attribute)(&label.tag, &label.value))
    }

    /// `<source> -> <target> [attributes];`
    #[must_use]
    pub fn dot_edge(&self, edge: &Edge) -> String {
        format!(
            "{} -> {} {};",
            edge.source,
            edge.target,
            (self.edge_attribute)(&edge.label.tag, &edge.label.value)
        )
    }

    /// Every node declaration, one indented line each.
    #[must_use]
    pub fn all_nodes(&self, graph: &LabeledGraph) -> String {
        graph
            .nodes()
            .map(|(id, label)| format!("  {}\n", self.dot_node(id, label)))
            .collect()
    }

    /// Every edge declaration, one indented line each.
    #[must_use]
    pub fn all_edges(&self, graph: &LabeledGraph) -> String {
        graph
            .edges()
            .map(|(_, edge)| format!("  {}\n", self.dot_edge(edge)))
            .collect()
    }

    /// `digraph <name> { nodes edges }`, without a trailing newline.
    #[must_use]
    pub fn dot_graph(&self, name: &str, graph: &LabeledGraph) -> String {
        format!(
            "digraph {name} {{\n{}{}}}",
            self.all_nodes(graph),
            self.all_edges(graph)
        )
    }
}

// =============================================================================
// PBTXT EXPORTER
// =============================================================================

/// Renders a graph as a text-proto `GraphDef`.
///
/// A node is named `tag/value/id`, container fields joined by `/`.
pub struct PbtxtExporter<'a> {
    graph: &'a LabeledGraph,
    names: BTreeMap<NodeId, String>,
}

impl<'a> PbtxtExporter<'a> {
    #[must_use]
    pub fn new(graph: &'a LabeledGraph) -> Self {
        Self {
            graph,
            names: BTreeMap::new(),
        }
    }

    /// The name of a node, cached after first use.
    fn name(&mut self, id: NodeId) -> String {
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }
        let name = self
            .graph
            .node_label(id)
            .map(|label| node_name(id, label))
            .unwrap_or_default();
        self.names.insert(id, name.clone());
        name
    }

    /// The whole graph as text.
    pub fn to_pbtxt(&mut self) -> String {
        let graph = self.graph;
        let mut out = String::new();
        for (id, _) in graph.nodes() {
            out.push_str("node {\n");
            out.push_str(&format!("  name: \"{}\"\n", escape_text(&self.name(id))));
            for input in graph.predecessors(id) {
                out.push_str(&format!("  input: \"{}\"\n", escape_text(&self.name(input))));
            }
            out.push_str("}\n");
        }
        out
    }
}

/// `tag/value/id`
#[must_use]
pub fn node_name(id: NodeId, label: &Label) -> String {
    format!("{}/{}/{}", label.tag, label.value, id)
}

/// Escape a string for a text-proto string literal.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphSchema;

    fn file(dirs: &[&str], name: Option<&str>) -> LabelValue {
        LabelValue::Tuple(vec![
            LabelValue::List(dirs.iter().map(|d| LabelValue::str(*d)).collect()),
            name.map(LabelValue::str).unwrap_or(LabelValue::Null),
        ])
    }

    fn small_graph() -> LabeledGraph {
        let schema = GraphSchema::new()
            .node("User", true)
            .node(FILE_TAG, true)
            .edge("Access", true)
            .edge(PRECEDES_TAG, true);
        let mut graph = LabeledGraph::new(schema);
        let a = graph
            .find_or_add_node(Label::new("User", LabelValue::str("a<b")))
            .expect("add");
        let f = graph
            .find_or_add_node(Label::new(FILE_TAG, file(&["tmp"], Some("x"))))
            .expect("add");
        graph
            .find_or_add_edge(a, f, Label::new("Access", LabelValue::Int(2)))
            .expect("edge");
        graph
            .find_or_add_edge(f, a, Label::null(PRECEDES_TAG))
            .expect("edge");
        graph
    }

    #[test]
    fn timestamp_renders_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(
            format_timestamp(1_430_000_000_000_000),
            "2015-04-25T22:13:20+00:00"
        );
    }

    #[test]
    fn file_attribute_splits_path_components() {
        let attr = DotPrinter::file_attribute(&file(&["usr", "bin"], Some("ls")));
        assert_eq!(
            attr,
            format!("[{FILE_STYLE}, label=\"usr/\\l  \u{21b3}bin/\\l    \u{21b3}ls\"]")
        );
    }

    #[test]
    fn file_attribute_without_filename() {
        let attr = DotPrinter::file_attribute(&file(&["etc"], None));
        assert_eq!(attr, format!("[{FILE_STYLE}, label=\"etc\"]"));
    }

    #[test]
    fn node_labels_escape_html() {
        let attr = DotPrinter::node_attribute("User", &LabelValue::str("a<b&c"));
        assert!(attr.contains("a&lt;b&amp;c"));
        assert!(attr.contains("label=<"));
    }

    #[test]
    fn tuple_labels_render_as_tables() {
        let value = LabelValue::Tuple(vec![LabelValue::str("x"), LabelValue::Int(1)]);
        let attr = DotPrinter::node_attribute("Actor", &value);
        assert!(attr.contains("<table"));
        assert!(attr.contains("<tr><td>  x</td></tr>\n<tr><td>  1</td></tr>"));
    }

    #[test]
    fn edge_attributes() {
        assert_eq!(
            DotPrinter::edge_attribute(PRECEDES_TAG, &LabelValue::Null),
            "[style=invis, label=\"\"]"
        );
        assert_eq!(
            DotPrinter::edge_attribute("Uses", &LabelValue::Null),
            format!("[{DASHED_GRAY_EDGE}, label=\"\"]")
        );
        assert!(DotPrinter::edge_attribute("Access", &LabelValue::Int(4)).contains("label=<4>"));
    }

    #[test]
    fn dot_graph_lists_nodes_then_edges() {
        let dot = DotPrinter::default().dot_graph("g", &small_graph());
        assert!(dot.starts_with("digraph g {\n  0 ["));
        assert!(dot.contains("\n  1 [shape=folder"));
        assert!(dot.contains("\n  0 -> 1 ["));
        assert!(dot.contains("\n  1 -> 0 [style=invis"));
        assert!(dot.ends_with("];\n}"));
    }

    #[test]
    fn custom_attribute_functions_are_used() {
        fn plain(tag: &str, _: &LabelValue) -> String {
            format!("[label=\"{tag}\"]")
        }
        let dot = DotPrinter::new(plain, plain).dot_graph("g", &small_graph());
        assert!(dot.contains("  0 [label=\"User\"];"));
        assert!(dot.contains("  0 -> 1 [label=\"Access\"];"));
    }

    #[test]
    fn pbtxt_names_nodes_and_inputs() {
        let graph = small_graph();
        let text = PbtxtExporter::new(&graph).to_pbtxt();
        assert_eq!(
            text,
            "node {\n  name: \"User/a<b/0\"\n  input: \"File/tmp/x/1\"\n}\n\
             node {\n  name: \"File/tmp/x/1\"\n  input: \"User/a<b/0\"\n}\n"
        );
    }

    #[test]
    fn pbtxt_escapes_quotes() {
        assert_eq!(escape_text("a\"b\\c"), "a\\\"b\\\\c");
    }
}
