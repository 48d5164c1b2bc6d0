//! Concrete syntax tree in arena layout.
//!
//! Tree-sitter produces the parse; it is copied once into a flat vector of
//! [`SyntaxNode`]s so that the tree can be cached, shared between threads and
//! walked without holding on to the parser's buffers. Comments are dropped
//! during the copy: they never contribute to a scope.

use std::collections::BTreeMap;

use tree_sitter::{Language, Node, Parser};

use crate::error::Error;

/// Node kinds that are comments in the Java grammar.
const COMMENT_KINDS: &[&str] = &["block_comment", "line_comment"];

/// Literal kinds whose source text is kept on the node even though they have children.
pub const LITERAL_KINDS: &[&str] = &[
    "binary_integer_literal",
    "character_literal",
    "decimal_floating_point_literal",
    "decimal_integer_literal",
    "false",
    "hex_floating_point_literal",
    "hex_integer_literal",
    "null_literal",
    "octal_integer_literal",
    "string_literal",
    "text_block",
    "true",
];

/// Longest error excerpt quoted in a syntax error message.
const EXCERPT_CHARS: usize = 24;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// One node of the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Children in source order.
    pub children: Vec<NodeId>,
    /// One-based last line covered by the node.
    pub end_line: u32,
    /// Grammar production name; anonymous tokens use their token text.
    pub kind: &'static str,
    /// Source text of named leaves and literals.
    pub literal: Option<String>,
    /// One-based first line covered by the node.
    pub start_line: u32,
}

impl SyntaxNode {
    /// Whether the node's line span contains the one-based `line`.
    pub const fn contains_line(&self, line: u32) -> bool {
        return self.start_line <= line && line <= self.end_line;
    }
}

/// Immutable parse result of one file. The root is always the first node.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    /// Names of `static final` fields initialized with a single literal,
    /// mapped to the literal's kind.
    constants: BTreeMap<String, &'static str>,
    /// All nodes in pre-order; children are referenced by index.
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Child ids of `id`, empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        return self.node(id).map_or(&[], |n| return n.children.as_slice());
    }

    /// Literal kind a constant named `name` is initialized with.
    pub fn constant_kind(&self, name: &str) -> Option<&'static str> {
        return self.constants.get(name).copied();
    }

    /// Name and literal kind of the constant declared by `id`, if it declares one.
    ///
    /// A constant is a field with both `static` and `final` modifiers (or any
    /// interface constant) declaring one variable whose initializer is a literal.
    fn constant_declared_by(&self, id: NodeId) -> Option<(String, &'static str)> {
        let kids = self.children(id);
        match self.kind(id) {
            "constant_declaration" => {},
            "field_declaration" => {
                let modifiers = kids.iter().find(|c| return self.kind(**c) == "modifiers")?;
                let words: Vec<&str> = self.children(*modifiers).iter().map(|m| return self.kind(*m)).collect();
                if !words.contains(&"static") || !words.contains(&"final") {
                    return None;
                }
            },
            _ => return None,
        }

        let mut declarators = kids.iter().filter(|c| return self.kind(**c) == "variable_declarator");
        let declarator = *declarators.next()?;
        if declarators.next().is_some() {
            return None;
        }

        let [name, assign, value] = self.children(declarator) else {
            return None;
        };
        if self.kind(*name) != "identifier" || self.kind(*assign) != "=" || !LITERAL_KINDS.contains(&self.kind(*value)) {
            return None;
        }
        let text = self.node(*name)?.literal.clone()?;
        return Some((text, self.kind(*value)));
    }

    /// Nodes accepted by `accept` whose span contains `line`, with their depth,
    /// in pre-order (outer constructs before the ones nested inside them).
    pub fn enclosing(&self, line: u32, accept: impl Fn(&str) -> bool) -> Vec<(NodeId, usize)> {
        let mut found = Vec::new();
        let mut stack = vec![(self.root(), 0_usize)];

        while let Some((id, depth)) = stack.pop() {
            for &child in self.children(id).iter().rev() {
                if self.node(child).is_some_and(|n| return n.contains_line(line)) {
                    stack.push((child, depth.saturating_add(1)));
                }
            }
            if id != self.root() && accept(self.kind(id)) {
                found.push((id, depth));
            }
        }

        return found;
    }

    /// Constant table of the whole file. The first declaration of a name wins.
    fn find_constants(&self) -> BTreeMap<String, &'static str> {
        let mut constants = BTreeMap::new();
        for idx in 0..self.nodes.len() {
            let id = NodeId(u32::try_from(idx).unwrap_or(u32::MAX));
            if let Some((name, kind)) = self.constant_declared_by(id) {
                constants.entry(name).or_insert(kind);
            }
        }
        return constants;
    }

    /// Whether the tree holds no node at all.
    pub const fn is_empty(&self) -> bool {
        return self.nodes.is_empty();
    }

    /// Kind label of `id`, empty for unknown ids.
    pub fn kind(&self, id: NodeId) -> &'static str {
        return self.node(id).map_or("", |n| return n.kind);
    }

    /// Number of nodes in the arena.
    pub const fn len(&self) -> usize {
        return self.nodes.len();
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        let idx = usize::try_from(id.0).ok()?;
        return self.nodes.get(idx);
    }

    /// Parse source text with the given grammar.
    ///
    /// # Errors
    ///
    /// Returns `Error::Syntax` if the grammar cannot be loaded, the parser
    /// gives up, or the tree contains an error or missing node.
    pub fn parse(source: &str, language: &Language) -> Result<Self, Error> {
        let mut parser = Parser::new();
        parser.set_language(language).map_err(|e| {
            return Error::Syntax {
                line: 0,
                message: format!("grammar rejected: {e}"),
            };
        })?;

        let tree = parser.parse(source, None).ok_or_else(|| {
            return Error::Syntax {
                line: 0,
                message: "tree-sitter returned no tree".to_string(),
            };
        })?;

        let root = tree.root_node();
        if let Some(bad) = first_error_node(root) {
            return Err(describe_error_node(bad, source));
        }

        let mut arena = Self {
            constants: BTreeMap::new(),
            nodes: copy_into_arena(root, source),
        };
        arena.constants = arena.find_constants();
        tracing::trace!(nodes = arena.len(), constants = arena.constants.len(), "copied syntax tree into arena");

        return Ok(arena);
    }

    /// Root node id.
    pub const fn root(&self) -> NodeId {
        return NodeId(0);
    }

    /// Every non-root node whose span starts on `line`, in pre-order.
    pub fn starting_on(&self, line: u32) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            if id != self.root() && self.node(id).is_some_and(|n| return n.start_line == line) {
                found.push(id);
            }
            for &child in self.children(id).iter().rev() {
                if self.node(child).is_some_and(|n| return n.contains_line(line)) {
                    stack.push(child);
                }
            }
        }

        return found;
    }
}

/// Copy `root` and its non-comment descendants into an arena in pre-order.
///
/// Iterative: expression chains nest as deep as the source is long.
fn copy_into_arena(root: Node<'_>, source: &str) -> Vec<SyntaxNode> {
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    let mut cursor = root.walk();
    let mut stack: Vec<(Node<'_>, Option<usize>)> = vec![(root, None)];

    while let Some((node, parent)) = stack.pop() {
        let idx = nodes.len();
        let (start_line, end_line) = line_span(node);

        let keeps_text = (node.is_named() && node.child_count() == 0) || LITERAL_KINDS.contains(&node.kind());
        let literal = if keeps_text {
            node.utf8_text(source.as_bytes()).ok().map(str::to_string)
        } else {
            None
        };

        nodes.push(SyntaxNode {
            children: Vec::new(),
            end_line,
            kind: node.kind(),
            literal,
            start_line,
        });
        if let Some(slot) = parent.and_then(|p| return nodes.get_mut(p)) {
            slot.children.push(NodeId(u32::try_from(idx).unwrap_or(u32::MAX)));
        }

        let kids: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|kid| return !COMMENT_KINDS.contains(&kid.kind()))
            .collect();
        stack.extend(kids.into_iter().rev().map(|kid| return (kid, Some(idx))));
    }

    return nodes;
}

/// Build the syntax error for the first error or missing node.
fn describe_error_node(node: Node<'_>, source: &str) -> Error {
    let line = u32::try_from(node.start_position().row.saturating_add(1)).unwrap_or(u32::MAX);
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let excerpt: String = text.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(EXCERPT_CHARS).collect();
        format!("unexpected `{excerpt}`")
    };
    return Error::Syntax { line, message };
}

/// Depth-first search for the first error or missing node, without recursion.
fn first_error_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let kids: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(kids.into_iter().rev());
        }
    }

    return None;
}

/// One-based first and last line of a node. A node ending at column 0 of a
/// later row ends on the previous line.
fn line_span(node: Node<'_>) -> (u32, u32) {
    let start = node.start_position();
    let end = node.end_position();
    let last_row = if end.column == 0 && end.row > start.row { end.row.saturating_sub(1) } else { end.row };

    let start_line = u32::try_from(start.row.saturating_add(1)).unwrap_or(u32::MAX);
    let end_line = u32::try_from(last_row.saturating_add(1)).unwrap_or(u32::MAX);
    return (start_line, end_line);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::source::SourceIndex;

    fn java() -> Language {
        return tree_sitter_java::LANGUAGE.into();
    }

    const SAMPLE: &str = "\
package demo;

/** Docs. */
public class Sample {
    private int count = 1;

    public int next() {
        // bump
        return count++;
    }
}
";

    #[test]
    fn root_is_the_compilation_unit() {
        let tree = SyntaxTree::parse(SAMPLE, &java()).unwrap();
        assert_eq!(tree.kind(tree.root()), "program");
        assert!(!tree.is_empty());
    }

    #[test]
    fn comments_are_not_copied() {
        let tree = SyntaxTree::parse(SAMPLE, &java()).unwrap();
        let kinds: Vec<&str> = (0..tree.len())
            .map(|i| return tree.kind(NodeId(u32::try_from(i).unwrap())))
            .collect();
        assert!(!kinds.iter().any(|k| return k.contains("comment")));
    }

    #[test]
    fn nodes_carry_line_spans() {
        let tree = SyntaxTree::parse(SAMPLE, &java()).unwrap();
        let methods = tree.enclosing(9, |k| return k == "method_declaration");
        assert_eq!(methods.len(), 1);
        let method = tree.node(methods[0].0).unwrap();
        assert_eq!((method.start_line, method.end_line), (7, 10));
    }

    #[test]
    fn enclosing_lists_outer_before_inner() {
        let tree = SyntaxTree::parse(SAMPLE, &java()).unwrap();
        let found = tree.enclosing(9, |k| return k == "class_declaration" || k == "method_declaration");
        let kinds: Vec<&str> = found.iter().map(|(id, _)| return tree.kind(*id)).collect();
        assert_eq!(kinds, vec!["class_declaration", "method_declaration"]);
        assert!(found[0].1 < found[1].1);
    }

    #[test]
    fn identifiers_and_literals_keep_text() {
        let tree = SyntaxTree::parse(SAMPLE, &java()).unwrap();
        let literals: Vec<&str> = tree
            .starting_on(5)
            .into_iter()
            .filter_map(|id| return tree.node(id).and_then(|n| return n.literal.as_deref()))
            .collect();
        assert_eq!(literals, vec!["count", "1"]);
    }

    #[test]
    fn sibling_start_lines_never_decrease() {
        let tree = SyntaxTree::parse(SAMPLE, &java()).unwrap();
        for i in 0..tree.len() {
            let id = NodeId(u32::try_from(i).unwrap());
            let starts: Vec<u32> = tree
                .children(id)
                .iter()
                .map(|c| return tree.node(*c).unwrap().start_line)
                .collect();
            assert!(starts.windows(2).all(|w| return w[0] <= w[1]), "unordered children under {}", tree.kind(id));
        }
    }

    #[test]
    fn deeply_nested_expressions_are_copied() {
        let chain = vec!["1"; 20_000].join(" + ");
        let source = format!("class Deep {{\n    int total() {{\n        return {chain};\n    }}\n}}\n");
        let tree = SyntaxTree::parse(&source, &java()).unwrap();
        assert!(tree.len() > 40_000);
        assert_eq!(tree.kind(tree.root()), "program");
        assert!(tree.starting_on(3).iter().any(|id| return tree.kind(*id) == "binary_expression"));
    }

    #[test]
    fn deep_broken_source_is_a_syntax_error() {
        let chain = vec!["1"; 20_000].join(" + ");
        let source = format!("class Deep {{\n    int total() {{\n        return {chain} +;\n    }}\n}}\n");
        assert!(matches!(SyntaxTree::parse(&source, &java()), Err(Error::Syntax { .. })));
    }

    #[test]
    fn static_final_literals_are_constants() {
        let source = "\
class Limits {
    static final int LIMIT = 3;
    private static final String NAME = \"x\";
    final int notStatic = 4;
    static int notFinal = 5;
    static final int A = 1, B = 2;
    static final int DERIVED = LIMIT + 1;
}
interface Defaults {
    double RATIO = 0.5;
}
";
        let tree = SyntaxTree::parse(source, &java()).unwrap();
        assert_eq!(tree.constant_kind("LIMIT"), Some("decimal_integer_literal"));
        assert_eq!(tree.constant_kind("NAME"), Some("string_literal"));
        assert_eq!(tree.constant_kind("RATIO"), Some("decimal_floating_point_literal"));
        for name in ["notStatic", "notFinal", "A", "B", "DERIVED"] {
            assert_eq!(tree.constant_kind(name), None, "{name} is not a constant");
        }
    }

    #[test]
    fn code_lines_agree_with_the_source_index() {
        let source = include_str!("../tests/fixtures/project/src/Inventory.java");
        let tree = SyntaxTree::parse(source, &java()).unwrap();
        let index = SourceIndex::build(source);

        for line in 1..=u32::try_from(index.len()).unwrap() {
            let has_token = tree
                .nodes
                .iter()
                .skip(1)
                .any(|n| return n.children.is_empty() && n.contains_line(line));
            assert_eq!(index.is_meaningful(line), has_token, "line {line} disagrees with the tree");
        }
    }

    #[test]
    fn broken_source_is_a_syntax_error() {
        let err = SyntaxTree::parse("class Broken {\n    void run( {\n}\n", &java()).unwrap_err();
        assert!(matches!(err, Error::Syntax { line, .. } if line >= 1));
    }
}
