//! Scope selection: which part of the tree stands for a warning.
//!
//! Every strategy anchors on the nearest meaningful line at or before the
//! reported one (see [`SourceIndex::anchor`]), so blank or comment lines
//! inserted above a warning never move it to another construct.
//!
//! A surrounding window counts meaningful lines, not sibling statements, so
//! near the end of a method it can reach into the next declaration.

use std::num::NonZeroU32;

use crate::error::Error;
use crate::source::SourceIndex;
use crate::syntax::{NodeId, SyntaxTree};
use crate::types::ScopeKind;

/// Type declarations; all of them count as a "class".
pub const TYPE_KINDS: &[&str] = &[
    "annotation_type_declaration",
    "class_declaration",
    "enum_declaration",
    "interface_declaration",
    "record_declaration",
];

/// Bodies of type declarations.
const BODY_KINDS: &[&str] = &["annotation_type_body", "class_body", "enum_body", "interface_body"];

/// Field-like members of a type body.
const FIELD_KINDS: &[&str] = &["constant_declaration", "field_declaration"];

/// Methods and constructors.
const METHOD_KINDS: &[&str] = &["compact_constructor_declaration", "constructor_declaration", "method_declaration"];

/// One piece of a selected scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePart {
    /// Every node that starts on this one-based line, without descendants
    /// starting on other lines.
    Line(u32),
    /// The node and all of its descendants.
    Subtree(NodeId),
    /// The node and its descendants, leaving out nested type declarations.
    SubtreeWithoutNestedTypes(NodeId),
}

/// Result of a selection: the strategy that produced it and the parts in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Parts in source order.
    pub parts: Vec<ScopePart>,
    /// The strategy that actually produced the parts; differs from the
    /// requested one when `MethodOrClass` or a window fell back.
    pub resolved: ScopeKind,
}

impl Scope {
    /// First and last source line touched by the scope.
    pub fn line_span(&self, tree: &SyntaxTree) -> Option<(u32, u32)> {
        let spans = self.parts.iter().filter_map(|part| {
            return match *part {
                ScopePart::Line(line) => Some((line, line)),
                ScopePart::Subtree(id) | ScopePart::SubtreeWithoutNestedTypes(id) => {
                    tree.node(id).map(|n| return (n.start_line, n.end_line))
                },
            };
        });
        return spans.fold(None, |acc, (start, end)| {
            return match acc {
                None => Some((start, end)),
                Some((lo, hi)) => Some((lo.min(start), hi.max(end))),
            };
        });
    }

    /// Scope made of a single subtree.
    fn subtree(resolved: ScopeKind, id: NodeId) -> Self {
        return Self { parts: vec![ScopePart::Subtree(id)], resolved };
    }
}

/// Select the scope of `kind` around the one-based `line`.
///
/// # Errors
///
/// Returns `Error::NoEnclosingScope` when the requested construct does not
/// exist around the line. `File`, `MethodOrClass` and `SurroundingWindow`
/// never fail.
pub fn select(tree: &SyntaxTree, index: &SourceIndex, kind: ScopeKind, line: u32) -> Result<Scope, Error> {
    let missing = || return Error::NoEnclosingScope { line, scope: kind };

    return match kind {
        ScopeKind::Fields => {
            let anchor = index.anchor(line).ok_or_else(missing)?;
            select_fields(tree, anchor).ok_or_else(missing)
        },
        ScopeKind::File => Ok(Scope::subtree(ScopeKind::File, tree.root())),
        ScopeKind::Method => {
            let anchor = index.anchor(line).ok_or_else(missing)?;
            let method = innermost(tree, anchor, METHOD_KINDS).ok_or_else(missing)?;
            Ok(Scope::subtree(kind, method))
        },
        ScopeKind::MethodOrClass => Ok(select_method_or_class(tree, index, line)),
        ScopeKind::PackageDeclaration => {
            let package = tree
                .children(tree.root())
                .iter()
                .copied()
                .find(|id| return tree.kind(*id) == "package_declaration")
                .ok_or_else(missing)?;
            Ok(Scope::subtree(kind, package))
        },
        ScopeKind::SurroundingWindow(size) => Ok(select_window(tree, index, size, line)),
        ScopeKind::WholeClass { include_nested_only } => {
            let anchor = index.anchor(line).ok_or_else(missing)?;
            select_class(tree, anchor, include_nested_only).ok_or_else(missing)
        },
    };
}

/// Members of the body of type declaration `class`. Enum constants are
/// skipped: the members of an enum live in its body declarations.
fn body_members(tree: &SyntaxTree, class: NodeId) -> Vec<NodeId> {
    let Some(body) = tree.children(class).iter().copied().find(|id| return BODY_KINDS.contains(&tree.kind(*id))) else {
        return Vec::new();
    };

    if tree.kind(body) == "enum_body" {
        return tree
            .children(body)
            .iter()
            .copied()
            .find(|id| return tree.kind(*id) == "enum_body_declarations")
            .map(|decls| return tree.children(decls).to_vec())
            .unwrap_or_default();
    }
    return tree.children(body).to_vec();
}

/// Innermost node of one of `kinds` whose span contains `line`.
fn innermost(tree: &SyntaxTree, line: u32, kinds: &[&str]) -> Option<NodeId> {
    let found = tree.enclosing(line, |k| return kinds.contains(&k));
    let deepest = found.into_iter().fold(None, |best: Option<(NodeId, usize)>, (id, depth)| {
        return match best {
            Some((_, best_depth)) if best_depth >= depth => best,
            _ => Some((id, depth)),
        };
    });
    return deepest.map(|(id, _)| return id);
}

/// Outermost node of one of `kinds` whose span contains `line`.
fn outermost(tree: &SyntaxTree, line: u32, kinds: &[&str]) -> Option<NodeId> {
    let found = tree.enclosing(line, |k| return kinds.contains(&k));
    return found.into_iter().min_by_key(|(_, depth)| return *depth).map(|(id, _)| return id);
}

/// Class selection around the anchor line.
fn select_class(tree: &SyntaxTree, anchor: u32, include_nested_only: bool) -> Option<Scope> {
    let resolved = ScopeKind::WholeClass { include_nested_only };
    if include_nested_only {
        let class = innermost(tree, anchor, TYPE_KINDS)?;
        return Some(Scope {
            parts: vec![ScopePart::SubtreeWithoutNestedTypes(class)],
            resolved,
        });
    }
    let class = outermost(tree, anchor, TYPE_KINDS)?;
    return Some(Scope::subtree(resolved, class));
}

/// Field declarations leading the innermost class body around the anchor.
fn select_fields(tree: &SyntaxTree, anchor: u32) -> Option<Scope> {
    let class = innermost(tree, anchor, TYPE_KINDS)?;
    let members = body_members(tree, class);

    let leading: Vec<ScopePart> = members
        .iter()
        .copied()
        .take_while(|id| return !METHOD_KINDS.contains(&tree.kind(*id)))
        .filter(|id| return FIELD_KINDS.contains(&tree.kind(*id)))
        .map(ScopePart::Subtree)
        .collect();

    if !leading.is_empty() {
        return Some(Scope { parts: leading, resolved: ScopeKind::Fields });
    }

    // No field precedes the first method: fall back to the field on the anchor.
    let own = members.into_iter().find(|id| {
        return FIELD_KINDS.contains(&tree.kind(*id)) && tree.node(*id).is_some_and(|n| return n.contains_line(anchor));
    })?;
    return Some(Scope::subtree(ScopeKind::Fields, own));
}

/// Method, else innermost class, else the whole file.
fn select_method_or_class(tree: &SyntaxTree, index: &SourceIndex, line: u32) -> Scope {
    let Some(anchor) = index.anchor(line) else {
        return Scope::subtree(ScopeKind::File, tree.root());
    };

    if let Some(method) = innermost(tree, anchor, METHOD_KINDS) {
        return Scope::subtree(ScopeKind::Method, method);
    }
    if let Some(scope) = select_class(tree, anchor, true) {
        return scope;
    }
    tracing::debug!(line, "no method or class around line, using the whole file");
    return Scope::subtree(ScopeKind::File, tree.root());
}

/// The anchor line plus up to `size` meaningful lines on each side.
fn select_window(tree: &SyntaxTree, index: &SourceIndex, size: NonZeroU32, line: u32) -> Scope {
    let Some(anchor) = index.anchor(line) else {
        return Scope::subtree(ScopeKind::File, tree.root());
    };
    let count = usize::try_from(size.get()).unwrap_or(usize::MAX);

    let mut lines = index.meaningful_before(anchor, count);
    lines.push(anchor);
    lines.extend(index.meaningful_after(anchor, count));

    return Scope {
        parts: lines.into_iter().map(ScopePart::Line).collect(),
        resolved: ScopeKind::SurroundingWindow(size),
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
package demo.shapes;

import java.util.List;

public class Outer {
    private int width = 2;
    private String name;

    public Outer() {
        name = \"outer\";
    }

    private int area() {
        int result = width * width;

        return result;
    }

    static class Inner {
        int depth;

        void sink() {
            depth++;
        }
    }
}
";

    fn parse(text: &str) -> (SyntaxTree, SourceIndex) {
        let tree = SyntaxTree::parse(text, &tree_sitter_java::LANGUAGE.into()).unwrap();
        return (tree, SourceIndex::build(text));
    }

    fn span(kind: ScopeKind, line: u32) -> Option<(u32, u32)> {
        let (tree, index) = parse(SAMPLE);
        return select(&tree, &index, kind, line).unwrap().line_span(&tree);
    }

    #[test]
    fn file_scope_is_the_root() {
        let (tree, index) = parse(SAMPLE);
        let scope = select(&tree, &index, ScopeKind::File, 14).unwrap();
        assert_eq!(scope.parts, vec![ScopePart::Subtree(tree.root())]);
    }

    #[test]
    fn method_scope_covers_the_method() {
        assert_eq!(span(ScopeKind::Method, 14), Some((13, 17)));
        assert_eq!(span(ScopeKind::Method, 10), Some((9, 11)));
    }

    #[test]
    fn blank_line_inside_method_anchors_backward() {
        assert_eq!(span(ScopeKind::Method, 15), Some((13, 17)));
    }

    #[test]
    fn method_scope_fails_outside_methods() {
        let (tree, index) = parse(SAMPLE);
        let err = select(&tree, &index, ScopeKind::Method, 6).unwrap_err();
        assert!(matches!(err, Error::NoEnclosingScope { line: 6, scope: ScopeKind::Method }));
    }

    #[test]
    fn class_scopes_pick_inner_or_outer() {
        assert_eq!(span(ScopeKind::WholeClass { include_nested_only: true }, 23), Some((19, 25)));
        assert_eq!(span(ScopeKind::WholeClass { include_nested_only: false }, 23), Some((5, 26)));
    }

    #[test]
    fn method_or_class_falls_back_to_class_then_file() {
        let (tree, index) = parse(SAMPLE);
        let on_field = select(&tree, &index, ScopeKind::MethodOrClass, 20).unwrap();
        assert_eq!(on_field.resolved, ScopeKind::WholeClass { include_nested_only: true });
        let on_import = select(&tree, &index, ScopeKind::MethodOrClass, 3).unwrap();
        assert_eq!(on_import.resolved, ScopeKind::File);
        let in_method = select(&tree, &index, ScopeKind::MethodOrClass, 23).unwrap();
        assert_eq!(in_method.resolved, ScopeKind::Method);
    }

    #[test]
    fn fields_collapse_to_leading_declarations() {
        let (tree, index) = parse(SAMPLE);
        let first = select(&tree, &index, ScopeKind::Fields, 6).unwrap();
        let second = select(&tree, &index, ScopeKind::Fields, 7).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.parts.len(), 2);
        assert_eq!(first.line_span(&tree), Some((6, 7)));
    }

    #[test]
    fn fields_of_nested_class_are_separate() {
        assert_eq!(span(ScopeKind::Fields, 20), Some((20, 20)));
    }

    #[test]
    fn package_scope_ignores_line() {
        assert_eq!(span(ScopeKind::PackageDeclaration, 23), Some((1, 1)));
    }

    #[test]
    fn missing_package_is_reported() {
        let (tree, index) = parse("class A {}\n");
        let err = select(&tree, &index, ScopeKind::PackageDeclaration, 1).unwrap_err();
        assert!(matches!(err, Error::NoEnclosingScope { .. }));
    }

    #[test]
    fn window_counts_meaningful_lines_only() {
        let (tree, index) = parse(SAMPLE);
        let size = NonZeroU32::new(3).unwrap();
        let scope = select(&tree, &index, ScopeKind::SurroundingWindow(size), 14).unwrap();
        let lines: Vec<ScopePart> = [10, 11, 13, 14, 16, 17, 19].into_iter().map(ScopePart::Line).collect();
        assert_eq!(scope.parts, lines);
    }

    #[test]
    fn window_reaches_past_the_end_of_its_method() {
        let (tree, index) = parse(SAMPLE);
        let size = NonZeroU32::new(3).unwrap();
        let scope = select(&tree, &index, ScopeKind::SurroundingWindow(size), 16).unwrap();
        let lines: Vec<ScopePart> = [11, 13, 14, 16, 17, 19, 20].into_iter().map(ScopePart::Line).collect();
        assert_eq!(scope.parts, lines);
        assert_eq!(span(ScopeKind::Method, 16), Some((13, 17)));
    }

    #[test]
    fn window_shrinks_at_file_boundaries() {
        let (tree, index) = parse(SAMPLE);
        let size = NonZeroU32::new(3).unwrap();
        let scope = select(&tree, &index, ScopeKind::SurroundingWindow(size), 1).unwrap();
        let lines: Vec<ScopePart> = [1, 3, 5, 6].into_iter().map(ScopePart::Line).collect();
        assert_eq!(scope.parts, lines);
    }
}
