//! Canonical serialization of a selected scope.
//!
//! The canonical form is the pre-order sequence of node kinds joined by
//! single spaces, one line per scope part. Identifier and literal text is
//! left out, so renames and value changes never move a fingerprint, except
//! where the retention table keeps it for a scope kind. Retained text is
//! quoted and escaped so it can never imitate a separator. An identifier
//! naming a file constant stands for the constant's literal kind.

use crate::scope::{Scope, ScopePart, TYPE_KINDS};
use crate::syntax::{LITERAL_KINDS, NodeId, SyntaxTree};
use crate::types::ScopeKind;

/// Node kinds whose source text is part of the canonical form, per scope kind name.
const RETENTION: &[(&str, &[&str])] = &[("fields", LITERAL_KINDS), ("package", &["identifier"])];

/// Node kinds whose text is retained under `kind`.
pub fn retained_kinds(kind: ScopeKind) -> &'static [&'static str] {
    return RETENTION
        .iter()
        .find(|(name, _)| return *name == kind.name())
        .map_or(&[], |(_, kinds)| return *kinds);
}

/// Serialize the scope into its canonical string.
pub fn canonicalize(tree: &SyntaxTree, scope: &Scope) -> String {
    let retained = retained_kinds(scope.resolved);
    let lines: Vec<String> = scope
        .parts
        .iter()
        .map(|part| {
            let mut tokens = Vec::new();
            match *part {
                ScopePart::Line(line) => {
                    for id in tree.starting_on(line) {
                        tokens.push(token(tree, id, retained));
                    }
                },
                ScopePart::Subtree(id) => walk(tree, id, retained, false, &mut tokens),
                ScopePart::SubtreeWithoutNestedTypes(id) => walk(tree, id, retained, true, &mut tokens),
            }
            return tokens.join(" ");
        })
        .collect();
    return lines.join("\n");
}

/// Canonical token of one node.
fn token(tree: &SyntaxTree, id: NodeId, retained: &[&str]) -> String {
    let kind = tree.kind(id);
    let text = tree.node(id).and_then(|n| return n.literal.as_deref());

    if retained.contains(&kind) {
        if let Some(text) = text {
            return format!("{kind}={text:?}");
        }
    }
    if kind == "identifier" {
        if let Some(constant) = text.and_then(|name| return tree.constant_kind(name)) {
            return constant.to_string();
        }
    }
    return kind.to_string();
}

/// Pre-order walk below `start` with an explicit stack.
fn walk(tree: &SyntaxTree, start: NodeId, retained: &[&str], prune_nested_types: bool, tokens: &mut Vec<String>) {
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        let kind = tree.kind(id);
        if prune_nested_types && id != start && TYPE_KINDS.contains(&kind) {
            continue;
        }

        tokens.push(token(tree, id, retained));
        if retained.contains(&kind) {
            continue;
        }
        stack.extend(tree.children(id).iter().rev().copied());
    }
}
