use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use scopeprint::engine::{Basis, ParsedFile};
use scopeprint::scope::{self, ScopePart};
use scopeprint::{CategoryRegistry, Error, Fingerprint, FingerprintEngine, ScopeKind};

const INVENTORY: &str = include_str!("fixtures/project/src/Inventory.java");

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Fingerprint `text` as a fresh file in a fresh engine.
fn fingerprint(text: &str, category: &str, line: u32) -> Fingerprint {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Subject.java", text);
    let engine = FingerprintEngine::new(CategoryRegistry::default());
    engine.fingerprint(&file, category, line).unwrap().fingerprint
}

/// Insert `count` blank lines before the one-based `line`.
fn insert_blank_lines(text: &str, line: usize, count: usize) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    for _ in 0..count {
        lines.insert(line - 1, "");
    }
    lines.join("\n") + "\n"
}

#[test]
fn same_input_gives_same_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Inventory.java", INVENTORY);
    let engine = FingerprintEngine::new(CategoryRegistry::default());

    let first = engine.fingerprint(&file, "NeedBraces", 40).unwrap().fingerprint;
    let again = engine.fingerprint(&file, "NeedBraces", 40).unwrap().fingerprint;
    let fresh = fingerprint(INVENTORY, "NeedBraces", 40);

    assert_eq!(first, again);
    assert_eq!(first, fresh);
    assert_eq!(first.hash, fresh.hash);
}

#[test]
fn brace_warning_survives_a_blank_line_above_its_method() {
    let shifted = insert_blank_lines(INVENTORY, 36, 1);
    assert_eq!(fingerprint(INVENTORY, "NeedBraces", 40), fingerprint(&shifted, "NeedBraces", 41));
    assert_eq!(fingerprint(INVENTORY, "MethodLength", 40), fingerprint(&shifted, "MethodLength", 41));
}

#[test]
fn method_digest_ignores_blank_lines_above_the_method() {
    let shifted = insert_blank_lines(INVENTORY, 24, 4);
    assert_eq!(fingerprint(INVENTORY, "MethodLength", 37), fingerprint(&shifted, "MethodLength", 41));
}

#[test]
fn warning_on_a_blank_line_anchors_on_the_code_above() {
    assert_eq!(fingerprint(INVENTORY, "MethodLength", 41), fingerprint(INVENTORY, "MethodLength", 40));
}

#[test]
fn renaming_the_package_changes_the_package_digest() {
    let renamed = INVENTORY.replace("package com.example.store;", "package com.example.shop;");
    assert_ne!(fingerprint(INVENTORY, "PackageName", 1), fingerprint(&renamed, "PackageName", 1));
}

#[test]
fn renaming_a_local_keeps_the_method_digest() {
    let renamed = INVENTORY.replace("added", "extra");
    assert_ne!(renamed, INVENTORY);
    assert_eq!(fingerprint(INVENTORY, "MethodLength", 40), fingerprint(&renamed, "MethodLength", 40));
}

#[test]
fn pushing_a_method_down_keeps_only_the_method_digest() {
    let before = "\
package demo;

class Base {
    int twice(int x) {
        return x * 2;
    }
}

class Sub extends Base {
}
";
    let after = "\
package demo;

class Base {
}

class Sub extends Base {
    int twice(int x) {
        return x * 2;
    }
}
";
    assert_eq!(fingerprint(before, "MethodLength", 5), fingerprint(after, "MethodLength", 7));
    assert_ne!(fingerprint(before, "TypeName", 5), fingerprint(after, "TypeName", 7));
    assert_ne!(fingerprint(before, "FileLength", 5), fingerprint(after, "FileLength", 7));
}

#[test]
fn window_holds_three_meaningful_lines_on_each_side() {
    let parsed = ParsedFile::parse(INVENTORY, &tree_sitter_java::LANGUAGE.into()).unwrap();
    let kind = ScopeKind::SurroundingWindow(NonZeroU32::new(3).unwrap());
    let selected = scope::select(&parsed.tree, &parsed.index, kind, 40).unwrap();

    let lines: Vec<ScopePart> = [37, 38, 39, 40, 42, 43, 44].into_iter().map(ScopePart::Line).collect();
    assert_eq!(selected.parts, lines);
}

#[test]
fn window_ignores_blank_and_comment_lines_inside_it() {
    let mut lines: Vec<&str> = INVENTORY.lines().collect();
    lines.insert(38, "        // about to add");
    lines.insert(38, "");
    let padded = lines.join("\n") + "\n";
    assert_eq!(fingerprint(INVENTORY, "NeedBraces", 40), fingerprint(&padded, "NeedBraces", 42));
}

#[test]
fn unknown_category_still_fingerprints() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Inventory.java", INVENTORY);
    let engine = FingerprintEngine::new(CategoryRegistry::default());

    for line in [0, 1, 40, 500] {
        let done = engine.fingerprint(&file, "SomeBrandNewCheck", line).unwrap();
        assert!(matches!(done.basis, Basis::Scope(ScopeKind::SurroundingWindow(_)) | Basis::Scope(ScopeKind::File)));
        assert_eq!(done.fingerprint.digest.len(), 64);
    }
}

#[test]
fn field_warnings_of_one_class_share_a_digest() {
    assert_eq!(fingerprint(INVENTORY, "MemberName", 13), fingerprint(INVENTORY, "ConstantName", 12));

    let reinitialized = INVENTORY.replace("\"nobody\"", "\"anyone\"");
    assert_ne!(fingerprint(INVENTORY, "ExplicitInitialization", 14), fingerprint(&reinitialized, "ExplicitInitialization", 14));
}

#[test]
fn unparsable_file_has_no_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "Broken.java", include_str!("fixtures/project/src/Broken.java"));
    let engine = FingerprintEngine::new(CategoryRegistry::default());

    let err = engine.fingerprint(&file, "NeedBraces", 4).unwrap_err();
    assert!(matches!(err, Error::FileNotParsable { .. }));
}
