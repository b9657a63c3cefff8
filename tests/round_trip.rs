use na::parse::{ParseOptions, parse_outline, serialize_outline};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn read_fixture(fixture_name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(fixture_name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Could not read fixture {}: {}", fixture_name, e))
}

fn serialize(source: &str) -> String {
    let outline = parse_outline(source, &ParseOptions::default());
    serialize_outline(&outline.root, &outline.indent_unit, "- ")
}

/// Helper: load a canonical fixture, parse it, serialize it, and assert byte-for-byte equality
fn assert_round_trip(fixture_name: &str) {
    let source = read_fixture(fixture_name);
    let outline = parse_outline(&source, &ParseOptions::default());
    assert!(
        outline.errors.is_empty(),
        "unexpected parse errors in {}: {:?}",
        fixture_name,
        outline.errors
    );
    assert_eq!(
        serialize(&source),
        source,
        "Round-trip failed for fixture: {}",
        fixture_name
    );
}

/// Helper: parse → serialize → parse yields the same tree, and serializing is stable
fn assert_idempotent(fixture_name: &str) {
    let source = read_fixture(fixture_name);
    let options = ParseOptions::default();

    let first = parse_outline(&source, &options);
    let canonical = serialize(&source);
    let second = parse_outline(&canonical, &options);

    assert_eq!(first.root, second.root, "tree changed for fixture: {}", fixture_name);
    assert_eq!(serialize(&canonical), canonical);
}

// ============================================================================
// Canonical files survive unchanged
// ============================================================================

#[test]
fn round_trip_simple() {
    assert_round_trip("simple.taskpaper");
}

#[test]
fn round_trip_nested_with_notes_and_project_tags() {
    assert_round_trip("nested.taskpaper");
}

#[test]
fn round_trip_space_indented() {
    assert_round_trip("spaces.taskpaper");
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn idempotent_simple() {
    assert_idempotent("simple.taskpaper");
}

#[test]
fn idempotent_nested() {
    assert_idempotent("nested.taskpaper");
}

#[test]
fn idempotent_messy_input() {
    assert_idempotent("messy.taskpaper");
}

#[test]
fn messy_input_keeps_every_action() {
    let source = read_fixture("messy.taskpaper");
    let outline = parse_outline(&source, &ParseOptions::default());
    // Two-space indentation and the top-level action are reported, not dropped
    assert_eq!(outline.errors.len(), 2);
    assert_eq!(outline.root.action_count(), 5);
}

#[test]
fn reparse_is_deterministic() {
    let source = read_fixture("nested.taskpaper");
    let options = ParseOptions::default();
    let a = parse_outline(&source, &options);
    let b = parse_outline(&source, &options);
    assert_eq!(a.root, b.root);
    assert_eq!(a.errors, b.errors);
}
