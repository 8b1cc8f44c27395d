//! Property-based tests for path merging, label validation and sealing.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use swarm_cli::domain::bundle::{open, seal, sha256_hex};
use swarm_cli::domain::path::{ConfigPath, merge_nested, set_nested};
use swarm_cli::domain::validate::validate_label;

fn lookup<'a>(root: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut cursor = root;
    for segment in parents {
        cursor = cursor.get(segment)?.as_object()?;
    }
    cursor.get(last)
}

// ============================================================================
// set_nested / merge_nested
// ============================================================================

proptest! {
    /// Whatever was in the way, the value ends up at the path.
    #[test]
    fn prop_set_nested_value_readable_at_path(
        segments in prop::collection::vec("[a-z]{1,6}", 1..5),
        existing in prop::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..6),
        value in any::<i64>(),
    ) {
        let mut target = Map::new();
        for (k, v) in existing {
            target.insert(k, json!(v));
        }
        let path = ConfigPath::new(segments.clone());
        set_nested(&mut target, &path, json!(value));
        prop_assert_eq!(lookup(&target, &segments), Some(&json!(value)));
    }

    /// Merging keeps sibling keys already present at the path.
    #[test]
    fn prop_merge_nested_keeps_siblings(
        parent in "[a-z]{1,6}",
        kept in "k[a-z]{1,5}",
        added in "a[a-z]{1,5}",
        kept_value in any::<i32>(),
        added_value in any::<i32>(),
    ) {
        let mut target = Map::new();
        set_nested(&mut target, &ConfigPath::new([parent.clone(), kept.clone()]), json!(kept_value));
        let mut fields = Map::new();
        fields.insert(added.clone(), json!(added_value));
        merge_nested(&mut target, &ConfigPath::new([parent.clone()]), Value::Object(fields));

        prop_assert_eq!(lookup(&target, &[parent.clone(), kept]), Some(&json!(kept_value)));
        prop_assert_eq!(lookup(&target, &[parent, added]), Some(&json!(added_value)));
    }

    /// Later writes to the same key win.
    #[test]
    fn prop_merge_nested_last_write_wins(key in "[a-z]{1,6}", first in any::<i32>(), second in any::<i32>()) {
        let mut target = Map::new();
        let path = ConfigPath::default();
        merge_nested(&mut target, &path, json!({ key.clone(): first }));
        merge_nested(&mut target, &path, json!({ key.clone(): second }));
        prop_assert_eq!(target.get(&key), Some(&json!(second)));
    }
}

// ============================================================================
// validate_label
// ============================================================================

proptest! {
    /// Well-formed labels are accepted.
    #[test]
    fn prop_valid_labels_accepted(label in "[a-z0-9]([a-z0-9-]{0,62}[a-z0-9])?") {
        prop_assert!(validate_label(&label).is_ok(), "rejected: {}", label);
    }

    /// Anything with a path separator or uppercase is rejected.
    #[test]
    fn prop_labels_with_separators_rejected(
        prefix in "[a-z0-9]{1,10}",
        bad in prop::sample::select(vec!["/", "\\", "A", " ", ".."]),
        suffix in "[a-z0-9]{1,10}",
    ) {
        let label = format!("{prefix}{bad}{suffix}");
        prop_assert!(validate_label(&label).is_err(), "accepted: {}", label);
    }
}

#[test]
fn test_overlong_label_rejected() {
    assert!(validate_label(&"a".repeat(64)).is_ok());
    assert!(validate_label(&"a".repeat(65)).is_err());
}

// ============================================================================
// seal / open
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The sealing key opens what it sealed, and the hash names the plaintext.
    #[test]
    fn prop_seal_then_open_recovers_plaintext(plaintext in prop::collection::vec(any::<u8>(), 0..512)) {
        let sealed = seal(&plaintext).expect("seal");
        prop_assert_eq!(&sealed.directive_hash, &sha256_hex(&plaintext));
        let opened = open(&sealed.bundle, &sealed.swarm_key).expect("open");
        prop_assert_eq!(opened, plaintext);
    }

    /// A different key never opens the bundle.
    #[test]
    fn prop_foreign_key_fails(plaintext in prop::collection::vec(any::<u8>(), 1..256)) {
        let sealed = seal(&plaintext).expect("seal");
        let other = seal(b"x").expect("seal");
        prop_assert!(open(&sealed.bundle, &other.swarm_key).is_err());
    }
}
