use std::fs;

use indexmap::IndexMap;
use msamp_run::canonical::{digest, to_json_bytes, DATA_DOMAIN, TABLE_DOMAIN};
use msamp_run::table;

#[test]
fn key_order_does_not_change_bytes() {
    let mut forward = IndexMap::new();
    forward.insert("b", 2);
    forward.insert("a", 1);
    let mut backward = IndexMap::new();
    backward.insert("a", 1);
    backward.insert("b", 2);

    let bytes = to_json_bytes(&forward).expect("encode");
    assert_eq!(bytes, to_json_bytes(&backward).expect("encode"));
    assert_eq!(bytes, br#"{"a":1,"b":2}"#.to_vec());
}

#[test]
fn digests_are_labelled_by_domain() {
    let value = vec![("A", 0.5), ("B", 0.5)];
    let table_digest = digest(TABLE_DOMAIN, &value).expect("digest");
    assert_eq!(table_digest.len(), 64);
    assert!(table_digest.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(table_digest, digest(TABLE_DOMAIN, &value).expect("digest"));
    assert_ne!(table_digest, digest(DATA_DOMAIN, &value).expect("digest"));
}

#[test]
fn table_hash_ignores_file_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let text = dir.path().join("probs.txt");
    let json = dir.path().join("probs.json");
    fs::write(&text, "A 0.25\nB 0.75\n").expect("write text");
    fs::write(&json, r#"[["A", 0.25], ["B", 0.75]]"#).expect("write json");

    let from_text = table::load(&text).expect("text table");
    let from_json = table::load(&json).expect("json table");
    assert_eq!(
        from_text.table_hash().expect("hash"),
        from_json.table_hash().expect("hash")
    );
}
