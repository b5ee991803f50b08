//! Contract checks every `RecordStore` must pass, plus the suites running them
//! against each provider and the facade.

use schemashare_core::{is_well_formed, RecordStore};

/// Payload pairs that must survive a save/get cycle byte for byte.
pub const PAYLOADS: &[(&str, &str)] = &[
    ("{\"type\":\"object\"}", "{\"a\":1}"),
    ("{\"type\":\"string\",\"maxLength\":3}", "\"toolong\""),
    ("{}", "null"),
    ("{ \"type\" : \"array\" }\n", "[1, 2,\t3]\r\n"),
    ("{\"title\":\"Grüße 🚀\"}", "{\"k\":\"\\u00e9\\n\"}"),
    ("not even json", "{\"a\":"),
    ("", ""),
];

pub async fn assert_round_trip<S: RecordStore>(store: &S, schema: &str, json: &str) {
    let id = store.save(schema, json).await.expect("save");
    assert!(!id.is_empty());
    assert!(is_well_formed(&id), "id {id} is not URL-safe");
    let rec = store
        .get(&id)
        .await
        .expect("get")
        .expect("record present after save");
    assert_eq!(rec.id, id);
    assert_eq!(rec.schema, schema);
    assert_eq!(rec.json, json);
}

pub async fn assert_contract<S: RecordStore>(store: &S) {
    for (schema, json) in PAYLOADS {
        assert_round_trip(store, schema, json).await;
    }
    assert!(store.get("nonexistent-id").await.expect("get").is_none());
    assert!(store.get("").await.expect("get").is_none());

    let a = store.save("{}", "1").await.expect("save");
    let b = store.save("{}", "1").await.expect("save");
    assert_ne!(a, b, "identical payloads must still get distinct ids");
}
