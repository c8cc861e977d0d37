// Queue event handling against a filesystem-backed object store

use garble::event::{EventError, HANDLER_MESSAGE};
use garble::{handle, parse_term_bytes, LocalObjectStore};
use serde_json::json;

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::TestFixture;

fn record(bucket: &str, key: &str) -> serde_json::Value {
    let body = json!({"detail": {"bucket": {"name": bucket}, "object": {"key": key}}});
    json!({"body": body.to_string()})
}

#[test]
fn test_event_fetches_objects_in_record_order() {
    let fixture = TestFixture::new();
    for i in 0..3 {
        fixture.create_file(format!("inbox/test-{i}.txt"), &format!("Test file {i}"));
    }
    let store = LocalObjectStore::new(&fixture.root_path);
    let event = json!({"Records": [
        record("inbox", "test-2.txt"),
        record("inbox", "test-0.txt"),
        record("inbox", "test-1.txt"),
    ]});

    let response = handle(&event, &store).expect("event handled");

    assert_eq!(response.message, HANDLER_MESSAGE);
    assert_eq!(response.event, event);
    let contents: Vec<String> = response
        .file_contents
        .iter()
        .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
        .collect();
    assert_eq!(contents, vec!["Test file 2", "Test file 0", "Test file 1"]);
}

#[test]
fn test_event_without_records_is_empty() {
    let fixture = TestFixture::new();
    let store = LocalObjectStore::new(&fixture.root_path);

    for event in [json!({}), json!({"Records": []})] {
        let response = handle(&event, &store).expect("event handled");
        assert!(response.file_contents.is_empty());
        assert_eq!(response.event, event);
    }
}

#[test]
fn test_event_missing_object_is_fetch_error() {
    let fixture = TestFixture::new();
    let store = LocalObjectStore::new(&fixture.root_path);
    let event = json!({"Records": [record("inbox", "absent.txt")]});

    match handle(&event, &store) {
        Err(EventError::Fetch { location, .. }) => assert_eq!(location.to_string(), "inbox/absent.txt"),
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn test_event_rejects_keys_outside_store() {
    let fixture = TestFixture::new();
    fixture.create_file("secret.txt", "do not read");
    let store = LocalObjectStore::new(fixture.root_path.join("store"));
    let event = json!({"Records": [record("inbox", "../../secret.txt")]});

    assert!(matches!(handle(&event, &store), Err(EventError::InvalidLocation(_))));
}

#[test]
fn test_fetched_terms_parse_into_records() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/terms.tsv", test_utils::LAB_TERMS);
    let store = LocalObjectStore::new(&fixture.root_path);
    let event = json!({"Records": [record("inbox", "terms.tsv")]});

    let response = handle(&event, &store).expect("event handled");
    let records = parse_term_bytes(&response.file_contents[0]).expect("terms are UTF-8");

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].term, "Hematocrit of Blood");
    assert_eq!(records[0].related_terms, vec!["Hct", "PCV", "Packed cell volume"]);
}

#[test]
fn test_fetched_invalid_utf8_is_reported() {
    let fixture = TestFixture::new();
    let bad = fixture.root_path.join("inbox").join("bad.tsv");
    std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
    std::fs::write(&bad, [b'H', b'c', b't', 0xFF, b'\n']).unwrap();
    let store = LocalObjectStore::new(&fixture.root_path);
    let event = json!({"Records": [record("inbox", "bad.tsv")]});

    let response = handle(&event, &store).expect("bytes are fetched as-is");
    assert_eq!(response.file_contents[0].len(), 5);
    assert!(parse_term_bytes(&response.file_contents[0]).is_err());
}
