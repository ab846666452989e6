use chrono::{Duration, TimeZone, Utc};
use echorag_core::traits::ChunkStore;
use echorag_core::{Chunk, DocType, Document, HeadingRow, IndexState, Meta, SensitivityLevel};
use echorag_store::SqliteStore;
use tempfile::TempDir;

fn doc(id: &str, minutes: i64) -> Document {
    let mut metadata = Meta::new();
    metadata.insert("tags".into(), serde_json::json!(["garden", "water"]));
    Document {
        id: id.to_string(),
        filename: format!("{id}.txt"),
        filetype: "text".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes),
        metadata,
    }
}

fn chunks(doc_id: &str) -> Vec<Chunk> {
    let parent = Chunk {
        doc_id: doc_id.to_string(),
        chunk_id: format!("{doc_id}-p"),
        chunk_index: 0,
        text: "Chapter 1 Water. Whole parent text.".to_string(),
        doc_type: DocType::LongForm,
        sensitivity_level: SensitivityLevel::Low,
        redacted: false,
        is_parent: true,
        parent_chunk_id: None,
        section: Some("Chapter 1 Water".to_string()),
    };
    let child = Chunk {
        chunk_id: format!("{doc_id}-c"),
        chunk_index: 1,
        text: "Whole parent text.".to_string(),
        is_parent: false,
        parent_chunk_id: Some(parent.chunk_id.clone()),
        ..parent.clone()
    };
    vec![parent, child]
}

#[test]
fn documents_and_chunks_roundtrip() {
    let store = SqliteStore::open_in_memory().unwrap();
    let d = doc("doc_a", 0);
    store.insert_document(&d, &chunks("doc_a")).unwrap();

    assert_eq!(store.get_document("doc_a").unwrap(), Some(d.clone()));
    assert_eq!(store.get_document("doc_a").unwrap().unwrap().tags(), vec!["garden", "water"]);

    let stored = store.chunks_for_doc("doc_a").unwrap();
    assert_eq!(stored, chunks("doc_a"));
    let child = store.chunk_at("doc_a", 1).unwrap().unwrap();
    assert_eq!(child.parent_chunk_id.as_deref(), Some("doc_a-p"));
    assert_eq!(store.get_chunk("doc_a-p").unwrap().unwrap().section.as_deref(), Some("Chapter 1 Water"));
    assert!(store.chunk_at("doc_a", 2).unwrap().is_none());
    assert!(store.get_chunk("missing").unwrap().is_none());
}

#[test]
fn index_state_tracks_pending_documents() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.insert_document(&doc("doc_a", 0), &chunks("doc_a")).unwrap();
    store.insert_document(&doc("doc_b", 1), &chunks("doc_b")).unwrap();
    assert_eq!(store.documents_in_state(IndexState::Pending).unwrap(), vec!["doc_a", "doc_b"]);

    store.set_index_state("doc_a", IndexState::Indexed).unwrap();
    assert_eq!(store.documents_in_state(IndexState::Pending).unwrap(), vec!["doc_b"]);
    assert_eq!(store.documents_in_state(IndexState::Indexed).unwrap(), vec!["doc_a"]);
    assert!(store.set_index_state("nope", IndexState::Indexed).is_err());
}

#[test]
fn duplicate_chunk_rolls_back_the_whole_document() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut dup = chunks("doc_a");
    dup[1].chunk_id = dup[0].chunk_id.clone();
    assert!(store.insert_document(&doc("doc_a", 0), &dup).is_err());
    assert!(store.get_document("doc_a").unwrap().is_none());
    assert!(store.chunks_for_doc("doc_a").unwrap().is_empty());
}

#[test]
fn list_is_newest_first_and_delete_cascades() {
    let store = SqliteStore::open_in_memory().unwrap();
    for (i, id) in ["doc_a", "doc_b", "doc_c"].iter().enumerate() {
        store.insert_document(&doc(id, i as i64), &chunks(id)).unwrap();
    }
    let ids: Vec<String> = store.list_documents().unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["doc_c", "doc_b", "doc_a"]);

    store
        .replace_headings(
            "doc_b",
            &[HeadingRow {
                doc_id: "doc_b".into(),
                idx: 0,
                heading_text: "Chapter 1 Water".into(),
                chunk_id: "doc_b-p".into(),
                chunk_index: 0,
            }],
        )
        .unwrap();
    assert_eq!(store.headings_for_docs(&["doc_b".into()]).unwrap().len(), 1);

    assert!(store.delete_document("doc_b").unwrap());
    assert!(!store.delete_document("doc_b").unwrap());
    assert!(store.chunks_for_doc("doc_b").unwrap().is_empty());
    assert!(store.headings_for_docs(&["doc_b".into()]).unwrap().is_empty());
    assert_eq!(store.all_chunks().unwrap().len(), 4);
}

#[test]
fn headings_are_replaced_and_ordered() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.insert_document(&doc("doc_a", 0), &chunks("doc_a")).unwrap();
    store.insert_document(&doc("doc_b", 1), &chunks("doc_b")).unwrap();
    let row = |doc: &str, idx: i64, text: &str| HeadingRow {
        doc_id: doc.into(),
        idx,
        heading_text: text.into(),
        chunk_id: format!("{doc}-p"),
        chunk_index: 0,
    };
    store.replace_headings("doc_a", &[row("doc_a", 1, "old")]).unwrap();
    store
        .replace_headings("doc_a", &[row("doc_a", 1001, "Chapter 2"), row("doc_a", 0, "Chapter 1")])
        .unwrap();
    store.replace_headings("doc_b", &[row("doc_b", 0, "Contents")]).unwrap();

    let got: Vec<(String, String)> = store
        .headings_for_docs(&["doc_b".into(), "doc_a".into()])
        .unwrap()
        .into_iter()
        .map(|h| (h.doc_id, h.heading_text))
        .collect();
    assert_eq!(
        got,
        vec![
            ("doc_a".into(), "Chapter 1".into()),
            ("doc_a".into(), "Chapter 2".into()),
            ("doc_b".into(), "Contents".into()),
        ]
    );
    assert!(store.headings_for_docs(&[]).unwrap().is_empty());
}

#[test]
fn on_disk_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/echorag.sqlite");
    {
        let store = SqliteStore::open(&path).unwrap();
        store.insert_document(&doc("doc_a", 0), &chunks("doc_a")).unwrap();
        store.set_index_state("doc_a", IndexState::Indexed).unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.chunks_for_doc("doc_a").unwrap().len(), 2);
    assert_eq!(store.documents_in_state(IndexState::Indexed).unwrap(), vec!["doc_a"]);
}
