use echorag_core::traits::{SparseEntry, SparseIndex};
use echorag_core::types::SourceKind;
use echorag_text::{tokenize, TantivySparseIndex};
use tempfile::TempDir;

fn entry(chunk_id: &str, doc_id: &str, text: &str) -> SparseEntry {
    SparseEntry { chunk_id: chunk_id.into(), doc_id: doc_id.into(), tokens: tokenize(text) }
}

#[test]
fn ram_index_ranks_matching_chunks() {
    let index = TantivySparseIndex::in_ram().expect("index");
    index
        .insert(&[
            entry("c1", "d1", "Invoices are generated monthly from the billing page."),
            entry("c2", "d1", "Passwords can be reset from account settings."),
            entry("c3", "d2", "Billing disputes go to the billing team, billing is handled weekly."),
        ])
        .expect("insert");

    let snap = index.snapshot().expect("snapshot");
    let hits = snap.search(&tokenize("billing invoices"), 10).expect("search");
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"c1") && ids.contains(&"c3"));
    assert!(hits.iter().all(|h| h.source == SourceKind::Sparse));
    assert!(hits[0].score >= hits[1].score);

    assert!(snap.search(&tokenize("nothing matches zebra"), 10).expect("search").is_empty());
    assert!(snap.search(&[], 10).expect("search").is_empty());
}

#[test]
fn snapshot_is_isolated_from_later_writes() {
    let index = TantivySparseIndex::in_ram().expect("index");
    index.insert(&[entry("c1", "d1", "harbor schedule")]).expect("insert");
    let before = index.snapshot().expect("snapshot");

    index.insert(&[entry("c2", "d2", "harbor ledger")]).expect("insert");
    assert_eq!(before.search(&tokenize("harbor"), 10).expect("search").len(), 1);
    assert_eq!(index.snapshot().expect("snapshot").search(&tokenize("harbor"), 10).expect("search").len(), 2);
}

#[test]
fn delete_doc_and_reinsert_on_disk() {
    let tmp = TempDir::new().expect("tmp");
    {
        let index = TantivySparseIndex::open(tmp.path()).expect("open");
        index.insert(&[entry("c1", "d1", "alpha beta"), entry("c2", "d2", "alpha gamma")]).expect("insert");
        // same chunk id replaces the old entry
        index.insert(&[entry("c1", "d1", "alpha beta delta")]).expect("reinsert");
        assert_eq!(index.num_docs(), 2);

        index.delete_doc("d1").expect("delete");
        let hits = index.snapshot().expect("snapshot").search(&tokenize("alpha"), 10).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "c2");
    }
    let reopened = TantivySparseIndex::open(tmp.path()).expect("reopen");
    assert_eq!(reopened.num_docs(), 1);
}
