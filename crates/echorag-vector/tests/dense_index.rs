use echorag_core::traits::{DenseEntry, DenseIndex};
use echorag_vector::{FlatIndex, LanceDenseIndex};

fn unit(v: &[f32]) -> Vec<f32> {
    let n = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / n).collect()
}

fn entry(chunk_id: &str, doc_id: &str, v: &[f32]) -> DenseEntry {
    DenseEntry { chunk_id: chunk_id.into(), doc_id: doc_id.into(), vector: unit(v) }
}

fn corpus() -> Vec<DenseEntry> {
    vec![
        entry("a", "d1", &[1.0, 0.0, 0.0, 0.0]),
        entry("b", "d1", &[0.8, 0.6, 0.0, 0.0]),
        entry("c", "d2", &[0.0, 0.0, 1.0, 0.0]),
    ]
}

#[tokio::test]
async fn flat_index_ranks_by_inner_product() -> anyhow::Result<()> {
    let index = FlatIndex::new();
    index.insert(&corpus()).await?;

    let hits = index.snapshot().await?.search(&unit(&[1.0, 0.1, 0.0, 0.0]), 2).await?;
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(hits[0].score <= 1.0 + 1e-6);
    Ok(())
}

#[tokio::test]
async fn flat_snapshot_survives_delete() -> anyhow::Result<()> {
    let index = FlatIndex::new();
    index.insert(&corpus()).await?;
    let before = index.snapshot().await?;

    index.delete_doc("d1").await?;
    assert_eq!(index.len(), 1);
    assert_eq!(before.search(&unit(&[1.0, 0.0, 0.0, 0.0]), 10).await?.len(), 3);

    // reinsert replaces by chunk id
    index.insert(&[entry("c", "d2", &[0.0, 1.0, 0.0, 0.0])]).await?;
    assert_eq!(index.len(), 1);
    Ok(())
}

#[tokio::test]
async fn lance_index_roundtrip_on_disk() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let index = LanceDenseIndex::open(tmp.path(), "chunks", 4).await?;
    index.insert(&corpus()).await?;
    assert_eq!(index.count().await?, 3);

    let snap = index.snapshot().await?;
    let hits = snap.search(&unit(&[1.0, 0.0, 0.0, 0.0]), 2).await?;
    assert_eq!(hits[0].id, "a");
    assert!((hits[0].score - 1.0).abs() < 1e-4);

    index.delete_doc("d1").await?;
    assert_eq!(index.count().await?, 1);
    let hits = index.snapshot().await?.search(&unit(&[1.0, 0.0, 0.0, 0.0]), 5).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "c");

    // the earlier snapshot still sees the pre-delete version
    assert_eq!(snap.search(&unit(&[1.0, 0.0, 0.0, 0.0]), 5).await?.len(), 3);
    Ok(())
}
