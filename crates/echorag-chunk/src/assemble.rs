use echorag_core::{Chunk, ChunkDraft};

/// Mint ids and indexes for strategy output.
///
/// `chunk_index` follows emission order from 0. `chunk_id` is derived from
/// `(doc_id, chunk_index)`, so re-chunking the same text under the same
/// document id yields the same ids. Children get their parent's id.
pub fn assemble(drafts: Vec<ChunkDraft>, doc_id: &str) -> Vec<Chunk> {
    let ids: Vec<String> = (0..drafts.len()).map(|i| chunk_id_for(doc_id, i)).collect();
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, d)| Chunk {
            doc_id: doc_id.to_string(),
            chunk_id: ids[i].clone(),
            chunk_index: i,
            text: d.text,
            doc_type: d.doc_type,
            sensitivity_level: d.sensitivity_level,
            redacted: d.redacted,
            is_parent: d.is_parent,
            parent_chunk_id: d.parent.and_then(|p| ids.get(p).cloned()),
            section: d.section,
        })
        .collect()
}

pub fn chunk_id_for(doc_id: &str, chunk_index: usize) -> String {
    let hash = blake3::hash(format!("{doc_id}:{chunk_index}").as_bytes());
    format!("chk_{}", &hash.to_hex().as_str()[..24])
}

/// `doc_` followed by 12 hex chars.
pub fn new_doc_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("doc_{}", &id[..12])
}
