use echorag_core::traits::Embedder;
use echorag_embed::{l2_normalize, truncate_at_word_boundary, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn hash_embedder_is_deterministic_and_unit_length() {
    let e = HashEmbedder::new(64, 2048);
    let texts = vec!["Billing runs monthly".to_string(), "billing runs MONTHLY".to_string()];
    let vs = e.embed_batch(&texts).await.expect("embed");
    assert_eq!(vs.len(), 2);
    assert_eq!(vs[0].len(), 64);
    assert_eq!(vs[0], vs[1], "case does not matter");
    assert!((dot(&vs[0], &vs[0]) - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn shared_words_score_higher() {
    let e = HashEmbedder::new(256, 2048);
    let q = e.embed_one("reset password settings");
    let near = e.embed_one("You can reset your password in settings.");
    let far = e.embed_one("The harbor opens at dawn for fishing boats.");
    assert!(dot(&q, &near) > dot(&q, &far));
}

#[test]
fn normalize_leaves_zero_vector() {
    let mut z = vec![0.0f32; 3];
    l2_normalize(&mut z);
    assert_eq!(z, vec![0.0; 3]);

    let mut v = vec![3.0f32, 4.0];
    l2_normalize(&mut v);
    assert!((v[0] - 0.6).abs() < 1e-6 && (v[1] - 0.8).abs() < 1e-6);
}

#[test]
fn truncation_respects_word_boundaries() {
    assert_eq!(truncate_at_word_boundary("short text", 50), "short text");
    assert_eq!(truncate_at_word_boundary("alpha beta gamma", 8), "alpha");
    assert_eq!(truncate_at_word_boundary("alpha beta gamma", 10), "alpha beta");
    assert_eq!(truncate_at_word_boundary("abcdefghij", 4), "abcd");
}
