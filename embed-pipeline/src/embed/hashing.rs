//! Deterministic offline embedder.
//!
//! Lowercased alphanumeric tokens are hashed with blake3 into `dim` signed
//! buckets and the result is L2-normalized. No model download, no network;
//! texts sharing words land close together under cosine distance.

use crate::embed::{EmbedFuture, Embedder};

#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    /// `dim` of zero is clamped to one.
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = blake3::hash(token.to_lowercase().as_bytes());
            let b = h.as_bytes();
            let bucket = u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
            let sign = if b[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[(bucket % self.dim as u64) as usize] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl Embedder for HashingEmbedder {
    fn embed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(async move { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) })
    }

    fn describe(&self) -> String {
        format!("hashing(dim={})", self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn deterministic_and_normalized() {
        let e = HashingEmbedder::new(64);
        let a = e.embed_text("passage: Hello, World!");
        let b = e.embed_text("passage: Hello, World!");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = HashingEmbedder::new(8).embed_text("  ,, ");
        assert_eq!(v, vec![0.0; 8]);
    }

    #[test]
    fn shared_words_score_higher() {
        let e = HashingEmbedder::new(256);
        let q = e.embed_text("hello world");
        let near = e.embed_text("passage: Hello, World!");
        let far = e.embed_text("completely unrelated sentence about grass");
        assert!(cosine(&q, &near) > cosine(&q, &far));
    }

    #[tokio::test]
    async fn embed_preserves_order_and_length() {
        let e = HashingEmbedder::new(16);
        let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let out = e.embed(&texts).await.unwrap();
        assert_eq!(out.len(), 3);
        for (t, v) in texts.iter().zip(&out) {
            assert_eq!(v, &e.embed_text(t));
        }
        assert!(e.embed(&[]).await.unwrap().is_empty());
    }
}
