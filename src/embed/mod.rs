//! Dense text embeddings for the semantic similarity pass.
//!
//! [`TextEmbedder`] is the seam for any sentence encoder. With the
//! `sentence-model` feature, [`load_embedder`] returns a pretrained
//! fastembed model. [`HashingEmbedder`] is a deterministic stand-in for
//! tests and benchmarks; it measures word overlap, not meaning.

#[cfg(feature = "sentence-model")]
pub mod sentence;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use unicode_normalization::UnicodeNormalization;

use crate::error::{SimilarityError, SimilarityResult};

#[cfg(feature = "sentence-model")]
pub use sentence::SentenceEmbedder;

/// Sentence model used when the configuration names none.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Produces one fixed-dimension vector per input text.
pub trait TextEmbedder: Send + Sync {
    /// Embed a batch of texts. Must return exactly one vector per text.
    fn embed(&self, texts: &[&str]) -> SimilarityResult<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;

    /// Largest batch the embedder accepts in one call.
    fn max_batch_size(&self) -> usize {
        256
    }
}

/// Signed feature hashing of word unigrams and bigrams.
///
/// `DefaultHasher` is not stable across Rust releases, so vectors from this
/// embedder must not be persisted.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dimension];
        let words: Vec<&str> = text.split_whitespace().collect();
        for word in &words {
            self.add_feature(&mut out, word, 1.0);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut out, &format!("{} {}", pair[0], pair[1]), 0.5);
        }
        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            out.iter_mut().for_each(|x| *x /= norm);
        }
        out
    }

    fn add_feature(&self, out: &mut [f32], feature: &str, weight: f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let hash = hasher.finish();
        let slot = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        out[slot] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, texts: &[&str]) -> SimilarityResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Load the named sentence model.
#[cfg(feature = "sentence-model")]
pub fn load_embedder(model: &str) -> SimilarityResult<Box<dyn TextEmbedder>> {
    Ok(Box::new(SentenceEmbedder::new(model)?))
}

/// Load the named sentence model. This build has none compiled in.
#[cfg(not(feature = "sentence-model"))]
pub fn load_embedder(model: &str) -> SimilarityResult<Box<dyn TextEmbedder>> {
    Err(SimilarityError::ModelUnavailable {
        model: model.to_string(),
    })
}

/// Embed `texts` in sequential chunks, checking every returned vector.
pub fn embed_batched(
    embedder: &dyn TextEmbedder,
    texts: &[&str],
    batch_size: usize,
) -> SimilarityResult<Vec<Vec<f32>>> {
    let chunk = batch_size.min(embedder.max_batch_size()).max(1);
    let expected_dim = embedder.dimension();
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(chunk) {
        let embedded = embedder.embed(batch)?;
        if embedded.len() != batch.len() {
            return Err(SimilarityError::Embedding {
                expected: batch.len(),
                actual: embedded.len(),
            });
        }
        if let Some(bad) = embedded.iter().find(|v| v.len() != expected_dim) {
            return Err(SimilarityError::DimensionMismatch {
                expected: expected_dim,
                actual: bad.len(),
            });
        }
        vectors.extend(embedded);
    }
    Ok(vectors)
}

/// Normalize verse text for embedding: NFKC, lowercase, footnote markers
/// and punctuation removed, whitespace collapsed.
pub fn normalize_verse_text(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    folded
        .split_whitespace()
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// `1 - arccos(cos) / π`, in `[0, 1]`.
pub fn angular_similarity(a: &[f32], b: &[f32]) -> f64 {
    let cos = f64::from(cosine_similarity(a, b)).clamp(-1.0, 1.0);
    1.0 - cos.acos() / std::f64::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_markup_residue() {
        assert_eq!(
            normalize_verse_text("And it came to pass, that the Lord’s word—was given!"),
            "and it came to pass that the lord s word was given"
        );
        assert_eq!(normalize_verse_text("Nephi's  ﬁrst\u{a0}book"), "nephi's first book");
        assert_eq!(normalize_verse_text("  ... "), "");
    }

    #[test]
    fn hashing_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed(&["in the beginning god created"]).unwrap();
        let b = embedder.embed(&["in the beginning god created"]).unwrap();
        assert_eq!(a, b);
        let norm: f32 = a[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_phrasing_scores_higher() {
        let embedder = HashingEmbedder::default();
        let v = embedder
            .embed(&[
                "i will go and do the things which the lord hath commanded",
                "go and do the things which the lord hath commanded",
                "the vineyard was laid waste by the wild boar",
            ])
            .unwrap();
        let close = angular_similarity(&v[0], &v[1]);
        let far = angular_similarity(&v[0], &v[2]);
        assert!(close > 0.77, "close={close}");
        assert!(far < close);
        assert!((angular_similarity(&v[0], &v[0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_text_embeds_to_zero() {
        let v = HashingEmbedder::new(8).embed(&[""]).unwrap();
        assert!(v[0].iter().all(|x| *x == 0.0));
        assert!((angular_similarity(&v[0], &v[0]) - 0.5).abs() < 1e-9);
    }

    struct ShortEmbedder;

    impl TextEmbedder for ShortEmbedder {
        fn embed(&self, texts: &[&str]) -> SimilarityResult<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![0.0; 4]).collect())
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    #[test]
    fn batching_checks_counts_and_dimensions() {
        let err = embed_batched(&ShortEmbedder, &["a", "b"], 8).unwrap_err();
        assert!(matches!(err, SimilarityError::Embedding { expected: 2, actual: 1 }));

        assert!(embed_batched(&HashingEmbedder::new(4), &["a"], 8).is_ok());

        struct Wrong;
        impl TextEmbedder for Wrong {
            fn embed(&self, texts: &[&str]) -> SimilarityResult<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
            }
            fn dimension(&self) -> usize {
                4
            }
        }
        let err = embed_batched(&Wrong, &["a"], 8).unwrap_err();
        assert!(matches!(err, SimilarityError::DimensionMismatch { expected: 4, actual: 3 }));
    }

    #[cfg(not(feature = "sentence-model"))]
    #[test]
    fn sentence_model_needs_the_feature() {
        let err = load_embedder(DEFAULT_MODEL).err().unwrap();
        assert!(matches!(err, SimilarityError::ModelUnavailable { ref model } if model == DEFAULT_MODEL));
    }

    #[test]
    fn batches_are_chunked() {
        let embedder = HashingEmbedder::new(16);
        let texts: Vec<&str> = vec!["a b", "c d", "e f", "g h", "i j"];
        let all = embed_batched(&embedder, &texts, 2).unwrap();
        assert_eq!(all, embedder.embed(&texts).unwrap());
    }
}
