//! Sentence embeddings from a local ONNX model, via fastembed.
//!
//! The model is downloaded to the fastembed cache on first use.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::error::{SimilarityError, SimilarityResult};

use super::TextEmbedder;

/// A pretrained sentence encoder.
pub struct SentenceEmbedder {
    model: Mutex<TextEmbedding>,
    name: String,
    dimension: usize,
}

impl SentenceEmbedder {
    /// Load a model by name, e.g. `"all-MiniLM-L6-v2"` or
    /// `"BAAI/bge-small-en-v1.5"`.
    pub fn new(name: &str) -> SimilarityResult<Self> {
        let (model, dimension) = model_for(name).ok_or_else(|| SimilarityError::UnknownModel {
            model: name.to_string(),
        })?;
        let options = InitOptions::new(model).with_show_download_progress(true);
        let embedding = TextEmbedding::try_new(options).map_err(|e| SimilarityError::Model {
            model: name.to_string(),
            message: e.to_string(),
        })?;
        info!(model = name, dimension, "loaded sentence model");
        Ok(Self {
            model: Mutex::new(embedding),
            name: name.to_string(),
            dimension,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TextEmbedder for SentenceEmbedder {
    fn embed(&self, texts: &[&str]) -> SimilarityResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let failed = |message: String| SimilarityError::Model {
            model: self.name.clone(),
            message,
        };
        let mut model = self
            .model
            .lock()
            .map_err(|_| failed("model lock poisoned".into()))?;
        model
            .embed(texts.to_vec(), Some(self.max_batch_size()))
            .map_err(|e| failed(e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_batch_size(&self) -> usize {
        32
    }
}

/// The fastembed model and output dimension for a model name.
fn model_for(name: &str) -> Option<(EmbeddingModel, usize)> {
    let name = name.rsplit('/').next().unwrap_or(name);
    match name {
        "all-MiniLM-L6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-MiniLM-L12-v2" => Some((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        "bge-large-en-v1.5" => Some((EmbeddingModel::BGELargeENV15, 1024)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::angular_similarity;

    #[test]
    fn model_names_map_with_or_without_owner() {
        assert_eq!(model_for("all-MiniLM-L6-v2").map(|(_, d)| d), Some(384));
        assert_eq!(
            model_for("sentence-transformers/all-MiniLM-L6-v2").map(|(_, d)| d),
            Some(384)
        );
        assert_eq!(model_for("BAAI/bge-base-en-v1.5").map(|(_, d)| d), Some(768));
        assert!(model_for("universal-sentence-encoder").is_none());
    }

    #[test]
    fn unknown_model_fails_before_loading() {
        let err = SentenceEmbedder::new("universal-sentence-encoder").err().unwrap();
        assert!(matches!(err, SimilarityError::UnknownModel { .. }));
    }

    #[test]
    #[ignore = "requires model download"]
    fn paraphrases_score_above_unrelated_text() {
        let embedder = SentenceEmbedder::new("all-MiniLM-L6-v2").unwrap();
        let v = embedder
            .embed(&[
                "ask and it shall be given you seek and ye shall find",
                "whoso requesteth receiveth whoso searcheth discovereth",
                "the tame olive tree waxed old and began to decay",
            ])
            .unwrap();
        assert_eq!(v[0].len(), embedder.dimension());
        assert!(angular_similarity(&v[0], &v[1]) > angular_similarity(&v[0], &v[2]));
    }
}
