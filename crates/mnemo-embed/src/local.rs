//! Local embeddings using ONNX Runtime.
//!
//! Runs a sentence-transformer ONNX export (MiniLM-class) with mean pooling
//! over the attention mask and L2 normalization, matching the vectors the
//! model produces in its reference implementation. Requires the
//! `local-embeddings` feature.

use std::path::Path;

use async_trait::async_trait;
use ndarray::Array2;
use ort::{GraphOptimizationLevel, Session};
use tokenizers::Tokenizer;
use tracing::info;

use crate::error::{EmbedError, Result};
use crate::{Embedder, normalize};

/// Inference batch size; keeps peak memory bounded on large index runs.
const BATCH_CHUNK: usize = 32;

/// Embedder backed by a local ONNX model.
pub struct LocalEmbedder {
    session: Session,
    tokenizer: Tokenizer,
    dimensions: usize,
    model_name: String,
}

impl LocalEmbedder {
    /// Load the model and tokenizer from disk.
    ///
    /// Loading is CPU-heavy and can take seconds; callers run it on a
    /// blocking task and flip the service's model-loaded flag afterwards.
    pub fn load(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        dimensions: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        let session = Session::builder()
            .map_err(|e| EmbedError::Model(format!("session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| EmbedError::Model(format!("optimization level: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| EmbedError::Model(format!("load {}: {e}", model_path.display())))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path.as_ref()).map_err(|e| {
            EmbedError::Tokenizer(format!("load {}: {e}", tokenizer_path.as_ref().display()))
        })?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "local".to_string());

        info!(model = %model_name, dimensions, "loaded local embedding model");

        Ok(Self {
            session,
            tokenizer,
            dimensions,
            model_name,
        })
    }

    /// Tokenize, pad, and run one inference batch.
    fn run_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(*text, true)
                    .map_err(|e| EmbedError::Tokenizer(format!("encode: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = encodings.len();
        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        let mut input_ids = vec![0i64; batch * max_len];
        let mut attention_mask = vec![0i64; batch * max_len];
        let mut token_type_ids = vec![0i64; batch * max_len];

        for (row, enc) in encodings.iter().enumerate() {
            let offset = row * max_len;
            for (col, ((&id, &mask), &ty)) in enc
                .get_ids()
                .iter()
                .zip(enc.get_attention_mask())
                .zip(enc.get_type_ids())
                .enumerate()
            {
                input_ids[offset + col] = id as i64;
                attention_mask[offset + col] = mask as i64;
                token_type_ids[offset + col] = ty as i64;
            }
        }

        let shape = (batch, max_len);
        let ids_array = Array2::from_shape_vec(shape, input_ids)
            .map_err(|e| EmbedError::Model(format!("input shape: {e}")))?;
        let mask_array = Array2::from_shape_vec(shape, attention_mask.clone())
            .map_err(|e| EmbedError::Model(format!("input shape: {e}")))?;
        let type_array = Array2::from_shape_vec(shape, token_type_ids)
            .map_err(|e| EmbedError::Model(format!("input shape: {e}")))?;

        let outputs = self
            .session
            .run(
                ort::inputs![
                    "input_ids" => ids_array.view(),
                    "attention_mask" => mask_array.view(),
                    "token_type_ids" => type_array.view(),
                ]
                .map_err(|e| EmbedError::Model(format!("inputs: {e}")))?,
            )
            .map_err(|e| EmbedError::Model(format!("inference: {e}")))?;

        let hidden = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedError::Model(format!("output: {e}")))?;
        let hidden = hidden.view().to_owned();

        // hidden is (batch, seq_len, hidden_dim); mean-pool over real tokens.
        let dims = hidden.shape();
        let (seq_len, hidden_dim) = (dims[1], dims[2]);

        let mut results = Vec::with_capacity(batch);
        for row in 0..batch {
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut tokens = 0.0f32;
            for col in 0..seq_len {
                if attention_mask[row * max_len + col] == 0 {
                    continue;
                }
                for (k, slot) in pooled.iter_mut().enumerate() {
                    *slot += hidden[[row, col, k]];
                }
                tokens += 1.0;
            }
            if tokens > 0.0 {
                for slot in pooled.iter_mut() {
                    *slot /= tokens;
                }
            }
            normalize(&mut pooled);
            results.push(pooled);
        }

        Ok(results)
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Model("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_CHUNK) {
            all.extend(self.run_batch(chunk)?);
        }
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
