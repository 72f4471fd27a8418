//! Sentence embeddings from `all-MiniLM-L6-v2` (BERT) running on candle.
//!
//! Weights, config and tokenizer are fetched from the HuggingFace Hub on first
//! load and cached under `HF_HOME`. Output is the attention-masked mean of the
//! last hidden state, L2-normalized, which matches sentence-transformers'
//! `encode` for this model.

use crate::config;
use crate::embedding::{Embedder, EncodingError};
use crate::search::similarity::normalize;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::api::sync::Api;
use std::fmt::Display;
use tokenizers::{Tokenizer, TruncationParams};

fn load_err<E: Display>(stage: &'static str) -> impl Fn(E) -> EncodingError {
    move |e| EncodingError::ModelLoad(format!("{stage}: {e}"))
}

/// BERT sentence encoder. CPU only.
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl MiniLmEmbedder {
    /// Downloads (or reuses the cached copy of) `model_id` and builds the model.
    ///
    /// Blocking and slow on first run.
    pub fn load(model_id: &str) -> Result<Self, EncodingError> {
        let device = Device::Cpu;
        let repo = Api::new()
            .map_err(load_err("hub client"))?
            .model(model_id.to_string());

        let config_path = repo.get("config.json").map_err(load_err("config download"))?;
        let raw = std::fs::read_to_string(config_path).map_err(load_err("config read"))?;
        let bert_config: Config = serde_json::from_str(&raw).map_err(load_err("config parse"))?;

        let weights_path = repo
            .get("model.safetensors")
            .map_err(load_err("weights download"))?;
        // SAFETY: the safetensors file is owned by the hub cache and not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(load_err("weights map"))?
        };
        let model = BertModel::load(vb, &bert_config).map_err(load_err("model build"))?;

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(load_err("tokenizer download"))?;
        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(load_err("tokenizer"))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config::MINILM_MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(load_err("tokenizer truncation"))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension: bert_config.hidden_size,
        })
    }

    fn mean_pooled(&self, ids: &[u32], mask: &[u32]) -> candle_core::Result<Vec<f32>> {
        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let attention = Tensor::new(mask, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        // [1, seq, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention))?;
        let weights = attention.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
        let counts = weights.sum(1)?;
        summed.broadcast_div(&counts)?.squeeze(0)?.to_vec1::<f32>()
    }
}

impl Embedder for MiniLmEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        if text.trim().is_empty() {
            return Err(EncodingError::EmptyInput);
        }
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EncodingError::Inference(e.to_string()))?;
        let mut embedding = self
            .mean_pooled(encoding.get_ids(), encoding.get_attention_mask())
            .map_err(|e| EncodingError::Inference(e.to_string()))?;
        normalize(&mut embedding);
        Ok(embedding)
    }
}
