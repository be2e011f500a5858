use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::pooling::TokenStates;
use crate::{Result, WikicheckError};

/// Fixed text run through the encoder once at load time to discover its output width
pub const WARMUP_TEXT: &str = "testtext";

/// A pretrained text encoder producing per-token hidden states
pub trait TokenEncoder: Send + Sync {
    fn name(&self) -> &str;

    /// Width of one token representation
    fn hidden_size(&self) -> usize;

    /// Encode `text`, truncating to the encoder's maximum input length
    fn encode(&self, text: &str) -> Result<TokenStates>;
}

/// ONNX Runtime encoder paired with a HuggingFace tokenizer.
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex and
/// concurrent requests take turns on it.
pub struct OnnxEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    token_type_ids: bool,
    hidden_size: usize,
    model_name: String,
}

impl std::fmt::Debug for OnnxEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEncoder")
            .field("model_name", &self.model_name)
            .field("hidden_size", &self.hidden_size)
            .field("token_type_ids", &self.token_type_ids)
            .finish_non_exhaustive()
    }
}

fn unavailable(path: &Path, reason: impl std::fmt::Display) -> WikicheckError {
    WikicheckError::EncoderUnavailable(format!("{}: {}", path.display(), reason))
}

fn inference(reason: impl std::fmt::Display) -> WikicheckError {
    WikicheckError::Inference(reason.to_string())
}

impl OnnxEncoder {
    /// Load the model and tokenizer named by `config` and run the start-up warm-up
    pub fn load(config: &Config) -> Result<Self> {
        let model_path = config.model_path();
        let tokenizer_path = config.tokenizer_path();

        if !model_path.is_file() {
            return Err(unavailable(&model_path, "model file not found"));
        }
        if !tokenizer_path.is_file() {
            return Err(unavailable(&tokenizer_path, "tokenizer file not found"));
        }

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| unavailable(&tokenizer_path, e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.encoder.max_sequence_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| unavailable(&tokenizer_path, e))?;
        tokenizer.with_padding(None);

        let session = Session::builder()
            .map_err(|e| unavailable(&model_path, e))?
            .with_intra_threads(config.encoder.intra_threads)
            .map_err(|e| unavailable(&model_path, e))?
            .commit_from_file(&model_path)
            .map_err(|e| unavailable(&model_path, e))?;

        let model_name = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-model")
            .to_string();

        let mut encoder = Self {
            session: Mutex::new(session),
            tokenizer,
            token_type_ids: config.encoder.token_type_ids,
            hidden_size: 0,
            model_name,
        };

        let warmup = encoder
            .run(WARMUP_TEXT)
            .map_err(|e| unavailable(&model_path, format!("warm-up inference failed: {e}")))?;
        encoder.hidden_size = warmup.hidden_size();

        info!(
            "Loaded encoder {} (hidden size {}, max {} tokens)",
            encoder.model_name, encoder.hidden_size, config.encoder.max_sequence_length
        );
        Ok(encoder)
    }

    fn run(&self, text: &str) -> Result<TokenStates> {
        let encoding = self.tokenizer.encode(text, true).map_err(inference)?;
        let attention_mask = encoding.get_attention_mask().to_vec();
        let seq_len = encoding.get_ids().len();

        let shape = vec![1i64, seq_len as i64];
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<i64> = attention_mask.iter().map(|&m| i64::from(m)).collect();

        let ids_tensor = Tensor::from_array((shape.clone(), input_ids))
            .map_err(|e| inference(format!("tensor creation error: {e}")))?;
        let mask_tensor = Tensor::from_array((shape.clone(), mask))
            .map_err(|e| inference(format!("tensor creation error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| inference(format!("session lock poisoned: {e}")))?;

        let result = if self.token_type_ids {
            let type_tensor = Tensor::from_array((shape, vec![0i64; seq_len]))
                .map_err(|e| inference(format!("tensor creation error: {e}")))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor
            ])
        };
        let outputs = result.map_err(inference)?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| inference("no output tensor"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| inference(format!("tensor extraction failed: {e}")))?;

        // [batch=1, seq, hidden]
        if shape.len() != 3 || shape[0] != 1 {
            return Err(inference(format!(
                "expected per-token output of shape [1, seq, hidden], got {shape:?}"
            )));
        }
        let tokens = shape[1] as usize;
        let hidden = shape[2] as usize;
        let values = data
            .get(..tokens * hidden)
            .ok_or_else(|| inference("output tensor shorter than its shape"))?
            .to_vec();

        debug!("Encoded {} tokens into {} dimensions", tokens, hidden);
        TokenStates::new(values, attention_mask, hidden)
    }
}

impl TokenEncoder for OnnxEncoder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn encode(&self, text: &str) -> Result<TokenStates> {
        self.run(text)
    }
}
