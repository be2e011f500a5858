
use serde::{Deserialize, Serialize};

use crate::{Result, WikicheckError};

/// Rule for collapsing per-token representations into one vector.
///
/// Fixed for the lifetime of an [`EmbeddingGenerator`](super::EmbeddingGenerator);
/// vectors pooled with different rules are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Pooling {
    /// Representation of the leading summary token (`[CLS]`)
    SummaryToken,
    /// Mean over every token covered by the attention mask
    #[default]
    MeanPool,
}

impl std::fmt::Display for Pooling {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Pooling::SummaryToken => write!(f, "summary-token"),
            Pooling::MeanPool => write!(f, "mean-pool"),
        }
    }
}

/// Last hidden layer of an encoder for a single input, row-major `token_count x hidden_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStates {
    data: Vec<f32>,
    attention_mask: Vec<u32>,
    hidden_size: usize,
}

impl TokenStates {
    pub fn new(data: Vec<f32>, attention_mask: Vec<u32>, hidden_size: usize) -> Result<Self> {
        if hidden_size == 0 || attention_mask.is_empty() {
            return Err(WikicheckError::Inference(
                "encoder produced an empty hidden state".to_string(),
            ));
        }

        if data.len() != attention_mask.len() * hidden_size {
            return Err(WikicheckError::Inference(format!(
                "hidden state of {} values does not match {} tokens x {} dimensions",
                data.len(),
                attention_mask.len(),
                hidden_size
            )));
        }

        Ok(Self {
            data,
            attention_mask,
            hidden_size,
        })
    }

    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[inline]
    pub fn token_count(&self) -> usize {
        self.attention_mask.len()
    }

    #[inline]
    pub fn token(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.hidden_size)?;
        self.data.get(start..start + self.hidden_size)
    }
}

impl Pooling {
    pub fn pool(self, states: &TokenStates) -> Result<Vec<f32>> {
        match self {
            Pooling::SummaryToken => states
                .token(0)
                .map(<[f32]>::to_vec)
                .ok_or_else(|| WikicheckError::Inference("no summary token".to_string())),
            Pooling::MeanPool => {
                let mut pooled = vec![0.0f32; states.hidden_size];
                let mut counted = 0usize;

                for (index, &mask) in states.attention_mask.iter().enumerate() {
                    if mask == 0 {
                        continue;
                    }
                    let Some(token) = states.token(index) else {
                        break;
                    };
                    for (acc, &value) in pooled.iter_mut().zip(token) {
                        *acc += value;
                    }
                    counted += 1;
                }

                if counted == 0 {
                    return Err(WikicheckError::Inference(
                        "attention mask covers no tokens".to_string(),
                    ));
                }

                let n = counted as f32;
                for value in &mut pooled {
                    *value /= n;
                }
                Ok(pooled)
            }
        }
    }
}
