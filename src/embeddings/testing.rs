use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embeddings::encoder::TokenEncoder;
use crate::embeddings::pooling::TokenStates;
use crate::{Result, WikicheckError};

/// Deterministic stand-in for a pretrained encoder: a leading summary token
/// hashed from the kept words, then one token per word.
pub(crate) struct HashEncoder {
    pub hidden_size: usize,
    pub max_tokens: usize,
    pub fail_after: Option<usize>,
    pub calls: Arc<AtomicUsize>,
}

impl HashEncoder {
    pub(crate) fn new(hidden_size: usize) -> Self {
        Self {
            hidden_size,
            max_tokens: 16,
            fail_after: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn token_vector(&self, word: &str) -> Vec<f32> {
        let mut h: u32 = 0x811c_9dc5;
        for b in word.to_lowercase().as_bytes() {
            h ^= u32::from(*b);
            h = h.wrapping_mul(0x0100_0193);
        }
        (0..self.hidden_size)
            .map(|i| {
                let mixed = h.rotate_left(i as u32 % 32) ^ (i as u32).wrapping_mul(0x9e37_79b9);
                (mixed % 2000) as f32 / 1000.0 - 1.0
            })
            .collect()
    }
}

impl TokenEncoder for HashEncoder {
    fn name(&self) -> &str {
        "hash-encoder"
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn encode(&self, text: &str) -> Result<TokenStates> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| call >= limit) {
            return Err(WikicheckError::Inference("encoder offline".to_string()));
        }

        let words: Vec<&str> = text
            .split_whitespace()
            .take(self.max_tokens.saturating_sub(1))
            .collect();

        let mut data = self.token_vector(&words.join(" "));
        for word in &words {
            data.extend(self.token_vector(word));
        }

        TokenStates::new(data, vec![1; words.len() + 1], self.hidden_size)
    }
}

/// Encoder whose advertised hidden size disagrees with what it actually emits
pub(crate) struct LyingEncoder;

impl TokenEncoder for LyingEncoder {
    fn name(&self) -> &str {
        "lying-encoder"
    }

    fn hidden_size(&self) -> usize {
        8
    }

    fn encode(&self, _text: &str) -> Result<TokenStates> {
        TokenStates::new(vec![0.5; 4], vec![1], 4)
    }
}
