//! Token accounting for configuration artifacts.
//!
//! Counts are only meaningful when the tokenizer matches the consuming
//! model's token boundaries, so the tokenizer is a trait object supplied by
//! the caller. [`BpeTokenizer`] is the default.

use crate::error::{HarnessError, Result};
use crate::frontmatter::strip_header_block;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

pub trait Tokenizer: Send + Sync {
    /// Number of tokens in `text`. Called only with non-blank text.
    fn count(&self, text: &str) -> usize;
}

static CL100K: OnceLock<CoreBPE> = OnceLock::new();

/// Byte-pair encoder over the `cl100k_base` vocabulary.
///
/// The vocabulary is loaded once per process and shared by every instance.
#[derive(Clone, Copy)]
pub struct BpeTokenizer {
    bpe: &'static CoreBPE,
}

impl BpeTokenizer {
    pub fn cl100k() -> Result<Self> {
        if let Some(bpe) = CL100K.get() {
            return Ok(Self { bpe });
        }
        let loaded =
            tiktoken_rs::cl100k_base().map_err(|e| HarnessError::Tokenizer(e.to_string()))?;
        Ok(Self {
            bpe: CL100K.get_or_init(|| loaded),
        })
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BpeTokenizer(cl100k_base)")
    }
}

impl Tokenizer for BpeTokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// Tokens in `text`; blank text is always zero.
pub fn count_tokens(tokenizer: &dyn Tokenizer, text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    tokenizer.count(text)
}

/// Tokens in an artifact's content, excluding its leading header block.
pub fn count_artifact_tokens(tokenizer: &dyn Tokenizer, content: &str) -> usize {
    count_tokens(tokenizer, strip_header_block(content).trim())
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTokens {
    pub name: String,
    pub tokens: usize,
    /// Share of the total, rounded to the nearest whole percent.
    pub percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDistribution {
    pub total: usize,
    pub files: Vec<FileTokens>,
}

/// Per-file artifact token counts and each file's share of the total.
pub fn analyze_distribution<'a, I>(tokenizer: &dyn Tokenizer, files: I) -> TokenDistribution
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let counted: Vec<(String, usize)> = files
        .into_iter()
        .map(|(name, content)| (name.to_string(), count_artifact_tokens(tokenizer, content)))
        .collect();
    let total: usize = counted.iter().map(|(_, t)| t).sum();

    let files = counted
        .into_iter()
        .map(|(name, tokens)| {
            let percentage = if total > 0 {
                ((tokens as f64 / total as f64) * 100.0).round() as u32
            } else {
                0
            };
            FileTokens {
                name,
                tokens,
                percentage,
            }
        })
        .collect();

    TokenDistribution { total, files }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
