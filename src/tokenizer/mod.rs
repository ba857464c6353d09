//! Sub-word token counting for cost estimation
//!
//! Counts come from a BPE encoding via `tiktoken-rs`. When encoding fails
//! both texts fall back to whitespace word counts, so the two numbers handed
//! back to callers are always produced by the same method.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tiktoken_rs::CoreBPE;
use tracing::warn;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Failed to load {encoding} encoding: {reason}")]
    Load {
        encoding: TokenEncoding,
        reason: String,
    },

    #[error("Text contains disallowed special token {0}")]
    DisallowedSpecial(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

/// BPE encodings available for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEncoding {
    /// GPT-4 / GPT-3.5 encoding
    #[default]
    Cl100kBase,
    /// Codex encoding
    P50kBase,
    /// GPT-3 encoding
    R50kBase,
}

impl TokenEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenEncoding::Cl100kBase => "cl100k_base",
            TokenEncoding::P50kBase => "p50k_base",
            TokenEncoding::R50kBase => "r50k_base",
        }
    }

    /// Special tokens the encoding refuses to see in plain text
    pub fn special_tokens(&self) -> &'static [&'static str] {
        match self {
            TokenEncoding::Cl100kBase => &[
                "<|endoftext|>",
                "<|fim_prefix|>",
                "<|fim_middle|>",
                "<|fim_suffix|>",
                "<|endofprompt|>",
            ],
            TokenEncoding::P50kBase | TokenEncoding::R50kBase => &["<|endoftext|>"],
        }
    }
}

impl fmt::Display for TokenEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenEncoding {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k_base" | "cl100k" => Ok(TokenEncoding::Cl100kBase),
            "p50k_base" | "p50k" => Ok(TokenEncoding::P50kBase),
            "r50k_base" | "r50k" | "gpt2" => Ok(TokenEncoding::R50kBase),
            _ => Err(TokenizerError::UnknownEncoding(s.to_string())),
        }
    }
}

/// Turns text into sub-word token ids
pub trait SubwordTokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<usize>, TokenizerError>;

    fn name(&self) -> &str;
}

/// `tiktoken-rs` backed tokenizer
pub struct TiktokenTokenizer {
    encoding: TokenEncoding,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn new(encoding: TokenEncoding) -> Result<Self, TokenizerError> {
        let loaded = match encoding {
            TokenEncoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            TokenEncoding::P50kBase => tiktoken_rs::p50k_base(),
            TokenEncoding::R50kBase => tiktoken_rs::r50k_base(),
        };
        let bpe = loaded.map_err(|e| TokenizerError::Load {
            encoding,
            reason: e.to_string(),
        })?;

        Ok(Self { encoding, bpe })
    }

    pub fn encoding(&self) -> TokenEncoding {
        self.encoding
    }
}

impl SubwordTokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<usize>, TokenizerError> {
        if let Some(special) = self
            .encoding
            .special_tokens()
            .iter()
            .find(|special| text.contains(**special))
        {
            return Err(TokenizerError::DisallowedSpecial(special.to_string()));
        }

        Ok(self.bpe.encode_ordinary(text))
    }

    fn name(&self) -> &str {
        self.encoding.as_str()
    }
}

impl fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Which method produced a pair of counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMethod {
    Subword,
    WhitespaceFallback,
}

/// Token counts for an original text and its optimized form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub original: usize,
    pub optimized: usize,
    pub method: CountingMethod,
}

/// Number of whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Counts both texts with `tokenizer`, or both with `count_words` if either
/// encoding fails.
pub fn count_pair(tokenizer: &dyn SubwordTokenizer, original: &str, optimized: &str) -> TokenCounts {
    let encoded = tokenizer
        .encode(original)
        .and_then(|orig| tokenizer.encode(optimized).map(|opt| (orig.len(), opt.len())));

    match encoded {
        Ok((original, optimized)) => TokenCounts {
            original,
            optimized,
            method: CountingMethod::Subword,
        },
        Err(e) => {
            warn!(
                "{} tokenizer failed ({}), counting whitespace words instead",
                tokenizer.name(),
                e
            );
            TokenCounts {
                original: count_words(original),
                optimized: count_words(optimized),
                method: CountingMethod::WhitespaceFallback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenTokenizer;

    impl SubwordTokenizer for BrokenTokenizer {
        fn encode(&self, _text: &str) -> Result<Vec<usize>, TokenizerError> {
            Err(TokenizerError::Encode("broken".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!(
            "cl100k_base".parse::<TokenEncoding>().unwrap(),
            TokenEncoding::Cl100kBase
        );
        assert_eq!("P50K".parse::<TokenEncoding>().unwrap(), TokenEncoding::P50kBase);
        assert!("o9000k".parse::<TokenEncoding>().is_err());
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  one two\tthree\n"), 3);
    }

    #[test]
    fn test_tiktoken_counts() {
        let tokenizer = TiktokenTokenizer::new(TokenEncoding::Cl100kBase).unwrap();
        assert!(tokenizer.encode("").unwrap().is_empty());

        let tokens = tokenizer.encode("Hello, world!").unwrap();
        assert!(!tokens.is_empty());
        assert!(tokens.len() < "Hello, world!".len());
    }

    #[test]
    fn test_special_token_is_rejected() {
        let tokenizer = TiktokenTokenizer::new(TokenEncoding::Cl100kBase).unwrap();
        let err = tokenizer.encode("stop <|endoftext|> here").unwrap_err();
        assert!(matches!(err, TokenizerError::DisallowedSpecial(_)));
    }

    #[test]
    fn test_count_pair_subword() {
        let tokenizer = TiktokenTokenizer::new(TokenEncoding::Cl100kBase).unwrap();
        let counts = count_pair(&tokenizer, "a much longer original sentence", "short");
        assert_eq!(counts.method, CountingMethod::Subword);
        assert!(counts.original > counts.optimized);
    }

    #[test]
    fn test_count_pair_fallback() {
        let counts = count_pair(&BrokenTokenizer, "one two three four", "one two");
        assert_eq!(
            counts,
            TokenCounts {
                original: 4,
                optimized: 2,
                method: CountingMethod::WhitespaceFallback,
            }
        );
    }

    #[test]
    fn test_fallback_when_only_original_fails() {
        let tokenizer = TiktokenTokenizer::new(TokenEncoding::Cl100kBase).unwrap();
        let counts = count_pair(&tokenizer, "<|endoftext|> tail words", "tail words");
        assert_eq!(counts.method, CountingMethod::WhitespaceFallback);
        assert_eq!(counts.original, 3);
        assert_eq!(counts.optimized, 2);
    }
}
