// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves and reloads the word-level vocabulary that maps
// words to embedding rows.
//
// The vocabulary is written straight into a HuggingFace
// tokenizer JSON (WordLevel model, whitespace pre-tokenizer)
// and loaded back with Tokenizer::from_file, which sidesteps
// the trainer/ModelWrapper type juggling of the tokenizers
// training API.
//
// Ids: [PAD] = 0 (also the padding token of every sample),
//      [UNK] = 1, corpus words from 2 in descending frequency.
// The vocabulary never exceeds `vocab_size`, which is the
// embedding table's row count. A saved tokenizer larger than
// the requested size is refused rather than reused.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokenizers::Tokenizer;

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const UNK_ID:    u32  = 1;

/// Lowercase and strip punctuation from both ends; None when nothing
/// alphanumeric is left.
pub fn normalise_word(word: &str) -> Option<String> {
    let w = word.to_lowercase();
    let w = w.trim_matches(|c: char| !c.is_alphanumeric());
    (!w.is_empty()).then(|| w.to_string())
}

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from disk");
            let tokenizer = self.load()?;
            let saved     = tokenizer.get_vocab_size(true);
            anyhow::ensure!(
                saved <= vocab_size,
                "Tokenizer in '{}' has {} entries but vocab_size is {}; \
                 use a fresh checkpoint directory or a vocab_size of at least {}",
                self.dir.display(),
                saved,
                vocab_size,
                saved
            );
            Ok(tokenizer)
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        anyhow::ensure!(vocab_size > 2, "vocab_size must leave room for [PAD] and [UNK]");
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count word frequencies ────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in text.split_whitespace().filter_map(normalise_word) {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so rebuilds are stable
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size - 2);

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        vocab.insert(PAD_TOKEN.to_string(), serde_json::json!(0));
        vocab.insert(UNK_TOKEN.to_string(), serde_json::json!(UNK_ID));
        for (next_id, (word, _)) in (UNK_ID as usize + 1..).zip(&words) {
            vocab.insert(word.clone(), serde_json::json!(next_id));
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "WhitespaceSplit"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON to '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} words, saved to '{}'",
            words.len() + 2,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path).map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> TokenizerStore {
        let dir = std::env::temp_dir().join(format!("han_tok_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        TokenizerStore::new(dir.to_string_lossy().to_string())
    }

    #[test]
    fn test_normalise_word() {
        assert_eq!(normalise_word("Hello,"), Some("hello".to_string()));
        assert_eq!(normalise_word("--"), None);
        assert_eq!(normalise_word("(x2)"), Some("x2".to_string()));
    }

    #[test]
    fn test_vocab_respects_size_and_frequency() {
        let store = temp_store("vocab");
        let texts = vec!["b a a c a b".to_string()];
        let tok   = store.load_or_build(&texts, 4).unwrap();

        assert_eq!(tok.token_to_id(PAD_TOKEN), Some(0));
        assert_eq!(tok.token_to_id(UNK_TOKEN), Some(UNK_ID));
        assert_eq!(tok.token_to_id("a"), Some(2));
        assert_eq!(tok.token_to_id("b"), Some(3));
        // capped at 4 entries: "c" did not make it
        assert_eq!(tok.token_to_id("c"), None);
        assert!(tok.get_vocab_size(true) <= 4);
    }

    #[test]
    fn test_reload_reuses_saved_vocab() {
        let store = temp_store("reload");
        store.load_or_build(&["x y".to_string()], 10).unwrap();
        // a different corpus does not rebuild once the file exists
        let tok = store.load_or_build(&["z".to_string()], 10).unwrap();
        assert!(tok.token_to_id("x").is_some());
        assert!(tok.token_to_id("z").is_none());
    }

    #[test]
    fn test_saved_vocab_larger_than_requested_is_refused() {
        let store = temp_store("shrink");
        let texts = vec!["one two three four five six seven eight".to_string()];
        let tok   = store.load_or_build(&texts, 100).unwrap();
        assert_eq!(tok.get_vocab_size(true), 10);

        let err = store.load_or_build(&texts, 5).unwrap_err();
        assert!(err.to_string().contains("vocab_size is 5"), "{err}");

        // same or larger size keeps every id inside the embedding table
        let tok    = store.load_or_build(&texts, 10).unwrap();
        let max_id = tok.get_vocab(true).values().copied().max().unwrap();
        assert!((max_id as usize) < 10);
    }
}
