// ============================================================
// Layer 6 — Embedding Store
// ============================================================
// Reads pre-trained word vectors from a whitespace-separated text
// file (GloVe / word2vec text format):
//
//   word v1 v2 ... vd
//
// and lays them out as an EmbeddingMatrix whose row i belongs to
// tokenizer id i.
//
//   - a leading "count dim" header line is skipped
//   - words are normalised the same way as the vocabulary
//   - rows with no vector get uniform noise in [-0.05, 0.05]
//   - row 0 ([PAD]) is always zero
//   - lines with the wrong number of values are skipped

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{fs, path::Path};
use tokenizers::Tokenizer;

use crate::domain::embedding::EmbeddingMatrix;
use crate::infra::tokenizer_store::normalise_word;

const INIT_RANGE: f32 = 0.05;

/// Build a `rows × dim` matrix for `tokenizer` from the vectors in `path`.
pub fn load_embeddings(
    path:      &Path,
    tokenizer: &Tokenizer,
    rows:      usize,
    dim:       usize,
    seed:      u64,
) -> Result<EmbeddingMatrix> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read embedding file '{}'", path.display()))?;

    let mut rng    = StdRng::seed_from_u64(seed);
    let mut values = Vec::with_capacity(rows * dim);
    for _ in 0..rows * dim {
        values.push(rng.gen_range(-INIT_RANGE..=INIT_RANGE));
    }

    let vocab       = tokenizer.get_vocab(true);
    let mut found   = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else { continue };
        let vector = match parts.map(str::parse::<f32>).collect::<Result<Vec<f32>, _>>() {
            Ok(v)  => v,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        if vector.len() != dim {
            // word2vec header: "<count> <dim>"
            if line_no == 0 && vector.len() == 1 {
                continue;
            }
            skipped += 1;
            continue;
        }

        let Some(key) = normalise_word(word) else { continue };
        let Some(&id) = vocab.get(&key) else { continue };
        let id = id as usize;
        if id == 0 || id >= rows {
            continue;
        }
        values[id * dim..(id + 1) * dim].copy_from_slice(&vector);
        found += 1;
    }

    values[..dim].iter_mut().for_each(|v| *v = 0.0);

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed lines in '{}'", skipped, path.display());
    }
    tracing::info!(
        "Pre-trained vectors found for {}/{} vocabulary rows",
        found,
        rows.saturating_sub(1)
    );

    Ok(EmbeddingMatrix::new(rows, dim, values)?)
}
