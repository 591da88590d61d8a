// ============================================================
// Layer 4 — Record → Sample Encoder
// ============================================================
// Walks each record's content tree down the hierarchy and
// writes it into the fixed-size buffers of a HanSample.
//
// Index arithmetic: a level-L node with per-sample index n owns
// children n * sequence_len(L-1) + c, c in 0..sequence_len(L-1).
// At level 0 the index is the word slot in `tokens`.
//
//   - extra children beyond the axis length are dropped
//   - missing children stay as padding (token 0, features 0)
//   - plain text above word level is split by the Segmenter
//   - sentence-level text is tokenised in one go

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::data::{dataset::HanSample, segmenter::Segmenter};
use crate::domain::{
    error::{check, check_len, ConfigError},
    hierarchy::HierarchyShape,
    record::{Record, Segment},
};
use crate::infra::tokenizer_store::{normalise_word, UNK_ID};

pub struct SampleEncoder<'a> {
    shape:        HierarchyShape,
    feature_dims: Vec<usize>,
    num_classes:  usize,
    tokenizer:    &'a Tokenizer,
    segmenter:    Segmenter,
}

impl<'a> SampleEncoder<'a> {
    pub fn new(
        shape:        HierarchyShape,
        feature_dims: Vec<usize>,
        num_classes:  usize,
        tokenizer:    &'a Tokenizer,
    ) -> Result<Self, ConfigError> {
        check_len("input_feature_dims", &feature_dims, shape.num_levels())?;
        check(num_classes > 0, || ConfigError::ZeroValue { name: "num_classes" })?;
        Ok(Self { shape, feature_dims, num_classes, tokenizer, segmenter: Segmenter::new() })
    }

    pub fn encode_all(&self, records: &[Record]) -> Result<Vec<HanSample>> {
        records.iter().map(|r| self.encode(r)).collect()
    }

    pub fn encode(&self, record: &Record) -> Result<HanSample> {
        let mut sample = HanSample::empty(&self.shape, &self.feature_dims, self.num_classes);
        let steps      = self.shape.time_steps();

        if record.steps.len() > steps {
            tracing::warn!(
                "Record '{}' has {} steps, keeping the first {}",
                record.id,
                record.steps.len(),
                steps
            );
        }

        let top = self.shape.top_level();
        for (t, step) in record.steps.iter().take(steps).enumerate() {
            for &label in &step.labels {
                check(label < self.num_classes, || ConfigError::LabelOutOfRange {
                    label,
                    num_classes: self.num_classes,
                })?;
                sample.targets[t * self.num_classes + label] = 1.0;
            }
            self.fill(&step.content, top, t, &mut sample)?;
            sample.steps += 1;
        }
        if sample.steps > 0 && sample.word_count() == 0 {
            tracing::warn!("Record '{}' encodes to padding only", record.id);
        }
        Ok(sample)
    }

    fn fill(&self, node: &Segment, level: usize, index: usize, sample: &mut HanSample) -> Result<()> {
        match node {
            Segment::Annotated { features, content } => {
                self.set_features(level, index, features, sample);
                self.fill(content, level, index, sample)
            }
            Segment::Text(word) if level == 0 => {
                sample.tokens[index] = self.word_id(word)?;
                Ok(())
            }
            Segment::Text(text) if level == 1 => self.fill_words(text, index, sample),
            Segment::Text(text) => {
                let parts: Vec<Segment> = self
                    .segmenter
                    .split_for_level(text, level - 1)
                    .into_iter()
                    .map(Segment::Text)
                    .collect();
                self.fill_children(&parts, level, index, sample)
            }
            Segment::Children(children) if level == 0 => match children.first() {
                Some(first) => self.fill(first, 0, index, sample),
                None        => Ok(()),
            },
            Segment::Children(children) => self.fill_children(children, level, index, sample),
        }
    }

    fn fill_children(
        &self,
        children: &[Segment],
        level:    usize,
        index:    usize,
        sample:   &mut HanSample,
    ) -> Result<()> {
        let child_level = level - 1;
        let seq         = self.shape.sequence_len(child_level);
        if children.len() > seq {
            tracing::debug!(
                "Truncating {} {}s to {}",
                children.len(),
                self.shape.level_name(child_level),
                seq
            );
        }
        for (c, child) in children.iter().take(seq).enumerate() {
            self.fill(child, child_level, index * seq + c, sample)?;
        }
        Ok(())
    }

    fn fill_words(&self, text: &str, index: usize, sample: &mut HanSample) -> Result<()> {
        let seq = self.shape.sequence_len(0);
        for (c, id) in self.tokenize(text)?.into_iter().take(seq).enumerate() {
            sample.tokens[index * seq + c] = id;
        }
        Ok(())
    }

    /// Copy up to dim(level) values; shorter vectors are zero-padded.
    fn set_features(&self, level: usize, index: usize, features: &[f32], sample: &mut HanSample) {
        let dim = self.feature_dims[level];
        if dim == 0 {
            return;
        }
        if features.len() != dim {
            tracing::debug!(
                "{} features have {} values, expected {}",
                self.shape.level_name(level),
                features.len(),
                dim
            );
        }
        let slot = &mut sample.features[level][index * dim..(index + 1) * dim];
        for (dst, src) in slot.iter_mut().zip(features) {
            *dst = *src;
        }
    }

    fn word_id(&self, word: &str) -> Result<u32> {
        Ok(self.tokenize(word)?.first().copied().unwrap_or(UNK_ID))
    }

    fn tokenize(&self, text: &str) -> Result<Vec<u32>> {
        let words: Vec<String> = self
            .segmenter
            .words(text)
            .iter()
            .filter_map(|w| normalise_word(w))
            .collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let cleaned = words.join(" ");
        let enc     = self
            .tokenizer
            .encode(cleaned.as_str(), false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }
}
