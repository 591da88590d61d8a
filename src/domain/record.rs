// ============================================================
// Layer 3 — Corpus Record Types
// ============================================================
// One Record is one training/inference example: a sequence of
// time steps, each carrying its own class labels and a nested
// piece of content (a document, a section, a sentence ... down
// to words, depending on how deep the hierarchy is).
//
// Content nests freely in JSON thanks to an untagged enum:
//
//   "a plain string"                       → Segment::Text
//   ["child", "child", ...]                → Segment::Children
//   {"features": [..], "content": ...}     → Segment::Annotated
//
// Plain text is split into children by the segmenter when it
// appears above the level it belongs to, so a whole document
// can be given as one string.
//
// Example line of a .jsonl corpus (hierarchy: step → sentence → word):
//   {"id": "r1", "steps": [
//      {"labels": [2], "content": "Markets fell. Bonds rallied."},
//      {"labels": [0], "content": {"features": [0.5], "content": "Quiet day."}}
//   ]}

use serde::{Deserialize, Serialize};

/// A labelled sequence of time steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Traceability only; echoed back by `predict`.
    #[serde(default)]
    pub id: String,

    pub steps: Vec<Step>,
}

/// One time step of a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Class indices active at this step. One entry for single-label
    /// data; several for multi-hot targets; empty when unlabelled.
    #[serde(default)]
    pub labels: Vec<usize>,

    pub content: Segment,
}

/// A node of the content tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Segment {
    Text(String),
    Children(Vec<Segment>),
    Annotated {
        features: Vec<f32>,
        content:  Box<Segment>,
    },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }

    pub fn annotated(features: Vec<f32>, content: Segment) -> Self {
        Segment::Annotated { features, content: Box::new(content) }
    }

    /// Auxiliary features attached directly to this node, if any.
    pub fn features(&self) -> Option<&[f32]> {
        match self {
            Segment::Annotated { features, .. } => Some(features),
            _ => None,
        }
    }

    /// The node with any annotation peeled off.
    pub fn content(&self) -> &Segment {
        match self {
            Segment::Annotated { content, .. } => content.content(),
            other => other,
        }
    }

    /// All text under this node, joined by spaces. Used to build the
    /// vocabulary.
    pub fn collect_text(&self, out: &mut Vec<String>) {
        match self {
            Segment::Text(t)                 => out.push(t.clone()),
            Segment::Children(children)      => children.iter().for_each(|c| c.collect_text(out)),
            Segment::Annotated { content, .. } => content.collect_text(out),
        }
    }
}

impl Record {
    /// Every text fragment of every step.
    pub fn texts(&self) -> Vec<String> {
        let mut out = Vec::new();
        for step in &self.steps {
            step.content.collect_text(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_segments_parse() {
        let json = r#"{"id": "r1", "steps": [
            {"labels": [2], "content": "Markets fell. Bonds rallied."},
            {"labels": [0, 1], "content": ["one sentence", ["two", "words"]]},
            {"content": {"features": [0.5, 1.0], "content": "Quiet day."}}
        ]}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "r1");
        assert_eq!(record.steps.len(), 3);
        assert_eq!(record.steps[0].content, Segment::text("Markets fell. Bonds rallied."));
        assert!(matches!(record.steps[1].content, Segment::Children(ref c) if c.len() == 2));
        assert!(record.steps[2].labels.is_empty());
        assert_eq!(record.steps[2].content.features(), Some(&[0.5, 1.0][..]));
        assert_eq!(record.steps[2].content.content(), &Segment::text("Quiet day."));
    }

    #[test]
    fn test_texts_walks_whole_tree() {
        let record = Record {
            id:    String::new(),
            steps: vec![Step {
                labels:  vec![0],
                content: Segment::Children(vec![
                    Segment::text("a b"),
                    Segment::annotated(vec![1.0], Segment::text("c")),
                ]),
            }],
        };
        assert_eq!(record.texts(), vec!["a b".to_string(), "c".to_string()]);
    }
}
