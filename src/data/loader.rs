// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads labelled records from JSON-lines files.
//
// The configured path may be:
//   - a single file    → every non-blank line is one Record
//   - a directory      → every *.jsonl file in it, in name order
//   - missing          → empty corpus plus a warning
//
// A line that does not parse fails the whole load with the file
// and line number in the error, so a corrupt corpus is never
// trained on silently.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::record::Record;
use crate::domain::traits::RecordSource;

pub struct JsonlLoader {
    path: PathBuf,
}

impl JsonlLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The .jsonl files this loader will read, sorted by name.
    fn files(&self) -> Result<Vec<PathBuf>> {
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read directory '{}'", self.path.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl RecordSource for JsonlLoader {
    fn load_all(&self) -> Result<Vec<Record>> {
        if !self.path.exists() {
            tracing::warn!(
                "Corpus path '{}' does not exist, returning empty corpus",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for file in self.files()? {
            let loaded = load_single_file(&file)?;
            tracing::debug!("Loaded: {} ({} records)", file.display(), loaded.len());
            records.extend(loaded);
        }

        tracing::info!("Successfully loaded {} records", records.len());
        Ok(records)
    }
}

fn load_single_file(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut record: Record = serde_json::from_str(line)
            .with_context(|| format!("Malformed record at {}:{}", path.display(), line_no + 1))?;

        // Records without an id are named after where they came from
        if record.id.is_empty() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("record");
            record.id = format!("{stem}:{}", line_no + 1);
        }
        records.push(record);
    }
    Ok(records)
}
