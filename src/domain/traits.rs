// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads corpora through RecordSource,
// so a JSON-lines directory, a single file, or an in-memory
// fixture are interchangeable.

use anyhow::Result;

use crate::domain::record::Record;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce labelled records.
///
/// Implementations:
///   - JsonlLoader → reads .jsonl files from a file or directory
///   - Vec<Record> → in-memory corpus (tests, embedding callers)
pub trait RecordSource {
    /// Load all available records from this source.
    fn load_all(&self) -> Result<Vec<Record>>;
}

impl RecordSource for Vec<Record> {
    fn load_all(&self) -> Result<Vec<Record>> {
        Ok(self.clone())
    }
}
