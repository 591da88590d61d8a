// ============================================================
// Layer 4 — Text Segmenter
// ============================================================
// Cleans raw text and splits it into the children of the next
// level down when a record gives plain text above word level:
//
//   section / document text → paragraphs (blank-line separated)
//   sentence-level parent   → sentences  (. ! ? then whitespace)
//   sentence text           → words      (whitespace)
//
// Cleaning (applied before any split):
//   1. Unicode whitespace variants and control chars → space
//   2. \r → \n
//   3. Runs of spaces collapsed, lines trimmed
//   4. More than one blank line collapsed to one
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Segmenter;

impl Segmenter {
    pub fn new() -> Self {
        Self
    }

    /// Normalise whitespace and strip control characters. Paragraph
    /// breaks (one blank line) survive.
    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                '\r' => '\n',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        let lines: Vec<String> = normalised
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();

        let mut out        = String::with_capacity(normalised.len());
        let mut blank_run  = 0usize;
        for line in &lines {
            if line.is_empty() {
                blank_run += 1;
                continue;
            }
            if !out.is_empty() {
                out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
            }
            out.push_str(line);
            blank_run = 0;
        }
        out
    }

    /// Blank-line separated blocks, each flattened to one line.
    pub fn paragraphs(&self, text: &str) -> Vec<String> {
        self.clean(text)
            .split("\n\n")
            .map(|p| p.replace('\n', " "))
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Sentences end at '.', '!' or '?' followed by whitespace or the end
    /// of the text. The terminator stays with its sentence.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        let flat      = self.clean(text).replace('\n', " ");
        let mut out   = Vec::new();
        let mut start = 0usize;
        let mut chars = flat.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if matches!(c, '.' | '!' | '?') {
                let at_boundary = match chars.peek() {
                    Some((_, next)) => next.is_whitespace(),
                    None            => true,
                };
                if at_boundary {
                    let end      = i + c.len_utf8();
                    let sentence = flat[start..end].trim();
                    if !sentence.is_empty() {
                        out.push(sentence.to_string());
                    }
                    start = end;
                }
            }
        }
        let tail = flat[start..].trim();
        if !tail.is_empty() {
            out.push(tail.to_string());
        }
        out
    }

    pub fn words(&self, text: &str) -> Vec<String> {
        self.clean(text).split_whitespace().map(str::to_string).collect()
    }

    /// Split `text` into the children it has at `child_level`
    /// (0 = words, 1 = sentences, 2+ = paragraphs).
    pub fn split_for_level(&self, text: &str, child_level: usize) -> Vec<String> {
        match child_level {
            0 => self.words(text),
            1 => self.sentences(text),
            _ => self.paragraphs(text),
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_whitespace_and_controls() {
        let s = Segmenter::new();
        assert_eq!(s.clean("  hello \t  world\x01again  "), "hello world again");
        assert_eq!(s.clean(""), "");
    }

    #[test]
    fn test_clean_keeps_single_paragraph_break() {
        let s = Segmenter::new();
        assert_eq!(s.clean("one\r\n\r\n\r\n\ntwo\nthree"), "one\n\ntwo\nthree");
    }

    #[test]
    fn test_sentences() {
        let s = Segmenter::new();
        assert_eq!(
            s.sentences("Rates rose 0.5 points. Stocks fell!  Why?  Unclear"),
            vec!["Rates rose 0.5 points.", "Stocks fell!", "Why?", "Unclear"]
        );
        assert!(s.sentences("   ").is_empty());
    }

    #[test]
    fn test_paragraphs() {
        let s = Segmenter::new();
        assert_eq!(
            s.paragraphs("First part.\nStill first.\n\n\nSecond part."),
            vec!["First part. Still first.", "Second part."]
        );
    }

    #[test]
    fn test_split_for_level_dispatch() {
        let s = Segmenter::new();
        assert_eq!(s.split_for_level("a b. c", 0), vec!["a", "b.", "c"]);
        assert_eq!(s.split_for_level("a b. c", 1), vec!["a b.", "c"]);
        assert_eq!(s.split_for_level("a b.\n\nc", 2), vec!["a b.", "c"]);
    }
}
