//! Paragraph- and sentence-aware segmentation into synthesis chunks.
//!
//! Paragraphs that fit the character budget go through untouched. Longer
//! paragraphs are cut into sentences by a [`SentenceBoundary`] strategy and
//! greedily packed back together, never splitting a sentence. Packing does not
//! backtrack, so the chunk count is not globally minimal, but no emitted chunk
//! could be merged with its successor without breaking the budget.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use crate::error::{Result, VoxcastError};
use regex::Regex;
use std::sync::LazyLock;

/// One unit of text submitted to the speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the document, starting at 0.
    pub index: usize,
    /// Trimmed, non-empty text.
    pub text: String,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Strategy that cuts a paragraph into sentences.
///
/// Implementations return slices of `paragraph` in document order. They may
/// return untrimmed or empty pieces; the segmenter cleans them up.
pub trait SentenceBoundary: Send + Sync {
    fn split<'a>(&self, paragraph: &'a str) -> Vec<&'a str>;
}

// SAFETY: hardcoded patterns — always valid
#[allow(clippy::expect_used)]
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("hardcoded paragraph pattern"));

#[allow(clippy::expect_used)]
static SPANISH_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?¡¿](\s+)[A-ZÁÉÍÓÚÑÜ0-9]").expect("hardcoded sentence pattern")
});

#[allow(clippy::expect_used)]
static UNICODE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[.!?¡¿](\s+)[\p{Lu}\p{Nd}]").expect("hardcoded sentence pattern")
});

/// Heuristic boundary: whitespace after terminal punctuation (`. ! ? ¡ ¿`)
/// that is followed by an uppercase letter or a digit.
///
/// Abbreviations followed by a capitalised word ("Sr. García") are split, and
/// punctuation followed by lowercase is not. That is accepted: this is not a
/// linguistic tokenizer.
#[derive(Debug, Clone)]
pub struct PunctuationBoundary {
    pattern: &'static Regex,
}

impl PunctuationBoundary {
    /// Uppercase class limited to `A-Z` plus Spanish accented capitals.
    pub fn new() -> Self {
        Self {
            pattern: &SPANISH_BOUNDARY,
        }
    }

    /// Uppercase class widened to every Unicode uppercase letter.
    pub fn unicode() -> Self {
        Self {
            pattern: &UNICODE_BOUNDARY,
        }
    }
}

impl Default for PunctuationBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceBoundary for PunctuationBoundary {
    fn split<'a>(&self, paragraph: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for caps in self.pattern.captures_iter(paragraph) {
            if let Some(gap) = caps.get(1) {
                sentences.push(&paragraph[start..gap.start()]);
                start = gap.end();
            }
        }
        sentences.push(&paragraph[start..]);

        sentences
    }
}

/// Splits normalized text into ordered, budget-respecting chunks.
pub struct Segmenter {
    max_chars: usize,
    boundary: Box<dyn SentenceBoundary>,
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter")
            .field("max_chars", &self.max_chars)
            .finish_non_exhaustive()
    }
}

impl Segmenter {
    /// Create a segmenter with the default [`PunctuationBoundary`].
    ///
    /// Returns an error if `max_chars` is zero.
    pub fn new(max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(VoxcastError::ConfigInvalidValue {
                key: "segmentation.max_chars".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(Self {
            max_chars,
            boundary: Box::new(PunctuationBoundary::new()),
        })
    }

    /// Swap in another sentence boundary strategy.
    pub fn with_boundary(mut self, boundary: impl SentenceBoundary + 'static) -> Self {
        self.boundary = Box::new(boundary);
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Segment `text` into chunks.
    ///
    /// Never returns an empty list for text that contains anything besides
    /// whitespace.
    pub fn segment(&self, text: &str) -> Vec<Chunk> {
        let mut pieces: Vec<String> = Vec::new();

        for paragraph in PARAGRAPH_BREAK.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if char_len(paragraph) <= self.max_chars {
                pieces.push(paragraph.to_string());
                continue;
            }

            self.pack_sentences(paragraph, &mut pieces);
        }

        if pieces.is_empty() && !text.trim().is_empty() {
            pieces.push(text.trim().to_string());
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }

    /// Greedy packing of one over-budget paragraph.
    fn pack_sentences(&self, paragraph: &str, out: &mut Vec<String>) {
        let sentences = self
            .boundary
            .split(paragraph)
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut current = String::new();
        let mut current_len = 0;

        for sentence in sentences {
            let sentence_len = char_len(sentence);

            if current.is_empty() {
                current.push_str(sentence);
                current_len = sentence_len;
                continue;
            }

            let tentative_len = current_len + 1 + sentence_len;
            if tentative_len > self.max_chars {
                out.push(std::mem::take(&mut current));
                current.push_str(sentence);
                current_len = sentence_len;
            } else {
                current.push(' ');
                current.push_str(sentence);
                current_len = tentative_len;
            }
        }

        if !current.is_empty() {
            out.push(current);
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
