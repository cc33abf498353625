//! Sentence-boundary segmentation for single-block prose documents.

use unicode_segmentation::UnicodeSegmentation;

/// Splits a block of prose into sentences. Implementations must be cheap to
/// call repeatedly; the parser invokes this once per document at most.
pub trait SentenceSegmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// UAX #29 sentence boundaries via the unicode-segmentation crate.
pub struct UnicodeSegmenter;

impl SentenceSegmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
