use crate::tokens::Tokenizer;

/// Counts whitespace-separated words, so expected totals are easy to read off
/// fixture text.
pub(crate) struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
