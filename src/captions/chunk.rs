use std::ops::Range;

use crate::config::CaptionSettings;

fn ends_sentence(word: &str) -> bool {
    word.trim_end_matches(['"', '\'', ')', ']'])
        .ends_with(['.', '!', '?'])
}

/// Group consecutive words into readable caption chunks.
///
/// A chunk closes before a word that would push it past `max_words` or
/// `max_chars` (counting joining spaces), and right after sentence
/// punctuation once it holds `sentence_break_min_words` words. A single word
/// longer than `max_chars` still gets a chunk of its own.
pub fn chunk_words<S: AsRef<str>>(words: &[S], settings: &CaptionSettings) -> Vec<Range<usize>> {
    let max_words = settings.max_words.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut chars = 0usize;

    for (idx, word) in words.iter().enumerate() {
        let word = word.as_ref();
        let count = idx - start;
        let len = word.chars().count();
        if count > 0 && (count + 1 > max_words || chars + 1 + len > settings.max_chars) {
            chunks.push(start..idx);
            start = idx;
            chars = 0;
        }
        chars += if idx == start { len } else { len + 1 };

        if ends_sentence(word) && idx + 1 - start >= settings.sentence_break_min_words {
            chunks.push(start..idx + 1);
            start = idx + 1;
            chars = 0;
        }
    }
    if start < words.len() {
        chunks.push(start..words.len());
    }
    chunks
}
