use crate::config::PreprocessConfig;
use std::collections::HashMap;

pub const STOPWORDS: [&str; 55] = [
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "him", "his", "how", "its", "who", "did", "she", "too", "that",
    "with", "have", "this", "will", "your", "from", "they", "been", "were", "what", "when",
    "where", "which", "there", "their", "them", "then", "than", "into", "some", "such", "only",
    "also", "would", "could", "should", "about", "these", "those",
];

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercases, splits on anything that is not a word character, and drops
/// short tokens and stopwords.
pub fn tokenize(text: &str, config: &PreprocessConfig) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|ch: char| !is_word_char(ch))
        .filter(|token| token.chars().count() >= config.min_token_chars)
        .filter(|token| !is_stopword(token))
        .map(str::to_string)
        .collect()
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Most frequent distinct tokens first; ties keep first-occurrence order.
pub fn extract_keywords(tokens: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for token in tokens {
        let count = counts.entry(token.as_str()).or_insert(0);
        if *count == 0 {
            order.push(token.as_str());
        }
        *count += 1;
    }

    order.sort_by(|left, right| counts[right].cmp(&counts[left]));
    order
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Sentences split on runs of `.`, `!` or `?`, trimmed, empties dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    split_sentence_spans(text)
        .into_iter()
        .map(|(_, sentence)| sentence)
        .collect()
}

/// Like [`split_sentences`], paired with each sentence's byte offset in `text`.
pub fn split_sentence_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = 0;

    for piece in text.split(['.', '!', '?']) {
        let leading = piece.len() - piece.trim_start().len();
        let sentence = piece.trim();
        if !sentence.is_empty() {
            spans.push((start + leading, sentence));
        }
        // Delimiters are single-byte.
        start += piece.len() + 1;
    }

    spans
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        tokenize(text, &PreprocessConfig::default())
    }

    #[test]
    fn tokenizer_drops_short_words_and_stopwords() {
        assert_eq!(
            tokens("The quick-brown fox; it is 42 and THAT was that!"),
            vec!["quick", "brown", "fox"]
        );
    }

    #[test]
    fn tokenizer_handles_empty_and_unicode_input() {
        assert!(tokens("").is_empty());
        assert!(tokens("   ...   ").is_empty());
        assert_eq!(tokens("Café déjà vu"), vec!["café", "déjà"]);
    }

    #[test]
    fn underscores_are_word_characters() {
        assert_eq!(tokens("Quarterly_Report"), vec!["quarterly_report"]);
    }

    #[test]
    fn keywords_are_ordered_by_frequency_then_first_seen() {
        let input = tokens("revenue grew; costs fell; revenue beat costs; revenue again");
        assert_eq!(
            extract_keywords(&input, 3),
            vec!["revenue", "costs", "grew"]
        );
    }

    #[test]
    fn keywords_are_capped_by_limit() {
        let input = tokens("alpha bravo charlie delta echo foxtrot golf hotel india juliet");
        assert_eq!(extract_keywords(&input, 8).len(), 8);
    }

    #[test]
    fn sentences_split_on_terminal_punctuation_runs() {
        assert_eq!(
            split_sentences("First one... Second!? third  .  "),
            vec!["First one", "Second", "third"]
        );
        assert!(split_sentences("  ").is_empty());
    }

    #[test]
    fn sentence_spans_point_into_the_source() {
        let text = "Alpha.  Beta gamma! Delta";
        let spans = split_sentence_spans(text);
        assert_eq!(spans, vec![(0, "Alpha"), (8, "Beta gamma"), (20, "Delta")]);
        for (offset, sentence) in spans {
            assert_eq!(&text[offset..offset + sentence.len()], sentence);
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(normalize_whitespace("A  \t  lot\nof   spacing"), "A lot of spacing");
    }
}
