//! Review tokenization for both audiences.
//!
//! English-like text segments into lowercased words with a stopword
//! filter. Han runs are shingled into character bigrams, the usual
//! segmenter-free treatment for Chinese review text; a lone ideograph
//! passes through as itself. UAX#29 word segmentation treats every
//! ideograph as its own word, so Han runs are gathered by hand first.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "both", "but", "by", "can", "could", "did", "do", "does",
    "down", "during", "each", "even", "few", "film", "films", "for", "from", "had", "has", "have",
    "he", "her", "here", "him", "his", "how", "if", "in", "into", "is", "it", "its", "just",
    "me", "more", "most", "movie", "movies", "much", "my", "no", "not", "now", "of", "off", "on",
    "once", "one", "only", "or", "other", "our", "out", "over", "own", "really", "same", "she",
    "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "to", "too", "up", "us", "very", "was", "watch", "watched", "we",
    "well", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "would", "you", "your",
];

const CHINESE_STOPWORDS: &[&str] = &[
    "的", "了", "是", "我", "你", "他", "她", "它", "在", "有", "和", "就", "不", "人", "都",
    "一", "也", "很", "但", "还", "这", "那", "个", "们", "与", "被", "对", "让", "电影", "觉得",
    "一个", "没有", "什么", "这个", "这部", "就是", "自己", "我们", "不是", "因为", "所以",
];

static STOPWORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ENGLISH_STOPWORDS
        .iter()
        .chain(CHINESE_STOPWORDS.iter())
        .copied()
        .collect()
});

fn is_han(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}'
    )
}

/// Split one review into feature tokens. Empty output means the review
/// carried no usable signal.
#[must_use]
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfc().collect();
    let mut tokens = Vec::new();
    let mut han_run: Vec<char> = Vec::new();
    let mut other_run = String::new();

    for c in normalized.chars() {
        if is_han(c) {
            flush_other(&mut other_run, &mut tokens);
            han_run.push(c);
        } else {
            flush_han(&mut han_run, &mut tokens);
            other_run.push(c);
        }
    }
    flush_han(&mut han_run, &mut tokens);
    flush_other(&mut other_run, &mut tokens);

    tokens
}

fn flush_han(run: &mut Vec<char>, tokens: &mut Vec<String>) {
    match run.len() {
        0 => return,
        1 => {
            let single = run[0].to_string();
            if !STOPWORDS.contains(single.as_str()) {
                tokens.push(single);
            }
        }
        _ => {
            for pair in run.windows(2) {
                let bigram: String = pair.iter().collect();
                if !STOPWORDS.contains(bigram.as_str()) {
                    tokens.push(bigram);
                }
            }
        }
    }
    run.clear();
}

fn flush_other(buffer: &mut String, tokens: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    for word in buffer.unicode_words() {
        let lower = word.to_lowercase();
        if lower.chars().count() >= 2
            && lower.chars().any(char::is_alphanumeric)
            && !STOPWORDS.contains(lower.as_str())
        {
            tokens.push(lower);
        }
    }
    buffer.clear();
}
