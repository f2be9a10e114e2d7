//! Small text helpers shared by the pipeline stages.

use std::collections::HashSet;

/// Lower-cased whitespace tokens as a set.
pub fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Jaccard similarity of two token sets (0.0 when both are empty).
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

/// Jaccard similarity of two texts over lower-cased whitespace tokens.
pub fn text_jaccard(a: &str, b: &str) -> f32 {
    jaccard(&token_set(a), &token_set(b))
}

/// Whether `text` (already lower-cased) contains any of the phrases.
pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

/// Upper-case the first letter of each word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const TITLES: &[&str] = &["dr.", "dr", "mr.", "mr", "ms.", "ms", "mrs.", "mrs"];
const PRONOUNS: &[&str] = &[
    "i", "i'll", "i'm", "i've", "me", "myself", "we", "we'll", "we're", "us", "you", "you'll",
    "they", "they'll", "them", "he", "she", "someone", "somebody",
];

/// Whether the word is a pronoun standing in for a person.
pub fn is_pronoun(word: &str) -> bool {
    PRONOUNS.contains(&word.trim().to_lowercase().as_str())
}

/// Normalize a person name: strip honorifics and punctuation, title-case.
///
/// Returns `None` for empty names and bare pronouns, which callers resolve
/// against the speaker.
pub fn clean_person_name(name: &str) -> Option<String> {
    let words: Vec<&str> = name
        .split_whitespace()
        .filter(|w| !TITLES.contains(&w.to_lowercase().as_str()))
        .collect();
    let joined = words
        .join(" ")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string();

    if joined.is_empty() || is_pronoun(&joined) || joined.eq_ignore_ascii_case("unclear") {
        return None;
    }
    Some(title_case(&joined))
}

/// Similarity ratio in [0, 1] based on the longest common subsequence of
/// characters: `2 * lcs / (len(a) + len(b))`.
pub fn char_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        prev = row;
    }

    2.0 * prev[b.len()] as f32 / (a.len() + b.len()) as f32
}
