//! Query term extraction for search.

/// Words that carry no meaning for matching.
const STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "how", "i",
    "in", "is", "it", "me", "my", "of", "on", "or", "the", "to", "we", "what", "when", "where",
    "which", "who", "why", "with",
    // Russian
    "а", "в", "во", "вы", "да", "еще", "и", "или", "их", "к", "как", "не", "на", "но", "о",
    "об", "от", "по", "с", "со", "то", "у", "уже", "я",
];

/// Split a free-text query into lowercase search terms.
///
/// Terms are maximal runs of alphanumeric characters, deduplicated in order
/// of first appearance. Stop words are dropped unless the query consists of
/// nothing else, in which case all terms are kept.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    for token in query.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        let token = token.to_lowercase();
        if !all.contains(&token) {
            all.push(token);
        }
    }

    let meaningful: Vec<String> = all
        .iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .cloned()
        .collect();

    if meaningful.is_empty() { all } else { meaningful }
}
