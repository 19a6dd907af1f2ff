//! Query expansion: light stemming plus a synonym table for the HR and
//! payroll vocabulary the knowledge base is mostly asked about.

use crate::terms::search_terms;

/// Stems shorter than this are matched exactly rather than by prefix.
const MIN_STEM_CHARS: usize = 4;

/// Inflectional endings, longest first.
const SUFFIXES: &[&str] = &[
    // Russian
    "ается", "яется", "ется", "ого", "его", "ому", "ему", "ыми", "ими", "ить", "ать", "ять",
    "ая", "яя", "ую", "юю", "ой", "ей", "ый", "ий", "ые", "ие", "ых", "их", "ом", "ем", "ам",
    "ям", "ах", "ях", "ов", "ев", "ы", "и", "а", "я", "у", "ю", "е", "о", "ь",
    // English
    "ing", "ed", "es", "s",
];

/// Groups of interchangeable words and phrases.
const SYNONYMS: &[&[&str]] = &[
    &[
        "зарплата",
        "заработная плата",
        "оплата труда",
        "зп",
        "выплата",
        "заработок",
        "salary",
        "payroll",
    ],
    &["отпуск", "отпускные", "отдых", "vacation", "holiday"],
    &["больничный", "больничный лист", "sick leave"],
    &["справка", "документ", "certificate"],
    &["договор", "контракт", "соглашение", "contract", "agreement"],
    &["премия", "бонус", "надбавка", "bonus"],
    &["аванс", "предоплата", "advance"],
    &["налог", "налоги", "tax"],
    &["ндфл", "подоходный налог", "income tax"],
    &["уволиться", "увольнение", "resign", "resignation"],
    &["график", "расписание", "schedule"],
    &["удаленка", "удалёнка", "удаленная работа", "remote"],
];

/// One alternative in an expanded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchTerm {
    /// Match the word or phrase as written.
    Exact(String),
    /// Match any word starting with this stem.
    Prefix(String),
}

impl MatchTerm {
    pub fn text(&self) -> &str {
        match self {
            MatchTerm::Exact(t) | MatchTerm::Prefix(t) => t,
        }
    }
}

/// Strip one inflectional ending from a lowercase word, keeping at least
/// [`MIN_STEM_CHARS`] characters.
pub fn stem(word: &str) -> &str {
    SUFFIXES
        .iter()
        .filter_map(|suffix| word.strip_suffix(suffix))
        .find(|base| base.chars().count() >= MIN_STEM_CHARS)
        .unwrap_or(word)
}

/// Expand a free-text query into match alternatives.
///
/// Every search term becomes a stem prefix (or an exact match when too
/// short to stem safely), followed by the members of its synonym group.
/// Duplicates are dropped; order follows the query.
pub fn expand_query(query: &str) -> Vec<MatchTerm> {
    let mut out: Vec<MatchTerm> = Vec::new();
    for term in search_terms(query) {
        push_unique(&mut out, word_term(&term));
        for synonym in synonyms_of(&term) {
            push_unique(&mut out, word_term(synonym));
        }
    }
    out
}

fn word_term(word: &str) -> MatchTerm {
    if word.contains(' ') {
        return MatchTerm::Exact(word.to_string());
    }
    let base = stem(word);
    if base.chars().count() >= MIN_STEM_CHARS {
        MatchTerm::Prefix(base.to_string())
    } else {
        MatchTerm::Exact(word.to_string())
    }
}

fn synonyms_of(term: &str) -> Vec<&'static str> {
    let key = stem(term);
    SYNONYMS
        .iter()
        .filter(|group| {
            group
                .iter()
                .any(|member| !member.contains(' ') && stem(member) == key)
        })
        .flat_map(|group| group.iter().copied())
        .filter(|member| *member != term)
        .collect()
}

fn push_unique(out: &mut Vec<MatchTerm>, term: MatchTerm) {
    if !out.contains(&term) {
        out.push(term);
    }
}
