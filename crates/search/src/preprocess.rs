//! Query preprocessing: one conversational query in, two signal queries out.
//!
//! The semantic index wants the query's informative core; the keyword index
//! wants the user's literal tokens. Both share a single pass that strips one
//! leading conversational prefix, after which only the semantic path drops
//! stopwords and surrounding punctuation. Identifier-looking tokens survive
//! stopword filtering unconditionally.

use std::collections::HashSet;

use once_cell::sync::Lazy;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "am", "do", "does",
        "did", "can", "could", "should", "would", "will", "shall", "may", "might", "must", "i",
        "me", "my", "we", "our", "us", "you", "your", "it", "its", "this", "that", "these",
        "those", "there", "here", "to", "of", "in", "on", "for", "with", "and", "or", "not",
        "no", "at", "by", "from", "as", "about", "into", "over", "under", "how", "what", "when",
        "where", "which", "who", "whom", "why", "please", "help", "need", "want", "like", "get",
        "make", "use", "using", "some", "any", "all", "explain", "show", "tell",
    ]
    .into_iter()
    .collect()
});

/// Conversational lead-ins removed before either signal sees the query.
/// Checked longest first so "can you show me" wins over "can you".
///
/// Every phrase here contains a word the stopword filter drops, so a
/// stripped query can never itself begin with a table entry. Bare verbs
/// ("find", "explain") must not be added: stripping them from their own
/// output would make preparation unstable on repeated application.
static STRIP_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut prefixes = vec![
        "can you show me",
        "could you show me",
        "can you find",
        "could you find",
        "can you explain",
        "i would like to know",
        "i want to know",
        "i want to",
        "i need to",
        "i'm looking for",
        "i am looking for",
        "tell me about",
        "show me",
        "can you",
        "could you",
        "how do i",
        "how do you",
        "how can i",
        "how does",
        "what is",
        "what are",
        "where is",
        "where are",
    ];
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
    prefixes
});

/// Signal-specific renditions of one user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    /// Stopword-filtered core for embedding search.
    pub semantic: String,
    /// Prefix-stripped query with original tokens and casing intact.
    pub keyword: String,
}

pub fn prepare(query: &str) -> PreparedQuery {
    let stripped = strip_prefix_once(query.trim());
    let semantic = filter_stopwords(stripped);
    PreparedQuery {
        semantic: if semantic.is_empty() {
            stripped.to_string()
        } else {
            semantic
        },
        keyword: stripped.to_string(),
    }
}

/// Removes at most one leading conversational prefix, case-insensitively.
/// The prefix must end at a word boundary and leave a non-empty remainder.
fn strip_prefix_once(query: &str) -> &str {
    for prefix in STRIP_PREFIXES.iter() {
        let Some(head) = query.get(..prefix.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            continue;
        }
        let rest = &query[prefix.len()..];
        if !rest.starts_with(|c: char| c.is_whitespace() || c == ',' || c == ':') {
            continue;
        }
        let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == ':');
        if !rest.is_empty() {
            return rest;
        }
    }
    query
}

fn filter_stopwords(text: &str) -> String {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter_map(|token| {
            let trimmed = token.trim_matches(|c: char| {
                matches!(c, '?' | '!' | ',' | ';' | '(' | ')' | '"' | '\'' | '`')
            });
            if trimmed.is_empty() {
                return None;
            }
            if looks_like_identifier(trimmed) {
                return Some(trimmed);
            }
            let lower = trimmed.to_lowercase();
            if STOPWORDS.contains(lower.as_str()) {
                None
            } else {
                Some(trimmed)
            }
        })
        .collect();
    kept.join(" ")
}

/// Code-ish tokens are never treated as stopwords: paths, qualified names,
/// snake_case, and ALLCAPS constants.
fn looks_like_identifier(token: &str) -> bool {
    if token.contains('_') || token.contains('.') || token.contains("::") || token.contains('/') {
        return true;
    }
    token.len() > 1
        && token.chars().any(|c| c.is_ascii_uppercase())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
