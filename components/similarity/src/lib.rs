//! Query/result similarity scoring
//!
//! ## Scoring Formula
//! ```text
//! confidence = (0.6 × title_ratio + 0.4 × artist_ratio) × 100
//!            + 20 if one cleaned title contains the other (capped at 100)
//! ```
//!
//! Titles and artists are cleaned before comparison: parenthesised parts are
//! removed, text is lowercased and only alphanumerics and whitespace are kept.
//! Artists are cut at the first `&` so collaborations compare on the first
//! credited name.

use tracing::debug;

const TITLE_WEIGHT: f64 = 0.6;
const ARTIST_WEIGHT: f64 = 0.4;
const CONTAINMENT_BONUS: f64 = 20.0;
const MAX_CONFIDENCE: f64 = 100.0;

/// Score how well a catalog result matches a query, 0-100
///
/// Any empty input scores 0.
///
/// # Examples
/// ```
/// let score = similarity::confidence("Song (Remix)", "A & B", "Song", "A");
/// assert_eq!(score, 100.0);
/// ```
pub fn confidence(
    query_title: &str,
    query_artist: &str,
    result_title: &str,
    result_artist: &str,
) -> f64 {
    if [query_title, query_artist, result_title, result_artist]
        .iter()
        .any(|s| s.is_empty())
    {
        return 0.0;
    }

    let query_title = clean_text(query_title);
    let result_title = clean_text(result_title);
    let query_artist = clean_text(primary_artist(query_artist));
    let result_artist = clean_text(primary_artist(result_artist));

    let title_ratio = levenshtein_ratio(&query_title, &result_title);
    let artist_ratio = levenshtein_ratio(&query_artist, &result_artist);

    let mut score = (title_ratio * TITLE_WEIGHT + artist_ratio * ARTIST_WEIGHT) * 100.0;

    if query_title.contains(&result_title) || result_title.contains(&query_title) {
        score = (score + CONTAINMENT_BONUS).min(MAX_CONFIDENCE);
    }

    debug!(
        query_title = %query_title,
        result_title = %result_title,
        query_artist = %query_artist,
        result_artist = %result_artist,
        title_ratio,
        artist_ratio,
        score,
        "Scored candidate"
    );

    score
}

/// Normalise text for comparison
///
/// Parenthesised substrings are removed repeatedly while a `(` precedes a
/// `)`. A stray `)` before the first `(` stops the stripping.
pub fn clean_text(text: &str) -> String {
    let mut text = text.to_string();

    while let (Some(start), Some(end)) = (text.find('('), text.find(')')) {
        if start >= end {
            break;
        }
        text.replace_range(start..=end, "");
    }

    text.to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// The first credited artist of a collaboration ("A & B" → "A")
pub fn primary_artist(artist: &str) -> &str {
    artist.split('&').next().unwrap_or(artist)
}

/// Normalised edit-distance similarity in [0, 1]
///
/// `1 - levenshtein(a, b) / max(len(a), len(b))`, with two empty strings
/// counting as identical.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}
