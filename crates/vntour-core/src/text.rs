//! Text helpers shared by the keyword normalizer, the trends fetcher and the
//! province matcher.

use unidecode::unidecode;

/// Longest keyword the trends API is sent; longer names are truncated.
pub const MAX_KEYWORD_CHARS: usize = 100;

/// Folds Vietnamese text to a comparison key: transliterated to ASCII,
/// lowercased, every non-alphanumeric character replaced by a space, and
/// whitespace collapsed.
///
/// `"Thành phố Hồ Chí Minh"` becomes `"thanh pho ho chi minh"` and `"Đà Lạt!"`
/// becomes `"da lat"`.
#[must_use]
pub fn fold_accents(text: &str) -> String {
    let ascii = unidecode(text).to_lowercase();
    let spaced: String = ascii
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&spaced)
}

/// Collapses runs of whitespace to a single space and trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips trailing `, . ;` and whitespace.
#[must_use]
pub fn trim_trailing_punctuation(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';'))
}

/// Light cleanup applied to keywords before they are sent to the trends API.
///
/// Keeps diacritics and province suffixes so deduplicated names stay distinct.
#[must_use]
pub fn sanitize_keyword(keyword: &str) -> String {
    let cleaned = collapse_whitespace(trim_trailing_punctuation(keyword.trim()));
    if cleaned.chars().count() > MAX_KEYWORD_CHARS {
        let truncated: String = cleaned.chars().take(MAX_KEYWORD_CHARS).collect();
        truncated.trim_end().to_string()
    } else {
        cleaned
    }
}
