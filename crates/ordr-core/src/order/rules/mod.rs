//! Field-level parsing rules shared by the vendor grammars.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{parse_locale_number, AmountKind, NormalizedAmount, NumericLocale, NumericNormalizer};
pub use dates::{parse_date, DateExtractor, DateOrder};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A matched value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// First capture group of `re` in `text`, trimmed and non-empty.
pub fn capture(re: &regex::Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collapse whitespace runs to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    patterns::WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Strip leading zeros from an all-digit string ("0010" -> "10", "000" -> "0").
pub fn strip_leading_zeros(value: &str) -> String {
    let value = value.trim();
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        let stripped = value.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        value.to_string()
    }
}
