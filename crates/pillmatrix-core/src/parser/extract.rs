//! Field extraction for a single prescription line.

use super::tables::{
    FrequencyRule, DOSAGE_PATTERNS, DURATION_PATTERNS, ENUMERATION_PREFIX, FORM_PREFIX,
    NAME_BEFORE_DOSAGE,
};

/// Outcome of a lookup that may fall back to a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<T> {
    /// A table entry or pattern matched
    Recognized(T),
    /// Nothing matched; the caller substitutes its sentinel
    Defaulted,
}

impl<T> Extracted<T> {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Recognized(value) => Some(value),
            Self::Defaulted => None,
        }
    }
}

impl Extracted<String> {
    /// Flatten to the value, or the given sentinel when defaulted.
    pub fn or_sentinel(self, sentinel: &str) -> String {
        self.into_option().unwrap_or_else(|| sentinel.to_string())
    }
}

/// Strip list numbering and a leading dosage-form abbreviation.
pub fn clean_line(line: &str) -> String {
    let without_number = ENUMERATION_PREFIX.replace(line, "");
    let without_form = FORM_PREFIX.replace(&without_number, "");
    without_form.trim().to_string()
}

/// Drug name: letters before the first dosage, else the first two words.
pub fn extract_name(cleaned: &str) -> String {
    if let Some(caps) = NAME_BEFORE_DOSAGE.captures(cleaned) {
        let name = caps[1].trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    cleaned
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dosage substring as written, or empty when none is present.
pub fn extract_dosage(line: &str) -> String {
    DOSAGE_PATTERNS
        .iter()
        .find_map(|re| re.find(line))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// First frequency rule whose keyword appears as a whole word.
pub fn match_frequency(rules: &[FrequencyRule], lower_line: &str) -> Extracted<String> {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(lower_line))
        .map(|rule| Extracted::Recognized(rule.expansion.clone()))
        .unwrap_or(Extracted::Defaulted)
}

/// First duration pattern that matches, rendered in normalized form.
pub fn match_duration(line: &str) -> Extracted<String> {
    DURATION_PATTERNS
        .iter()
        .find_map(|p| {
            p.regex
                .captures(line)
                .map(|caps| p.output.render(&caps[1]))
        })
        .map(Extracted::Recognized)
        .unwrap_or(Extracted::Defaulted)
}
