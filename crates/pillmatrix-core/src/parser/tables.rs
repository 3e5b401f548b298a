//! Ordered keyword and pattern tables for prescription text.
//!
//! Every table is evaluated top to bottom and the first hit wins, so the
//! order of entries is part of the parser's observable behavior.

use std::sync::LazyLock;

use regex::Regex;

/// Unit and dosage-form keywords that mark a candidate medication line.
pub const FORM_KEYWORDS: &[&str] = &[
    "mg", "ml", "mcg", "g", "tablet", "tab", "cap", "capsule", "syrup", "syr", "injection", "inj",
    "drops", "cream", "ointment",
];

/// Lines containing any of these are headers or metadata, never medications.
pub const SKIP_KEYWORDS: &[&str] = &["rx", "prescription", "doctor", "patient", "date"];

pub const DIAGNOSIS_KEYWORDS: &[&str] = &["diagnosis", "dx", "impression", "condition"];

pub const NOTES_KEYWORDS: &[&str] = &["note", "instruction", "advice", "caution", "warning"];

/// Lines shorter than this (in characters) are never medication lines.
pub const MIN_LINE_LEN: usize = 5;

/// Prescribing abbreviations and phrases with their canonical expansion.
pub const FREQUENCY_TABLE: &[(&str, &str)] = &[
    ("od", "Once daily"),
    ("bd", "Twice daily"),
    ("td", "Thrice daily"),
    ("tds", "Thrice daily"),
    ("qid", "Four times daily"),
    ("prn", "As needed"),
    ("sos", "As needed"),
    ("stat", "Immediately"),
    ("hs", "At bedtime"),
    ("ac", "Before meals"),
    ("pc", "After meals"),
    ("daily", "Once daily"),
    ("twice", "Twice daily"),
    ("thrice", "Thrice daily"),
    ("morning", "In the morning"),
    ("evening", "In the evening"),
    ("night", "At night"),
    ("noon", "At noon"),
    ("1-0-0", "Once daily (morning)"),
    ("0-1-0", "Once daily (noon)"),
    ("0-0-1", "Once daily (night)"),
    ("1-0-1", "Twice daily (morning & night)"),
    ("1-1-1", "Thrice daily"),
    ("0-1-1", "Twice daily (noon & night)"),
    ("1-1-0", "Twice daily (morning & noon)"),
];

/// A frequency keyword compiled to a case-insensitive whole-word matcher.
#[derive(Debug, Clone)]
pub struct FrequencyRule {
    pub keyword: String,
    pub pattern: Regex,
    pub expansion: String,
}

impl FrequencyRule {
    pub fn new(keyword: &str, expansion: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            keyword: keyword.to_string(),
            pattern: word_pattern(keyword)?,
            expansion: expansion.to_string(),
        })
    }
}

/// Case-insensitive whole-word regex for a literal keyword.
pub fn word_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
}

pub static DEFAULT_FREQUENCY_RULES: LazyLock<Vec<FrequencyRule>> = LazyLock::new(|| {
    FREQUENCY_TABLE
        .iter()
        .map(|(keyword, expansion)| FrequencyRule::new(keyword, expansion).unwrap())
        .collect()
});

/// How a matched duration amount is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationOutput {
    Days,
    Weeks,
    Months,
}

impl DurationOutput {
    pub fn render(&self, amount: &str) -> String {
        match self {
            Self::Days => format!("{} days", amount),
            Self::Weeks => format!("{} weeks", amount),
            Self::Months => format!("{} months", amount),
        }
    }
}

#[derive(Debug)]
pub struct DurationPattern {
    pub regex: Regex,
    pub output: DurationOutput,
}

/// Duration notations: clinical shorthand first (`5/7` days, `2/52` weeks),
/// then spelled-out units.
pub static DURATION_PATTERNS: LazyLock<Vec<DurationPattern>> = LazyLock::new(|| {
    let pattern = |re: &str, output| DurationPattern {
        regex: Regex::new(re).unwrap(),
        output,
    };
    vec![
        pattern(r"(\d+)\s*/\s*7", DurationOutput::Days),
        pattern(r"(\d+)\s*/\s*52", DurationOutput::Weeks),
        pattern(r"(?i)x\s*(\d+)\s*days?", DurationOutput::Days),
        pattern(r"(?i)for\s*(\d+)\s*days?", DurationOutput::Days),
        pattern(r"(?i)(\d+)\s*days?", DurationOutput::Days),
        pattern(r"(?i)(\d+)\s*weeks?", DurationOutput::Weeks),
        pattern(r"(?i)(\d+)\s*months?", DurationOutput::Months),
    ]
});

/// Dosage notations, compound liquid strength first.
pub static DOSAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\d+\.?\d*\s*mg\s*/\s*\d+\.?\d*\s*ml").unwrap(),
        Regex::new(r"(?i)\d+\.?\d*\s*mg").unwrap(),
        Regex::new(r"(?i)\d+\.?\d*\s*ml").unwrap(),
        Regex::new(r"(?i)\d+\.?\d*\s*mcg").unwrap(),
        Regex::new(r"(?i)\d+\.?\d*\s*g").unwrap(),
    ]
});

/// A number directly followed by a mass or volume unit.
pub static NUMERIC_DOSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\.?\d*\s*(?:mg|ml|mcg|g)").unwrap());

/// Letters and spaces leading up to the first `<number><unit>` token.
pub static NAME_BEFORE_DOSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z\s]+?)\s*\d+(?:\.\d+)?\s*(?:mcg|mg|ml|g)").unwrap()
});

/// List numbering such as `1.` or `2)`.
pub static ENUMERATION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());

/// Dosage-form abbreviation at the start of a line (`Tab.`, `Cap`, ...).
pub static FORM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:tab|cap|syr|inj)\b\.?\s*").unwrap());
