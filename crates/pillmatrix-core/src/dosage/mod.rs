//! Dose quantity calculation.
//!
//! `quantity = total days × doses per day`, with a fixed 30-day month and
//! "as needed" counting as zero doses per day. A result of 0 means the
//! quantity could not be computed and inventory must not be deducted.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parser::Extracted;

/// Days counted for one month.
pub const DAYS_PER_MONTH: u32 = 30;

/// Doses per day when the frequency is not recognized.
pub const DEFAULT_DOSES_PER_DAY: u32 = 1;

static DURATION_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(day|week|month)s?").unwrap());

/// Frequency classes, multi-dose phrases ahead of the plain "daily" catch-all.
const DOSES_PER_DAY_TABLE: &[(&[&str], u32)] = &[
    (&["four times daily", "qid"], 4),
    (&["thrice daily", "tds", "tid"], 3),
    (&["twice daily", "bd"], 2),
    (&["as needed", "prn", "sos"], 0),
    (&["once daily", "daily", "od"], 1),
];

/// Unit of a prescription duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Day,
    Week,
    Month,
}

impl DurationUnit {
    pub fn days(&self) -> u32 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => DAYS_PER_MONTH,
        }
    }
}

/// Parsed duration amount and unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DurationSpec {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl DurationSpec {
    /// Parse the first `<n> day|week|month[s]` in a duration string.
    pub fn parse(duration: &str) -> Option<Self> {
        let caps = DURATION_SPEC.captures(duration)?;
        let amount = caps[1].parse::<u32>().ok()?;
        let unit = match caps[2].to_lowercase().as_str() {
            "day" => DurationUnit::Day,
            "week" => DurationUnit::Week,
            "month" => DurationUnit::Month,
            _ => return None,
        };
        Some(Self { amount, unit })
    }

    pub fn total_days(&self) -> u32 {
        self.amount.saturating_mul(self.unit.days())
    }
}

/// Doses per day derived from a frequency string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrequencySpec {
    pub doses_per_day: u32,
}

impl FrequencySpec {
    /// Classify by case-insensitive substring, first table row wins.
    pub fn classify(frequency: &str) -> Extracted<Self> {
        let lower = frequency.to_lowercase();
        DOSES_PER_DAY_TABLE
            .iter()
            .find(|(phrases, _)| phrases.iter().any(|p| lower.contains(p)))
            .map(|(_, doses_per_day)| {
                Extracted::Recognized(Self {
                    doses_per_day: *doses_per_day,
                })
            })
            .unwrap_or(Extracted::Defaulted)
    }

    /// Classification with the unrecognized case mapped to one dose a day.
    pub fn from_frequency(frequency: &str) -> Self {
        Self::classify(frequency).into_option().unwrap_or(Self {
            doses_per_day: DEFAULT_DOSES_PER_DAY,
        })
    }
}

/// Total number of doses needed to cover the duration.
///
/// Returns 0 when the duration is not recognized.
pub fn calculate_dose_quantity(frequency: &str, duration: &str) -> u32 {
    let Some(spec) = DurationSpec::parse(duration) else {
        tracing::debug!(duration, "Unrecognized duration, quantity not computed");
        return 0;
    };

    spec.total_days()
        .saturating_mul(FrequencySpec::from_frequency(frequency).doses_per_day)
}
