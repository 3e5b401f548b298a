//! Property-based tests for the parser and dose calculator.

use pillmatrix_core::dosage::calculate_dose_quantity;
use pillmatrix_core::parser::parse_medications;
use proptest::prelude::*;

const DRUG_NAMES: &[&str] = &[
    "Amoxicillin",
    "Metformin",
    "Paracetamol",
    "Omeprazole",
    "Atorvastatin",
    "Cetirizine",
];

const FREQUENCIES: &[(&str, &str, u32)] = &[
    ("OD", "Once daily", 1),
    ("BD", "Twice daily", 2),
    ("TDS", "Thrice daily", 3),
    ("QID", "Four times daily", 4),
    ("PRN", "As needed", 0),
];

proptest! {
    /// Arbitrary text never panics and never yields a nameless or doseless entry
    #[test]
    fn parse_entries_have_name_and_dosage(text in "\\PC{0,300}") {
        let result = parse_medications(&text);
        for medication in &result.medications {
            prop_assert!(!medication.name.is_empty(), "Empty name from {:?}", text);
            prop_assert!(!medication.dosage.is_empty(), "Empty dosage from {:?}", text);
        }
    }

    /// Prescription-shaped text, line breaks included
    #[test]
    fn parse_is_idempotent(
        lines in proptest::collection::vec("[A-Za-z0-9 ./:()-]{0,40}", 0..12)
    ) {
        let text = lines.join("\n");
        prop_assert_eq!(parse_medications(&text), parse_medications(&text));
    }

    /// A well-formed single line yields exactly that medication
    #[test]
    fn well_formed_line_round_trips(
        prefix in prop::sample::select(vec!["", "Tab ", "Cap. ", "1. ", "2) "]),
        name in prop::sample::select(DRUG_NAMES.to_vec()),
        strength in 1u32..1000,
        frequency in prop::sample::select(FREQUENCIES.to_vec()),
        days in 1u32..60,
    ) {
        let (abbreviation, expansion, doses_per_day) = frequency;
        let line = format!("{}{} {}mg {} x {} days", prefix, name, strength, abbreviation, days);
        let result = parse_medications(&line);

        prop_assert_eq!(result.medications.len(), 1, "Line {:?}", line);
        let medication = &result.medications[0];
        prop_assert_eq!(medication.name.as_str(), name);
        prop_assert_eq!(medication.dosage.clone(), format!("{}mg", strength));
        prop_assert_eq!(medication.frequency.as_str(), expansion);
        prop_assert_eq!(medication.duration.clone(), format!("{} days", days));

        prop_assert_eq!(
            calculate_dose_quantity(&medication.frequency, &medication.duration),
            days * doses_per_day
        );
    }

    /// Arbitrary strings never panic the calculator
    #[test]
    fn quantity_total_for_any_input(frequency in "\\PC{0,60}", duration in "\\PC{0,60}") {
        let _ = calculate_dose_quantity(&frequency, &duration);
    }

    /// Quantity is days times doses per day for recognized durations
    #[test]
    fn quantity_is_multiple_of_days(
        amount in 0u32..10_000,
        unit in prop::sample::select(vec![("day", 1u32), ("week", 7), ("month", 30)]),
        frequency in prop::sample::select(FREQUENCIES.to_vec()),
    ) {
        let (unit_name, unit_days) = unit;
        let (_, expansion, doses_per_day) = frequency;
        let duration = format!("{} {}s", amount, unit_name);

        prop_assert_eq!(
            calculate_dose_quantity(expansion, &duration),
            amount * unit_days * doses_per_day
        );
    }

    /// Durations without a day/week/month unit are never computed
    #[test]
    fn unitless_duration_is_zero(
        amount in 0u32..10_000,
        frequency in prop::sample::select(FREQUENCIES.to_vec()),
    ) {
        let (_, expansion, _) = frequency;
        prop_assert_eq!(calculate_dose_quantity(expansion, &amount.to_string()), 0);
    }
}
