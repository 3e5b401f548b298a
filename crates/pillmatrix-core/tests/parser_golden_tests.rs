//! Golden tests for the prescription parser and dose calculator.
//!
//! These tests pin the parser's output on known prescription snippets.

use pillmatrix_core::dosage::calculate_dose_quantity;
use pillmatrix_core::parser::parse_medications;

/// Expected medication: (name, dosage, frequency, duration).
type ExpectedMedication = (&'static str, &'static str, &'static str, &'static str);

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    input: &'static str,
    expected_medications: Vec<ExpectedMedication>,
    expected_diagnosis: Option<&'static str>,
    expected_notes: Option<&'static str>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "amoxicillin-continuation-lines",
            input: "Amoxicillin 500mg\nBD\n7 days\nDiagnosis: Bacterial infection",
            expected_medications: vec![("Amoxicillin", "500mg", "Twice daily", "7 days")],
            expected_diagnosis: Some("Bacterial infection"),
            expected_notes: None,
        },
        GoldenCase {
            id: "tab-prefix-stripped",
            input: "Tab Paracetamol 650mg TDS for 5 days",
            expected_medications: vec![("Paracetamol", "650mg", "Thrice daily", "5 days")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "compound-dosage-weeks-shorthand",
            input: "Cough Syrup 250mg/5ml OD 2/52",
            expected_medications: vec![("Cough Syrup", "250mg/5ml", "Once daily", "2 weeks")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "below-min-length",
            input: "xyz",
            expected_medications: vec![],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "injection-stat-grams",
            input: "Inj Ceftriaxone 1g stat",
            expected_medications: vec![("Ceftriaxone", "1g", "Immediately", "7 days")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "micrograms-prn",
            input: "Salbutamol 100mcg inhaler PRN",
            expected_medications: vec![("Salbutamol", "100mcg", "As needed", "7 days")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "bedtime-times-days",
            input: "Cetirizine 10mg HS x 3 days",
            expected_medications: vec![("Cetirizine", "10mg", "At bedtime", "3 days")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "month-rendered-plural",
            input: "Lisinopril 10mg OD 1 month",
            expected_medications: vec![("Lisinopril", "10mg", "Once daily", "1 months")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "dosage-spacing-verbatim",
            input: "Pantoprazole 40 mg before breakfast",
            expected_medications: vec![("Pantoprazole", "40 mg", "As directed", "7 days")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "days-shorthand-wins",
            input: "Paracetamol 500mg daily x 5/7",
            expected_medications: vec![("Paracetamol", "500mg", "Once daily", "5 days")],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "continuation-applies-to-last-only",
            input: "Amoxicillin 500mg BD\nMetronidazole 400mg TDS\n5 days",
            expected_medications: vec![
                ("Amoxicillin", "500mg", "Twice daily", "7 days"),
                ("Metronidazole", "400mg", "Thrice daily", "5 days"),
            ],
            expected_diagnosis: None,
            expected_notes: None,
        },
        GoldenCase {
            id: "full-prescription",
            input: "Rx\n\
                    Dr. A. Mehta\n\
                    Patient: R. Kumar   Date: 04/02/2024\n\
                    Diagnosis: Acute bronchitis\n\
                    1. Tab Azithromycin 500mg OD x 3 days\n\
                    2. Syr Ambroxol 15mg/5ml TDS 5/7\n\
                    3. Cap Omeprazole 20mg 1-0-0 2/52\n\
                    Advice: Steam inhalation twice daily\n\
                    Note: Review after one week",
            expected_medications: vec![
                ("Azithromycin", "500mg", "Once daily", "3 days"),
                ("Ambroxol", "15mg/5ml", "Thrice daily", "5 days"),
                ("Omeprazole", "20mg", "Once daily (morning)", "2 weeks"),
            ],
            expected_diagnosis: Some("Acute bronchitis"),
            expected_notes: Some("Steam inhalation twice daily Review after one week"),
        },
        GoldenCase {
            id: "header-only",
            input: "Prescription\nDoctor: Smith\nDate: 01/01/2024",
            expected_medications: vec![],
            expected_diagnosis: None,
            expected_notes: None,
        },
    ]
}

#[test]
fn test_golden_cases() {
    for case in get_golden_cases() {
        let result = parse_medications(case.input);

        let actual: Vec<(&str, &str, &str, &str)> = result
            .medications
            .iter()
            .map(|m| {
                (
                    m.name.as_str(),
                    m.dosage.as_str(),
                    m.frequency.as_str(),
                    m.duration.as_str(),
                )
            })
            .collect();

        assert_eq!(
            actual, case.expected_medications,
            "Case {}: medications mismatch", case.id
        );

        assert_eq!(
            result.diagnosis.as_deref(), case.expected_diagnosis,
            "Case {}: diagnosis mismatch", case.id
        );

        assert_eq!(
            result.notes.as_deref(), case.expected_notes,
            "Case {}: notes mismatch", case.id
        );
    }
}

#[test]
fn test_all_frequency_abbreviations() {
    let frequency_tests = vec![
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

    assert_eq!(frequency_tests.len(), 25);
    for (abbreviation, expected) in frequency_tests {
        let line = format!("Amoxicillin 500mg {}", abbreviation.to_uppercase());
        let result = parse_medications(&line);
        assert_eq!(
            result.medications[0].frequency, expected,
            "Frequency {} should expand to {}", abbreviation, expected
        );
    }
}

#[test]
fn test_all_duration_notations() {
    let duration_tests = vec![
        ("5/7", "5 days"),
        ("3 / 52", "3 weeks"),
        ("x10 days", "10 days"),
        ("for 1 day", "1 days"),
        ("14 days", "14 days"),
        ("2 weeks", "2 weeks"),
        ("1 week", "1 weeks"),
        ("3 months", "3 months"),
    ];

    for (notation, expected) in duration_tests {
        let line = format!("Amoxicillin 500mg BD {}", notation);
        let result = parse_medications(&line);
        assert_eq!(
            result.medications[0].duration, expected,
            "Duration {} should normalize to {}", notation, expected
        );
    }
}

#[test]
fn test_dose_quantity_cases() {
    let quantity_tests = vec![
        ("Twice daily", "2 weeks", 28),
        ("As needed", "30 days", 0),
        ("Once daily", "1 month", 30),
        ("Thrice daily", "5 days", 15),
        ("Four times daily", "1 week", 28),
        ("Twice daily (morning & night)", "10 days", 20),
        ("Thrice daily", "2 MONTHS", 180),
        ("", "10 days", 10),
        ("Twice daily", "", 0),
        ("Once daily", "7", 0),
    ];

    for (frequency, duration, expected) in quantity_tests {
        assert_eq!(
            calculate_dose_quantity(frequency, duration),
            expected,
            "Quantity for {:?} over {:?}", frequency, duration
        );
    }
}

#[test]
fn test_parsed_output_feeds_calculator() {
    let result =
        parse_medications("Tab Paracetamol 650mg TDS for 5 days\nCough Syrup 250mg/5ml OD 2/52");

    let quantities: Vec<u32> = result
        .medications
        .iter()
        .map(|m| calculate_dose_quantity(&m.frequency, &m.duration))
        .collect();
    assert_eq!(quantities, vec![15, 14]);
}
