// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use insuredocs_core::config::ExtractionProfile;
use insuredocs_extract::{Extractor, FieldExtractor};

const ARTIFACT: &str = "
--- Page 1 (Text Layer) ---
Policy Number: ABC-123456
Claim No: CLM-2024-0091 filed 2023-04-01 for $1,234.56
--- Page 2 (OCR ERROR: OCR failed: unreadable glyphs) ---

--- Page 3 (OCR) ---
Member ID: QX88213 Group #: GRP-5521 VIN 1HGCM82633A004352
Second payment of $1,234.56 on 04/15/2023, deductible $567
";

#[test]
fn repeated_extraction_is_byte_identical() {
    let extractor = FieldExtractor::new(ExtractionProfile::Combined).expect("extractor");

    let first = extractor.extract(ARTIFACT).expect("first run");
    let second = extractor.extract(ARTIFACT).expect("second run");

    let first_json = serde_json::to_string(&first).expect("serialize");
    let second_json = serde_json::to_string(&second).expect("serialize");
    assert_eq!(first_json, second_json);
    assert_eq!(first.numbers("amounts"), vec![567.0, 1234.56]);
}

#[test]
fn fresh_extractors_agree() {
    let a = FieldExtractor::new(ExtractionProfile::Combined)
        .expect("extractor")
        .extract(ARTIFACT)
        .expect("run");
    let b = FieldExtractor::new(ExtractionProfile::Combined)
        .expect("extractor")
        .extract(ARTIFACT)
        .expect("run");
    assert_eq!(a, b);
}

#[test]
fn every_entity_label_is_found() {
    let fields = FieldExtractor::new(ExtractionProfile::Entities)
        .expect("extractor")
        .extract(ARTIFACT)
        .expect("run");

    assert_eq!(fields.texts("POLICY_NUMBER"), vec!["ABC-123456"]);
    assert_eq!(fields.texts("CLAIM_NUMBER"), vec!["CLM-2024-0091"]);
    assert_eq!(fields.texts("MEMBER_ID"), vec!["QX88213"]);
    assert_eq!(fields.texts("GROUP_NUMBER"), vec!["GRP-5521"]);
    assert_eq!(fields.texts("REGEX_DATE_ISO"), vec!["2023-04-01"]);
    assert_eq!(fields.texts("REGEX_DATE_US"), vec!["04/15/2023"]);
    assert_eq!(fields.texts("VIN"), vec!["1HGCM82633A004352"]);
    assert!(fields.texts("REGEX_AMOUNT").contains(&"$1,234.56"));
}
