use landuse_feasibility::{
    extract_municipality_hints, extract_property_details, parse_address, parse_legal_description,
    parse_property, AddressKind, Gazetteer, LegalKind, RawInput,
};

#[test]
fn street_address_with_postal_code() {
    let parsed = parse_address("4914 48th Ave, Red Deer, AB t4n 3t4");
    assert_eq!(parsed.kind, AddressKind::Street);
    assert_eq!(parsed.components.get("number").unwrap(), "4914");
    assert_eq!(parsed.components.get("street").unwrap(), "48th Ave");
    assert_eq!(parsed.components.get("postal_code").unwrap(), "T4N3T4");
}

#[test]
fn postal_code_normalization_is_idempotent() {
    let spaced = parse_address("t4n 3t4");
    let compact = parse_address("T4N3T4");
    assert_eq!(spaced.components.get("postal_code").unwrap(), "T4N3T4");
    assert_eq!(
        spaced.components.get("postal_code"),
        compact.components.get("postal_code")
    );
    // no street or rural pattern matched, so the type stays unknown
    assert_eq!(spaced.kind, AddressKind::Unknown);
}

#[test]
fn rural_address_overrides_street_components() {
    let parsed = parse_address("Township Road 454, Ponoka County");
    assert_eq!(parsed.kind, AddressKind::Rural);
    assert_eq!(parsed.components.get("road_type").unwrap(), "Township Road");
    assert_eq!(parsed.components.get("road_number").unwrap(), "454");
}

#[test]
fn quarter_section_legal_description() {
    let parsed = parse_legal_description("SW 14-45-25-W4");
    assert_eq!(parsed.kind, LegalKind::QuarterSection);
    assert_eq!(parsed.components.get("quarter").unwrap(), "SW");
    assert_eq!(parsed.components.get("section").unwrap(), "14");
    assert_eq!(parsed.components.get("township").unwrap(), "45");
    assert_eq!(parsed.components.get("range").unwrap(), "25");
    assert_eq!(parsed.components.get("meridian_direction").unwrap(), "W");
    assert_eq!(parsed.components.get("meridian").unwrap(), "4");
}

#[test]
fn lot_block_plan_legal_description() {
    let parsed = parse_legal_description("Lot 7, Block 3, Plan 8921753");
    assert_eq!(parsed.kind, LegalKind::LotBlock);
    assert_eq!(parsed.components.get("lot").unwrap(), "7");
    assert_eq!(parsed.components.get("block").unwrap(), "3");
    assert_eq!(parsed.components.get("plan").unwrap(), "8921753");
}

#[test]
fn section_township_range_legal_description() {
    let parsed = parse_legal_description("Section 14, Township 45, Range 25, W4");
    assert_eq!(parsed.kind, LegalKind::Section);
    assert_eq!(parsed.components.get("township").unwrap(), "45");
    assert_eq!(parsed.components.get("meridian").unwrap(), "4");
}

#[test]
fn quarter_section_pattern_wins_over_lot_block() {
    // Both patterns are present; the quarter-section pattern is tried first.
    let parsed = parse_legal_description("LOT 5, BLOCK 2, PLAN 1234 and NE 10-55-22-W4");
    assert_eq!(parsed.kind, LegalKind::QuarterSection);
    assert_eq!(parsed.components.get("quarter").unwrap(), "NE");
}

#[test]
fn unmatched_legal_description_is_unknown() {
    let parsed = parse_legal_description("14.55 acre rural commercial property");
    assert_eq!(parsed.kind, LegalKind::Unknown);
    assert!(parsed.components.is_empty());
}

#[test]
fn municipality_hints_keep_gazetteer_order() {
    let gazetteer = Gazetteer::builtin();
    let hints =
        extract_municipality_hints(&gazetteer, "between athabasca and RED DEER, near Lacombe County");
    // scan order: municipality list first, then counties
    assert_eq!(hints, vec!["Red Deer", "Lacombe", "Athabasca", "Lacombe County"]);
}

#[test]
fn property_details_from_sample_notes() {
    let notes = "14.55 acre rural commercial property directly North of Black Bull Golf. \
                 Plan to develop the north section of the property with small cottages for rent. \
                 The county just installed a septic lift station; septic pipes and power line are \
                 in place. There's no village water, so everyone drills for it. \
                 Neighbouring property to the north consist of .3 acre rv lots for sale.";
    let details = extract_property_details(notes);
    assert_eq!(details.acreage, Some(14.55));
    assert_eq!(details.zoning_hints, vec!["commercial", "rural"]);
    assert_eq!(details.development_intentions, vec!["develop", "cottages"]);
    assert_eq!(details.infrastructure_mentions, vec!["septic", "water", "power"]);
}

#[test]
fn acreage_takes_first_match_only() {
    let details = extract_property_details("5 acres plus an optional 80 acres next door");
    assert_eq!(details.acreage, Some(5.0));
}

#[test]
fn empty_request_fails_the_validity_gate() {
    let gazetteer = Gazetteer::builtin();
    let record = parse_property(&gazetteer, &RawInput::default(), None);
    assert!(record.is_none());
}

#[test]
fn raw_text_alone_passes_the_validity_gate() {
    let gazetteer = Gazetteer::builtin();
    let raw = RawInput {
        additional_info: "nothing recognizable here".to_string(),
        ..Default::default()
    };
    let record = parse_property(&gazetteer, &raw, None).expect("raw text is a signal");
    assert!(record.parsed_address.is_none());
    assert!(record.municipality_hints.is_empty());
}

#[test]
fn parse_property_populates_all_sections() {
    let gazetteer = Gazetteer::builtin();
    let raw = RawInput {
        address: "4914 48th Ave, Red Deer, AB T4N 3T4".to_string(),
        legal_description: "SW 14-45-25-W4".to_string(),
        additional_info: "14.55 acre rural commercial property".to_string(),
    };
    let record = parse_property(&gazetteer, &raw, None).expect("should parse");
    assert_eq!(record.parsed_address.as_ref().unwrap().kind, AddressKind::Street);
    assert_eq!(
        record.parsed_legal.as_ref().unwrap().kind,
        LegalKind::QuarterSection
    );
    assert!(record.coordinates.is_none());
    assert_eq!(record.municipality_hints, vec!["Red Deer"]);
    assert_eq!(record.property_details.acreage, Some(14.55));
}
