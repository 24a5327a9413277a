use landuse_feasibility::{
    emit_report, AnalysisError, Analyzer, Feasibility, Gazetteer, GeoPoint, Geocoder, RawInput,
    ResolutionMethod,
};

struct StubGeocoder {
    point: GeoPoint,
}

impl Geocoder for StubGeocoder {
    fn geocode(&self, _address: &str) -> Option<GeoPoint> {
        Some(self.point.clone())
    }
}

fn cottage_request() -> RawInput {
    RawInput {
        address: "4914 48th Ave, Red Deer, AB T4N 3T4".to_string(),
        legal_description: "SW 14-45-25-W4".to_string(),
        additional_info: "14.55 acre rural commercial property. Plan to develop the north \
                          section with small cottages for rent."
            .to_string(),
    }
}

#[test]
fn full_analysis_for_a_cottage_development_request() {
    let mut analyzer = Analyzer::new(Gazetteer::builtin());
    let report = analyzer.analyze(&cottage_request()).expect("should analyze");

    assert_eq!(report.municipality_info.record.name, "Red Deer");
    assert_eq!(report.resolution_method, ResolutionMethod::NameHint);
    assert!(report.ambiguous_name_matches.is_empty());

    let address = report.property_info.parsed_address.as_ref().unwrap();
    assert_eq!(address.components.get("postal_code").unwrap(), "T4N3T4");
    assert_eq!(report.property_info.property_details.acreage, Some(14.55));

    assert_eq!(report.policy_info.zoning.as_deref(), Some("RC - Rural Commercial"));
    assert_eq!(report.feasibility_summary.development_potential, "High");

    let cottage = report.cottage_analysis.expect("cottages were mentioned");
    assert_eq!(cottage.feasibility, Feasibility::High);
    let potential = cottage.cottage_potential.expect("sizing should fire");
    assert_eq!(potential.estimated_cottage_units, 26);
    assert_eq!(potential.recommended_phase_1, 5);
}

#[test]
fn cottage_analysis_is_omitted_without_cottage_intentions() {
    let mut analyzer = Analyzer::new(Gazetteer::builtin());
    let raw = RawInput {
        address: "4914 48th Ave, Red Deer, AB T4N 3T4".to_string(),
        additional_info: "14.55 acre rural commercial property".to_string(),
        ..Default::default()
    };
    let report = analyzer.analyze(&raw).expect("should analyze");
    assert!(report.cottage_analysis.is_none());
}

#[test]
fn empty_request_is_unable_to_parse() {
    let mut analyzer = Analyzer::new(Gazetteer::builtin());
    let err = analyzer.analyze(&RawInput::default()).unwrap_err();
    assert_eq!(err, AnalysisError::UnableToParse);
}

#[test]
fn unresolvable_property_is_municipality_not_found() {
    let mut analyzer = Analyzer::new(Gazetteer::builtin());
    let raw = RawInput {
        address: "Property north of Black Bull Golf, west of The Village at Pigeon Lake, AB"
            .to_string(),
        legal_description: "14.55 acre rural commercial property".to_string(),
        ..Default::default()
    };
    let err = analyzer.analyze(&raw).unwrap_err();
    assert_eq!(err, AnalysisError::MunicipalityNotFound);
}

#[test]
fn geocoder_output_feeds_coordinate_resolution() {
    let stub = StubGeocoder {
        point: GeoPoint {
            latitude: 52.47,
            longitude: -113.74,
            display_name: "somewhere near Lacombe".to_string(),
        },
    };
    let mut analyzer = Analyzer::new(Gazetteer::builtin()).with_geocoder(Box::new(stub));
    let raw = RawInput {
        address: "52 acres on a gravel road".to_string(),
        ..Default::default()
    };
    let report = analyzer.analyze(&raw).expect("should analyze");
    assert_eq!(report.municipality_info.record.name, "Lacombe");
    assert_eq!(report.resolution_method, ResolutionMethod::Coordinates);
    assert!(report.property_info.coordinates.is_some());
}

#[test]
fn repeat_analysis_is_stable_apart_from_the_timestamp() {
    let mut analyzer = Analyzer::new(Gazetteer::builtin());
    let first = analyzer.analyze(&cottage_request()).expect("should analyze");
    let second = analyzer.analyze(&cottage_request()).expect("should analyze");

    // the policy cache guarantees the embedded last_updated stamp repeats
    assert_eq!(first.policy_info, second.policy_info);

    let mut a = serde_json::to_value(&first).expect("serializable");
    let mut b = serde_json::to_value(&second).expect("serializable");
    a.as_object_mut().unwrap().remove("analysis_date");
    b.as_object_mut().unwrap().remove("analysis_date");
    assert_eq!(a, b);
}

#[test]
fn emit_report_writes_the_analysis_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let outdir = dir.path().to_str().unwrap();

    let mut analyzer = Analyzer::new(Gazetteer::builtin());
    let report = analyzer.analyze(&cottage_request()).expect("should analyze");
    let value = serde_json::to_value(&report).expect("serializable");

    let path = emit_report(&value, outdir, "black-bull-request").expect("should write");
    assert!(path.ends_with("black-bull-request.analysis.json"));

    let written = std::fs::read_to_string(&path).expect("readable");
    let round_trip: serde_json::Value = serde_json::from_str(&written).expect("valid json");
    assert_eq!(round_trip, value);

    // no stray temp files left behind
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("listable")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
