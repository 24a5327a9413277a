use std::collections::HashSet;
use std::path::Path;

use landuse_feasibility::{
    emit_report, sha256_hex, supported_municipalities, AnalysisError, Analyzer, Gazetteer,
    NominatimGeocoder, RawInput,
};

struct CliArgs {
    no_geocode: bool,
    list_municipalities: bool,
    out_dir: String,
    gazetteer_path: Option<String>,
    request_files: Vec<String>,
}

// Simple CLI flags parsing. A value-taking flag consumes the next token
// only when that token is not itself a flag.
fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs {
        no_geocode: false,
        list_municipalities: false,
        out_dir: String::from("./output"),
        gazetteer_path: None,
        request_files: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--no-geocode" => cli.no_geocode = true,
            "--list-municipalities" => cli.list_municipalities = true,
            "--out" | "--gazetteer" => {
                if let Some(val) = args.get(i + 1).filter(|v| !v.starts_with("--")) {
                    if arg == "--out" {
                        cli.out_dir = val.clone();
                    } else {
                        cli.gazetteer_path = Some(val.clone());
                    }
                    i += 1;
                }
            }
            _ if arg.starts_with("--") => {}
            _ => cli.request_files.push(arg.clone()),
        }
        i += 1;
    }

    cli
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let CliArgs {
        no_geocode,
        list_municipalities,
        out_dir,
        gazetteer_path,
        request_files,
    } = parse_args(&args[1..]);

    // 1) Load the municipality table
    let gazetteer = match &gazetteer_path {
        Some(path) => match Gazetteer::from_yaml_file(Path::new(path)) {
            Ok(g) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"load_gazetteer",
                        "file": path,
                        "status":"ok",
                        "cities": g.cities.len(),
                        "counties": g.counties.len()
                    })
                );
                g
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"load_gazetteer",
                        "file": path,
                        "error": e.to_string(),
                        "error_code": 3
                    })
                );
                std::process::exit(3);
            }
        },
        None => Gazetteer::builtin(),
    };

    if list_municipalities {
        for municipality in supported_municipalities(&gazetteer) {
            println!(
                "{}",
                serde_json::json!({
                    "name": municipality.record.name,
                    "category": municipality.category,
                    "type": municipality.record.kind,
                    "website": municipality.record.website
                })
            );
        }
        return;
    }

    if request_files.is_empty() {
        eprintln!(
            "{}",
            serde_json::json!({
                "tool":"parse_request",
                "error":"NoRequestFiles",
                "error_code": 1
            })
        );
        eprintln!("Usage: landuse-analyze [--gazetteer <table.yaml>] [--out <dir>] [--no-geocode] [--list-municipalities] <request.json>...");
        std::process::exit(1);
    }

    // 2) Wire up the analyzer; a missing geocoder degrades to no coordinates
    let mut analyzer = Analyzer::new(gazetteer);
    if !no_geocode {
        match NominatimGeocoder::new() {
            Ok(geocoder) => {
                analyzer = analyzer.with_geocoder(Box::new(geocoder));
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"geocode",
                        "warning":"geocoder_unavailable",
                        "detail": e.to_string()
                    })
                );
            }
        }
    }

    // Track used slugs for uniqueness
    let mut used_doc_ids: HashSet<String> = HashSet::new();

    fn slugify(base: &str) -> String {
        let lower = base.to_lowercase();
        let mut s = String::with_capacity(lower.len());
        for ch in lower.chars() {
            if ch.is_ascii_alphanumeric() {
                s.push(ch);
            } else {
                s.push('-');
            }
        }
        let trimmed = s.trim_matches('-').to_string();
        let mut collapsed = String::with_capacity(trimmed.len());
        let mut prev_dash = false;
        for ch in trimmed.chars() {
            if ch == '-' {
                if !prev_dash {
                    collapsed.push(ch);
                }
                prev_dash = true;
            } else {
                prev_dash = false;
                collapsed.push(ch);
            }
        }
        if collapsed.is_empty() {
            "property".to_string()
        } else {
            collapsed
        }
    }

    fn unique_slug(slug_in: String, used: &mut HashSet<String>) -> String {
        if !used.contains(&slug_in) {
            used.insert(slug_in.clone());
            return slug_in;
        }
        let mut i = 1;
        loop {
            let candidate = format!("{}-{}", slug_in, i);
            if !used.contains(&candidate) {
                used.insert(candidate.clone());
                return candidate;
            }
            i += 1;
        }
    }

    // 3) Analyze each request file
    for file in request_files {
        let raw = match std::fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"parse_request",
                        "file": file,
                        "error": e.to_string(),
                        "error_code": 3
                    })
                );
                std::process::exit(3);
            }
        };
        let request: RawInput = match serde_json::from_str(&raw) {
            Ok(request) => request,
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"parse_request",
                        "file": file,
                        "error": e.to_string(),
                        "error_code": 3
                    })
                );
                std::process::exit(3);
            }
        };
        eprintln!(
            "{}",
            serde_json::json!({
                "tool":"parse_request",
                "file": file,
                "status":"ok"
            })
        );

        match analyzer.analyze(&request) {
            Ok(report) => {
                if !report.ambiguous_name_matches.is_empty() {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "tool":"find_municipality",
                            "file": file,
                            "warning":"ambiguous_name_match",
                            "also_matched": report.ambiguous_name_matches
                        })
                    );
                }
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"find_municipality",
                        "file": file,
                        "municipality": report.municipality_info.record.name,
                        "category": report.municipality_info.category,
                        "method": report.resolution_method,
                        "distance_km": report.municipality_info.distance_km
                    })
                );
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"land_use_policies",
                        "file": file,
                        "zoning": report.policy_info.zoning,
                        "permitted_uses": report.policy_info.permitted_uses.len(),
                        "development_requirements": report.policy_info.development_requirements.len()
                    })
                );
                if let Some(cottage) = &report.cottage_analysis {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "tool":"cottage_analysis",
                            "file": file,
                            "feasibility": cottage.feasibility,
                            "estimated_units": cottage.cottage_potential.as_ref().map(|p| p.estimated_cottage_units)
                        })
                    );
                }

                // Fingerprint over the report minus the timestamp
                let report_value = serde_json::to_value(&report).unwrap_or_default();
                let mut normalized = report_value.clone();
                if let Some(obj) = normalized.as_object_mut() {
                    obj.remove("analysis_date");
                }
                let normalized_bytes = serde_json::to_vec(&normalized).unwrap_or_default();
                let fingerprint = sha256_hex(&normalized_bytes);
                let mut full = report_value.as_object().cloned().unwrap_or_default();
                full.insert("report_fingerprint".to_string(), serde_json::json!(fingerprint));
                let report_value = serde_json::Value::Object(full);

                let stem = Path::new(&file)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("property");
                let doc_id = unique_slug(slugify(stem), &mut used_doc_ids);
                match emit_report(&report_value, &out_dir, &doc_id) {
                    Ok(path) => {
                        eprintln!(
                            "{}",
                            serde_json::json!({
                                "tool":"emit_report",
                                "file": file,
                                "report_path": path
                            })
                        );
                    }
                    Err(e) => {
                        eprintln!(
                            "{}",
                            serde_json::json!({
                                "tool":"emit_report",
                                "file": file,
                                "error": e.to_string(),
                                "error_code": 6
                            })
                        );
                        std::process::exit(6);
                    }
                }
            }
            Err(err @ AnalysisError::UnableToParse) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"parse_property",
                        "file": file,
                        "error": err.to_string(),
                        "error_code": 4
                    })
                );
                eprintln!("Unable to parse property information. Provide a street address, legal land description, or descriptive notes.");
                std::process::exit(4);
            }
            Err(err @ AnalysisError::MunicipalityNotFound) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"find_municipality",
                        "file": file,
                        "error": err.to_string(),
                        "error_code": 5
                    })
                );
                eprintln!("Municipality not found or not supported. Add a municipality name, coordinates-friendly address, or a township-range legal description.");
                std::process::exit(5);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_args;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn flags_values_and_positionals() {
        let cli = parse_args(&args(&[
            "--gazetteer",
            "table.yaml",
            "--out",
            "reports",
            "--no-geocode",
            "a.json",
            "b.json",
        ]));
        assert!(cli.no_geocode);
        assert!(!cli.list_municipalities);
        assert_eq!(cli.out_dir, "reports");
        assert_eq!(cli.gazetteer_path.as_deref(), Some("table.yaml"));
        assert_eq!(cli.request_files, vec!["a.json", "b.json"]);
    }

    #[test]
    fn flag_after_value_taking_flag_is_not_swallowed() {
        let cli = parse_args(&args(&["--out", "--no-geocode", "req.json"]));
        assert!(cli.no_geocode);
        assert_eq!(cli.out_dir, "./output");
        assert_eq!(cli.request_files, vec!["req.json"]);

        let cli = parse_args(&args(&["--gazetteer", "--list-municipalities"]));
        assert!(cli.gazetteer_path.is_none());
        assert!(cli.list_municipalities);
        assert!(cli.request_files.is_empty());
    }

    #[test]
    fn trailing_value_taking_flag_without_value() {
        let cli = parse_args(&args(&["req.json", "--out"]));
        assert_eq!(cli.out_dir, "./output");
        assert_eq!(cli.request_files, vec!["req.json"]);
    }
}
