pub mod gazetteer;
pub mod geocode;
pub mod parser;
pub mod policy;
pub mod resolver;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use gazetteer::{ContactInfo, Gazetteer, GazetteerError, LatLon, MunicipalityKind, MunicipalityRecord};
pub use geocode::{GeoPoint, Geocoder, NominatimGeocoder, GEOCODE_TIMEOUT_SECS};
pub use parser::{
    extract_municipality_hints, extract_property_details, parse_address, parse_legal_description,
    parse_property, AddressKind, LegalKind, ParsedAddress, ParsedLegal, PropertyDetails,
    PropertyRecord, RawInput,
};
pub use policy::{
    cottage_development_analysis, density_restrictions, height_restrictions, land_use_policies,
    sha256_hex, typical_setbacks, BylawInfo, BylawSection, CottageAnalysis, CottagePotential,
    Feasibility, PolicyCache, PolicyRecord, Table,
};
pub use resolver::{
    find_by_address_components, find_by_coordinates, find_by_legal_description, find_by_name,
    find_municipality, haversine_km, location_hints, municipality_details,
    supported_municipalities, Municipality, MunicipalityDetails, Resolution, ResolutionMethod,
};

/// Terminal user-facing outcomes of the pipeline. Everything else degrades
/// silently to absent fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("UnableToParse")]
    UnableToParse,
    #[error("MunicipalityNotFound")]
    MunicipalityNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasibilitySummary {
    pub development_potential: String,
    pub key_considerations: Vec<String>,
    pub recommended_actions: Vec<String>,
}

/// The combined analysis object handed to the report renderer. All fields
/// are display-only for consumers.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub property_info: PropertyRecord,
    pub municipality_info: Municipality,
    pub resolution_method: ResolutionMethod,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_name_matches: Vec<String>,
    pub policy_info: PolicyRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cottage_analysis: Option<CottageAnalysis>,
    pub analysis_date: String,
    pub feasibility_summary: FeasibilitySummary,
}

/// One-shot property analyzer: gazetteer, policy memo and optional geocoder,
/// wired together once at startup.
pub struct Analyzer {
    gazetteer: Gazetteer,
    cache: PolicyCache,
    geocoder: Option<Box<dyn Geocoder>>,
}

impl Analyzer {
    pub fn new(gazetteer: Gazetteer) -> Self {
        Analyzer {
            gazetteer,
            cache: PolicyCache::default(),
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    /// Run the full pipeline: parse, resolve, derive policy, summarize.
    /// The cottage sizing sub-analysis is attached when the notes mention
    /// cottage development.
    pub fn analyze(&mut self, request: &RawInput) -> Result<AnalysisReport, AnalysisError> {
        let property = parse_property(&self.gazetteer, request, self.geocoder.as_deref())
            .ok_or(AnalysisError::UnableToParse)?;

        let resolution = find_municipality(&self.gazetteer, &property)
            .ok_or(AnalysisError::MunicipalityNotFound)?;

        let policy = land_use_policies(&resolution.municipality, &property, &mut self.cache);

        let cottage_analysis = if property
            .property_details
            .development_intentions
            .iter()
            .any(|k| k == "cottages")
        {
            Some(cottage_development_analysis(&policy, &property.property_details))
        } else {
            None
        };

        let feasibility_summary = feasibility_summary(&policy);

        Ok(AnalysisReport {
            property_info: property,
            municipality_info: resolution.municipality,
            resolution_method: resolution.method,
            ambiguous_name_matches: resolution.ambiguous_with,
            policy_info: policy,
            cottage_analysis,
            analysis_date: chrono::Local::now().to_rfc3339(),
            feasibility_summary,
        })
    }
}

fn format_table(table: &Table) -> String {
    table
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Summarize development potential from the zoning string: residential,
/// commercial or mixed zoning reads High, agricultural or rural reads
/// Moderate, anything else Low.
pub fn feasibility_summary(policy: &PolicyRecord) -> FeasibilitySummary {
    let mut summary = FeasibilitySummary {
        development_potential: "Unknown".to_string(),
        key_considerations: Vec::new(),
        recommended_actions: Vec::new(),
    };

    if let Some(zoning) = &policy.zoning {
        let zoning_lower = zoning.to_lowercase();
        summary.development_potential = if ["residential", "commercial", "mixed"]
            .iter()
            .any(|term| zoning_lower.contains(term))
        {
            "High"
        } else if ["agricultural", "rural"]
            .iter()
            .any(|term| zoning_lower.contains(term))
        {
            "Moderate"
        } else {
            "Low"
        }
        .to_string();
    }

    if !policy.setbacks.is_empty() {
        summary
            .key_considerations
            .push(format!("Setback requirements: {}", format_table(&policy.setbacks)));
    }
    if !policy.density_restrictions.is_empty() {
        summary.key_considerations.push(format!(
            "Density restrictions: {}",
            format_table(&policy.density_restrictions)
        ));
    }
    summary
        .key_considerations
        .extend(policy.special_provisions.iter().cloned());

    summary.recommended_actions = [
        "Consult with municipal planning department",
        "Review detailed zoning bylaws",
        "Consider environmental assessments if required",
        "Verify utility availability and capacity",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    summary
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

/// Atomically write the analysis JSON into outdir under the doc_id stem:
/// temp file first, then rename.
pub fn emit_report(
    report: &serde_json::Value,
    outdir: &str,
    doc_id: &str,
) -> Result<String, EmitError> {
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let path = Path::new(outdir).join(format!("{}.analysis.json", doc_id));

    let pid = std::process::id();
    let tmp = path.with_extension(format!("analysis.json.tmp.{}", pid));

    let bytes =
        serde_json::to_vec_pretty(report).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::write(&tmp, bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, &path).map_err(|e| EmitError::WriteFailed(e.to_string()))?;

    Ok(path.to_string_lossy().to_string())
}
