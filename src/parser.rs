use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::gazetteer::Gazetteer;
use crate::geocode::{GeoPoint, Geocoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Street,
    Rural,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAddress {
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub components: BTreeMap<String, String>,
    pub full_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalKind {
    QuarterSection,
    LotBlock,
    Parcel,
    Section,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLegal {
    #[serde(rename = "type")]
    pub kind: LegalKind,
    pub components: BTreeMap<String, String>,
    pub full_description: String,
}

/// Details scraped from the free-form notes. Buckets keep keyword-list
/// order and are never de-duplicated beyond the one-entry-per-keyword scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acreage: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zoning_hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub development_intentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infrastructure_mentions: Vec<String>,
}

impl PropertyDetails {
    pub fn is_empty(&self) -> bool {
        self.acreage.is_none()
            && self.zoning_hints.is_empty()
            && self.development_intentions.is_empty()
            && self.infrastructure_mentions.is_empty()
    }
}

/// The three free-text inputs of an analysis request, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub legal_description: String,
    #[serde(default)]
    pub additional_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub raw_input: RawInput,
    pub parsed_address: Option<ParsedAddress>,
    pub parsed_legal: Option<ParsedLegal>,
    pub coordinates: Option<GeoPoint>,
    pub municipality_hints: Vec<String>,
    pub property_details: PropertyDetails,
}

impl PropertyRecord {
    /// A record is usable when at least one signal survived parsing. Raw
    /// non-empty input counts as a signal of last resort.
    pub fn has_signal(&self) -> bool {
        let has_address = self
            .parsed_address
            .as_ref()
            .map(|a| a.kind != AddressKind::Unknown)
            .unwrap_or(false);
        let has_legal = self
            .parsed_legal
            .as_ref()
            .map(|l| l.kind != LegalKind::Unknown)
            .unwrap_or(false);
        let has_raw = !self.raw_input.address.is_empty()
            || !self.raw_input.legal_description.is_empty()
            || !self.raw_input.additional_info.is_empty();
        has_address
            || has_legal
            || self.coordinates.is_some()
            || !self.municipality_hints.is_empty()
            || !self.property_details.is_empty()
            || has_raw
    }
}

static STREET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+)\s+([A-Za-z0-9\s]+(?:Street|St|Avenue|Ave|Road|Rd|Drive|Dr|Lane|Ln|Boulevard|Blvd|Way|Circle|Cir|Court|Ct|Crescent|Cres))",
    )
    .unwrap()
});
static RURAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(RR|Rural Route|Range Road|Township Road|Highway|Hwy)\s*(\d+)").unwrap());
static POSTAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([A-Za-z]\d[A-Za-z]\s*\d[A-Za-z]\d)").unwrap());

static QUARTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([NSEW]{1,2})\s*(\d{1,2})\s*-\s*(\d{1,3})\s*-\s*(\d{1,3})\s*-\s*([WE])\s*(\d)")
        .unwrap()
});
static LOT_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)LOT\s*(\d+)\s*,?\s*BLOCK\s*(\d+)\s*,?\s*PLAN\s*(\w+)").unwrap());
static PARCEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)PARCEL\s*(\w+)\s*,?\s*PLAN\s*(\w+)").unwrap());
static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)SECTION\s*(\d{1,2})\s*,?\s*TOWNSHIP\s*(\d{1,3})\s*,?\s*RANGE\s*(\d{1,3})\s*,?\s*([WE])\s*(\d)",
    )
    .unwrap()
});

static ACREAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+\.?\d*)\s*acres?").unwrap());

const ZONING_KEYWORDS: &[&str] = &["commercial", "residential", "rural", "agricultural", "industrial"];
const DEVELOPMENT_KEYWORDS: &[&str] = &["develop", "cottages", "subdivision", "building", "construction"];
const INFRASTRUCTURE_KEYWORDS: &[&str] = &["septic", "water", "power", "sewer", "gas", "internet"];

/// Parse a street or rural address. The street pattern is tried first; a
/// rural match afterwards replaces both the type and the components. The
/// postal code attaches to whichever component map resulted, normalized to
/// uppercase with spaces stripped.
pub fn parse_address(address: &str) -> ParsedAddress {
    let mut parsed = ParsedAddress {
        kind: AddressKind::Unknown,
        components: BTreeMap::new(),
        full_address: address.trim().to_string(),
    };

    if let Some(caps) = STREET_RE.captures(address) {
        parsed.kind = AddressKind::Street;
        parsed.components.insert("number".into(), caps[1].to_string());
        parsed
            .components
            .insert("street".into(), caps[2].trim().to_string());
    }

    if let Some(caps) = RURAL_RE.captures(address) {
        parsed.kind = AddressKind::Rural;
        parsed.components.clear();
        parsed
            .components
            .insert("road_type".into(), caps[1].to_string());
        parsed
            .components
            .insert("road_number".into(), caps[2].to_string());
    }

    if let Some(caps) = POSTAL_RE.captures(address) {
        let code = caps[1].to_uppercase().replace(' ', "");
        parsed.components.insert("postal_code".into(), code);
    }

    parsed
}

/// Parse an Alberta legal land description. Patterns are tried in a fixed
/// order (quarter-section, lot/block, parcel, section) and the first match
/// wins.
pub fn parse_legal_description(legal_desc: &str) -> ParsedLegal {
    let mut parsed = ParsedLegal {
        kind: LegalKind::Unknown,
        components: BTreeMap::new(),
        full_description: legal_desc.trim().to_string(),
    };

    if let Some(caps) = QUARTER_RE.captures(legal_desc) {
        parsed.kind = LegalKind::QuarterSection;
        for (key, idx) in [
            ("quarter", 1),
            ("section", 2),
            ("township", 3),
            ("range", 4),
            ("meridian_direction", 5),
            ("meridian", 6),
        ] {
            parsed.components.insert(key.into(), caps[idx].to_string());
        }
    } else if let Some(caps) = LOT_BLOCK_RE.captures(legal_desc) {
        parsed.kind = LegalKind::LotBlock;
        for (key, idx) in [("lot", 1), ("block", 2), ("plan", 3)] {
            parsed.components.insert(key.into(), caps[idx].to_string());
        }
    } else if let Some(caps) = PARCEL_RE.captures(legal_desc) {
        parsed.kind = LegalKind::Parcel;
        for (key, idx) in [("parcel", 1), ("plan", 2)] {
            parsed.components.insert(key.into(), caps[idx].to_string());
        }
    } else if let Some(caps) = SECTION_RE.captures(legal_desc) {
        parsed.kind = LegalKind::Section;
        for (key, idx) in [
            ("section", 1),
            ("township", 2),
            ("range", 3),
            ("meridian_direction", 4),
            ("meridian", 5),
        ] {
            parsed.components.insert(key.into(), caps[idx].to_string());
        }
    }

    parsed
}

/// Case-insensitive scan of the combined input text against the gazetteer's
/// place-name lists. Hints come back in list order, municipalities before
/// counties, duplicates across the two lists preserved.
pub fn extract_municipality_hints(gazetteer: &Gazetteer, text: &str) -> Vec<String> {
    let text_lower = text.to_lowercase();
    gazetteer
        .hint_places()
        .filter(|place| text_lower.contains(&place.to_lowercase()))
        .map(|place| place.to_string())
        .collect()
}

/// Scrape acreage and keyword buckets out of the free-form notes. Only the
/// first acreage figure counts.
pub fn extract_property_details(additional_info: &str) -> PropertyDetails {
    let mut details = PropertyDetails::default();
    let text_lower = additional_info.to_lowercase();

    if let Some(caps) = ACREAGE_RE.captures(additional_info) {
        details.acreage = caps[1].parse::<f64>().ok();
    }

    for keyword in ZONING_KEYWORDS {
        if text_lower.contains(keyword) {
            details.zoning_hints.push((*keyword).to_string());
        }
    }
    for keyword in DEVELOPMENT_KEYWORDS {
        if text_lower.contains(keyword) {
            details.development_intentions.push((*keyword).to_string());
        }
    }
    for keyword in INFRASTRUCTURE_KEYWORDS {
        if text_lower.contains(keyword) {
            details.infrastructure_mentions.push((*keyword).to_string());
        }
    }

    details
}

/// Aggregate the raw inputs into a PropertyRecord. Geocoding runs only when
/// an address is present and a geocoder was supplied; its failures leave the
/// coordinates absent. Returns `None` when no field carries any signal.
pub fn parse_property(
    gazetteer: &Gazetteer,
    raw: &RawInput,
    geocoder: Option<&dyn Geocoder>,
) -> Option<PropertyRecord> {
    let mut record = PropertyRecord {
        raw_input: raw.clone(),
        parsed_address: None,
        parsed_legal: None,
        coordinates: None,
        municipality_hints: Vec::new(),
        property_details: PropertyDetails::default(),
    };

    if !raw.address.is_empty() {
        record.parsed_address = Some(parse_address(&raw.address));
        if let Some(geocoder) = geocoder {
            record.coordinates = geocoder.geocode(&raw.address);
        }
    }

    if !raw.legal_description.is_empty() {
        record.parsed_legal = Some(parse_legal_description(&raw.legal_description));
    }

    let all_text = format!(
        "{} {} {}",
        raw.address, raw.legal_description, raw.additional_info
    );
    record.municipality_hints = extract_municipality_hints(gazetteer, &all_text);

    if !raw.additional_info.is_empty() {
        record.property_details = extract_property_details(&raw.additional_info);
    }

    if record.has_signal() {
        Some(record)
    } else {
        None
    }
}
