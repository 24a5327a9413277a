use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::gazetteer::ContactInfo;
use crate::parser::{PropertyDetails, PropertyRecord};
use crate::resolver::Municipality;

pub type Table = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BylawSection {
    pub section: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BylawInfo {
    pub url: String,
    pub title: String,
    pub sections: Vec<BylawSection>,
}

/// Derived policy view for one property in one municipality. Ephemeral per
/// request apart from the bounded memo below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRecord {
    pub municipality: String,
    pub zoning: Option<String>,
    pub land_use_bylaw: Option<BylawInfo>,
    pub permitted_uses: Vec<String>,
    pub discretionary_uses: Vec<String>,
    pub setbacks: Table,
    pub density_restrictions: Table,
    pub height_restrictions: Table,
    pub special_provisions: Vec<String>,
    pub development_requirements: Vec<String>,
    pub contact_info: ContactInfo,
    pub last_updated: String,
}

/// Process-wide memo for policy lookups, bounded by entry count with
/// oldest-inserted eviction. Replaces the original's unbounded cache; the
/// key still pairs the municipality name with a digest of the property
/// record.
pub struct PolicyCache {
    capacity: usize,
    entries: HashMap<String, PolicyRecord>,
    order: VecDeque<String>,
}

impl PolicyCache {
    pub fn new(capacity: usize) -> Self {
        PolicyCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PolicyRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, record: PolicyRecord) {
        if self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, record);
    }
}

impl Default for PolicyCache {
    fn default() -> Self {
        PolicyCache::new(256)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}

fn cache_key(municipality_name: &str, property: &PropertyRecord) -> String {
    let bytes = serde_json::to_vec(property).unwrap_or_default();
    format!("{}_{}", municipality_name, sha256_hex(&bytes))
}

struct ZoningInfo {
    zoning: &'static str,
    permitted_uses: &'static [&'static str],
    discretionary_uses: &'static [&'static str],
}

/// Mock zoning determination: commercial hint plus acreage over five acres
/// maps to Rural Commercial, a small commercial parcel to Community
/// Commercial, a rural hint or more than two acres to Rural Residential,
/// anything else to Single Family Residential.
fn determine_zoning(details: &PropertyDetails) -> ZoningInfo {
    let acreage = details.acreage.unwrap_or(0.0);
    let has_hint = |hint: &str| details.zoning_hints.iter().any(|h| h == hint);

    if has_hint("commercial") {
        if acreage > 5.0 {
            ZoningInfo {
                zoning: "RC - Rural Commercial",
                permitted_uses: &[
                    "Tourist accommodation",
                    "Recreation facilities",
                    "Small scale retail",
                    "Restaurants",
                    "Bed and breakfast",
                ],
                discretionary_uses: &[
                    "Cottage development",
                    "RV parks",
                    "Event facilities",
                    "Conference centers",
                ],
            }
        } else {
            ZoningInfo {
                zoning: "C2 - Community Commercial",
                permitted_uses: &["Retail stores", "Restaurants", "Offices", "Personal services"],
                discretionary_uses: &[],
            }
        }
    } else if has_hint("rural") || acreage > 2.0 {
        ZoningInfo {
            zoning: "RUR - Rural Residential",
            permitted_uses: &[
                "Single family dwelling",
                "Home occupation",
                "Agriculture (limited)",
                "Accessory buildings",
            ],
            discretionary_uses: &[
                "Bed and breakfast",
                "Secondary suite",
                "Small scale tourism",
            ],
        }
    } else {
        ZoningInfo {
            zoning: "R1 - Single Family Residential",
            permitted_uses: &["Single family dwelling", "Home occupation", "Accessory buildings"],
            discretionary_uses: &[],
        }
    }
}

// The ordered rule chains below replace the original if/elif ladders: each
// is a top-to-bottom list of (substring needles, table rows) with an
// explicit default. Needle matching is case-sensitive against the zoning
// string.
type TableRows = &'static [(&'static str, &'static str)];
type RuleChain = &'static [(&'static [&'static str], TableRows)];

const SETBACK_RULES: RuleChain = &[
    (
        &["R1", "Single Family"],
        &[("front", "7.5 meters"), ("rear", "7.5 meters"), ("side", "1.5 meters")],
    ),
    (
        &["RC", "Rural Commercial"],
        &[("front", "15 meters"), ("rear", "15 meters"), ("side", "7.5 meters")],
    ),
    (
        &["RUR", "Rural"],
        &[("front", "30 meters"), ("rear", "15 meters"), ("side", "15 meters")],
    ),
];
const SETBACK_DEFAULT: TableRows =
    &[("front", "6 meters"), ("rear", "6 meters"), ("side", "3 meters")];

const DENSITY_RULES: RuleChain = &[
    (
        &["RC", "Rural Commercial"],
        &[
            ("maximum_site_coverage", "40%"),
            ("maximum_floor_area_ratio", "0.5"),
            ("minimum_lot_size", "2 hectares"),
        ],
    ),
    (
        &["RUR", "Rural"],
        &[
            ("maximum_site_coverage", "25%"),
            ("minimum_lot_size", "2 hectares"),
            ("maximum_dwelling_units", "1 per lot"),
        ],
    ),
    (
        &["R1"],
        &[
            ("maximum_site_coverage", "35%"),
            ("minimum_lot_size", "600 square meters"),
            ("maximum_dwelling_units", "1 per lot"),
        ],
    ),
];
const DENSITY_DEFAULT: TableRows = &[];

const HEIGHT_RULES: RuleChain = &[
    (
        &["RC", "Commercial"],
        &[("maximum_height", "12 meters"), ("maximum_stories", "3")],
    ),
    (
        &["RUR", "Rural"],
        &[("maximum_height", "10 meters"), ("maximum_stories", "2.5")],
    ),
];
const HEIGHT_DEFAULT: TableRows =
    &[("maximum_height", "9 meters"), ("maximum_stories", "2.5")];

fn rows_to_table(rows: TableRows) -> Table {
    rows.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn lookup_table(zoning: &str, rules: RuleChain, default: TableRows) -> Table {
    let rows = rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| zoning.contains(needle)))
        .map(|(_, rows)| *rows)
        .unwrap_or(default);
    rows_to_table(rows)
}

pub fn typical_setbacks(zoning: &str) -> Table {
    lookup_table(zoning, SETBACK_RULES, SETBACK_DEFAULT)
}

pub fn density_restrictions(zoning: &str) -> Table {
    lookup_table(zoning, DENSITY_RULES, DENSITY_DEFAULT)
}

pub fn height_restrictions(zoning: &str) -> Table {
    lookup_table(zoning, HEIGHT_RULES, HEIGHT_DEFAULT)
}

fn bylaw_information(municipality: &Municipality) -> Option<BylawInfo> {
    let url = municipality.record.land_use_bylaw.clone();
    if url.is_empty() {
        return None;
    }
    let sections = [
        ("1", "Definitions and General Provisions", "Basic definitions and general requirements"),
        ("2", "Zoning Districts", "Description of all zoning districts and their purposes"),
        ("3", "General Regulations", "Setbacks, height limits, parking requirements"),
        ("4", "Development Permits", "Development permit application process and requirements"),
        ("5", "Subdivision", "Subdivision regulations and approval process"),
    ]
    .iter()
    .map(|(section, title, description)| BylawSection {
        section: section.to_string(),
        title: title.to_string(),
        description: description.to_string(),
    })
    .collect();
    Some(BylawInfo {
        url,
        title: format!("{} Land Use Bylaw", municipality.record.name),
        sections,
    })
}

fn development_requirements(municipality: &Municipality, zoning: &str) -> Vec<String> {
    let mut requirements: Vec<&str> = vec![
        "Development permit required",
        "Building permit required",
        "Compliance with Alberta Building Code",
    ];

    let zoning_lower = zoning.to_lowercase();
    if zoning_lower.contains("commercial") {
        requirements.extend([
            "Site plan approval required",
            "Parking plan submission",
            "Landscaping plan required",
            "Signage approval needed",
        ]);
    }
    if zoning_lower.contains("rural") {
        requirements.extend([
            "Septic system approval (if applicable)",
            "Water well testing (if applicable)",
            "Environmental assessment may be required",
            "Agricultural impact assessment",
        ]);
    }
    if municipality.record.name.contains("County") {
        requirements.extend([
            "County road access approval",
            "Fire protection plan",
            "Waste management plan",
        ]);
    }

    requirements.iter().map(|s| s.to_string()).collect()
}

/// Pure policy derivation for (municipality, property), memoized in the
/// bounded cache.
pub fn land_use_policies(
    municipality: &Municipality,
    property: &PropertyRecord,
    cache: &mut PolicyCache,
) -> PolicyRecord {
    let key = cache_key(&municipality.record.name, property);
    if let Some(hit) = cache.get(&key) {
        return hit.clone();
    }

    let zoning_info = determine_zoning(&property.property_details);
    let zoning = zoning_info.zoning.to_string();

    let record = PolicyRecord {
        municipality: municipality.record.name.clone(),
        zoning: Some(zoning.clone()),
        land_use_bylaw: bylaw_information(municipality),
        permitted_uses: zoning_info.permitted_uses.iter().map(|s| s.to_string()).collect(),
        discretionary_uses: zoning_info
            .discretionary_uses
            .iter()
            .map(|s| s.to_string())
            .collect(),
        setbacks: typical_setbacks(&zoning),
        density_restrictions: density_restrictions(&zoning),
        height_restrictions: height_restrictions(&zoning),
        special_provisions: Vec::new(),
        development_requirements: development_requirements(municipality, &zoning),
        contact_info: municipality.record.contact_info.clone(),
        last_updated: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    cache.insert(key, record.clone());
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Feasibility {
    High,
    Moderate,
    Low,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CottagePotential {
    pub total_acreage: f64,
    pub developable_acreage: f64,
    pub estimated_cottage_units: u32,
    pub phased_development: bool,
    pub recommended_phase_1: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CottageAnalysis {
    pub feasibility: Feasibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cottage_potential: Option<CottagePotential>,
    pub regulatory_considerations: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Cottage-development sizing. The unit estimate only fires for Rural
/// Commercial zoning on fourteen acres or more, and only when the density
/// table carries the literal "40%" coverage figure; any other percentage
/// skips the calculation.
pub fn cottage_development_analysis(
    policy: &PolicyRecord,
    details: &PropertyDetails,
) -> CottageAnalysis {
    let zoning = policy.zoning.clone().unwrap_or_default();
    let acreage = details.acreage.unwrap_or(0.0);

    let mut analysis = CottageAnalysis {
        feasibility: Feasibility::Unknown,
        cottage_potential: None,
        regulatory_considerations: Vec::new(),
        next_steps: Vec::new(),
    };

    if zoning.contains("Rural Commercial") || zoning.contains("RC") {
        analysis.feasibility = Feasibility::High;

        if acreage >= 14.0 {
            let max_coverage = policy
                .density_restrictions
                .get("maximum_site_coverage")
                .cloned()
                .unwrap_or_else(|| "40%".to_string());
            if max_coverage.contains("40%") {
                let developable_acreage = acreage * 0.4;
                // 4-5 cottages per acre, truncated
                let estimated_cottage_units = (developable_acreage * 4.5) as u32;
                analysis.cottage_potential = Some(CottagePotential {
                    total_acreage: acreage,
                    developable_acreage,
                    estimated_cottage_units,
                    phased_development: true,
                    recommended_phase_1: estimated_cottage_units.min(5),
                });
            }
        }

        analysis.regulatory_considerations = [
            "Tourist accommodation is typically permitted use",
            "Development permit required for each phase",
            "Site plan approval needed",
            "Septic system capacity assessment required",
            "Water supply adequacy verification needed",
            "Fire access and safety plan required",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
    } else if zoning.contains("Rural") {
        analysis.feasibility = Feasibility::Moderate;
        analysis.regulatory_considerations = [
            "May require rezoning to Rural Commercial",
            "Discretionary use application may be possible",
            "Bed and breakfast operations typically allowed",
            "Small scale tourism may be permitted",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
    } else {
        analysis.feasibility = Feasibility::Low;
        analysis.regulatory_considerations = [
            "Rezoning likely required",
            "Commercial use not typically permitted",
            "Significant regulatory hurdles expected",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
    }

    analysis.next_steps = [
        "Schedule pre-application meeting with planning department",
        "Obtain detailed zoning map and bylaw review",
        "Conduct environmental site assessment",
        "Verify utility capacity and availability",
        "Consult with development engineer",
        "Prepare preliminary site plan",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    analysis
}
