use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference point for a municipality, decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MunicipalityKind {
    City,
    Town,
    County,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MunicipalityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u32>,
    pub coordinates: LatLon,
    pub website: String,
    pub planning_dept: String,
    pub land_use_bylaw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning_map: Option<String>,
    pub contact_info: ContactInfo,
}

/// Static municipality table plus the place-name list used for hint
/// extraction. Constructed once at startup and passed explicitly into the
/// resolver and policy engine; never mutated afterwards.
///
/// The hint lists are wider than the record tables on purpose: the scan
/// recognizes place names the resolver has no record for, and those hints
/// simply fail name resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gazetteer {
    pub cities: Vec<MunicipalityRecord>,
    pub counties: Vec<MunicipalityRecord>,
    #[serde(default)]
    pub hint_municipalities: Vec<String>,
    #[serde(default)]
    pub hint_counties: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("Failed to read gazetteer: {0}")]
    Read(String),
    #[error("Failed to parse gazetteer: {0}")]
    Parse(String),
    #[error("Invalid gazetteer: {0}")]
    Invalid(String),
}

// Alberta municipalities between Red Deer and Athabasca, scanned in this
// order. Hints preserve list order, not input order.
const HINT_MUNICIPALITIES: &[&str] = &[
    "Red Deer",
    "Lacombe",
    "Ponoka",
    "Wetaskiwin",
    "Camrose",
    "Leduc",
    "Edmonton",
    "St. Albert",
    "Sherwood Park",
    "Fort Saskatchewan",
    "Morinville",
    "Legal",
    "Bon Accord",
    "Gibbons",
    "Redwater",
    "Smoky Lake",
    "Vilna",
    "Mundare",
    "Lamont",
    "Bruderheim",
    "Athabasca",
    "Boyle",
    "Westlock",
    "Barrhead",
    "Mayerthorpe",
    "Whitecourt",
    "Slave Lake",
    "High Prairie",
    "Valleyview",
];

const HINT_COUNTIES: &[&str] = &[
    "Lacombe County",
    "Ponoka County",
    "Wetaskiwin County",
    "Camrose County",
    "Leduc County",
    "Strathcona County",
    "Sturgeon County",
    "Parkland County",
    "Lac Ste. Anne County",
    "Barrhead County",
    "Westlock County",
    "Athabasca County",
];

#[allow(clippy::too_many_arguments)]
fn muni(
    name: &str,
    kind: MunicipalityKind,
    population: Option<u32>,
    lat: f64,
    lon: f64,
    website: &str,
    planning_dept: &str,
    land_use_bylaw: &str,
    zoning_map: Option<&str>,
    phone: &str,
    office: &str,
) -> MunicipalityRecord {
    MunicipalityRecord {
        name: name.to_string(),
        kind,
        population,
        coordinates: LatLon { lat, lon },
        website: website.to_string(),
        planning_dept: planning_dept.to_string(),
        land_use_bylaw: land_use_bylaw.to_string(),
        zoning_map: zoning_map.map(|s| s.to_string()),
        contact_info: ContactInfo {
            phone: phone.to_string(),
            address: office.to_string(),
        },
    }
}

impl Gazetteer {
    /// The embedded municipality table. Table order matters: proximity
    /// resolution breaks distance ties in favour of the earlier entry.
    pub fn builtin() -> Self {
        use MunicipalityKind::{City, County, Town};
        let cities = vec![
            muni(
                "Red Deer",
                City,
                Some(100_844),
                52.2681,
                -113.8112,
                "https://www.reddeer.ca",
                "planning@reddeer.ca",
                "https://www.reddeer.ca/city-government/bylaws-and-policies/land-use-bylaw/",
                Some("https://www.reddeer.ca/city-services/planning-and-development/zoning-maps/"),
                "403-342-8111",
                "4914 48th Ave, Red Deer, AB T4N 3T4",
            ),
            muni(
                "Edmonton",
                City,
                Some(1_010_899),
                53.5461,
                -113.4938,
                "https://www.edmonton.ca",
                "development@edmonton.ca",
                "https://www.edmonton.ca/city_government/bylaws/zoning-bylaw",
                Some("https://maps.edmonton.ca/map.aspx?id=ZoningBylaw"),
                "311",
                "1 Sir Winston Churchill Square, Edmonton, AB T5J 2R7",
            ),
            muni(
                "Lacombe",
                City,
                Some(13_057),
                52.4675,
                -113.7364,
                "https://www.lacombe.ca",
                "planning@lacombe.ca",
                "https://www.lacombe.ca/government/bylaws/",
                None,
                "403-782-6666",
                "5432 56 Ave, Lacombe, AB T4L 1E9",
            ),
            muni(
                "Wetaskiwin",
                City,
                Some(12_655),
                52.9692,
                -113.3747,
                "https://www.wetaskiwin.ca",
                "planning@wetaskiwin.ca",
                "https://www.wetaskiwin.ca/government/bylaws-policies/",
                None,
                "780-361-4400",
                "4905 50 Ave, Wetaskiwin, AB T9A 0S7",
            ),
            muni(
                "Camrose",
                City,
                Some(18_742),
                53.0167,
                -112.8333,
                "https://www.camrose.ca",
                "planning@camrose.ca",
                "https://www.camrose.ca/government/bylaws/",
                None,
                "780-672-4428",
                "4703 50 Ave, Camrose, AB T4V 0P7",
            ),
            // Athabasca is a town but lives in the cities table; resolved
            // results report category "city" for it, as the source data did.
            muni(
                "Athabasca",
                Town,
                Some(2_965),
                54.7186,
                -113.2856,
                "https://www.athabasca.ca",
                "cao@athabasca.ca",
                "https://www.athabasca.ca/government/bylaws/",
                None,
                "780-675-2273",
                "4904 50 St, Athabasca, AB T9S 1E2",
            ),
        ];
        let counties = vec![
            muni(
                "Lacombe County",
                County,
                None,
                52.4000,
                -113.8000,
                "https://www.lacombecounty.com",
                "planning@lacombecounty.com",
                "https://www.lacombecounty.com/government/bylaws/",
                None,
                "403-782-8060",
                "4611 52 Ave, Lacombe, AB T4L 1G3",
            ),
            muni(
                "Ponoka County",
                County,
                None,
                52.6833,
                -113.5833,
                "https://www.ponokacounty.com",
                "planning@ponokacounty.com",
                "https://www.ponokacounty.com/government/bylaws/",
                None,
                "403-783-3333",
                "5506 57 Ave, Ponoka, AB T4J 1A1",
            ),
            muni(
                "Wetaskiwin County",
                County,
                None,
                53.0000,
                -113.5000,
                "https://www.county.wetaskiwin.ab.ca",
                "planning@county.wetaskiwin.ab.ca",
                "https://www.county.wetaskiwin.ab.ca/government/bylaws/",
                None,
                "780-352-3321",
                "Multi-Municipal Building, 4905 51 Ave, Wetaskiwin, AB T9A 1P2",
            ),
            muni(
                "Camrose County",
                County,
                None,
                53.0000,
                -112.5000,
                "https://www.camrosecounty.ab.ca",
                "planning@camrosecounty.ab.ca",
                "https://www.camrosecounty.ab.ca/government/bylaws/",
                None,
                "780-672-4446",
                "#10, 3755 43 Ave, Camrose, AB T4V 3S8",
            ),
            muni(
                "Leduc County",
                County,
                None,
                53.2667,
                -113.5500,
                "https://www.leduc-county.com",
                "planning@leduc-county.com",
                "https://www.leduc-county.com/government/bylaws/",
                None,
                "780-955-3555",
                "1101 5 St, Nisku, AB T9E 2X3",
            ),
            muni(
                "Strathcona County",
                County,
                None,
                53.5167,
                -113.2000,
                "https://www.strathcona.ca",
                "planning@strathcona.ca",
                "https://www.strathcona.ca/council-county/bylaws/",
                None,
                "780-464-8111",
                "2001 Sherwood Dr, Sherwood Park, AB T8A 3W7",
            ),
            muni(
                "Sturgeon County",
                County,
                None,
                53.8000,
                -113.6000,
                "https://www.sturgeoncounty.ca",
                "planning@sturgeoncounty.ca",
                "https://www.sturgeoncounty.ca/government/bylaws/",
                None,
                "780-939-4321",
                "9613 100 St, Morinville, AB T8R 1L9",
            ),
            muni(
                "Parkland County",
                County,
                None,
                53.7000,
                -114.0000,
                "https://www.parklandcounty.com",
                "planning@parklandcounty.com",
                "https://www.parklandcounty.com/government/bylaws/",
                None,
                "780-968-8888",
                "53109A Hwy 779, Parkland County, AB T7Z 1R1",
            ),
            muni(
                "Athabasca County",
                County,
                None,
                54.5000,
                -113.0000,
                "https://www.athabascacounty.com",
                "planning@athabascacounty.com",
                "https://www.athabascacounty.com/government/bylaws/",
                None,
                "780-675-2273",
                "4904 50 St, Athabasca, AB T9S 1E2",
            ),
        ];
        Gazetteer {
            cities,
            counties,
            hint_municipalities: HINT_MUNICIPALITIES.iter().map(|s| s.to_string()).collect(),
            hint_counties: HINT_COUNTIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load a substitute table from YAML. Hint lists default to the record
    /// names when the file omits them, so a substitute table also drives
    /// hint extraction.
    pub fn from_yaml_file(path: &Path) -> Result<Self, GazetteerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| GazetteerError::Read(e.to_string()))?;
        let mut gazetteer: Gazetteer =
            serde_yaml::from_str(&raw).map_err(|e| GazetteerError::Parse(e.to_string()))?;
        if gazetteer.hint_municipalities.is_empty() && gazetteer.hint_counties.is_empty() {
            gazetteer.hint_municipalities =
                gazetteer.cities.iter().map(|r| r.name.clone()).collect();
            gazetteer.hint_counties = gazetteer.counties.iter().map(|r| r.name.clone()).collect();
        }
        gazetteer.validate()?;
        Ok(gazetteer)
    }

    pub fn validate(&self) -> Result<(), GazetteerError> {
        if self.cities.is_empty() && self.counties.is_empty() {
            return Err(GazetteerError::Invalid("no municipalities defined".into()));
        }
        for record in self.cities.iter().chain(self.counties.iter()) {
            if record.name.trim().is_empty() {
                return Err(GazetteerError::Invalid("municipality with empty name".into()));
            }
            let LatLon { lat, lon } = record.coordinates;
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(GazetteerError::Invalid(format!(
                    "coordinates out of range for {}",
                    record.name
                )));
            }
        }
        Ok(())
    }

    /// All hint place names in scan order: municipalities, then counties.
    /// Duplicates across the two lists are kept.
    pub fn hint_places(&self) -> impl Iterator<Item = &str> {
        self.hint_municipalities
            .iter()
            .chain(self.hint_counties.iter())
            .map(|s| s.as_str())
    }
}
