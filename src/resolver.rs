use std::collections::BTreeMap;

use serde::Serialize;

use crate::gazetteer::{Gazetteer, LatLon, MunicipalityRecord};
use crate::parser::{LegalKind, ParsedAddress, ParsedLegal, PropertyRecord};

/// A resolved municipality: the static record plus which table it came from
/// and, for proximity matches, how far away it was. Athabasca sits in the
/// cities table despite being a town, so its category is "city".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Municipality {
    #[serde(flatten)]
    pub record: MunicipalityRecord,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    NameHint,
    Coordinates,
    LegalDescription,
    AddressComponents,
}

/// Outcome of the fallback chain. `ambiguous_with` lists the names of the
/// other table entries the winning hint also matched; callers may warn on a
/// non-empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub municipality: Municipality,
    pub method: ResolutionMethod,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_with: Vec<String>,
}

const PROXIMITY_LIMIT_KM: f64 = 50.0;

/// Apply the four fallback strategies in fixed priority order; the first
/// non-empty result wins. Returns `None` only when every strategy failed,
/// which callers must treat as a terminal "municipality not found".
pub fn find_municipality(gazetteer: &Gazetteer, property: &PropertyRecord) -> Option<Resolution> {
    for hint in &property.municipality_hints {
        if let Some((municipality, ambiguous_with)) = find_by_name(gazetteer, hint) {
            return Some(Resolution {
                municipality,
                method: ResolutionMethod::NameHint,
                ambiguous_with,
            });
        }
    }

    if let Some(point) = &property.coordinates {
        if let Some(municipality) = find_by_coordinates(gazetteer, point.latitude, point.longitude)
        {
            return Some(Resolution {
                municipality,
                method: ResolutionMethod::Coordinates,
                ambiguous_with: Vec::new(),
            });
        }
    }

    if let Some(legal) = &property.parsed_legal {
        if legal.kind != LegalKind::Unknown {
            if let Some(municipality) = find_by_legal_description(gazetteer, legal) {
                return Some(Resolution {
                    municipality,
                    method: ResolutionMethod::LegalDescription,
                    ambiguous_with: Vec::new(),
                });
            }
        }
    }

    if let Some(address) = &property.parsed_address {
        if let Some((municipality, ambiguous_with)) = find_by_address_components(gazetteer, address)
        {
            return Some(Resolution {
                municipality,
                method: ResolutionMethod::AddressComponents,
                ambiguous_with,
            });
        }
    }

    None
}

/// Case-insensitive name lookup, cities before counties. A table name
/// appearing anywhere inside the hint counts as a match, which can fire on
/// short names embedded in longer hints; the first match wins and the rest
/// are reported for the caller to log.
pub fn find_by_name(gazetteer: &Gazetteer, name: &str) -> Option<(Municipality, Vec<String>)> {
    let needle = name.to_lowercase();
    let mut matches: Vec<Municipality> = Vec::new();

    for (category, records) in [("city", &gazetteer.cities), ("county", &gazetteer.counties)] {
        for record in records.iter() {
            if needle.contains(&record.name.to_lowercase()) {
                matches.push(Municipality {
                    record: record.clone(),
                    category: category.to_string(),
                    distance_km: None,
                });
            }
        }
    }

    let mut iter = matches.into_iter();
    let first = iter.next()?;
    Some((first, iter.map(|m| m.record.name).collect()))
}

/// Nearest municipality within 50 km. Ties on distance keep the earlier
/// table entry: only a strictly smaller distance replaces the running
/// minimum.
pub fn find_by_coordinates(gazetteer: &Gazetteer, lat: f64, lon: f64) -> Option<Municipality> {
    let point = LatLon { lat, lon };
    let mut closest: Option<Municipality> = None;
    let mut closest_distance = f64::INFINITY;

    for (category, records) in [("city", &gazetteer.cities), ("county", &gazetteer.counties)] {
        for record in records.iter() {
            let distance = haversine_km(point, record.coordinates);
            if distance < PROXIMITY_LIMIT_KM && distance < closest_distance {
                closest_distance = distance;
                closest = Some(Municipality {
                    record: record.clone(),
                    category: category.to_string(),
                    distance_km: Some(distance),
                });
            }
        }
    }

    closest
}

/// Township/range heuristic: three disjoint bands map to Red Deer, Edmonton
/// and Athabasca. The bands share their township endpoints; the earlier band
/// wins the boundary because it is tested first.
pub fn find_by_legal_description(
    gazetteer: &Gazetteer,
    legal: &ParsedLegal,
) -> Option<Municipality> {
    if !matches!(legal.kind, LegalKind::QuarterSection | LegalKind::Section) {
        return None;
    }

    let township: i32 = legal.components.get("township")?.parse().ok()?;
    let range: i32 = legal.components.get("range")?.parse().ok()?;

    if !(20..=30).contains(&range) {
        return None;
    }
    let name = if (40..=50).contains(&township) {
        "Red Deer"
    } else if (50..=60).contains(&township) {
        "Edmonton"
    } else if (60..=70).contains(&township) {
        "Athabasca"
    } else {
        return None;
    };

    find_by_name(gazetteer, name).map(|(municipality, _)| municipality)
}

/// Last-resort strategy: mine the parsed address text for capitalized words
/// and bigrams, then re-run the name lookup on each.
pub fn find_by_address_components(
    gazetteer: &Gazetteer,
    address: &ParsedAddress,
) -> Option<(Municipality, Vec<String>)> {
    for hint in location_hints(&address.full_address) {
        if let Some(found) = find_by_name(gazetteer, &hint) {
            return Some(found);
        }
    }
    None
}

/// Capitalized-word heuristic: any word longer than three characters that
/// starts uppercase is a candidate place name, and so is the bigram formed
/// with a following capitalized word.
pub fn location_hints(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut hints = Vec::new();

    for (i, word) in words.iter().enumerate() {
        let starts_upper = word
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        if starts_upper && word.chars().count() > 3 {
            hints.push((*word).to_string());
            if let Some(next) = words.get(i + 1) {
                let next_upper = next
                    .chars()
                    .next()
                    .map(|c| c.is_uppercase())
                    .unwrap_or(false);
                if next_upper {
                    hints.push(format!("{} {}", word, next));
                }
            }
        }
    }

    hints
}

/// Great-circle distance in kilometres (haversine, mean earth radius).
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0088;
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Every municipality in the table, sorted by name.
pub fn supported_municipalities(gazetteer: &Gazetteer) -> Vec<Municipality> {
    let mut all: Vec<Municipality> = gazetteer
        .cities
        .iter()
        .map(|record| Municipality {
            record: record.clone(),
            category: "city".to_string(),
            distance_km: None,
        })
        .chain(gazetteer.counties.iter().map(|record| Municipality {
            record: record.clone(),
            category: "county".to_string(),
            distance_km: None,
        }))
        .collect();
    all.sort_by(|a, b| a.record.name.cmp(&b.record.name));
    all
}

#[derive(Debug, Clone, Serialize)]
pub struct MunicipalityDetails {
    #[serde(flatten)]
    pub municipality: Municipality,
    pub supported_services: Vec<String>,
    pub typical_processing_times: BTreeMap<String, String>,
}

/// Detail view for one municipality, extended with the services and
/// processing times relevant to a land-use inquiry.
pub fn municipality_details(gazetteer: &Gazetteer, name: &str) -> Option<MunicipalityDetails> {
    let (municipality, _) = find_by_name(gazetteer, name)?;
    let supported_services = [
        "Land Use Bylaw Information",
        "Zoning Maps",
        "Development Permits",
        "Subdivision Applications",
        "Planning Consultation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let typical_processing_times = [
        ("development_permit", "4-6 weeks"),
        ("subdivision", "3-6 months"),
        ("rezoning", "6-12 months"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Some(MunicipalityDetails {
        municipality,
        supported_services,
        typical_processing_times,
    })
}
