//! Maps a UK postcode to its geohash prefix (§4.6, §6 "optional geospatial
//! filter derived from a postcode-to-geohash mapping"). A production
//! deployment would call an external geocoding service; this ships a small
//! outward-code lookup table, the same static-seed-table shape used
//! throughout the catalog for controlled vocabularies.

use core_common::geo::geohash_prefix;

use crate::error::ApiError;

/// (outward code, latitude, longitude) for the districts this table covers,
/// matched by the longest prefix of the normalized postcode.
const OUTWARD_CODES: &[(&str, f64, f64)] = &[
    ("SW1A", 51.5010, -0.1416), // London, Westminster
    ("SW", 51.4772, -0.1637),   // London, south-west
    ("SE", 51.4730, -0.0820),   // London, south-east
    ("EC", 51.5155, -0.0922),   // London, City
    ("N", 51.5588, -0.1097),    // London, north
    ("E", 51.5255, -0.0453),    // London, east
    ("M", 53.4808, -2.2426),    // Manchester
    ("B", 52.4862, -1.8904),    // Birmingham
    ("LS", 53.8008, -1.5491),   // Leeds
    ("G", 55.8642, -4.2518),    // Glasgow
    ("EH", 55.9533, -3.1883),   // Edinburgh
    ("BS", 51.4545, -2.5879),   // Bristol
    ("L", 53.4084, -2.9916),    // Liverpool
    ("NE", 54.9783, -1.6178),   // Newcastle upon Tyne
    ("S", 53.3811, -1.4701),    // Sheffield
];

/// Resolves a postcode to an 8-character geohash prefix via the longest
/// matching outward-code entry. Returns `None` when no district in the
/// table matches.
pub fn postcode_to_geohash(postcode: &str) -> Option<String> {
    let normalized: String = postcode.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();
    OUTWARD_CODES
        .iter()
        .filter(|(prefix, _, _)| normalized.starts_with(prefix))
        .max_by_key(|(prefix, _, _)| prefix.len())
        .map(|(_, lat, lng)| geohash_prefix(*lat, *lng))
}

/// Validates and converts a `postcode` query parameter into a geohash
/// prefix suitable for `SearchQuery::geohash_prefix`.
pub fn validate_postcode(postcode: &str) -> Result<String, ApiError> {
    postcode_to_geohash(postcode).ok_or_else(|| ApiError::InvalidInput {
        field: "postcode".to_string(),
        reason: "postcode district not recognized".to_string(),
    })
}
