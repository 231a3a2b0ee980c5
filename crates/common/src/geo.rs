//! Geospatial helpers: 8-character geohash prefixes and style sharding.

use geohash::encode;
use geohash::Coord;

/// Encodes a coordinate into the 8-character geohash prefix used throughout
/// the catalog for coarse geographic filtering (§GLOSSARY).
pub fn geohash_prefix(lat: f64, lng: f64) -> String {
    encode(Coord { x: lng, y: lat }, 8).unwrap_or_default()
}

/// Number of logical shards a style is bucketed across (§4.1).
pub const STYLE_SHARD_COUNT: u32 = 10;

/// Hashes an artist id into one of `STYLE_SHARD_COUNT` logical partitions,
/// so that listing artists by a popular style fans out across shards
/// instead of hammering a single hot partition key.
pub fn style_shard_for_artist(artist_id: &uuid::Uuid) -> u32 {
    let bytes = artist_id.as_bytes();
    let mut acc: u32 = 2166136261; // FNV offset basis
    for b in bytes {
        acc ^= *b as u32;
        acc = acc.wrapping_mul(16777619);
    }
    acc % STYLE_SHARD_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geohash_prefix_is_eight_chars() {
        let gh = geohash_prefix(44.9778, -93.2650);
        assert_eq!(gh.chars().count(), 8);
    }

    #[test]
    fn style_shard_is_deterministic_and_bounded() {
        let id = uuid::Uuid::new_v4();
        let shard1 = style_shard_for_artist(&id);
        let shard2 = style_shard_for_artist(&id);
        assert_eq!(shard1, shard2);
        assert!(shard1 < STYLE_SHARD_COUNT);
    }

    #[test]
    fn style_shard_spreads_across_many_ids() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(style_shard_for_artist(&uuid::Uuid::new_v4()));
        }
        // With 200 random ids we should see most of the 10 shards populated.
        assert!(seen.len() >= STYLE_SHARD_COUNT as usize - 2);
    }
}
