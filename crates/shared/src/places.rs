//! Curated local place dataset, consulted synchronously by the search
//! merger. Grid coordinates are HK1980 easting/northing, consistent with
//! the projection module.

use std::sync::OnceLock;

use crate::models::SearchCandidate;

const PLACES_JSON: &str = include_str!("places.json");

static PLACES: OnceLock<Vec<SearchCandidate>> = OnceLock::new();

/// The fixed curated dataset. Parsed once; every entry carries
/// `CandidateSource::Curated` provenance.
pub fn curated_places() -> &'static [SearchCandidate] {
    PLACES.get_or_init(|| {
        serde_json::from_str(PLACES_JSON).expect("embedded places dataset is valid JSON")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateSource;
    use crate::projection;

    #[test]
    fn test_dataset_parses_and_is_nonempty() {
        assert!(!curated_places().is_empty());
    }

    #[test]
    fn test_all_entries_are_curated_with_both_names() {
        for place in curated_places() {
            assert_eq!(place.source, CandidateSource::Curated);
            assert!(!place.name_zh.is_empty());
            assert!(!place.name_en.is_empty());
            assert!(place.district_zh.is_some());
        }
    }

    #[test]
    fn test_all_entries_convert_inside_the_region() {
        // The dataset must never produce a candidate the transformer rejects.
        for place in curated_places() {
            let geo = projection::to_geographic(place.x, place.y)
                .unwrap_or_else(|e| panic!("{}: {e}", place.name_en));
            assert!(geo.lat > projection::REGION_LAT_MIN);
            assert!(geo.lat < projection::REGION_LAT_MAX);
        }
    }
}
