use hkmap_shared::error::RemoteSearchError;
use hkmap_shared::models::{CandidateSource, SearchCandidate};

const SEARCH_ENDPOINT: &str = "https://www.map.gov.hk/gs/api/v1.0.0/locationSearch";

/// Parse a location-search response body into candidates tagged with remote
/// provenance. The payload is a bare JSON array; coordinates are HK1980
/// grid easting/northing.
pub fn parse_locations(body: &str) -> Result<Vec<SearchCandidate>, RemoteSearchError> {
    let mut candidates: Vec<SearchCandidate> =
        serde_json::from_str(body).map_err(|e| RemoteSearchError::Payload(e.to_string()))?;
    for candidate in &mut candidates {
        candidate.source = CandidateSource::Remote;
    }
    Ok(candidates)
}

/// Query the public location-search service. Every failure maps onto
/// [`RemoteSearchError`]; the caller treats any of them as zero remote
/// results.
pub async fn remote_search(query: &str) -> Result<Vec<SearchCandidate>, RemoteSearchError> {
    let resp = reqwest::Client::new()
        .get(SEARCH_ENDPOINT)
        .query(&[("q", query)])
        .send()
        .await
        .map_err(|e| RemoteSearchError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(RemoteSearchError::Status(status.as_u16()));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| RemoteSearchError::Transport(e.to_string()))?;
    parse_locations(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations_tags_remote_source() {
        let body = r#"[
            {"nameZH":"旺角","nameEN":"Mong Kok","x":835497.9,"y":820032.9,"districtZH":"油尖旺區"},
            {"nameZH":"旺角東站","nameEN":"Mong Kok East Station","x":836120.0,"y":820355.0,"addressEN":"Argyle Street"}
        ]"#;
        let candidates = parse_locations(body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates
            .iter()
            .all(|c| c.source == CandidateSource::Remote));
        assert_eq!(candidates[0].name_zh, "旺角");
        assert_eq!(candidates[0].district_zh.as_deref(), Some("油尖旺區"));
        assert_eq!(
            candidates[1].address_en.as_deref(),
            Some("Argyle Street")
        );
    }

    #[test]
    fn test_parse_locations_empty_array() {
        assert!(parse_locations("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_locations_rejects_non_array_payload() {
        let err = parse_locations(r#"{"error":"rate limited"}"#).unwrap_err();
        assert!(matches!(err, RemoteSearchError::Payload(_)));
    }

    #[test]
    fn test_parse_locations_rejects_malformed_json() {
        let err = parse_locations("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, RemoteSearchError::Payload(_)));
    }

    #[test]
    fn test_parse_locations_requires_coordinates() {
        // An entry without x/y is a malformed payload, not a silent skip.
        let err = parse_locations(r#"[{"nameZH":"旺角","nameEN":"Mong Kok"}]"#).unwrap_err();
        assert!(matches!(err, RemoteSearchError::Payload(_)));
    }
}
