//! Multi-source search-result merging.
//!
//! Local curated matches are computed synchronously; the remote lookup runs
//! asynchronously and its completion is routed back through
//! [`SearchSession::complete`] with the request's sequence number, so a
//! response for a superseded query is dropped on the floor.

use crate::error::RemoteSearchError;
use crate::models::SearchCandidate;

/// Upper bound on merged results shown to the user.
pub const MAX_RESULTS: usize = 5;

/// Trim and case-fold a raw query. An empty normalized query means "do not
/// search".
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Case-folded substring match of `normalized_query` against the dataset's
/// primary (`nameZH`) names. Containment, not prefix.
pub fn local_matches(dataset: &[SearchCandidate], normalized_query: &str) -> Vec<SearchCandidate> {
    if normalized_query.is_empty() {
        return Vec::new();
    }
    dataset
        .iter()
        .filter(|c| c.name_zh.to_lowercase().contains(normalized_query))
        .cloned()
        .collect()
}

/// Dedup key: secondary (`nameEN`) name when present, else primary, both
/// case-folded.
fn dedup_key(candidate: &SearchCandidate) -> String {
    let en = candidate.name_en.trim();
    if en.is_empty() {
        candidate.name_zh.trim().to_lowercase()
    } else {
        en.to_lowercase()
    }
}

/// Priority merge: local before remote, first occurrence of a dedup key
/// wins, truncated to [`MAX_RESULTS`].
pub fn merge_results(
    local: Vec<SearchCandidate>,
    remote: Vec<SearchCandidate>,
) -> Vec<SearchCandidate> {
    let mut seen = std::collections::HashSet::new();
    local
        .into_iter()
        .chain(remote)
        .filter(|c| seen.insert(dedup_key(c)))
        .take(MAX_RESULTS)
        .collect()
}

/// Result tri-state: a caller renders "no results" only after a real attempt.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchStatus {
    #[default]
    NotSearched,
    Searched(Vec<SearchCandidate>),
}

impl SearchStatus {
    pub fn results(&self) -> &[SearchCandidate] {
        match self {
            SearchStatus::NotSearched => &[],
            SearchStatus::Searched(results) => results,
        }
    }

    pub fn attempted(&self) -> bool {
        matches!(self, SearchStatus::Searched(_))
    }
}

/// Ticket handed to the caller when a search begins; its sequence number must
/// accompany the remote response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub seq: u64,
    pub query: String,
}

/// Single-owner search state machine with a latest-query-wins discipline.
#[derive(Debug, Default)]
pub struct SearchSession {
    seq: u64,
    pending_local: Vec<SearchCandidate>,
    status: SearchStatus,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Start a search. A blank query clears prior results, invalidates any
    /// in-flight request and returns `None` (no lookup is issued). Otherwise
    /// local matches are captured immediately and the returned ticket's
    /// query should be sent to the remote service.
    pub fn begin(&mut self, raw_query: &str, dataset: &[SearchCandidate]) -> Option<SearchRequest> {
        self.seq += 1;
        let query = normalize_query(raw_query);
        if query.is_empty() {
            self.pending_local.clear();
            self.status = SearchStatus::NotSearched;
            return None;
        }
        self.pending_local = local_matches(dataset, &query);
        Some(SearchRequest {
            seq: self.seq,
            query,
        })
    }

    /// Apply a remote completion. Stale responses (the query changed since)
    /// are ignored; a remote failure degrades to local-only results.
    /// Returns whether the response was applied.
    pub fn complete(
        &mut self,
        seq: u64,
        remote: Result<Vec<SearchCandidate>, RemoteSearchError>,
    ) -> bool {
        if seq != self.seq {
            return false;
        }
        let remote = match remote {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!("remote search failed, using local results only: {err}");
                Vec::new()
            }
        };
        let local = std::mem::take(&mut self.pending_local);
        self.status = SearchStatus::Searched(merge_results(local, remote));
        true
    }

    /// Discard results (e.g. after the user picked a candidate).
    pub fn clear(&mut self) {
        self.seq += 1;
        self.pending_local.clear();
        self.status = SearchStatus::NotSearched;
    }
}
