use thiserror::Error;

/// Failure of the planar-to-geographic coordinate conversion.
///
/// Fatal only to the single marker-creation attempt that triggered it;
/// callers skip the marker and carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("non-finite grid coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
    #[error("grid coordinate ({x}, {y}) converts outside the supported region")]
    OutsideRegion { x: f64, y: f64 },
}

/// Failure of the key-value backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("marker serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Marker-store operation errors. `NotFound` is a value, not a crash: the
/// caller treats it as a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("no marker with id {0}")]
    NotFound(u64),
}

/// Failure of the remote location-search service. Always recoverable: the
/// merger degrades to local-only results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteSearchError {
    #[error("location search request failed: {0}")]
    Transport(String),
    #[error("location search returned status {0}")]
    Status(u16),
    #[error("location search payload malformed: {0}")]
    Payload(String),
}
