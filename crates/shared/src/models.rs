use serde::{Deserialize, Serialize};

/// Where a search candidate came from. Curated entries take priority over
/// remote ones when results are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    #[default]
    Curated,
    Remote,
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateSource::Curated => write!(f, "curated"),
            CandidateSource::Remote => write!(f, "remote"),
        }
    }
}

/// A transient search result. `x`/`y` are HK1980 Grid easting/northing in
/// meters; the candidate is discarded once converted into a [`Marker`] or
/// once the user issues a new search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    #[serde(rename = "nameZH")]
    pub name_zh: String,
    #[serde(rename = "nameEN")]
    pub name_en: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "districtZH", default)]
    pub district_zh: Option<String>,
    #[serde(rename = "addressEN", default)]
    pub address_en: Option<String>,
    #[serde(default)]
    pub source: CandidateSource,
}

/// A user-created point annotation. Serialized shape matches the historical
/// stored JSON (`nameZH`, `type`, ...), so collections persisted by older
/// builds still load; `type` and `description` default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: u64,
    #[serde(rename = "nameZH")]
    pub name_zh: String,
    #[serde(rename = "nameEN")]
    pub name_en: String,
    #[serde(rename = "districtZH", default)]
    pub district_zh: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type", default)]
    pub category: u8,
    #[serde(default)]
    pub description: String,
}

impl Marker {
    /// Markers with a non-finite position are excluded from layout work.
    pub fn has_finite_position(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Fixed marker category palette. The index stored on a marker is the only
/// persisted representation; unknown indices fall back to [`Self::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerCategory {
    Classic,
    Food,
    Scenery,
    Transport,
    Shopping,
}

impl MarkerCategory {
    pub const DEFAULT: MarkerCategory = MarkerCategory::Classic;

    pub const ALL: [MarkerCategory; 5] = [
        MarkerCategory::Classic,
        MarkerCategory::Food,
        MarkerCategory::Scenery,
        MarkerCategory::Transport,
        MarkerCategory::Shopping,
    ];

    /// Palette lookup with default fallback for out-of-range indices.
    pub fn from_index(index: u8) -> MarkerCategory {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(Self::DEFAULT)
    }

    pub fn index(self) -> u8 {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0) as u8
    }

    /// Display colour for map rendering. Pure configuration; the clustering
    /// algorithm never looks at this.
    pub fn color(self) -> &'static str {
        match self {
            MarkerCategory::Classic => "#c43030",
            MarkerCategory::Food => "#e08a2e",
            MarkerCategory::Scenery => "#5ab882",
            MarkerCategory::Transport => "#4a8fd4",
            MarkerCategory::Shopping => "#9b6bd4",
        }
    }
}

impl std::fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerCategory::Classic => write!(f, "Classic"),
            MarkerCategory::Food => write!(f, "Food"),
            MarkerCategory::Scenery => write!(f, "Scenery"),
            MarkerCategory::Transport => write!(f, "Transport"),
            MarkerCategory::Shopping => write!(f, "Shopping"),
        }
    }
}
