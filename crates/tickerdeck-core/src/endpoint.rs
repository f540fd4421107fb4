//! Fixed upstream endpoint catalog and cache-key derivation.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The five provider endpoints the governor knows how to call.
///
/// The catalog is fixed: collaborators pick an operation, never a raw path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Stock,
    Trending,
    NseMostActive,
    BseMostActive,
    HistoricalData,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Stock => "/stock",
            Self::Trending => "/trending",
            Self::NseMostActive => "/NSE_most_active",
            Self::BseMostActive => "/BSE_most_active",
            Self::HistoricalData => "/historical_data",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Exchange selector for the most-active listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Nse,
    Bse,
}

impl Exchange {
    pub const fn most_active_endpoint(self) -> Endpoint {
        match self {
            Self::Nse => Endpoint::NseMostActive,
            Self::Bse => Endpoint::BseMostActive,
        }
    }
}

/// Canonical cache key: endpoint path plus the query pairs sorted by name.
///
/// Sorting makes the key independent of caller argument order, so identical
/// logical requests always collapse onto one cache slot and one in-flight
/// registration.
pub fn cache_key(endpoint: Endpoint, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return endpoint.path().to_owned();
    }

    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);

    let query = sorted
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{query}", endpoint.path())
}
