//! Normalized record shapes and tolerant provider-JSON decoding.
//!
//! The upstream API is loose about shapes: numbers arrive as JSON numbers or
//! as strings (sometimes with thousands separators or a trailing `%`), field
//! names differ between endpoints, and fields go missing outright. All
//! default-substitution rules live here so the rest of the crate works with
//! three fixed, fully-populated shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single-instrument quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub percent_change: f64,
    pub volume: u64,
}

/// Why a card appears in a dashboard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTag {
    Gainer,
    Loser,
    Active,
}

/// Compact listing entry for trending / most-active widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCard {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub percent_change: f64,
    pub tag: CardTag,
}

/// One point of a historical price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: String,
    pub price: f64,
    pub volume: u64,
}

// ---------------------------------------------------------------------------
// Tolerant field coercion
// ---------------------------------------------------------------------------

/// Coerce a JSON value to f64: numbers pass through, strings are parsed
/// after stripping thousands separators and a trailing percent sign.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.trim().trim_end_matches('%').replace(',', "");
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// First present-and-coercible numeric field among `keys`, defaulting to 0.
fn num_field(parent: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|key| parent.get(key))
        .find_map(coerce_f64)
        .unwrap_or(0.0)
}

/// Like [`num_field`] but clamped into u64 for counts.
fn count_field(parent: &Value, keys: &[&str]) -> u64 {
    let raw = num_field(parent, keys);
    if raw.is_finite() && raw > 0.0 {
        raw as u64
    } else {
        0
    }
}

/// First non-empty string field among `keys`, else the fallback.
fn text_field(parent: &Value, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .filter_map(|key| parent.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_owned())
}

/// The `/stock` endpoint nests the price per exchange
/// (`{"currentPrice": {"NSE": ..., "BSE": ...}}`) but older payloads carry a
/// flat scalar. Prefer NSE, fall back to BSE, then to flat fields.
fn quote_price(parent: &Value) -> f64 {
    if let Some(nested) = parent.get("currentPrice") {
        if nested.is_object() {
            return num_field(nested, &["NSE", "BSE"]);
        }
        if let Some(price) = coerce_f64(nested) {
            return price;
        }
    }
    num_field(parent, &["price", "lastPrice", "last_price"])
}

// ---------------------------------------------------------------------------
// Normalization per endpoint
// ---------------------------------------------------------------------------

impl Quote {
    /// Decode a `/stock` payload, falling back to the requested symbol for
    /// missing identity fields and 0 for missing numerics.
    pub fn from_provider(payload: &Value, requested: &str) -> Self {
        Self {
            symbol: text_field(payload, &["tickerId", "ticker", "symbol"], requested),
            name: text_field(payload, &["companyName", "company_name", "name"], requested),
            price: quote_price(payload),
            change: num_field(payload, &["change", "netChange", "net_change"]),
            percent_change: num_field(
                payload,
                &["percentChange", "percent_change", "pChange"],
            ),
            volume: count_field(payload, &["volume", "totalTradedVolume"]),
        }
    }
}

fn card_from_entry(entry: &Value, tag: CardTag) -> MarketCard {
    let symbol = text_field(entry, &["ticker_id", "ticker", "symbol", "tickerId"], "");
    MarketCard {
        name: text_field(entry, &["company_name", "company", "companyName"], &symbol),
        symbol,
        price: num_field(entry, &["price", "current_price", "ltp"]),
        percent_change: num_field(entry, &["percent_change", "percentChange", "pChange"]),
        tag,
    }
}

/// Decode a `/trending` payload: gainers first, then losers.
pub fn cards_from_trending(payload: &Value) -> Vec<MarketCard> {
    let trending = payload.get("trending_stocks").unwrap_or(payload);

    let section = |key: &str, tag: CardTag| {
        trending
            .get(key)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| card_from_entry(entry, tag))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    };

    let mut cards = section("top_gainers", CardTag::Gainer);
    cards.extend(section("top_losers", CardTag::Loser));
    cards
}

/// Decode a most-active payload (a bare array of entries; both exchanges
/// share one entry shape).
pub fn cards_from_most_active(payload: &Value) -> Vec<MarketCard> {
    payload
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|entry| card_from_entry(entry, CardTag::Active))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract one historical point from a dataset row.
///
/// Rows are `[date, price]` or `[date, price, volume]` tuples; rows missing
/// either required field are dropped rather than padded with nulls.
fn point_from_row(row: &Value) -> Option<HistoricalPoint> {
    let cells = row.as_array()?;
    if cells.len() < 2 {
        return None;
    }

    let date = cells[0].as_str()?.trim();
    if date.is_empty() {
        return None;
    }
    let price = coerce_f64(&cells[1])?;
    let volume = cells
        .get(2)
        .and_then(coerce_f64)
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v as u64)
        .unwrap_or(0);

    Some(HistoricalPoint {
        date: date.to_owned(),
        price,
        volume,
    })
}

/// Decode a `/historical_data` payload into an oldest-first series.
///
/// The provider sends `{"datasets": [{"metric": "Price", "values": [...]}]}`
/// with rows ordered newest-first; the dashboard charts oldest-first, so the
/// decoded series is reversed here.
pub fn points_from_historical(payload: &Value) -> Vec<HistoricalPoint> {
    let datasets = match payload.get("datasets").and_then(Value::as_array) {
        Some(datasets) => datasets,
        None => return Vec::new(),
    };

    let price_dataset = datasets
        .iter()
        .find(|dataset| {
            text_field(dataset, &["metric", "label"], "").eq_ignore_ascii_case("price")
        })
        .or_else(|| datasets.first());

    let mut points: Vec<HistoricalPoint> = price_dataset
        .and_then(|dataset| dataset.get("values"))
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(point_from_row).collect())
        .unwrap_or_default();

    points.reverse();
    points
}
