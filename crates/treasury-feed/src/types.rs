//! Wire types of the JSON treasury feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use treasury_core::{Observation, RecordTable, parse_date};

use crate::{Result, error::FeedError};

/// Fields every feed payload must carry inside `historicalData`.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "dates",
    "btc_balance",
    "stock_prices",
    "btc_prices",
    "diluted_shares_outstanding",
];

/// Top-level feed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPayload {
    /// Parallel per-date arrays.
    #[serde(rename = "historicalData")]
    pub historical_data: HistoricalData,
}

/// Parallel arrays of observations, one entry per date.
///
/// Numeric entries may be `null`; they become `NaN` in the record table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalData {
    /// `YYYY-MM-DD` dates, optionally with a time suffix.
    pub dates: Vec<String>,
    /// Bitcoin held.
    pub btc_balance: Vec<Option<f64>>,
    /// Stock price in USD.
    pub stock_prices: Vec<Option<f64>>,
    /// Bitcoin price in USD.
    pub btc_prices: Vec<Option<f64>>,
    /// Fully diluted share count.
    pub diluted_shares_outstanding: Vec<Option<f64>>,
    /// Basic market cap.
    #[serde(default)]
    pub market_cap_basic: Option<Vec<Option<f64>>>,
    /// BTC per diluted share, trusted as-is when present.
    #[serde(default)]
    pub btc_per_diluted_share: Option<Vec<Option<f64>>>,
}

impl FeedPayload {
    /// Parse a payload, reporting missing fields by name.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Json`] for malformed JSON and
    /// [`FeedError::Schema`] when `historicalData` or any required array is
    /// absent.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let Some(Value::Object(data)) = value.get("historicalData") else {
            let found = value
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default();
            return Err(FeedError::Schema {
                missing: vec!["historicalData".to_string()],
                found,
            });
        };

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|f| !data.contains_key(**f))
            .map(|f| (*f).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FeedError::Schema {
                missing,
                found: data.keys().cloned().collect(),
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Convert the parallel arrays into a record table, in feed order.
    ///
    /// # Errors
    ///
    /// Returns an error when the arrays differ in length or a date cannot be
    /// parsed.
    pub fn into_table(self) -> Result<RecordTable> {
        let h = self.historical_data;
        let n = h.dates.len();

        let mut lengths = vec![
            ("btc_balance", h.btc_balance.len()),
            ("stock_prices", h.stock_prices.len()),
            ("btc_prices", h.btc_prices.len()),
            ("diluted_shares_outstanding", h.diluted_shares_outstanding.len()),
        ];
        if let Some(v) = &h.market_cap_basic {
            lengths.push(("market_cap_basic", v.len()));
        }
        if let Some(v) = &h.btc_per_diluted_share {
            lengths.push(("btc_per_diluted_share", v.len()));
        }
        if let Some((name, len)) = lengths.into_iter().find(|(_, len)| *len != n) {
            return Err(treasury_core::TreasuryError::InvalidData(format!(
                "{name} has {len} entries but dates has {n}"
            ))
            .into());
        }

        let num = |v: &[Option<f64>], i: usize| v[i].unwrap_or(f64::NAN);

        h.dates
            .iter()
            .enumerate()
            .map(|(i, date)| -> Result<Observation> {
                let mut row = Observation::new(
                    parse_date(date)?,
                    num(&h.btc_balance, i),
                    num(&h.diluted_shares_outstanding, i),
                    num(&h.stock_prices, i),
                    num(&h.btc_prices, i),
                );
                if let Some(v) = &h.btc_per_diluted_share {
                    row = row.with_btc_per_diluted_share(num(v, i));
                }
                if let Some(v) = &h.market_cap_basic {
                    row = row.with_market_cap_basic(v[i]);
                }
                Ok(row)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "historicalData": {
            "dates": ["2025-06-01", "2025-06-02T00:00:00"],
            "btc_balance": [100.0, null],
            "stock_prices": [1.5, 1.6],
            "btc_prices": [100000.0, 101000.0],
            "diluted_shares_outstanding": [1000.0, 1000.0],
            "market_cap_basic": [1200.0, 1300.0]
        }
    }"#;

    #[test]
    fn test_parse_and_convert() {
        let table = FeedPayload::parse(PAYLOAD).unwrap().into_table().unwrap();
        assert_eq!(table.len(), 2);

        let first = table.rows()[0];
        assert_eq!(first.btc_per_diluted_share, 0.1);
        assert_eq!(first.market_cap_basic, Some(1200.0));

        let second = table.rows()[1];
        assert!(second.btc_balance.is_nan());
        assert!(!second.is_valid());
    }

    #[test]
    fn test_supplied_btc_per_share_is_trusted() {
        let text = r#"{"historicalData": {
            "dates": ["2025-06-01"], "btc_balance": [100.0], "stock_prices": [1.0],
            "btc_prices": [1.0], "diluted_shares_outstanding": [1000.0],
            "btc_per_diluted_share": [0.5]
        }}"#;
        let table = FeedPayload::parse(text).unwrap().into_table().unwrap();
        assert_eq!(table.rows()[0].btc_per_diluted_share, 0.5);
    }

    #[test]
    fn test_schema_failure_reports_fields() {
        let text = r#"{"historicalData": {"dates": [], "btc_balance": []}}"#;
        match FeedPayload::parse(text) {
            Err(FeedError::Schema { missing, mut found }) => {
                found.sort();
                assert_eq!(
                    missing,
                    vec!["stock_prices", "btc_prices", "diluted_shares_outstanding"]
                );
                assert_eq!(found, vec!["btc_balance", "dates"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }

        assert!(matches!(
            FeedPayload::parse(r#"{"data": {}}"#),
            Err(FeedError::Schema { .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let text = r#"{"historicalData": {
            "dates": ["2025-06-01", "2025-06-02"], "btc_balance": [1.0], "stock_prices": [1.0, 1.0],
            "btc_prices": [1.0, 1.0], "diluted_shares_outstanding": [1.0, 1.0]
        }}"#;
        let err = FeedPayload::parse(text).unwrap().into_table().unwrap_err();
        assert!(err.to_string().contains("btc_balance has 1 entries"));
    }
}
