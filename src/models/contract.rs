use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

impl OptionType {
    /// Lenient parse for upstream type strings. The live feed emits values
    /// beyond call/put (e.g. "other"); those are `None` and the record is
    /// dropped in validation rather than failing the whole payload.
    fn from_upstream(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "call" => Some(OptionType::Call),
            "put" => Some(OptionType::Put),
            _ => None,
        }
    }
}

/// One contract as the upstream API reports it. Untrusted: any field may be
/// missing or malformed, so everything stays optional and untyped until
/// validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContract {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub strike_price: Option<f64>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
}

/// A validated contract: positive strike, known type, parseable expiration.
/// Immutable source of truth for every downstream record.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub ticker: String,
    pub strike: f64,
    pub expiration: NaiveDate,
    pub contract_type: OptionType,
}

impl Contract {
    /// Validate a raw upstream record, returning `None` for anything that
    /// would not survive the generator's filter.
    pub fn from_raw(raw: &RawContract) -> Option<Self> {
        let strike = raw.strike_price.filter(|s| *s > 0.0)?;
        let contract_type = raw
            .contract_type
            .as_deref()
            .and_then(OptionType::from_upstream)?;
        let date_str = raw.expiration_date.as_deref()?;
        let expiration = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                debug!("Dropping contract with bad expiration {:?}: {}", date_str, e);
                return None;
            }
        };
        Some(Self {
            ticker: raw.ticker.clone().unwrap_or_default(),
            strike,
            expiration,
            contract_type,
        })
    }
}

/// Drop invalid records from an untrusted contract list.
pub fn validate_contracts(raw: &[RawContract]) -> Vec<Contract> {
    raw.iter().filter_map(Contract::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(strike: Option<f64>, exp: Option<&str>, ct: Option<&str>) -> RawContract {
        RawContract {
            ticker: Some("AAPL".into()),
            strike_price: strike,
            expiration_date: exp.map(str::to_string),
            contract_type: ct.map(str::to_string),
        }
    }

    #[test]
    fn validation_drops_incomplete_records() {
        let contracts = validate_contracts(&[
            raw(Some(100.0), Some("2026-10-16"), Some("call")),
            raw(None, Some("2026-10-16"), Some("call")),
            raw(Some(0.0), Some("2026-10-16"), Some("put")),
            raw(Some(-5.0), Some("2026-10-16"), Some("put")),
            raw(Some(100.0), None, Some("call")),
            raw(Some(100.0), Some("not-a-date"), Some("call")),
            raw(Some(100.0), Some("2026-10-16"), None),
        ]);
        assert_eq!(contracts.len(), 1);
        assert_eq!(contracts[0].strike, 100.0);
    }

    #[test]
    fn unknown_contract_type_drops_only_that_record() {
        let contracts = validate_contracts(&[
            raw(Some(100.0), Some("2026-10-16"), Some("call")),
            raw(Some(105.0), Some("2026-10-16"), Some("other")),
            raw(Some(110.0), Some("2026-10-16"), Some("straddle")),
        ]);
        assert_eq!(contracts.len(), 1);
        assert_eq!(contracts[0].contract_type, OptionType::Call);
    }

    #[test]
    fn contract_type_parses_case_insensitively() {
        let c = raw(Some(50.0), Some("2026-09-18"), Some("PUT"));
        assert_eq!(
            Contract::from_raw(&c).unwrap().contract_type,
            OptionType::Put
        );
    }

    #[test]
    fn unknown_fields_in_payload_are_ignored() {
        let c: RawContract = serde_json::from_str(
            r#"{"ticker":"T","strike_price":50.0,"expiration_date":"2026-09-18","contract_type":"call","cfi":"OCASPS"}"#,
        )
        .unwrap();
        assert!(Contract::from_raw(&c).is_some());
    }
}
