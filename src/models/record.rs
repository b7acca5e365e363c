use crate::models::OptionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One enriched row per contract, produced by a single generator pass and
/// discarded wholesale on the next refresh. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub ticker: String,
    pub contract_type: OptionType,
    pub strike: f64,
    pub expiration: NaiveDate,
    /// Fractional days until expiration; always > 0 (expired groups are skipped)
    pub days_to_expiry: f64,
    /// Synthetic smile IV, floored at a small positive value
    pub iv: f64,
    /// Black-Scholes gamma scaled by open interest and the contract multiplier
    pub gamma_exposure: f64,
    pub delta: f64,
    pub theta: f64,
    pub vega: f64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub open_interest: u32,
    pub volume: u32,
    /// `(strike - atm_strike) / atm_strike` within the record's expiry group
    pub moneyness: f64,
}

/// Strike display transform shared by the binner and all downstream
/// consumers: when normalization is on, strikes are rebased against the spot
/// estimate and scaled to 100. Skipped whenever spot is unset or zero.
pub fn display_strike(strike: f64, spot_estimate: f64, normalize: bool) -> f64 {
    if normalize && spot_estimate > 0.0 {
        (strike / spot_estimate) * 100.0
    } else {
        strike
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalization_rebases_against_spot() {
        assert_relative_eq!(display_strike(110.0, 100.0, true), 110.0);
        assert_relative_eq!(display_strike(95.0, 100.0, true), 95.0);
        assert_relative_eq!(display_strike(50.0, 200.0, true), 25.0);
    }

    #[test]
    fn normalization_skipped_without_spot_or_flag() {
        assert_relative_eq!(display_strike(110.0, 0.0, true), 110.0);
        assert_relative_eq!(display_strike(110.0, 100.0, false), 110.0);
    }

    #[test]
    fn repeated_calls_with_same_spot_do_not_compound() {
        // Not idempotent under re-application to its own output, but stable
        // for the same (strike, spot) inputs.
        let a = display_strike(120.0, 80.0, true);
        let b = display_strike(120.0, 80.0, true);
        assert_relative_eq!(a, b);
        assert!((display_strike(a, 80.0, true) - a).abs() > f64::EPSILON);
    }
}
