//! Closed-form Black-Scholes derivatives for the synthetic market generator.
//!
//! The normal CDF is the Zelen-Severo polynomial approximation rather than an
//! exact implementation: downstream option prices are defined in terms of this
//! approximation and must reproduce it bit-for-bit-ish (within 1e-6).

use crate::models::OptionType;

const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_433;

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() * FRAC_1_SQRT_2PI
}

/// Standard normal CDF, Zelen-Severo rational approximation.
///
/// t = 1/(1 + 0.2316419|x|), five-term polynomial in t scaled by the PDF,
/// reflected for negative x. Absolute error is below 1e-6 everywhere.
pub fn norm_cdf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.2316419 * x.abs());
    let d = norm_pdf(x);
    let p = d
        * t
        * (0.319381530
            + t * (-0.356563782 + t * (1.781477937 + t * (-1.821255978 + t * 1.330274429))));
    if x >= 0.0 {
        1.0 - p
    } else {
        p
    }
}

/// Calculate d1 parameter for the Black-Scholes model
fn calculate_d1(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
}

/// Calculate d2 parameter for the Black-Scholes model
fn calculate_d2(d1: f64, sigma: f64, t: f64) -> f64 {
    d1 - sigma * t.sqrt()
}

/// Black-Scholes gamma. Identical for calls and puts.
///
/// Callers must not pass `t <= 0` or `sigma <= 0`; the generator filters
/// expired contracts and floors the smile volatility before pricing.
pub fn gamma(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let d1 = calculate_d1(s, k, t, r, sigma);
    norm_pdf(d1) / (s * sigma * t.sqrt())
}

/// Black-Scholes option price
pub fn price(s: f64, k: f64, t: f64, r: f64, sigma: f64, option_type: OptionType) -> f64 {
    let d1 = calculate_d1(s, k, t, r, sigma);
    let d2 = calculate_d2(d1, sigma, t);
    match option_type {
        OptionType::Call => s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2),
        OptionType::Put => k * (-r * t).exp() * norm_cdf(-d2) - s * norm_cdf(-d1),
    }
}

/// Sigmoid delta approximation keyed off moneyness `(K - K_atm)/K_atm`.
///
/// Deliberately NOT the textbook N(d1) delta; the synthetic surface was
/// defined with this smooth form and consumers expect it unchanged.
pub fn delta_approx(moneyness: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => 0.5 + 0.5 * (1.0 - (-10.0 * moneyness).exp()),
        OptionType::Put => -0.5 - 0.5 * (1.0 - (10.0 * moneyness).exp()),
    }
}

/// Proportional theta: `-S * 0.01 * gamma / sqrt(days/30)`
pub fn theta_approx(s: f64, gamma: f64, term_factor: f64) -> f64 {
    -s * 0.01 * gamma / term_factor
}

/// Proportional vega: `S * 0.01 * gamma * sqrt(days/30)`
pub fn vega_approx(s: f64, gamma: f64, term_factor: f64) -> f64 {
    s * 0.01 * gamma * term_factor
}
