//! Plain-text options chain rendering, grouped by expiration.

use crate::config::SurfaceConfig;
use crate::models::{display_strike, EnrichedRecord, OptionType};
use std::collections::BTreeMap;
use std::fmt::Write;

const HEADERS: [&str; 12] = [
    "Exp. Date", "Type", "Strike", "Last", "Bid", "Ask", "IV", "Delta", "Gamma", "Theta", "Vega",
    "OI",
];
const COL_WIDTH: usize = 11;

fn pad(cell: &str) -> String {
    format!("{:>width$}", cell, width = COL_WIDTH)
}

fn row(cells: &[String]) -> String {
    cells.iter().map(|c| pad(c)).collect::<Vec<_>>().join(" ")
}

/// Render records as an expiry-grouped table. Within each group rows are
/// ordered by strike ascending with puts before calls at the same strike.
/// Strikes honor the display transform when normalization is enabled.
pub fn render_chain_table(
    records: &[EnrichedRecord],
    spot_estimate: f64,
    config: &SurfaceConfig,
) -> String {
    let mut groups: BTreeMap<i64, Vec<&EnrichedRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.days_to_expiry.round() as i64).or_default().push(r);
    }

    let mut out = String::new();
    let header = row(&HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(header.len()));

    for (days, group) in &mut groups {
        group.sort_by(|a, b| {
            a.strike
                .partial_cmp(&b.strike)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| type_rank(a.contract_type).cmp(&type_rank(b.contract_type)))
        });

        let _ = writeln!(
            out,
            "Expiration: {} ({} days)",
            group[0].expiration.format("%Y-%m-%d"),
            days
        );
        for r in group.iter() {
            let strike = display_strike(r.strike, spot_estimate, config.normalize_strikes);
            let cells = vec![
                r.expiration.format("%Y-%m-%d").to_string(),
                r.contract_type.to_string().to_uppercase(),
                format!("{:.2}", strike),
                format!("${:.2}", r.last),
                format!("${:.2}", r.bid),
                format!("${:.2}", r.ask),
                format!("{:.2}%", r.iv * 100.0),
                format!("{:.3}", r.delta),
                format!("{:.4}", r.gamma_exposure),
                format!("{:.4}", r.theta),
                format!("{:.4}", r.vega),
                r.open_interest.to_string(),
            ];
            let _ = writeln!(out, "{}", row(&cells));
        }
    }
    out
}

fn type_rank(t: OptionType) -> u8 {
    match t {
        OptionType::Put => 0,
        OptionType::Call => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(strike: f64, contract_type: OptionType, days: f64) -> EnrichedRecord {
        EnrichedRecord {
            ticker: "O:TEST".into(),
            contract_type,
            strike,
            expiration: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
            days_to_expiry: days,
            iv: 0.3,
            gamma_exposure: 12.3456,
            delta: 0.512,
            theta: -0.0123,
            vega: 0.0456,
            bid: 4.75,
            ask: 5.12,
            last: 4.9,
            open_interest: 250,
            volume: 100,
            moneyness: 0.0,
        }
    }

    #[test]
    fn rows_sort_by_strike_with_puts_first() {
        let records = vec![
            record(105.0, OptionType::Call, 30.0),
            record(100.0, OptionType::Call, 30.0),
            record(100.0, OptionType::Put, 30.0),
        ];
        let table = render_chain_table(&records, 100.0, &SurfaceConfig::default());
        let put_pos = table.find("PUT").unwrap();
        let call_100 = table.find("CALL").unwrap();
        assert!(put_pos < call_100);
        let line_105 = table.lines().last().unwrap();
        assert!(line_105.contains("105.00"));
    }

    #[test]
    fn expiry_groups_appear_in_ascending_order() {
        let mut far = record(100.0, OptionType::Call, 90.0);
        far.expiration = NaiveDate::from_ymd_opt(2026, 10, 30).unwrap();
        let records = vec![far, record(100.0, OptionType::Call, 30.0)];
        let table = render_chain_table(&records, 100.0, &SurfaceConfig::default());
        let near = table.find("(30 days)").unwrap();
        let far = table.find("(90 days)").unwrap();
        assert!(near < far);
    }

    #[test]
    fn normalized_strikes_show_in_display_space() {
        let config = SurfaceConfig {
            normalize_strikes: true,
            ..SurfaceConfig::default()
        };
        let records = vec![record(110.0, OptionType::Call, 30.0)];
        let table = render_chain_table(&records, 200.0, &config);
        assert!(table.contains("55.00"));
    }
}
