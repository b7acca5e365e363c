//! End-to-end surface assembly and refresh coordination.
//!
//! `build_surface` runs the pure pipeline: validate contracts, generate the
//! synthetic market, bin, interpolate. `SurfaceService` wraps it with a
//! generation counter so overlapping refreshes cannot clobber each other:
//! only the ticket issued last may publish a snapshot, and a failed or
//! superseded refresh leaves the previous snapshot untouched.

use crate::config::SurfaceConfig;
use crate::error::{Result, SurfaceError};
use crate::models::{validate_contracts, EnrichedRecord, FilledGrid, RawContract};
use crate::surface::binner::bin_records;
use crate::surface::interpolate::fill;
use crate::surface::synthetic;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{error, info, warn};

/// Complete output of one pipeline run. Immutable once published.
#[derive(Debug, Clone)]
pub struct SurfaceSnapshot {
    pub symbol: String,
    pub spot_estimate: f64,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<EnrichedRecord>,
    pub iv_grid: FilledGrid,
    pub gamma_grid: FilledGrid,
}

/// Run the full pipeline over a raw contract list.
///
/// Invalid contracts are dropped, not fatal; an empty valid set still yields
/// a snapshot whose grids fall back to the default IV and gamma levels.
pub fn build_surface<R: Rng>(
    symbol: &str,
    raw: &[RawContract],
    config: &SurfaceConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SurfaceSnapshot> {
    config.validate()?;

    let contracts = validate_contracts(raw);
    if contracts.is_empty() {
        warn!(symbol, total = raw.len(), "no valid contracts, surface falls back to defaults");
    } else {
        info!(symbol, valid = contracts.len(), total = raw.len(), "building surface");
    }

    let market = synthetic::generate(&contracts, config, now, rng);
    let grids = bin_records(&market.records, market.spot_estimate, config);
    let iv_grid = fill(grids.iv);
    let gamma_grid = fill(grids.gamma);

    Ok(SurfaceSnapshot {
        symbol: symbol.to_string(),
        spot_estimate: market.spot_estimate,
        generated_at: now,
        records: market.records,
        iv_grid,
        gamma_grid,
    })
}

/// Receives user-facing progress and error messages from the service.
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink that forwards messages to the tracing subscriber.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn status(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}

/// Proof that a refresh was started; `apply` rejects it once a newer
/// refresh has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Owns the latest published snapshot and the deterministic random source.
pub struct SurfaceService {
    config: SurfaceConfig,
    generation: AtomicU64,
    rng: Mutex<StdRng>,
    snapshot: RwLock<Option<Arc<SurfaceSnapshot>>>,
    sink: Box<dyn StatusSink>,
}

impl SurfaceService {
    pub fn new(config: SurfaceConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            generation: AtomicU64::new(0),
            rng: Mutex::new(rng),
            snapshot: RwLock::new(None),
            sink: Box::new(LogStatusSink),
        }
    }

    pub fn with_status_sink(mut self, sink: Box<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Start a refresh. Issuing a ticket invalidates every earlier one.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sink.status("Fetching option contracts...");
        RefreshTicket(generation)
    }

    /// Build and publish a snapshot from fetched contracts, unless a newer
    /// refresh was started since `ticket` was issued. The prior snapshot
    /// stays published on every failure path.
    pub fn apply(
        &self,
        ticket: RefreshTicket,
        symbol: &str,
        raw: &[RawContract],
        now: DateTime<Utc>,
    ) -> Result<Arc<SurfaceSnapshot>> {
        if ticket.0 != self.generation.load(Ordering::SeqCst) {
            return Err(SurfaceError::Superseded);
        }

        self.sink.status("Building volatility surface...");
        let snapshot = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| SurfaceError::Other("rng lock poisoned".to_string()))?;
            build_surface(symbol, raw, &self.config, now, &mut *rng)
        };
        let snapshot = match snapshot {
            Ok(s) => Arc::new(s),
            Err(e) => {
                self.sink.error(&format!("Surface build failed: {e}"));
                return Err(e);
            }
        };

        // Re-check after the build: a newer refresh may have started while
        // this one was computing.
        if ticket.0 != self.generation.load(Ordering::SeqCst) {
            return Err(SurfaceError::Superseded);
        }

        let mut slot = self
            .snapshot
            .write()
            .map_err(|_| SurfaceError::Other("snapshot lock poisoned".to_string()))?;
        *slot = Some(Arc::clone(&snapshot));
        self.sink.status(&format!(
            "Surface updated: {} contracts, spot estimate {:.2}",
            snapshot.records.len(),
            snapshot.spot_estimate
        ));
        Ok(snapshot)
    }

    /// Report a fetch failure without touching the published snapshot.
    pub fn fail(&self, message: &str) {
        self.sink.error(message);
    }

    pub fn snapshot(&self) -> Option<Arc<SurfaceSnapshot>> {
        match self.snapshot.read() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(strike: f64, expiration: &str, kind: &str) -> RawContract {
        RawContract {
            ticker: Some(format!("O:TEST{strike}")),
            strike_price: Some(strike),
            expiration_date: Some(expiration.to_string()),
            contract_type: Some(kind.to_string()),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        "2026-08-01T00:00:00Z".parse().unwrap()
    }

    fn sample_raw() -> Vec<RawContract> {
        vec![
            raw(95.0, "2026-08-31", "call"),
            raw(100.0, "2026-08-31", "put"),
            raw(105.0, "2026-08-31", "call"),
            raw(100.0, "2026-10-30", "put"),
        ]
    }

    fn seeded_config() -> SurfaceConfig {
        SurfaceConfig {
            rng_seed: Some(7),
            ..SurfaceConfig::default()
        }
    }

    #[test]
    fn build_surface_produces_dense_grids() {
        let config = seeded_config();
        let mut rng = StdRng::seed_from_u64(7);
        let snap = build_surface("TEST", &sample_raw(), &config, fixed_now(), &mut rng).unwrap();
        assert_eq!(snap.records.len(), 4);
        assert_eq!(
            snap.iv_grid.iv.dim(),
            (config.strike_resolution, config.days_resolution)
        );
        assert!(snap.iv_grid.iv.iter().all(|v| v.is_finite()));
        assert!(snap.gamma_grid.gamma.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn stale_ticket_is_rejected_and_snapshot_survives() {
        let service = SurfaceService::new(seeded_config());
        let first = service.begin_refresh();
        service.apply(first, "TEST", &sample_raw(), fixed_now()).unwrap();
        let published = service.snapshot().unwrap();

        let stale = service.begin_refresh();
        let _newer = service.begin_refresh();
        let err = service
            .apply(stale, "TEST", &[], fixed_now())
            .unwrap_err();
        assert!(matches!(err, SurfaceError::Superseded));
        let after = service.snapshot().unwrap();
        assert!(Arc::ptr_eq(&published, &after));
    }

    #[test]
    fn empty_contract_list_still_publishes_defaults() {
        let service = SurfaceService::new(seeded_config());
        let ticket = service.begin_refresh();
        let snap = service.apply(ticket, "TEST", &[], fixed_now()).unwrap();
        assert!(snap.records.is_empty());
        assert!(snap.iv_grid.iv.iter().all(|&v| (v - 0.3).abs() < 1e-12));
    }

    #[test]
    fn seeded_service_is_reproducible() {
        let run = || {
            let service = SurfaceService::new(seeded_config());
            let ticket = service.begin_refresh();
            service.apply(ticket, "TEST", &sample_raw(), fixed_now()).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.records.len(), b.records.len());
        for (ra, rb) in a.records.iter().zip(&b.records) {
            assert_eq!(ra.iv, rb.iv);
            assert_eq!(ra.open_interest, rb.open_interest);
            assert_eq!(ra.volume, rb.volume);
        }
    }
}
