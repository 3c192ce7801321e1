// One hunt: scan every configured destination, then persist the result set.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use crate::client::{DuffelClient, FareSource};
use crate::config::HunterConfig;
use crate::mock::MockOfferGenerator;
use crate::scanner::{DestinationOutcome, DestinationScanner};
use crate::store::{JsonFileStore, SnapshotStore};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub deals: usize,
    pub live: usize,
    pub simulated: usize,
    pub elapsed: Duration,
    pub snapshot_path: PathBuf,
    pub outcomes: Vec<DestinationOutcome>,
}

pub struct DealHunter<S: FareSource, St: SnapshotStore, R: Rng = StdRng> {
    config: HunterConfig,
    scanner: DestinationScanner<S, R>,
    store: St,
}

impl DealHunter<DuffelClient, JsonFileStore> {
    /// Production wiring: live API client, entropy-seeded fallback prices, JSON file snapshot
    pub fn from_config(config: HunterConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let client = DuffelClient::new(config.api.clone()).context("Failed to build API client")?;
        let generator = MockOfferGenerator::from_entropy(config.fallback.clone());
        let store = JsonFileStore::new(config.snapshot_path.clone());

        Ok(Self::new(config, client, generator, store))
    }
}

impl<S: FareSource, St: SnapshotStore, R: Rng> DealHunter<S, St, R> {
    pub fn new(config: HunterConfig, source: S, generator: MockOfferGenerator<R>, store: St) -> Self {
        let scanner = DestinationScanner::new(source, generator)
            .with_pacing(config.pacing)
            .with_max_concurrency(config.max_concurrent_queries);

        Self {
            config,
            scanner,
            store,
        }
    }

    pub fn source(&self) -> &S {
        self.scanner.source()
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Runs the hunt as if started on `today`. The snapshot is only written
    /// once every destination has been settled.
    pub async fn run_on(&mut self, today: NaiveDate) -> Result<RunSummary> {
        let started = Instant::now();
        let date = self.config.search_date(today).with_context(|| {
            format!(
                "Search date {} days after {} is out of range",
                self.config.days_ahead, today
            )
        })?;

        let report = self
            .scanner
            .scan(&self.config.origin, &self.config.destinations, date)
            .await;

        self.store.save(&report.deals).with_context(|| {
            format!(
                "Failed to write snapshot to {}",
                self.config.snapshot_path.display()
            )
        })?;

        let summary = RunSummary {
            date,
            deals: report.deals.len(),
            live: report.live_count(),
            simulated: report.fallback_count(),
            elapsed: started.elapsed(),
            snapshot_path: self.config.snapshot_path.clone(),
            outcomes: report.outcomes,
        };

        info!(
            deals = summary.deals,
            live = summary.live,
            simulated = summary.simulated,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Hunt complete, snapshot updated"
        );
        Ok(summary)
    }
}
