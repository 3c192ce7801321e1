// Destination scanner: query, fall back, keep the cheapest offer per destination.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use crate::client::FareSource;
use crate::mock::MockOfferGenerator;
use crate::model::{DealSet, Offer};

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    // Query failed or returned an empty list
    NoOffers,
    // Every offer had an unreadable price or no segments
    NoUsableOffers { rejected: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DealSource {
    Live { offers_considered: usize },
    Fallback(FallbackReason),
}

impl DealSource {
    pub fn is_live(&self) -> bool {
        matches!(self, DealSource::Live { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DealSource::Live { .. } => "live",
            DealSource::Fallback(_) => "simulated",
        }
    }
}

/// Progress record for one scanned destination
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationOutcome {
    pub destination: String,
    pub total_amount: String,
    pub total_currency: String,
    pub source: DealSource,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub deals: DealSet,
    pub outcomes: Vec<DestinationOutcome>,
}

impl ScanReport {
    pub fn live_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.source.is_live()).count()
    }

    pub fn fallback_count(&self) -> usize {
        self.outcomes.len() - self.live_count()
    }
}

/// Index of the lowest-priced offer. Offers without a valid price are skipped,
/// and the first one wins on equal prices.
pub fn cheapest_index(offers: &[Offer]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, offer) in offers.iter().enumerate() {
        let Some(price) = offer.price() else {
            continue;
        };
        match best {
            Some((_, best_price)) if price >= best_price => {}
            _ => best = Some((index, price)),
        }
    }
    best.map(|(index, _)| index)
}

pub fn select_cheapest(mut offers: Vec<Offer>) -> Option<Offer> {
    cheapest_index(&offers).map(|index| offers.swap_remove(index))
}

// Earliest start of query `index`; `None` only when the offset overflows the clock
fn pacing_deadline(started: Instant, pacing: Duration, index: usize) -> Option<Instant> {
    let steps = u32::try_from(index).unwrap_or(u32::MAX);
    started.checked_add(pacing.saturating_mul(steps))
}

pub struct DestinationScanner<S: FareSource, R: Rng = StdRng> {
    source: S,
    generator: MockOfferGenerator<R>,
    pacing: Duration,
    max_concurrent_queries: usize,
}

impl<S: FareSource, R: Rng> DestinationScanner<S, R> {
    pub fn new(source: S, generator: MockOfferGenerator<R>) -> Self {
        Self {
            source,
            generator,
            pacing: Duration::ZERO,
            max_concurrent_queries: 1,
        }
    }

    /// Minimum spacing between the start of two consecutive queries
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrent_queries: usize) -> Self {
        self.max_concurrent_queries = max_concurrent_queries.max(1);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Scans every destination once and returns one winning offer per destination,
    /// in the order the destinations were given.
    pub async fn scan(&mut self, origin: &str, destinations: &[String], date: NaiveDate) -> ScanReport {
        let source = &self.source;
        let generator = &mut self.generator;
        let pacing = self.pacing;
        let started = Instant::now();
        let total = destinations.len();

        info!(origin, %date, destinations = total, "Scanning destinations");

        // `buffered` yields in input order, whatever order the queries finish in
        let mut queries = stream::iter(destinations.iter().enumerate())
            .map(|(index, destination)| async move {
                if index > 0 && !pacing.is_zero() {
                    if let Some(deadline) = pacing_deadline(started, pacing, index) {
                        sleep_until(deadline).await;
                    }
                }
                let offers = source.search_or_empty(origin, destination, date).await;
                (destination, offers)
            })
            .buffered(self.max_concurrent_queries);

        let mut report = ScanReport::default();
        while let Some((destination, offers)) = queries.next().await {
            let (offer, outcome) = settle(generator, origin, destination, date, offers);

            info!(
                destination = %outcome.destination,
                price = %outcome.total_amount,
                currency = %outcome.total_currency,
                source = outcome.source.label(),
                "[{}/{}] Locked {} at {} {}",
                report.outcomes.len() + 1,
                total,
                outcome.destination,
                outcome.total_amount,
                outcome.total_currency
            );

            report.deals.push(offer);
            report.outcomes.push(outcome);
        }

        report
    }
}

fn settle<R: Rng>(
    generator: &mut MockOfferGenerator<R>,
    origin: &str,
    destination: &str,
    date: NaiveDate,
    offers: Vec<Offer>,
) -> (Offer, DestinationOutcome) {
    let (valid, rejected): (Vec<Offer>, Vec<Offer>) =
        offers.into_iter().partition(|o| o.is_usable());

    for offer in &rejected {
        warn!(
            destination,
            offer_id = %offer.id,
            amount = %offer.total_amount,
            slices = offer.slices.len(),
            "Rejecting offer with unreadable price or missing segments"
        );
    }

    let considered = valid.len();
    let (offer, source) = match select_cheapest(valid) {
        Some(offer) => (
            offer,
            DealSource::Live {
                offers_considered: considered,
            },
        ),
        None => {
            let reason = if rejected.is_empty() {
                FallbackReason::NoOffers
            } else {
                FallbackReason::NoUsableOffers {
                    rejected: rejected.len(),
                }
            };
            info!(destination, ?reason, "No usable live offers, simulating one");
            (
                generator.generate(origin, destination, date),
                DealSource::Fallback(reason),
            )
        }
    };

    let outcome = DestinationOutcome {
        destination: destination.to_string(),
        total_amount: offer.total_amount.clone(),
        total_currency: offer.total_currency.clone(),
        source,
    };
    (offer, outcome)
}
