// Synthetic offers used when the live search returns nothing usable.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Map;

use crate::config::FallbackConfig;
use crate::model::{Airport, Carrier, Offer, Segment, Slice, SYNTHETIC_MARKER};

const SYNTHETIC_OWNER: &str = "Duffel Airways";
const SYNTHETIC_OPERATOR: &str = "SimAir";
const SYNTHETIC_TAX: &str = "25.00";
const DEPARTURE_TIME: &str = "10:00:00";
const ARRIVAL_TIME: &str = "14:30:00";

/// Builds one schema-conformant fake offer per call.
///
/// The random source is a type parameter so tests can seed it.
pub struct MockOfferGenerator<R: Rng = StdRng> {
    rng: R,
    config: FallbackConfig,
}

impl MockOfferGenerator<StdRng> {
    pub fn from_entropy(config: FallbackConfig) -> Self {
        Self::new(StdRng::from_entropy(), config)
    }

    pub fn seeded(seed: u64, config: FallbackConfig) -> Self {
        Self::new(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> MockOfferGenerator<R> {
    pub fn new(rng: R, config: FallbackConfig) -> Self {
        Self { rng, config }
    }

    pub fn generate(&mut self, origin: &str, destination: &str, date: NaiveDate) -> Offer {
        let price = self.rng.gen_range(self.config.price_range());
        let id = format!("mock_off_{}", self.rng.gen_range(1000..=9999));
        let day = date.format("%Y-%m-%d");

        let from = Airport::new(origin, "Origin City");
        let to = Airport::new(destination, "Dest City");

        Offer {
            id,
            total_amount: format!("{}.00", price),
            total_currency: self.config.currency.clone(),
            tax_amount: Some(SYNTHETIC_TAX.to_string()),
            tax_currency: Some(self.config.currency.clone()),
            owner: Carrier::new(&format!("{} {}", SYNTHETIC_OWNER, SYNTHETIC_MARKER)),
            slices: vec![Slice {
                origin: from.clone(),
                destination: to.clone(),
                segments: vec![Segment {
                    origin: from,
                    destination: to,
                    departing_at: format!("{}T{}", day, DEPARTURE_TIME),
                    arriving_at: format!("{}T{}", day, ARRIVAL_TIME),
                    operating_carrier: Carrier::new(SYNTHETIC_OPERATOR),
                    extra: Map::new(),
                }],
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}
