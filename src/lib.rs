// Deal hunter library: scan fare offers per destination, keep the cheapest,
// persist the result for the deal card renderer.

pub mod card;
pub mod client;
pub mod config;
pub mod hunter;
pub mod mock;
pub mod model;
pub mod scanner;
pub mod store;

// Re-export key types for convenience
pub use card::{featured, CardError, DealCard};
pub use client::{ClientError, DuffelClient, FareSource, QueryError, QueryStatsReport};
pub use config::{ApiConfig, ConfigError, FallbackConfig, HunterConfig};
pub use hunter::{DealHunter, RunSummary};
pub use mock::MockOfferGenerator;
pub use model::{Airport, Carrier, DealSet, Offer, Segment, Slice};
pub use scanner::{
    cheapest_index, select_cheapest, DealSource, DestinationOutcome, DestinationScanner,
    FallbackReason, ScanReport,
};
pub use store::{JsonFileStore, SnapshotStore, StoreError};
