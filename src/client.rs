// Fare query client: one offer request per (origin, destination, date)
// Every failure is typed here and collapsed to "no offers" at the scanner boundary.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::model::Offer;

const OFFER_REQUESTS_PATH: &str = "/air/offer_requests";
// Error bodies are only kept for logging
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Transport(_) => "transport",
            QueryError::Status { .. } => "status",
            QueryError::Malformed(_) => "malformed",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Initialization error: {0}")]
    InitError(String),
}

// Source of live offers for one route and date
#[async_trait]
pub trait FareSource: Send + Sync {
    async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<Offer>, QueryError>;

    /// Same as `search`, with every error logged and reported as no offers
    async fn search_or_empty(&self, origin: &str, destination: &str, date: NaiveDate) -> Vec<Offer> {
        match self.search(origin, destination, date).await {
            Ok(offers) => offers,
            Err(e) => {
                warn!(
                    origin,
                    destination,
                    kind = e.kind(),
                    status = e.status(),
                    "Fare search failed: {}",
                    e
                );
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryStats {
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub requests_failed: AtomicUsize,
    pub offers_received: AtomicUsize,
    pub offers_discarded: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryStatsReport {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub offers_received: usize,
    pub offers_discarded: usize,
}

#[derive(Debug, Deserialize)]
struct OfferRequestResponse {
    data: OfferRequestData,
}

#[derive(Debug, Deserialize)]
struct OfferRequestData {
    offers: Vec<Value>,
}

/// Client for the Duffel offer request endpoint
pub struct DuffelClient {
    http: reqwest::Client,
    config: ApiConfig,
    stats: QueryStats,
}

impl DuffelClient {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            stats: QueryStats::default(),
        })
    }

    pub fn offer_requests_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            OFFER_REQUESTS_PATH
        )
    }

    pub fn stats(&self) -> QueryStatsReport {
        QueryStatsReport {
            requests_sent: self.stats.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.stats.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.stats.requests_failed.load(Ordering::SeqCst),
            offers_received: self.stats.offers_received.load(Ordering::SeqCst),
            offers_discarded: self.stats.offers_discarded.load(Ordering::SeqCst),
        }
    }

    async fn send(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<Offer>, QueryError> {
        let body = offer_request_body(origin, destination, date);
        debug!(url = %self.offer_requests_url(), %body, "Sending offer request");

        let response = self
            .http
            .post(self.offer_requests_url())
            .bearer_auth(&self.config.token)
            .header("Duffel-Version", &self.config.version)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        if status != reqwest::StatusCode::CREATED {
            let body: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OfferRequestResponse =
            serde_json::from_slice(&bytes).map_err(|e| QueryError::Malformed(e.to_string()))?;

        Ok(self.decode_offers(destination, parsed.data.offers))
    }

    // An offer that does not match the schema, or has no slice or segment,
    // is dropped on its own instead of discarding the whole response.
    fn decode_offers(&self, destination: &str, raw: Vec<Value>) -> Vec<Offer> {
        let received = raw.len();
        let offers: Vec<Offer> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Offer>(value) {
                Ok(offer) if offer.has_route() => Some(offer),
                Ok(offer) => {
                    warn!(destination, offer_id = %offer.id, "Discarding offer without segments");
                    None
                }
                Err(e) => {
                    warn!(destination, "Discarding unreadable offer: {}", e);
                    None
                }
            })
            .collect();

        self.stats
            .offers_received
            .fetch_add(received, Ordering::SeqCst);
        self.stats
            .offers_discarded
            .fetch_add(received - offers.len(), Ordering::SeqCst);
        offers
    }
}

#[async_trait]
impl FareSource for DuffelClient {
    async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<Offer>, QueryError> {
        self.stats.requests_sent.fetch_add(1, Ordering::SeqCst);

        let result = self.send(origin, destination, date).await;
        match &result {
            Ok(offers) => {
                self.stats.requests_succeeded.fetch_add(1, Ordering::SeqCst);
                debug!(origin, destination, count = offers.len(), "Offer request succeeded");
            }
            Err(_) => {
                self.stats.requests_failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        result
    }
}

/// One-way, one adult, economy
pub fn offer_request_body(origin: &str, destination: &str, date: NaiveDate) -> Value {
    json!({
        "data": {
            "slices": [{
                "origin": origin,
                "destination": destination,
                "departure_date": date.format("%Y-%m-%d").to_string()
            }],
            "passengers": [{ "type": "adult" }],
            "cabin_class": "economy"
        }
    })
}
