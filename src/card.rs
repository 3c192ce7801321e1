// Deal card: the fields the promotional image renderer reads from a snapshot.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::Offer;
use crate::store::{SnapshotStore, StoreError};

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Offer {0} has no segments")]
    NoSegments(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealCard {
    pub price: String,
    pub currency: String,
    pub origin: String,
    pub destination: String,
    pub date: String,
    // e.g. "06 JAN"
    pub date_label: String,
}

impl DealCard {
    pub fn from_offer(offer: &Offer) -> Result<Self, CardError> {
        let no_segments = || CardError::NoSegments(offer.id.clone());
        let origin = offer.origin_code().ok_or_else(no_segments)?;
        let destination = offer.destination_code().ok_or_else(no_segments)?;
        let date = offer.departure_date().ok_or_else(no_segments)?;

        Ok(Self {
            price: offer.total_amount.clone(),
            currency: offer.total_currency.clone(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
            date_label: date_label(date),
        })
    }

    pub fn headline(&self) -> String {
        format!(
            "{} -> {} | {} | {} {}",
            self.origin, self.destination, self.date_label, self.price, self.currency
        )
    }
}

/// `2026-01-06` becomes `06 JAN`; anything unparsable is shown as given
pub fn date_label(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%d %b").to_string().to_uppercase(),
        Err(_) => raw.to_string(),
    }
}

/// Card for the first deal in the snapshot. `None` means there is nothing to render yet.
pub fn featured<S: SnapshotStore + ?Sized>(store: &S) -> Result<Option<DealCard>, CardError> {
    let deals = match store.load() {
        Ok(deals) => deals,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    deals.first().map(DealCard::from_offer).transpose()
}
