// Offer data structures shared by the fare client, the scanner and the snapshot store.
// Field names follow the fare-search API so offers round-trip without translation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker carried in the owner name of every synthetic offer
pub const SYNTHETIC_MARKER: &str = "(Simulated)";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Airport {
    pub iata_code: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Airport {
    pub fn new(iata_code: &str, name: &str) -> Self {
        Self {
            iata_code: iata_code.to_string(),
            name: name.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Carrier {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Carrier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Segment {
    pub origin: Airport,
    pub destination: Airport,
    pub departing_at: String,
    pub arriving_at: String,
    pub operating_carrier: Carrier,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Slice {
    pub origin: Airport,
    pub destination: Airport,
    pub segments: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A priced itinerary candidate, either returned by the API or synthesized.
///
/// Fields the pipeline does not read are kept in `extra` so a persisted offer
/// carries everything the API sent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Offer {
    pub id: String,
    pub total_amount: String,
    pub total_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_currency: Option<String>,
    pub owner: Carrier,
    pub slices: Vec<Slice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Offer {
    /// Numeric price, or `None` when `total_amount` is not a finite non-negative number
    pub fn price(&self) -> Option<f64> {
        parse_amount(&self.total_amount)
    }

    fn first_segment(&self) -> Option<&Segment> {
        self.slices.first().and_then(|s| s.segments.first())
    }

    fn last_segment(&self) -> Option<&Segment> {
        self.slices.last().and_then(|s| s.segments.last())
    }

    pub fn origin_code(&self) -> Option<&str> {
        self.first_segment().map(|s| s.origin.iata_code.as_str())
    }

    pub fn destination_code(&self) -> Option<&str> {
        self.last_segment().map(|s| s.destination.iata_code.as_str())
    }

    /// Date portion of the outbound departure timestamp
    pub fn departure_date(&self) -> Option<&str> {
        self.first_segment()
            .map(|s| s.departing_at.split('T').next().unwrap_or(&s.departing_at))
    }

    /// At least one slice, and no slice without segments
    pub fn has_route(&self) -> bool {
        !self.slices.is_empty() && self.slices.iter().all(|s| !s.segments.is_empty())
    }

    /// Priced and routed well enough to be selected and rendered
    pub fn is_usable(&self) -> bool {
        self.price().is_some() && self.has_route()
    }

    pub fn is_synthetic(&self) -> bool {
        self.owner.name.contains(SYNTHETIC_MARKER)
    }
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Winning offers of one run, one per scanned destination, in scan order
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DealSet(Vec<Offer>);

impl DealSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, offer: Offer) {
        self.0.push(offer);
    }

    pub fn offers(&self) -> &[Offer] {
        &self.0
    }

    pub fn first(&self) -> Option<&Offer> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn synthetic_count(&self) -> usize {
        self.0.iter().filter(|o| o.is_synthetic()).count()
    }

    pub fn into_inner(self) -> Vec<Offer> {
        self.0
    }
}

impl From<Vec<Offer>> for DealSet {
    fn from(offers: Vec<Offer>) -> Self {
        Self(offers)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn offer(id: &str, amount: &str, origin: &str, destination: &str) -> Offer {
        Offer {
            id: id.to_string(),
            total_amount: amount.to_string(),
            total_currency: "EUR".to_string(),
            tax_amount: None,
            tax_currency: None,
            owner: Carrier::new("TAP Air Portugal"),
            slices: vec![Slice {
                origin: Airport::new(origin, "Origin"),
                destination: Airport::new(destination, "Destination"),
                segments: vec![Segment {
                    origin: Airport::new(origin, "Origin"),
                    destination: Airport::new(destination, "Destination"),
                    departing_at: "2026-12-03T07:15:00".to_string(),
                    arriving_at: "2026-12-03T09:55:00".to_string(),
                    operating_carrier: Carrier::new("TAP Air Portugal"),
                    extra: Map::new(),
                }],
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::offer;
    use super::*;
    use test_case::test_case;

    #[test_case("220.00", Some(220.0); "decimal string")]
    #[test_case(" 15 ", Some(15.0); "surrounding whitespace")]
    #[test_case("0.00", Some(0.0); "free")]
    #[test_case("N/A", None; "not a number")]
    #[test_case("-4.00", None; "negative")]
    #[test_case("NaN", None; "nan")]
    #[test_case("inf", None; "infinite")]
    #[test_case("", None; "empty")]
    fn test_parse_amount(raw: &str, expected: Option<f64>) {
        assert_eq!(parse_amount(raw), expected);
    }

    #[test]
    fn test_api_offer_keeps_unknown_fields() {
        let json = r#"{
            "id": "off_0000AEdGRhtp5AUUdJqMxo",
            "total_amount": "132.40",
            "total_currency": "EUR",
            "expires_at": "2026-10-19T12:00:00Z",
            "owner": {"name": "Iberia", "iata_code": "IB"},
            "slices": [{
                "origin": {"iata_code": "LIS", "name": "Humberto Delgado Airport"},
                "destination": {"iata_code": "MAD", "name": "Adolfo Suarez Madrid-Barajas Airport"},
                "duration": "PT1H20M",
                "segments": [{
                    "origin": {"iata_code": "LIS", "name": "Humberto Delgado Airport"},
                    "destination": {"iata_code": "MAD", "name": "Adolfo Suarez Madrid-Barajas Airport"},
                    "departing_at": "2026-12-03T06:00:00",
                    "arriving_at": "2026-12-03T08:20:00",
                    "operating_carrier": {"name": "Iberia Express"},
                    "marketing_carrier_flight_number": "3101"
                }]
            }]
        }"#;

        let offer: Offer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.owner.name, "Iberia");
        assert_eq!(offer.extra["expires_at"], "2026-10-19T12:00:00Z");
        assert_eq!(offer.slices[0].extra["duration"], "PT1H20M");
        assert_eq!(offer.owner.extra["iata_code"], "IB");

        let written = serde_json::to_value(&offer).unwrap();
        assert_eq!(
            written["slices"][0]["segments"][0]["marketing_carrier_flight_number"],
            "3101"
        );
        assert!(written.get("tax_amount").is_none());
    }

    #[test]
    fn test_route_accessors_use_first_and_last_segment() {
        let mut offer = offer("off_1", "99.00", "LIS", "AMS");
        let mut connection = offer.slices[0].segments[0].clone();
        connection.origin = Airport::new("AMS", "Schiphol");
        connection.destination = Airport::new("CPH", "Kastrup");
        offer.slices[0].segments.push(connection);

        assert_eq!(offer.origin_code(), Some("LIS"));
        assert_eq!(offer.destination_code(), Some("CPH"));
        assert_eq!(offer.departure_date(), Some("2026-12-03"));
        assert!(!offer.is_synthetic());
    }

    #[test]
    fn test_offer_without_route_is_not_usable() {
        let complete = offer("off_ok", "99.00", "LIS", "LHR");
        assert!(complete.has_route());
        assert!(complete.is_usable());

        let mut no_slices = complete.clone();
        no_slices.slices.clear();
        assert!(!no_slices.has_route());
        assert!(!no_slices.is_usable());

        let mut empty_slice = complete.clone();
        empty_slice.slices.push(Slice {
            segments: Vec::new(),
            ..complete.slices[0].clone()
        });
        assert!(!empty_slice.has_route());

        let mut unpriced = complete;
        unpriced.total_amount = "N/A".to_string();
        assert!(unpriced.has_route());
        assert!(!unpriced.is_usable());
    }

    #[test]
    fn test_deal_set_serializes_as_plain_array() {
        let deals = DealSet::from(vec![offer("off_1", "10.00", "LIS", "LHR")]);
        let value = serde_json::to_value(&deals).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], "off_1");
    }
}
