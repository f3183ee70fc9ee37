use super::money::Price;
use super::wire;
use crate::error::CartError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A route listing exactly as the booking service sends it.
///
/// Every scalar is text and `null` reads as empty; see [`Offering::try_from`]
/// for coercion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOffering {
    #[serde(default, deserialize_with = "wire::text")]
    pub id: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub origin: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub destination: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub departure_time: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub arrival_time: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub bus_operator: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub bus_type: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub price_per_seat: String,
    #[serde(default, deserialize_with = "wire::optional_text")]
    pub total_seats: Option<String>,
    #[serde(default, deserialize_with = "wire::text")]
    pub seats_available: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub amenities: String,
}

/// A purchasable route, typed and validated.
///
/// Immutable once fetched. Seat counts go stale as other users buy, and
/// nothing here tracks that.
#[derive(Debug, Clone, PartialEq)]
pub struct Offering {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub operator: String,
    pub bus_type: String,
    pub price_per_seat: Price,
    pub seats_available: u32,
    pub total_seats: Option<u32>,
    pub amenities: Vec<String>,
}

impl Offering {
    /// `"<origin> to <destination>"`.
    pub fn route_label(&self) -> String {
        format!("{} to {}", self.origin, self.destination)
    }

    /// Date part of the departure time (`2024-06-01T08:30:00` → `2024-06-01`).
    pub fn departure_date(&self) -> &str {
        match self.departure_time.split('T').next() {
            Some(date) if !date.is_empty() => date,
            _ => "N/A",
        }
    }

    /// `HH:MM` part of the departure time.
    pub fn departure_clock(&self) -> &str {
        self.departure_time
            .split('T')
            .nth(1)
            .and_then(|time| time.get(..5))
            .unwrap_or("N/A")
    }

    pub fn is_sold_out(&self) -> bool {
        self.seats_available == 0
    }
}

fn parse_price(raw: &str) -> Result<Price, CartError> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| CartError::InvalidOfferingData(format!("non-numeric price '{raw}'")))?;
    Price::new(value)
}

fn parse_seats(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

impl TryFrom<RawOffering> for Offering {
    type Error = CartError;

    fn try_from(raw: RawOffering) -> Result<Self, Self::Error> {
        let id = raw.id.trim().to_string();
        if id.is_empty() {
            return Err(CartError::InvalidOfferingData(
                "offering without id".to_string(),
            ));
        }

        let price_per_seat = parse_price(&raw.price_per_seat)?;
        let seats_available = parse_seats(&raw.seats_available).ok_or_else(|| {
            CartError::InvalidOfferingData(format!(
                "non-numeric seat count '{}' for route {id}",
                raw.seats_available
            ))
        })?;
        let total_seats = raw.total_seats.as_deref().and_then(parse_seats);
        let amenities = raw
            .amenities
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            id,
            origin: raw.origin,
            destination: raw.destination,
            departure_time: raw.departure_time,
            arrival_time: raw.arrival_time,
            operator: raw.bus_operator,
            bus_type: raw.bus_type,
            price_per_seat,
            seats_available,
            total_seats,
            amenities,
        })
    }
}
