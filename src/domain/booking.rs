use super::money::Money;
use super::wire;
use crate::error::CartError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A booking record as the service returns it from checkout and history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBooking {
    #[serde(default, deserialize_with = "wire::text")]
    pub id: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub route_id: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub seats: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub total_amount: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub booking_date: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
    Upcoming,
    Completed,
    Cancelled,
    Other(String),
}

impl From<&str> for BookingStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "confirmed" => BookingStatus::Confirmed,
            "upcoming" => BookingStatus::Upcoming,
            "completed" => BookingStatus::Completed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => f.write_str("CONFIRMED"),
            BookingStatus::Upcoming => f.write_str("UPCOMING"),
            BookingStatus::Completed => f.write_str("COMPLETED"),
            BookingStatus::Cancelled => f.write_str("CANCELLED"),
            BookingStatus::Other(status) => f.write_str(status),
        }
    }
}

/// A completed booking, for account display.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub route_id: String,
    pub seats: u32,
    pub total_amount: Money,
    pub booking_date: String,
    pub status: BookingStatus,
}

impl TryFrom<RawBooking> for Booking {
    type Error = CartError;

    fn try_from(raw: RawBooking) -> Result<Self, Self::Error> {
        let seats = raw.seats.trim().parse::<u32>().map_err(|_| {
            CartError::InvalidBookingData(format!(
                "non-numeric seat count '{}' in booking {}",
                raw.seats, raw.id
            ))
        })?;
        let total_amount = Decimal::from_str(raw.total_amount.trim()).map_err(|_| {
            CartError::InvalidBookingData(format!(
                "non-numeric amount '{}' in booking {}",
                raw.total_amount, raw.id
            ))
        })?;

        Ok(Self {
            status: BookingStatus::from(raw.status.as_str()),
            id: raw.id,
            user_id: raw.user_id,
            route_id: raw.route_id,
            seats,
            total_amount: Money::new(total_amount),
            booking_date: raw.booking_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_booking_from_wire_json() {
        let json = r#"{"id": 3, "userId": 9, "routeId": 7, "seats": "2",
            "totalAmount": "1000", "bookingDate": "2024-05-01T10:00:00", "status": "CONFIRMED"}"#;
        let raw: RawBooking = serde_json::from_str(json).unwrap();
        let booking = Booking::try_from(raw).unwrap();

        assert_eq!(booking.id, "3");
        assert_eq!(booking.route_id, "7");
        assert_eq!(booking.seats, 2);
        assert_eq!(booking.total_amount, Money::new(dec!(1000)));
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_booking_with_null_text_fields() {
        let json = r#"{"id": 4, "routeId": 7, "seats": 1, "totalAmount": 450.5,
            "bookingDate": null, "status": null}"#;
        let raw: RawBooking = serde_json::from_str(json).unwrap();
        let booking = Booking::try_from(raw).unwrap();

        assert_eq!(booking.booking_date, "");
        assert_eq!(booking.status, BookingStatus::Other(String::new()));
        assert_eq!(booking.total_amount, Money::new(dec!(450.5)));
    }

    #[test]
    fn test_booking_with_bad_amount_is_rejected() {
        let raw = RawBooking {
            id: "1".to_string(),
            seats: "2".to_string(),
            total_amount: "lots".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Booking::try_from(raw),
            Err(CartError::InvalidBookingData(_))
        ));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(BookingStatus::from("Upcoming"), BookingStatus::Upcoming);
        assert_eq!(BookingStatus::from("canceled"), BookingStatus::Cancelled);
        assert_eq!(
            BookingStatus::from("On Hold"),
            BookingStatus::Other("On Hold".to_string())
        );
        assert_eq!(BookingStatus::Confirmed.to_string(), "CONFIRMED");
    }
}
