use crate::domain::offering::RawOffering;
use crate::error::{CartError, Result};
use serde::Deserialize;
use std::io::Read;

/// One catalog row. Columns are read as text so ids like `007` survive.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferingRow {
    id: String,
    #[serde(default)]
    origin: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    departure_time: String,
    #[serde(default)]
    arrival_time: String,
    #[serde(default)]
    bus_operator: String,
    #[serde(default)]
    bus_type: String,
    #[serde(default)]
    price_per_seat: String,
    #[serde(default)]
    total_seats: String,
    #[serde(default)]
    seats_available: String,
    #[serde(default)]
    amenities: String,
}

impl From<OfferingRow> for RawOffering {
    fn from(row: OfferingRow) -> Self {
        RawOffering {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            bus_operator: row.bus_operator,
            bus_type: row.bus_type,
            price_per_seat: row.price_per_seat,
            total_seats: Some(row.total_seats).filter(|t| !t.trim().is_empty()),
            seats_available: row.seats_available,
            amenities: row.amenities,
        }
    }
}

/// Reads a route catalog from CSV, with the service's camelCase field names
/// as headers (`id,origin,destination,...,pricePerSeat,seatsAvailable`).
///
/// Rows come out raw; coercion happens when they reach the catalog adapter.
pub struct OfferingReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OfferingReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one raw offering per row.
    pub fn offerings(self) -> impl Iterator<Item = Result<RawOffering>> {
        self.reader
            .into_deserialize::<OfferingRow>()
            .map(|row| row.map(RawOffering::from).map_err(CartError::from))
    }
}
