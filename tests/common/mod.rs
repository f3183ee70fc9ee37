#![allow(dead_code)]

use seatcart::domain::offering::{Offering, RawOffering};
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub fn raw(id: &str, price: &str, seats: &str) -> RawOffering {
    RawOffering {
        id: id.to_string(),
        origin: "Bengaluru".to_string(),
        destination: format!("Stop {id}"),
        departure_time: "2024-07-15T21:45:00".to_string(),
        bus_operator: "KSRTC".to_string(),
        price_per_seat: price.to_string(),
        seats_available: seats.to_string(),
        ..Default::default()
    }
}

pub fn offering(id: &str, price: &str, seats: u32) -> Offering {
    Offering::try_from(raw(id, price, &seats.to_string())).unwrap()
}

/// Writes a catalog CSV with `rows` of `(id, price, seats)`.
pub fn write_catalog(path: &Path, rows: &[(&str, &str, &str)]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record([
        "id",
        "origin",
        "destination",
        "departureTime",
        "busOperator",
        "pricePerSeat",
        "seatsAvailable",
    ])?;
    for &(id, price, seats) in rows {
        wtr.write_record([
            id,
            "Bengaluru",
            &format!("Stop {id}"),
            "2024-07-15T21:45:00",
            "KSRTC",
            price,
            seats,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
