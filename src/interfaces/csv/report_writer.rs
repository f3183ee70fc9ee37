use crate::domain::booking::Booking;
use crate::domain::cart::{CartStore, OrderSummary};
use crate::domain::checkout::CheckoutResult;
use crate::domain::offering::Offering;
use crate::error::{CartError, Result};
use std::io::Write;

/// Writes catalog, cart, booking and checkout output as CSV.
///
/// Sections have different widths, so the writer is flexible.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_offerings(&mut self, offerings: &[Offering]) -> Result<()> {
        self.writer.write_record([
            "id",
            "route",
            "departure",
            "operator",
            "price",
            "seats_available",
        ])?;
        for offering in offerings {
            self.writer.write_record([
                offering.id.as_str(),
                &offering.route_label(),
                &offering.departure_time,
                &offering.operator,
                &offering.price_per_seat.to_string(),
                &offering.seats_available.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Cart lines followed by `subtotal`, `service_fee` and `total` rows.
    pub fn write_cart(&mut self, cart: &CartStore, summary: &OrderSummary) -> Result<()> {
        self.writer
            .write_record(["id", "route", "quantity", "price", "subtotal"])?;
        for line in cart.lines() {
            self.writer.write_record([
                line.id(),
                line.route(),
                &line.quantity().to_string(),
                &line.price_snapshot().to_string(),
                &line.subtotal().to_string(),
            ])?;
        }
        self.writer
            .write_record(["subtotal", &summary.subtotal.to_string()])?;
        self.writer
            .write_record(["service_fee", &summary.service_fee.to_string()])?;
        self.writer.write_record(["total", &summary.total.to_string()])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_bookings(&mut self, bookings: &[Booking]) -> Result<()> {
        self.writer.write_record([
            "id",
            "route_id",
            "seats",
            "total_amount",
            "booking_date",
            "status",
        ])?;
        for booking in bookings {
            self.writer.write_record([
                booking.id.as_str(),
                &booking.route_id,
                &booking.seats.to_string(),
                &booking.total_amount.to_string(),
                &booking.booking_date,
                &booking.status.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// `completed`, or `failed,<reason>,<line>,<message>`.
    pub fn write_outcome(&mut self, result: &CheckoutResult) -> Result<()> {
        match result {
            CheckoutResult::Completed { .. } => self.writer.write_record(["completed"])?,
            CheckoutResult::Failed(failure) => self.writer.write_record([
                "failed",
                failure.reason.as_str(),
                failure.failed_line_id.as_deref().unwrap_or(""),
                &failure.user_message(),
            ])?,
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| CartError::IoError(std::io::Error::new(e.error().kind(), e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::{CheckoutFailure, FailureReason};
    use crate::domain::money::{Money, Price};
    use rust_decimal_macros::dec;

    fn offering(id: &str, price: rust_decimal::Decimal, seats: u32) -> Offering {
        Offering {
            id: id.to_string(),
            origin: "Delhi".to_string(),
            destination: "Agra".to_string(),
            departure_time: "2024-06-01T08:30:00".to_string(),
            arrival_time: String::new(),
            operator: "RedLine".to_string(),
            bus_type: String::new(),
            price_per_seat: Price::new(price).unwrap(),
            seats_available: seats,
            total_seats: None,
            amenities: Vec::new(),
        }
    }

    fn written(f: impl FnOnce(&mut ReportWriter<Vec<u8>>)) -> String {
        let mut writer = ReportWriter::new(Vec::new());
        f(&mut writer);
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_cart_with_summary_rows() {
        let mut cart = CartStore::new();
        cart.add_line(&offering("1", dec!(450.00), 5));
        cart.add_line(&offering("1", dec!(450.00), 5));
        let summary = cart.summary(Money::new(dec!(50)));

        let out = written(|w| w.write_cart(&cart, &summary).unwrap());
        assert!(out.contains("1,Delhi to Agra,2,450,900\n"));
        assert!(out.contains("service_fee,50\n"));
        assert!(out.ends_with("total,950\n"));
    }

    #[test]
    fn test_failed_outcome_row() {
        let mut failure = CheckoutFailure::new(FailureReason::StageFailed);
        failure.failed_line_id = Some("2".to_string());
        failure.message = Some("Route full".to_string());

        let out = written(|w| w.write_outcome(&CheckoutResult::Failed(failure)).unwrap());
        assert_eq!(out, "failed,stage_failed,2,Route full\n");
    }

    #[test]
    fn test_offerings_table() {
        let out = written(|w| w.write_offerings(&[offering("9", dec!(99.5), 0)]).unwrap());
        assert!(out.starts_with("id,route,departure,operator,price,seats_available\n"));
        assert!(out.contains("9,Delhi to Agra,2024-06-01T08:30:00,RedLine,99.5,0"));
    }
}
