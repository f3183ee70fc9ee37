use super::booking::RawBooking;
use super::notification::Notification;
use super::offering::RawOffering;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote booking service.
///
/// Every call resolves to success, `CartError::Rejected` (the service
/// answered with a non-success status) or `CartError::NetworkError` (no
/// usable answer at all).
#[async_trait]
pub trait BookingService: Send + Sync {
    async fn fetch_offerings(&self) -> Result<Vec<RawOffering>>;
    /// Adds `seats` seats of route `line_id` to the caller's remote cart.
    async fn stage_line(&self, token: &str, line_id: &str, seats: u32) -> Result<()>;
    /// Turns everything staged so far into bookings.
    async fn confirm_checkout(&self, token: &str) -> Result<Vec<RawBooking>>;
    async fn booking_history(&self, token: &str) -> Result<Vec<RawBooking>>;
}

/// Supplies the current identity token, if the user is signed in.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Receives user-facing outcome events.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub type SharedBookingService = Arc<dyn BookingService>;
pub type TokenSourceBox = Box<dyn TokenSource>;
pub type NotificationSinkBox = Box<dyn NotificationSink>;
