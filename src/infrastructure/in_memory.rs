use crate::domain::booking::RawBooking;
use crate::domain::offering::RawOffering;
use crate::domain::ports::BookingService;
use crate::error::{CartError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A request the in-memory service received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FetchOfferings,
    StageLine {
        token: String,
        line_id: String,
        seats: u32,
    },
    ConfirmCheckout {
        token: String,
    },
    BookingHistory {
        token: String,
    },
}

#[derive(Default)]
struct RemoteState {
    offerings: Vec<RawOffering>,
    staged: Vec<(String, u32)>,
    bookings: Vec<RawBooking>,
    calls: Vec<RemoteCall>,
    rejected_lines: HashMap<String, Option<String>>,
    rejected_confirm: Option<String>,
    required_token: Option<String>,
    unreachable: bool,
    next_booking_id: u64,
}

impl RemoteState {
    fn seats_left(&self, line_id: &str) -> Option<u32> {
        let route = self.offerings.iter().find(|o| o.id == line_id)?;
        let available = route.seats_available.trim().parse::<u32>().unwrap_or(0);
        let held: u32 = self
            .staged
            .iter()
            .filter(|(id, _)| id == line_id)
            .map(|(_, seats)| *seats)
            .sum();
        Some(available.saturating_sub(held))
    }

    fn check(&self, token: Option<&str>) -> Result<()> {
        if self.unreachable {
            return Err(CartError::NetworkError("connection refused".to_string()));
        }
        if let (Some(required), Some(token)) = (self.required_token.as_deref(), token)
            && required != token
        {
            return Err(CartError::Rejected {
                status: 401,
                message: Some("Invalid or expired token".to_string()),
            });
        }
        Ok(())
    }
}

/// A booking service that lives in memory.
///
/// Behaves like the real service for a single user: staging checks the seat
/// count, confirming turns staged lines into bookings and decrements seats.
/// Failures can be scripted per line, for the confirm step, or for the whole
/// transport. Serves the offline catalog mode of the binary and the tests.
///
/// Clones share state (`Arc<RwLock<..>>`).
#[derive(Default, Clone)]
pub struct InMemoryBookingService {
    state: Arc<RwLock<RemoteState>>,
}

impl InMemoryBookingService {
    /// Creates a service with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offerings(offerings: Vec<RawOffering>) -> Self {
        Self {
            state: Arc::new(RwLock::new(RemoteState {
                offerings,
                ..Default::default()
            })),
        }
    }

    /// Makes staging of `line_id` fail with `message`.
    pub async fn reject_line(&self, line_id: impl Into<String>, message: impl Into<String>) {
        let mut state = self.state.write().await;
        state
            .rejected_lines
            .insert(line_id.into(), Some(message.into()));
    }

    /// Makes staging of `line_id` fail with a bare status and no message.
    pub async fn reject_line_silently(&self, line_id: impl Into<String>) {
        self.state.write().await.rejected_lines.insert(line_id.into(), None);
    }

    /// Makes the confirm step fail with `message`.
    pub async fn reject_confirm(&self, message: impl Into<String>) {
        self.state.write().await.rejected_confirm = Some(message.into());
    }

    /// Every call fails as if the service could not be reached.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.write().await.unreachable = unreachable;
    }

    /// Only `token` is accepted on authenticated calls.
    pub async fn require_token(&self, token: impl Into<String>) {
        self.state.write().await.required_token = Some(token.into());
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.state.read().await.calls.clone()
    }

    /// Seats currently staged and not yet confirmed, per route.
    pub async fn staged(&self) -> Vec<(String, u32)> {
        self.state.read().await.staged.clone()
    }

    pub async fn offerings(&self) -> Vec<RawOffering> {
        self.state.read().await.offerings.clone()
    }
}

#[async_trait]
impl BookingService for InMemoryBookingService {
    async fn fetch_offerings(&self) -> Result<Vec<RawOffering>> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::FetchOfferings);
        state.check(None)?;
        Ok(state.offerings.clone())
    }

    async fn stage_line(&self, token: &str, line_id: &str, seats: u32) -> Result<()> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::StageLine {
            token: token.to_string(),
            line_id: line_id.to_string(),
            seats,
        });
        state.check(Some(token))?;

        if let Some(message) = state.rejected_lines.get(line_id) {
            return Err(CartError::Rejected {
                status: 409,
                message: message.clone(),
            });
        }
        let left = state.seats_left(line_id).ok_or_else(|| CartError::Rejected {
            status: 404,
            message: Some(format!("Route not found with id: {line_id}")),
        })?;
        if seats > left {
            return Err(CartError::Rejected {
                status: 409,
                message: Some(format!("Only {left} seats available")),
            });
        }

        state.staged.push((line_id.to_string(), seats));
        Ok(())
    }

    async fn confirm_checkout(&self, token: &str) -> Result<Vec<RawBooking>> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::ConfirmCheckout {
            token: token.to_string(),
        });
        state.check(Some(token))?;

        if let Some(message) = state.rejected_confirm.clone() {
            return Err(CartError::Rejected {
                status: 500,
                message: Some(message),
            });
        }
        if state.staged.is_empty() {
            return Err(CartError::Rejected {
                status: 400,
                message: Some("Cart is empty".to_string()),
            });
        }

        let booking_date = chrono::Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let staged = std::mem::take(&mut state.staged);
        let mut created = Vec::with_capacity(staged.len());

        for (line_id, seats) in staged {
            let Some(route) = state.offerings.iter_mut().find(|o| o.id == line_id) else {
                continue;
            };
            let price = Decimal::from_str(route.price_per_seat.trim()).unwrap_or(Decimal::ZERO);
            let available = route.seats_available.trim().parse::<u32>().unwrap_or(0);
            route.seats_available = available.saturating_sub(seats).to_string();

            state.next_booking_id += 1;
            created.push(RawBooking {
                id: state.next_booking_id.to_string(),
                user_id: "1".to_string(),
                route_id: line_id,
                seats: seats.to_string(),
                total_amount: price
                    .saturating_mul(Decimal::from(seats))
                    .normalize()
                    .to_string(),
                booking_date: booking_date.clone(),
                status: "CONFIRMED".to_string(),
            });
        }

        state.bookings.extend(created.iter().cloned());
        Ok(created)
    }

    async fn booking_history(&self, token: &str) -> Result<Vec<RawBooking>> {
        let mut state = self.state.write().await;
        state.calls.push(RemoteCall::BookingHistory {
            token: token.to_string(),
        });
        state.check(Some(token))?;
        Ok(state.bookings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, seats: &str) -> RawOffering {
        RawOffering {
            id: id.to_string(),
            price_per_seat: "250".to_string(),
            seats_available: seats.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_staging_respects_remote_seat_count() {
        let service = InMemoryBookingService::with_offerings(vec![route("1", "3")]);

        service.stage_line("t", "1", 2).await.unwrap();
        let err = service.stage_line("t", "1", 2).await.unwrap_err();
        assert_eq!(err.remote_message(), Some("Only 1 seats available"));

        let err = service.stage_line("t", "99", 1).await.unwrap_err();
        assert!(matches!(err, CartError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_confirm_creates_bookings_and_decrements_seats() {
        let service = InMemoryBookingService::with_offerings(vec![route("1", "3")]);
        service.stage_line("t", "1", 2).await.unwrap();

        let bookings = service.confirm_checkout("t").await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].total_amount, "500");
        assert_eq!(bookings[0].status, "CONFIRMED");
        assert!(service.staged().await.is_empty());
        assert_eq!(service.offerings().await[0].seats_available, "1");

        let history = service.booking_history("t").await.unwrap();
        assert_eq!(history, bookings);
    }

    #[tokio::test]
    async fn test_confirm_amount_saturates() {
        let mut huge = route("1", "3");
        huge.price_per_seat = "79228162514264337593543950335".to_string();
        let service = InMemoryBookingService::with_offerings(vec![huge]);
        service.stage_line("t", "1", 2).await.unwrap();

        let bookings = service.confirm_checkout("t").await.unwrap();
        assert_eq!(bookings[0].total_amount, "79228162514264337593543950335");
    }

    #[tokio::test]
    async fn test_confirm_with_nothing_staged() {
        let service = InMemoryBookingService::new();
        let err = service.confirm_checkout("t").await.unwrap_err();
        assert_eq!(err.remote_message(), Some("Cart is empty"));
    }

    #[tokio::test]
    async fn test_required_token() {
        let service = InMemoryBookingService::with_offerings(vec![route("1", "3")]);
        service.require_token("secret").await;

        let err = service.stage_line("wrong", "1", 1).await.unwrap_err();
        assert!(matches!(err, CartError::Rejected { status: 401, .. }));
        assert!(service.stage_line("secret", "1", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let service = InMemoryBookingService::with_offerings(vec![route("1", "3")]);
        service.fetch_offerings().await.unwrap();
        service.stage_line("t", "1", 1).await.unwrap();

        assert_eq!(
            service.calls().await,
            vec![
                RemoteCall::FetchOfferings,
                RemoteCall::StageLine {
                    token: "t".to_string(),
                    line_id: "1".to_string(),
                    seats: 1
                }
            ]
        );
    }
}
