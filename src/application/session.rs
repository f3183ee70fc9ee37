use super::catalog::{CatalogAdapter, HistoryFetch};
use super::checkout::CheckoutOrchestrator;
use crate::config::ClientConfig;
use crate::domain::cart::{AddOutcome, CartStore, OrderSummary};
use crate::domain::checkout::{CheckoutResult, CheckoutState, FailureReason};
use crate::domain::money::Money;
use crate::domain::notification::Notification;
use crate::domain::offering::Offering;
use crate::domain::ports::{NotificationSinkBox, SharedBookingService, TokenSourceBox};
use crate::error::{CartError, Result};
use std::time::Duration;
use tracing::info;

/// One user's shopping session.
///
/// Owns the cart and the last catalog read, runs the add-to-cart pre-checks,
/// drives checkout and reports every outcome to the notification sink. The
/// cart is cleared only after a completed checkout.
pub struct BookingSession {
    cart: CartStore,
    offerings: Vec<Offering>,
    catalog: CatalogAdapter,
    orchestrator: CheckoutOrchestrator,
    tokens: TokenSourceBox,
    notifier: NotificationSinkBox,
    service_fee: Money,
    commit_timeout: Option<Duration>,
}

impl BookingSession {
    pub fn new(
        service: SharedBookingService,
        tokens: TokenSourceBox,
        notifier: NotificationSinkBox,
    ) -> Self {
        let defaults = ClientConfig::default();
        Self {
            cart: CartStore::new(),
            offerings: Vec::new(),
            catalog: CatalogAdapter::new(service.clone()),
            orchestrator: CheckoutOrchestrator::new(service),
            tokens,
            notifier,
            service_fee: defaults.service_fee,
            commit_timeout: defaults.commit_timeout,
        }
    }

    /// Takes the fee and commit timeout from `config`.
    pub fn from_config(
        service: SharedBookingService,
        tokens: TokenSourceBox,
        notifier: NotificationSinkBox,
        config: &ClientConfig,
    ) -> Self {
        Self::new(service, tokens, notifier)
            .with_service_fee(config.service_fee)
            .with_commit_timeout(config.commit_timeout)
    }

    pub fn with_service_fee(mut self, fee: Money) -> Self {
        self.service_fee = fee;
        self
    }

    pub fn with_commit_timeout(mut self, limit: Option<Duration>) -> Self {
        self.commit_timeout = limit;
        self
    }

    /// Replaces the catalog with a fresh read. A failed read leaves the
    /// catalog empty and is reported as a notification.
    pub async fn load_catalog(&mut self) -> &[Offering] {
        let fetch = self.catalog.fetch_offerings().await;
        if fetch.error.is_some() {
            self.notifier.notify(Notification::destructive(
                "Error Fetching Routes",
                "Could not load bus routes from the server.",
            ));
        }
        self.offerings = fetch.offerings;
        &self.offerings
    }

    pub fn offerings(&self) -> &[Offering] {
        &self.offerings
    }

    pub fn offering(&self, id: &str) -> Option<&Offering> {
        self.offerings.iter().find(|offering| offering.id == id)
    }

    /// Adds one seat of `offering` and tells the user what happened.
    pub fn add_to_cart(&mut self, offering: &Offering) -> AddOutcome {
        let outcome = self.cart.add_line(offering);
        let notification = match outcome {
            AddOutcome::Added | AddOutcome::Incremented => Notification::success(
                "Added to Cart",
                format!("{} has been added to your cart.", offering.route_label()),
            ),
            AddOutcome::OutOfStock => {
                Notification::destructive("Out of Stock", "This route is currently sold out.")
            }
            AddOutcome::AtCapacity => {
                let available = self
                    .cart
                    .line(&offering.id)
                    .map_or(offering.seats_available, |line| {
                        line.seats_available_snapshot()
                    });
                Notification::destructive(
                    "Maximum Quantity Reached",
                    format!("Only {available} seats available."),
                )
            }
        };
        self.notifier.notify(notification);
        outcome
    }

    /// [`add_to_cart`](Self::add_to_cart) for an offering of the loaded catalog.
    pub fn add_by_id(&mut self, id: &str) -> Result<AddOutcome> {
        let offering = self
            .offering(id)
            .cloned()
            .ok_or_else(|| CartError::InvalidOfferingData(format!("no route with id '{id}'")))?;
        Ok(self.add_to_cart(&offering))
    }

    /// Sets a line's quantity (clamped; `n <= 0` removes the line).
    pub fn update_quantity(&mut self, id: &str, n: i64) -> Option<u32> {
        self.cart.set_quantity(id, n)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.cart.remove_line(id)
    }

    pub fn summary(&self) -> OrderSummary {
        self.cart.summary(self.service_fee)
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn checkout_state(&self) -> CheckoutState {
        self.orchestrator.state()
    }

    /// Commits the cart, clearing it only when every step succeeded.
    pub async fn checkout(&mut self) -> Result<CheckoutResult> {
        let token = self.tokens.token();
        let result = match self.commit_timeout {
            Some(limit) => {
                self.orchestrator
                    .commit_with_timeout(&self.cart, token.as_deref(), limit)
                    .await?
            }
            None => self.orchestrator.commit(&self.cart, token.as_deref()).await?,
        };

        let notification = match &result {
            CheckoutResult::Completed { bookings } => {
                info!(bookings = bookings.len(), "clearing cart after checkout");
                self.cart.clear();
                Notification::success(
                    "Payment Successful!",
                    "Your bus tickets have been booked successfully.",
                )
            }
            CheckoutResult::Failed(failure) => {
                let title = match failure.reason {
                    FailureReason::Unauthenticated => "Authentication Error",
                    FailureReason::EmptyCart => "No Items to Checkout",
                    _ => "Checkout Failed",
                };
                Notification::destructive(title, failure.user_message())
            }
        };
        self.notifier.notify(notification);
        Ok(result)
    }

    /// Booking history of the signed-in user.
    pub async fn booking_history(&self) -> HistoryFetch {
        let token = self.tokens.token();
        let fetch = self.catalog.fetch_booking_history(token.as_deref()).await;
        match &fetch.error {
            Some(CartError::Unauthenticated) => self.notifier.notify(Notification::destructive(
                "Authentication Error",
                "You must be logged in to view your bookings.",
            )),
            Some(_) => self.notifier.notify(Notification::destructive(
                "Error Fetching Bookings",
                "Could not load your booking history.",
            )),
            None => {}
        }
        fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::Severity;
    use crate::domain::offering::RawOffering;
    use crate::infrastructure::host::{RecordingNotifier, StaticToken};
    use crate::infrastructure::in_memory::InMemoryBookingService;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn raw(id: &str, price: &str, seats: &str) -> RawOffering {
        RawOffering {
            id: id.to_string(),
            origin: "Chennai".to_string(),
            destination: "Madurai".to_string(),
            price_per_seat: price.to_string(),
            seats_available: seats.to_string(),
            ..Default::default()
        }
    }

    fn session(
        service: &InMemoryBookingService,
        token: Option<&str>,
    ) -> (BookingSession, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        let session = BookingSession::new(
            Arc::new(service.clone()),
            Box::new(StaticToken::new(token.map(str::to_string))),
            Box::new(notifier.clone()),
        );
        (session, notifier)
    }

    #[tokio::test]
    async fn test_add_pre_checks_notify() {
        let service =
            InMemoryBookingService::with_offerings(vec![raw("1", "500", "1"), raw("2", "300", "0")]);
        let (mut session, notifier) = session(&service, Some("t"));
        session.load_catalog().await;

        assert_eq!(session.add_by_id("1").unwrap(), AddOutcome::Added);
        assert_eq!(session.add_by_id("1").unwrap(), AddOutcome::AtCapacity);
        assert_eq!(session.add_by_id("2").unwrap(), AddOutcome::OutOfStock);
        assert!(session.add_by_id("42").is_err());

        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].title, "Added to Cart");
        assert_eq!(
            notifications[0].description,
            "Chennai to Madurai has been added to your cart."
        );
        assert_eq!(notifications[1].description, "Only 1 seats available.");
        assert_eq!(notifications[2].title, "Out of Stock");
        assert_eq!(notifications[2].severity, Severity::Destructive);
        assert_eq!(session.cart().total_items(), 1);
    }

    #[tokio::test]
    async fn test_summary_includes_service_fee() {
        let service = InMemoryBookingService::with_offerings(vec![raw("1", "500", "4")]);
        let (session, _) = session(&service, Some("t"));
        let mut session = session.with_service_fee(Money::new(dec!(40)));
        session.load_catalog().await;
        session.add_by_id("1").unwrap();
        session.update_quantity("1", 3);

        let summary = session.summary();
        assert_eq!(summary.items, 3);
        assert_eq!(summary.subtotal, Money::new(dec!(1500)));
        assert_eq!(summary.total, Money::new(dec!(1540)));
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_only_on_success() {
        let service = InMemoryBookingService::with_offerings(vec![raw("1", "500", "4")]);
        service.reject_confirm("Payment gateway unavailable").await;
        let (mut session, notifier) = session(&service, Some("t"));
        session.load_catalog().await;
        session.add_by_id("1").unwrap();

        let result = session.checkout().await.unwrap();
        assert!(!result.is_completed());
        assert_eq!(session.cart().len(), 1);
        let last = notifier.notifications().pop().unwrap();
        assert_eq!(last.title, "Checkout Failed");
        assert_eq!(last.description, "Payment gateway unavailable");
    }

    #[tokio::test]
    async fn test_unauthenticated_checkout_and_history() {
        let service = InMemoryBookingService::with_offerings(vec![raw("1", "500", "4")]);
        let (mut session, notifier) = session(&service, None);
        session.load_catalog().await;
        session.add_by_id("1").unwrap();

        session.checkout().await.unwrap();
        let history = session.booking_history().await;
        assert!(matches!(history.error, Some(CartError::Unauthenticated)));
        assert_eq!(
            notifier.titles(),
            vec!["Added to Cart", "Authentication Error", "Authentication Error"]
        );
        assert_eq!(session.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_notifies() {
        let service = InMemoryBookingService::with_offerings(vec![raw("1", "500", "4")]);
        service.set_unreachable(true).await;
        let (mut session, notifier) = session(&service, Some("t"));

        assert!(session.load_catalog().await.is_empty());
        assert_eq!(notifier.titles(), vec!["Error Fetching Routes"]);
    }
}
