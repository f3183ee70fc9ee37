mod common;

use common::raw;
use seatcart::domain::notification::Notification;
use seatcart::domain::ports::{NotificationSinkBox, SharedBookingService, TokenSourceBox};
use seatcart::infrastructure::host::{RecordingNotifier, StaticToken};
use seatcart::infrastructure::in_memory::InMemoryBookingService;

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let service: SharedBookingService =
        std::sync::Arc::new(InMemoryBookingService::with_offerings(vec![raw("1", "450", "3")]));
    let tokens: TokenSourceBox = Box::new(StaticToken::new(Some("token".to_string())));
    let recorder = RecordingNotifier::new();
    let notifier: NotificationSinkBox = Box::new(recorder.clone());

    // Verify Send + Sync by spawning tasks
    let remote = service.clone();
    let stage_handle = tokio::spawn(async move {
        let token = tokens.token().unwrap();
        remote.stage_line(&token, "1", 2).await.unwrap();
        remote.confirm_checkout(&token).await.unwrap()
    });

    let notify_handle = tokio::spawn(async move {
        notifier.notify(Notification::info("Booking", "in progress"));
    });

    let bookings = stage_handle.await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].seats, "2");

    notify_handle.await.unwrap();
    assert_eq!(recorder.titles(), vec!["Booking"]);

    let offerings = service.fetch_offerings().await.unwrap();
    assert_eq!(offerings[0].seats_available, "1");
}

#[test]
fn test_closure_token_source() {
    let tokens: TokenSourceBox = Box::new(|| Some("from-closure".to_string()));
    assert_eq!(tokens.token().as_deref(), Some("from-closure"));
}
