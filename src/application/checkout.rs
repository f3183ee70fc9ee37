use super::catalog::normalize;
use crate::domain::booking::Booking;
use crate::domain::cart::CartStore;
use crate::domain::checkout::{
    CheckoutEvent, CheckoutFailure, CheckoutMachine, CheckoutResult, CheckoutState, FailureReason,
    NextStep, StageRequest,
};
use crate::domain::ports::SharedBookingService;
use crate::error::{CartError, Result};
use parking_lot::RwLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Commits a cart to the booking service in two phases.
///
/// Phase one stages every cart line, one request at a time and in cart order,
/// stopping at the first refusal. Phase two confirms the checkout. Lines
/// staged before a refusal stay reserved remotely; nothing releases them.
///
/// The orchestrator never touches the cart it is given: clearing it after a
/// `Completed` result is the caller's job. Retrying is the caller's job too.
/// Callers must not start a second `commit` while one is in flight.
pub struct CheckoutOrchestrator {
    service: SharedBookingService,
    state: RwLock<CheckoutState>,
}

impl CheckoutOrchestrator {
    pub fn new(service: SharedBookingService) -> Self {
        Self {
            service,
            state: RwLock::new(CheckoutState::Idle),
        }
    }

    /// State of the current (or last) attempt.
    pub fn state(&self) -> CheckoutState {
        self.state.read().clone()
    }

    /// Runs one commit attempt to a terminal state.
    ///
    /// A missing or blank token fails with `Unauthenticated` and an empty cart
    /// with `EmptyCart`; neither issues a request. The `Err` side is reserved
    /// for state machine violations, which the driver never produces.
    #[tracing::instrument(skip_all, fields(lines = cart.len()))]
    pub async fn commit(&self, cart: &CartStore, token: Option<&str>) -> Result<CheckoutResult> {
        let token = token.filter(|t| !t.trim().is_empty());

        let mut machine = CheckoutMachine::new();
        machine.apply(CheckoutEvent::Begin {
            authenticated: token.is_some(),
            lines: cart.lines().iter().map(StageRequest::from).collect(),
        })?;
        self.publish(&machine);

        if let Some(token) = token {
            while let Some(step) = machine.next_step() {
                let event = match step {
                    NextStep::Stage(request) => self.stage(token, request).await,
                    NextStep::Confirm => self.confirm(token).await,
                };
                machine.apply(event)?;
                self.publish(&machine);
            }
        }

        let result = machine.into_result()?;
        match &result {
            CheckoutResult::Completed { bookings } => {
                info!(bookings = bookings.len(), "checkout completed");
            }
            CheckoutResult::Failed(failure) => {
                warn!(
                    reason = %failure.reason,
                    line = failure.failed_line_id.as_deref().unwrap_or("-"),
                    transport = failure.transport,
                    "checkout failed"
                );
            }
        }
        Ok(result)
    }

    /// [`commit`](Self::commit) bounded by `limit`.
    ///
    /// On expiry the in-flight request is dropped and the attempt ends as
    /// `Failed{Timeout}`. Whatever was staged before expiry stays staged.
    pub async fn commit_with_timeout(
        &self,
        cart: &CartStore,
        token: Option<&str>,
        limit: Duration,
    ) -> Result<CheckoutResult> {
        match tokio::time::timeout(limit, self.commit(cart, token)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?limit, "checkout timed out");
                let mut machine = CheckoutMachine::from_state(self.state());
                if machine.apply(CheckoutEvent::TimedOut).is_err() {
                    machine = CheckoutMachine::from_state(CheckoutState::Failed(
                        CheckoutFailure::new(FailureReason::Timeout),
                    ));
                }
                self.publish(&machine);
                machine.into_result()
            }
        }
    }

    async fn stage(&self, token: &str, request: StageRequest) -> CheckoutEvent {
        debug!(line = %request.line_id, seats = request.seats, "staging line");
        match self
            .service
            .stage_line(token, &request.line_id, request.seats)
            .await
        {
            Ok(()) => CheckoutEvent::LineStaged {
                line_id: request.line_id,
            },
            Err(e) => {
                warn!(line = %request.line_id, error = %e, "line was not staged");
                CheckoutEvent::StageRejected {
                    message: failure_message(&e),
                    transport: e.is_transport(),
                    line_id: request.line_id,
                }
            }
        }
    }

    async fn confirm(&self, token: &str) -> CheckoutEvent {
        debug!("confirming checkout");
        match self.service.confirm_checkout(token).await {
            Ok(records) => {
                let (bookings, dropped) = normalize::<_, Booking>(records, "booking");
                if dropped > 0 {
                    warn!(dropped, "confirmation returned malformed bookings");
                }
                CheckoutEvent::Confirmed { bookings }
            }
            Err(e) => {
                warn!(error = %e, "checkout was not confirmed");
                CheckoutEvent::ConfirmRejected {
                    message: failure_message(&e),
                    transport: e.is_transport(),
                }
            }
        }
    }

    fn publish(&self, machine: &CheckoutMachine) {
        *self.state.write() = machine.state().clone();
    }
}

/// Server message when there is one, the transport error when there was no
/// answer. `None` leaves the step's default text to the state machine.
fn failure_message(error: &CartError) -> Option<String> {
    if let Some(message) = error.remote_message() {
        return Some(message.to_string());
    }
    error.is_transport().then(|| error.to_string())
}
