//! The checkout commit protocol as a finite-state machine.
//!
//! ```text
//! Idle ──Begin──▶ Committing ──(LineStaged)*──▶ Committing ──Confirmed──▶ Completed
//!   ▲                 │                               │
//!   │                 ├──StageRejected / TimedOut─────┼──ConfirmRejected──▶ Failed
//!   └──── Begin ──────┴───────────────────────────────┘                      │
//!                                        (retry: Failed ──Begin──▶ Committing)
//! ```
//!
//! [`CheckoutMachine::apply`] is the only way state changes. The async driver
//! in `application::checkout` asks [`CheckoutMachine::next_step`] what to do,
//! performs the remote call and feeds the outcome back as an event, so the
//! point where a commit failed is always a value held by the machine.

use super::booking::Booking;
use super::cart::CartLine;
use crate::error::CartError;
use std::collections::VecDeque;
use std::fmt;

pub const CONFIRM_FAILED_MESSAGE: &str = "Checkout process failed.";

/// Default text when staging `route` failed without a server message.
pub fn stage_failed_message(route: &str) -> String {
    format!("Failed to add {route} to backend cart.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Unauthenticated,
    EmptyCart,
    StageFailed,
    ConfirmFailed,
    Timeout,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Unauthenticated => "unauthenticated",
            FailureReason::EmptyCart => "empty_cart",
            FailureReason::StageFailed => "stage_failed",
            FailureReason::ConfirmFailed => "confirm_failed",
            FailureReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why and where a commit attempt stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutFailure {
    pub reason: FailureReason,
    /// Set for `StageFailed`: the first line the service refused.
    pub failed_line_id: Option<String>,
    /// Message supplied by the service, if it sent one.
    pub message: Option<String>,
    /// The step got no answer from the service at all.
    pub transport: bool,
}

impl CheckoutFailure {
    pub fn new(reason: FailureReason) -> Self {
        Self {
            reason,
            failed_line_id: None,
            message: None,
            transport: false,
        }
    }

    /// Text suitable for a notification description.
    pub fn user_message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match self.reason {
            FailureReason::Unauthenticated => {
                "You must be logged in to complete the purchase.".to_string()
            }
            FailureReason::EmptyCart => {
                "Your cart is empty. Add some bus tickets to proceed with checkout.".to_string()
            }
            FailureReason::StageFailed => stage_failed_message(&format!(
                "route {}",
                self.failed_line_id.as_deref().unwrap_or("?")
            )),
            FailureReason::ConfirmFailed => CONFIRM_FAILED_MESSAGE.to_string(),
            FailureReason::Timeout => "The booking service did not respond in time.".to_string(),
        }
    }
}

impl From<CheckoutFailure> for CartError {
    fn from(failure: CheckoutFailure) -> Self {
        let message = failure.user_message();
        match failure.reason {
            FailureReason::Unauthenticated => CartError::Unauthenticated,
            FailureReason::EmptyCart => CartError::EmptyCart,
            FailureReason::Timeout => CartError::Timeout,
            FailureReason::StageFailed => CartError::StageFailed {
                line_id: failure.failed_line_id.unwrap_or_default(),
                message,
            },
            FailureReason::ConfirmFailed => CartError::ConfirmFailed { message },
        }
    }
}

/// The terminal value of one commit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutResult {
    /// Every line staged and the checkout was confirmed. Carries whatever
    /// bookings the service returned.
    Completed { bookings: Vec<Booking> },
    Failed(CheckoutFailure),
}

impl CheckoutResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, CheckoutResult::Completed { .. })
    }

    pub fn failure(&self) -> Option<&CheckoutFailure> {
        match self {
            CheckoutResult::Failed(failure) => Some(failure),
            CheckoutResult::Completed { .. } => None,
        }
    }
}

/// One "reserve N seats of route id" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub line_id: String,
    pub seats: u32,
    pub route: String,
}

impl From<&CartLine> for StageRequest {
    fn from(line: &CartLine) -> Self {
        Self {
            line_id: line.id().to_string(),
            seats: line.quantity(),
            route: line.route().to_string(),
        }
    }
}

/// Staging bookkeeping while committing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Progress {
    pending: VecDeque<StageRequest>,
    staged: Vec<StageRequest>,
}

impl Progress {
    /// The line that must be staged next, in cart order.
    pub fn next_line(&self) -> Option<&StageRequest> {
        self.pending.front()
    }

    /// Lines the service accepted so far. Nothing releases these if a later
    /// step fails.
    pub fn staged(&self) -> &[StageRequest] {
        &self.staged
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Committing(Progress),
    Completed { bookings: Vec<Booking> },
    Failed(CheckoutFailure),
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::Committing(_) => "Committing",
            CheckoutState::Completed { .. } => "Completed",
            CheckoutState::Failed(_) => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Completed { .. } | CheckoutState::Failed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutEvent {
    Begin {
        authenticated: bool,
        lines: Vec<StageRequest>,
    },
    LineStaged {
        line_id: String,
    },
    StageRejected {
        line_id: String,
        message: Option<String>,
        transport: bool,
    },
    Confirmed {
        bookings: Vec<Booking>,
    },
    ConfirmRejected {
        message: Option<String>,
        transport: bool,
    },
    TimedOut,
}

impl CheckoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutEvent::Begin { .. } => "Begin",
            CheckoutEvent::LineStaged { .. } => "LineStaged",
            CheckoutEvent::StageRejected { .. } => "StageRejected",
            CheckoutEvent::Confirmed { .. } => "Confirmed",
            CheckoutEvent::ConfirmRejected { .. } => "ConfirmRejected",
            CheckoutEvent::TimedOut => "TimedOut",
        }
    }
}

/// What the driver has to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Stage(StageRequest),
    Confirm,
}

fn begin(authenticated: bool, lines: Vec<StageRequest>) -> CheckoutState {
    if !authenticated {
        return CheckoutState::Failed(CheckoutFailure::new(FailureReason::Unauthenticated));
    }
    if lines.is_empty() {
        return CheckoutState::Failed(CheckoutFailure::new(FailureReason::EmptyCart));
    }
    CheckoutState::Committing(Progress {
        pending: lines.into(),
        staged: Vec::new(),
    })
}

fn is_next(progress: &Progress, line_id: &str) -> bool {
    progress
        .next_line()
        .is_some_and(|next| next.line_id == line_id)
}

/// The transition function. Invalid pairs hand the state back untouched.
pub fn transition(
    state: CheckoutState,
    event: CheckoutEvent,
) -> Result<CheckoutState, (CheckoutState, CheckoutEvent)> {
    use CheckoutEvent as E;
    use CheckoutState as S;

    match (state, event) {
        (S::Idle | S::Failed(_), E::Begin { authenticated, lines }) => {
            Ok(begin(authenticated, lines))
        }
        (S::Committing(mut progress), E::LineStaged { line_id }) if is_next(&progress, &line_id) => {
            if let Some(done) = progress.pending.pop_front() {
                progress.staged.push(done);
            }
            Ok(S::Committing(progress))
        }
        (
            S::Committing(progress),
            E::StageRejected {
                line_id,
                message,
                transport,
            },
        ) if is_next(&progress, &line_id) => {
            let message = message.or_else(|| {
                progress
                    .next_line()
                    .map(|line| stage_failed_message(&line.route))
            });
            Ok(S::Failed(CheckoutFailure {
                reason: FailureReason::StageFailed,
                failed_line_id: Some(line_id),
                message,
                transport,
            }))
        }
        (S::Committing(progress), E::Confirmed { bookings }) if progress.pending.is_empty() => {
            Ok(S::Completed { bookings })
        }
        (S::Committing(progress), E::ConfirmRejected { message, transport })
            if progress.pending.is_empty() =>
        {
            Ok(S::Failed(CheckoutFailure {
                reason: FailureReason::ConfirmFailed,
                failed_line_id: None,
                message,
                transport,
            }))
        }
        (S::Committing(_), E::TimedOut) => {
            Ok(S::Failed(CheckoutFailure::new(FailureReason::Timeout)))
        }
        (state, event) => Err((state, event)),
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutMachine {
    state: CheckoutState,
}

impl CheckoutMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes from an observed state, e.g. to retry after `Failed`.
    pub fn from_state(state: CheckoutState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Applies `event`. On an invalid transition the state is left as it was.
    pub fn apply(&mut self, event: CheckoutEvent) -> Result<&CheckoutState, CartError> {
        let current = std::mem::take(&mut self.state);
        match transition(current, event) {
            Ok(next) => {
                self.state = next;
                Ok(&self.state)
            }
            Err((current, event)) => {
                let message = format!("{} while {}", event.name(), current.name());
                self.state = current;
                Err(CartError::InvalidTransition(message))
            }
        }
    }

    pub fn next_step(&self) -> Option<NextStep> {
        match &self.state {
            CheckoutState::Committing(progress) => Some(match progress.next_line() {
                Some(request) => NextStep::Stage(request.clone()),
                None => NextStep::Confirm,
            }),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<CheckoutResult, CartError> {
        match self.state {
            CheckoutState::Completed { bookings } => Ok(CheckoutResult::Completed { bookings }),
            CheckoutState::Failed(failure) => Ok(CheckoutResult::Failed(failure)),
            other => Err(CartError::InvalidTransition(format!(
                "attempt ended in non-terminal state {}",
                other.name()
            ))),
        }
    }
}
