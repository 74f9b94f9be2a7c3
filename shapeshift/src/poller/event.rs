use crate::model::{DepositStatus, Status};

/// Observation delivered to the callback of a tracked deposit.
#[derive(Clone, Debug, PartialEq)]
pub enum ShiftEvent {
    /// The exchange is not settled yet
    Pending(DepositStatus),
    Complete(DepositStatus),
    Failed(DepositStatus),
    /// The status could not be fetched this cycle; tracking goes on
    Unreachable(String),
}

impl ShiftEvent {
    /// Maps one status answer to the event it produces.
    pub fn from_status(status: DepositStatus) -> Self {
        match status.status {
            Status::Complete => ShiftEvent::Complete(status),
            Status::Failed => ShiftEvent::Failed(status),
            Status::NoDeposits | Status::Received | Status::Unknown => ShiftEvent::Pending(status),
        }
    }

    /// The error part of the observation, if any.
    ///
    /// A failed exchange reports its own error, or `"failed"` when the exchange gave none.
    pub fn error(&self) -> Option<&str> {
        match self {
            ShiftEvent::Failed(status) => Some(status.error.as_deref().unwrap_or("failed")),
            ShiftEvent::Unreachable(err) => Some(err),
            ShiftEvent::Pending(_) | ShiftEvent::Complete(_) => None,
        }
    }

    pub fn status(&self) -> Option<&DepositStatus> {
        match self {
            ShiftEvent::Pending(status) | ShiftEvent::Complete(status) | ShiftEvent::Failed(status) => Some(status),
            ShiftEvent::Unreachable(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShiftEvent::Complete(_) | ShiftEvent::Failed(_))
    }
}

/// Where a tracked item stands. Items leave the table once a terminal observation is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Tracked, nothing observed yet
    Pending,
    /// At least one non-terminal observation was delivered
    Observed,
}
