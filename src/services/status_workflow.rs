//! Transition rules shared by the invoice and purchase order lifecycles.
//!
//! Each lifecycle is an ordered chain plus one rejection status. A document
//! may move one step forward, one step back, drop out to the rejection status
//! while it is still open, and be reopened from rejection at the start of the
//! chain. The last chain status is terminal.

use crate::entities::{InvoiceStatus, OcStatus};
use crate::errors::ServiceError;
use std::fmt;

pub trait LifecycleStatus: Copy + Eq + fmt::Display + 'static {
    /// Statuses in processing order
    const CHAIN: &'static [Self];
    /// Side exit reachable from any open status
    const REJECTED: Self;

    fn initial() -> Self {
        Self::CHAIN[0]
    }

    fn position(self) -> Option<usize> {
        Self::CHAIN.iter().position(|s| *s == self)
    }

    fn is_terminal(self) -> bool {
        self.position() == Some(Self::CHAIN.len() - 1)
    }
}

impl LifecycleStatus for InvoiceStatus {
    const CHAIN: &'static [Self] = &[
        InvoiceStatus::Received,
        InvoiceStatus::InApproval,
        InvoiceStatus::InAccounting,
        InvoiceStatus::InTreasury,
        InvoiceStatus::AwaitingPayment,
        InvoiceStatus::Paid,
    ];
    const REJECTED: Self = InvoiceStatus::Rejected;
}

impl LifecycleStatus for OcStatus {
    const CHAIN: &'static [Self] = &[
        OcStatus::Pending,
        OcStatus::Approved,
        OcStatus::Issued,
        OcStatus::Delivered,
        OcStatus::Closed,
    ];
    const REJECTED: Self = OcStatus::Cancelled;
}

/// Returns whether `from -> to` is in the transition table.
pub fn is_allowed<S: LifecycleStatus>(from: S, to: S) -> bool {
    if from == to || from.is_terminal() {
        return false;
    }
    if to == S::REJECTED {
        return true;
    }
    if from == S::REJECTED {
        return to == S::initial();
    }
    match (from.position(), to.position()) {
        (Some(i), Some(j)) => j == i + 1 || j + 1 == i,
        _ => false,
    }
}

/// Statuses reachable from `from` under the strict table.
pub fn allowed_targets<S: LifecycleStatus>(from: S) -> Vec<S> {
    S::CHAIN
        .iter()
        .copied()
        .chain(std::iter::once(S::REJECTED))
        .filter(|to| is_allowed(from, *to))
        .collect()
}

/// Checks a requested move. With `strict` off every move except a no-op is
/// accepted.
pub fn check_transition<S: LifecycleStatus>(
    from: S,
    to: S,
    strict: bool,
) -> Result<(), ServiceError> {
    if from == to {
        return Err(ServiceError::InvalidStatus(format!(
            "status is already {}",
            from
        )));
    }
    if !strict || is_allowed(from, to) {
        return Ok(());
    }

    let allowed = allowed_targets(from);
    let hint = if allowed.is_empty() {
        format!("{} is terminal", from)
    } else {
        format!(
            "allowed: {}",
            allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    Err(ServiceError::InvalidStatus(format!(
        "Cannot transition from {} to {} ({})",
        from, to, hint
    )))
}
