// ⚠️ Portal Errors
//
// Login failures and unauthorized routes are NOT errors here: a rejected
// login is a `GateOutcome::Rejected`, an unauthorized route is a redirect.
// These variants cover malformed bill sets, stale settlement tickets and
// bad configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    /// More than one bill in the working set is pending
    #[error("bill set has {count} pending bills, at most one is allowed")]
    MultiplePendingBills { count: usize },

    /// Two bills share an id
    #[error("duplicate bill id: {0}")]
    DuplicateBill(String),

    /// `paid_on` must be present iff the bill is paid
    #[error("bill {0} has a settlement date that does not match its status")]
    InconsistentSettlement(String),

    #[error("unknown bill: {0}")]
    UnknownBill(String),

    /// Settlement ticket does not match the payment in flight
    #[error("no payment in flight for ticket {0}")]
    UnknownTicket(uuid::Uuid),

    #[error("unknown route: {0}")]
    UnknownRoute(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PortalResult<T> = Result<T, PortalError>;
