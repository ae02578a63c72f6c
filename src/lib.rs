// Electricity Board Customer Portal - Core Library
// Exposes the portal model for the TUI, the API server, and tests

pub mod error;
pub mod config;
pub mod logging;
pub mod session;         // Session Controller - auth + route gating
pub mod credential_gate; // Login overlay
pub mod landing;         // Static landing content
pub mod billing;         // Bills + payment settlement
pub mod portal;          // Composition root

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{PortalError, PortalResult};
pub use config::PortalConfig;
pub use session::{Credentials, NavItem, Route, Session, SessionController, SessionSnapshot};
pub use credential_gate::{CredentialGate, GateField, GateOutcome, INVALID_CREDENTIALS_MESSAGE};
pub use landing::{LandingContent, BRAND};
pub use billing::{
    Bill, BillStatus, BillingView, PaymentState, SettlementTicket,
    seed_bills, usage_percent,
};
pub use portal::{today, Portal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
