// ⚡ Portal - composition root
//
// One Session Controller, one Credential Gate, and a Billing View that is
// mounted the first time the dashboard is actually shown. Once mounted the
// Billing View lives for the rest of the session, so a paid bill stays paid
// when the user goes back to the landing page and returns.

use crate::billing::{Bill, BillingView, SettlementTicket};
use crate::config::PortalConfig;
use crate::credential_gate::{CredentialGate, GateOutcome};
use crate::error::{PortalError, PortalResult};
use crate::session::{Route, SessionController};
use chrono::{Local, NaiveDate};
use std::time::Instant;
use uuid::Uuid;

pub struct Portal {
    config: PortalConfig,
    pub session: SessionController,
    pub gate: CredentialGate,
    billing: Option<BillingView>,
}

impl Portal {
    pub fn new(config: PortalConfig) -> Self {
        let session = SessionController::new(config.accepted.clone());
        Portal {
            config,
            session,
            gate: CredentialGate::new(),
            billing: None,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn current_route(&self) -> Route {
        self.session.current_route()
    }

    /// Navigate, mounting the Billing View if billing is where we end up
    pub fn navigate(&mut self, route: Route) -> PortalResult<Route> {
        let resolved = self.session.navigate(route);
        if resolved == Route::Billing {
            self.mount_billing()?;
        }
        Ok(resolved)
    }

    pub fn navigate_path(&mut self, path: &str) -> PortalResult<Route> {
        let route = Route::from_path(path).ok_or_else(|| PortalError::UnknownRoute(path.to_string()))?;
        self.navigate(route)
    }

    pub fn open_login(&mut self) {
        self.session.open_login_prompt();
    }

    pub fn dismiss_login(&mut self) {
        self.gate.dismiss(&mut self.session);
    }

    /// Submit whatever the gate fields hold
    pub fn submit_login(&mut self) -> PortalResult<GateOutcome> {
        let outcome = self.gate.submit(&mut self.session);
        if let GateOutcome::Accepted { route: Route::Billing } = outcome {
            self.mount_billing()?;
        }
        Ok(outcome)
    }

    /// Fill the gate and submit, for front ends that collect both fields at once
    pub fn login(&mut self, identifier: &str, secret: &str) -> PortalResult<GateOutcome> {
        self.gate.identifier = identifier.to_string();
        self.gate.secret = secret.to_string();
        self.submit_login()
    }

    fn mount_billing(&mut self) -> PortalResult<&mut BillingView> {
        match &mut self.billing {
            Some(billing) => Ok(billing),
            slot => Ok(slot.insert(BillingView::seeded(&self.config)?)),
        }
    }

    /// The Billing View, if it has been displayed yet
    pub fn billing(&self) -> Option<&BillingView> {
        self.billing.as_ref()
    }

    /// The Billing View, or `None` while the session may not see it
    pub fn billing_mut(&mut self) -> PortalResult<Option<&mut BillingView>> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        self.mount_billing().map(Some)
    }

    pub fn pay_current_bill(&mut self, today: NaiveDate, now: Instant) -> PortalResult<Option<SettlementTicket>> {
        Ok(self
            .billing_mut()?
            .and_then(|billing| billing.initiate_payment(today, now)))
    }

    /// Fire the settlement continuation for `ticket_id` (async front ends)
    pub fn settle(&mut self, ticket_id: Uuid) -> PortalResult<Bill> {
        self.billing
            .as_mut()
            .ok_or(PortalError::UnknownTicket(ticket_id))?
            .settle(ticket_id)
    }

    /// Drive time-based state; returns the bill settled on this tick, if any
    pub fn tick(&mut self, now: Instant) -> Option<Bill> {
        self.billing.as_mut().and_then(|billing| billing.poll_settlement(now))
    }
}

/// Local calendar date, used as the settlement date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillStatus;
    use crate::credential_gate::INVALID_CREDENTIALS_MESSAGE;
    use std::time::Duration;

    #[test]
    fn test_billing_not_mounted_before_display() {
        let mut portal = Portal::new(PortalConfig::default());
        assert!(portal.billing().is_none());

        assert_eq!(portal.navigate(Route::Billing).unwrap(), Route::Landing);
        assert!(portal.billing().is_none());
        assert!(portal.billing_mut().unwrap().is_none());
    }

    #[test]
    fn test_unknown_path() {
        let mut portal = Portal::new(PortalConfig::default());
        assert!(matches!(
            portal.navigate_path("/settings"),
            Err(PortalError::UnknownRoute(_))
        ));
        assert_eq!(portal.navigate_path("/dashboard").unwrap(), Route::Landing);
    }

    #[test]
    fn test_payment_unavailable_while_logged_out() {
        let mut portal = Portal::new(PortalConfig::default());
        assert_eq!(portal.pay_current_bill(today(), Instant::now()).unwrap(), None);
    }

    #[test]
    fn test_paid_bill_survives_leaving_dashboard() {
        let mut portal = Portal::new(PortalConfig::default());
        portal.login("123123123", "admin").unwrap();

        let start = Instant::now();
        portal.pay_current_bill(today(), start).unwrap().unwrap();
        portal.tick(start + Duration::from_secs(3)).unwrap();

        portal.navigate(Route::Landing).unwrap();
        portal.navigate(Route::Billing).unwrap();

        let billing = portal.billing().unwrap();
        assert_eq!(billing.pending_count(), 0);
    }

    #[test]
    fn test_end_to_end_login_and_payment() {
        let mut portal = Portal::new(PortalConfig::default());
        portal.open_login();

        // wrong credentials
        let outcome = portal.login("123123123", "letmein").unwrap();
        assert_eq!(
            outcome,
            GateOutcome::Rejected {
                message: INVALID_CREDENTIALS_MESSAGE.to_string()
            }
        );
        assert_eq!(portal.gate.error(), Some(INVALID_CREDENTIALS_MESSAGE));
        assert!(!portal.session.is_authenticated());
        assert!(portal.session.is_login_prompt_visible());
        assert_eq!(portal.current_route(), Route::Landing);

        // correct credentials
        let outcome = portal.login("123123123", "admin").unwrap();
        assert_eq!(outcome, GateOutcome::Accepted { route: Route::Billing });
        assert!(portal.session.is_authenticated());
        assert!(!portal.session.is_login_prompt_visible());
        assert_eq!(portal.current_route(), Route::Billing);

        let pending = portal.billing().unwrap().current_pending_bill().unwrap().clone();
        assert_eq!(pending.id, "EB2024031001");
        assert_eq!(pending.formatted_amount(), "₹2450");

        let date = today();
        let start = Instant::now();
        let ticket = portal.pay_current_bill(date, start).unwrap().unwrap();
        assert_eq!(ticket.bill_id, pending.id);
        assert!(portal.billing().unwrap().is_processing());

        // nothing happens before the delay
        assert_eq!(portal.tick(start + Duration::from_millis(100)), None);

        let settled = portal.tick(start + Duration::from_secs(2)).unwrap();
        assert_eq!(settled.id, "EB2024031001");
        assert_eq!(settled.status, BillStatus::Paid);
        assert_eq!(settled.paid_on, Some(date));

        let billing = portal.billing().unwrap();
        assert!(billing.current_pending_bill().is_none());
        assert!(!billing.is_processing());
    }
}
