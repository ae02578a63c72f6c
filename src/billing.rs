// 🧾 Billing View - bills + simulated payment settlement
//
// Owns the bill set for the session. Payment is a two-phase transition:
//
//   Idle --initiate_payment--> Settling(ticket) --deadline/settle--> Idle
//
// and per bill:
//
//   Pending --settlement--> Paid   (terminal)
//
// Settlement always succeeds and cannot be cancelled. The continuation
// targets the bill captured when the payment was initiated.

use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

// ============================================================================
// BILL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Pending,
    Paid,
}

impl BillStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BillStatus::Pending => "Pending",
            BillStatus::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Bill number, e.g. "EB2024031001"
    pub id: String,

    /// Human readable period, e.g. "March 2024"
    pub billing_period: String,

    /// Amount in rupees
    pub amount_due: f64,

    pub due_date: NaiveDate,

    pub status: BillStatus,

    pub usage_kwh: u32,

    /// Present iff status == Paid
    pub paid_on: Option<NaiveDate>,
}

impl Bill {
    pub fn is_pending(&self) -> bool {
        self.status == BillStatus::Pending
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    /// "₹2450", or "₹2450.50" when there are paise
    pub fn formatted_amount(&self) -> String {
        if self.amount_due.fract() == 0.0 {
            format!("₹{:.0}", self.amount_due)
        } else {
            format!("₹{:.2}", self.amount_due)
        }
    }
}

/// Share of the usage bar filled by `usage_kwh`, in `[0, 100]`
pub fn usage_percent(usage_kwh: u32, ceiling_kwh: u32) -> f64 {
    if ceiling_kwh == 0 {
        return 100.0;
    }
    (usage_kwh as f64 / ceiling_kwh as f64 * 100.0).clamp(0.0, 100.0)
}

// ============================================================================
// SEED DATA
// ============================================================================

struct SeedBill {
    id: &'static str,
    period: &'static str,
    amount: f64,
    due_date: &'static str,
    status: BillStatus,
    usage: u32,
    paid_on: Option<&'static str>,
}

/// Most recent first
const SEED: [SeedBill; 3] = [
    SeedBill {
        id: "EB2024031001",
        period: "March 2024",
        amount: 2450.0,
        due_date: "2024-03-25",
        status: BillStatus::Pending,
        usage: 320,
        paid_on: None,
    },
    SeedBill {
        id: "EB2024021001",
        period: "February 2024",
        amount: 2100.0,
        due_date: "2024-02-25",
        status: BillStatus::Paid,
        usage: 280,
        paid_on: Some("2024-02-20"),
    },
    SeedBill {
        id: "EB2024011001",
        period: "January 2024",
        amount: 1950.0,
        due_date: "2024-01-25",
        status: BillStatus::Paid,
        usage: 260,
        paid_on: Some("2024-01-18"),
    },
];

fn parse_date(raw: &str) -> PortalResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| PortalError::Config(format!("bad date {:?}: {}", raw, e)))
}

/// The sample bill set shown on first display of the dashboard
pub fn seed_bills() -> PortalResult<Vec<Bill>> {
    SEED.iter()
        .map(|seed| {
            Ok(Bill {
                id: seed.id.to_string(),
                billing_period: seed.period.to_string(),
                amount_due: seed.amount,
                due_date: parse_date(seed.due_date)?,
                status: seed.status,
                usage_kwh: seed.usage,
                paid_on: seed.paid_on.map(parse_date).transpose()?,
            })
        })
        .collect()
}

// ============================================================================
// SETTLEMENT
// ============================================================================

/// Handle for the one payment in flight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementTicket {
    pub id: Uuid,
    pub bill_id: String,

    /// Invocation date; becomes the bill's `paid_on`
    pub paid_on: NaiveDate,

    #[serde(rename = "delay_ms", serialize_with = "crate::config::duration_millis::serialize")]
    pub delay: Duration,

    #[serde(skip)]
    pub deadline: Instant,
}

impl SettlementTicket {
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentState {
    Idle,
    Settling(SettlementTicket),
}

// ============================================================================
// BILLING VIEW
// ============================================================================

#[derive(Debug, Clone)]
pub struct BillingView {
    bills: Vec<Bill>,
    payment: PaymentState,
    settlement_delay: Duration,
    usage_ceiling_kwh: u32,
}

impl BillingView {
    /// Validate and take ownership of `bills`, keeping insertion order
    pub fn new(bills: Vec<Bill>, config: &PortalConfig) -> PortalResult<Self> {
        let mut seen = HashSet::new();
        for bill in &bills {
            if !seen.insert(bill.id.as_str()) {
                return Err(PortalError::DuplicateBill(bill.id.clone()));
            }
            if bill.is_pending() == bill.paid_on.is_some() {
                return Err(PortalError::InconsistentSettlement(bill.id.clone()));
            }
        }

        let pending = bills.iter().filter(|b| b.is_pending()).count();
        if pending > 1 {
            return Err(PortalError::MultiplePendingBills { count: pending });
        }

        Ok(BillingView {
            bills,
            payment: PaymentState::Idle,
            settlement_delay: config.settlement_delay,
            usage_ceiling_kwh: config.usage_ceiling_kwh,
        })
    }

    pub fn seeded(config: &PortalConfig) -> PortalResult<Self> {
        let view = Self::new(seed_bills()?, config)?;
        debug!(bills = view.bills.len(), "billing view seeded");
        Ok(view)
    }

    pub fn bills(&self) -> &[Bill] {
        &self.bills
    }

    pub fn bill(&self, id: &str) -> Option<&Bill> {
        self.bills.iter().find(|b| b.id == id)
    }

    pub fn current_pending_bill(&self) -> Option<&Bill> {
        self.bills.iter().find(|b| b.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.bills.iter().filter(|b| b.is_pending()).count()
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.payment, PaymentState::Settling(_))
    }

    pub fn in_flight(&self) -> Option<&SettlementTicket> {
        match &self.payment {
            PaymentState::Settling(ticket) => Some(ticket),
            PaymentState::Idle => None,
        }
    }

    pub fn usage_percent(&self, bill: &Bill) -> f64 {
        usage_percent(bill.usage_kwh, self.usage_ceiling_kwh)
    }

    /// Start settling the pending bill.
    ///
    /// Returns `None` (and changes nothing) when a payment is already in
    /// flight or there is nothing to pay.
    pub fn initiate_payment(&mut self, today: NaiveDate, now: Instant) -> Option<SettlementTicket> {
        if self.is_processing() {
            debug!("payment already in flight, ignoring");
            return None;
        }

        let bill_id = self.current_pending_bill()?.id.clone();
        let ticket = SettlementTicket {
            id: Uuid::new_v4(),
            bill_id,
            paid_on: today,
            delay: self.settlement_delay,
            deadline: now + self.settlement_delay,
        };

        info!(bill = %ticket.bill_id, ticket = %ticket.id, "payment initiated");
        self.payment = PaymentState::Settling(ticket.clone());
        Some(ticket)
    }

    /// Fire the settlement continuation if its deadline has passed
    pub fn poll_settlement(&mut self, now: Instant) -> Option<Bill> {
        let due = match &self.payment {
            PaymentState::Settling(ticket) => ticket.is_due(now),
            PaymentState::Idle => false,
        };
        if !due {
            return None;
        }
        self.finish_settlement().ok()
    }

    /// Fire the continuation for `ticket_id` now, regardless of the clock
    pub fn settle(&mut self, ticket_id: Uuid) -> PortalResult<Bill> {
        match &self.payment {
            PaymentState::Settling(ticket) if ticket.id == ticket_id => self.finish_settlement(),
            _ => Err(PortalError::UnknownTicket(ticket_id)),
        }
    }

    fn finish_settlement(&mut self) -> PortalResult<Bill> {
        let ticket = match std::mem::replace(&mut self.payment, PaymentState::Idle) {
            PaymentState::Settling(ticket) => ticket,
            PaymentState::Idle => return Err(PortalError::UnknownTicket(Uuid::nil())),
        };

        let bill = self
            .bills
            .iter_mut()
            .find(|b| b.id == ticket.bill_id)
            .ok_or_else(|| PortalError::UnknownBill(ticket.bill_id.clone()))?;

        bill.status = BillStatus::Paid;
        bill.paid_on = Some(ticket.paid_on);

        info!(bill = %bill.id, paid_on = %ticket.paid_on, "payment settled");
        Ok(bill.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PortalConfig {
        PortalConfig::default()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    fn create_test_bill(id: &str, status: BillStatus) -> Bill {
        Bill {
            id: id.to_string(),
            billing_period: "Test Period".to_string(),
            amount_due: 100.0,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
            status,
            usage_kwh: 100,
            paid_on: match status {
                BillStatus::Paid => NaiveDate::from_ymd_opt(2024, 1, 20),
                BillStatus::Pending => None,
            },
        }
    }

    #[test]
    fn test_seed_order_and_single_pending() {
        let view = BillingView::seeded(&config()).unwrap();
        let ids: Vec<&str> = view.bills().iter().map(|b| b.id.as_str()).collect();

        assert_eq!(ids, vec!["EB2024031001", "EB2024021001", "EB2024011001"]);
        assert_eq!(view.pending_count(), 1);
        assert!(!view.is_processing());

        let pending = view.current_pending_bill().unwrap();
        assert_eq!(pending.id, "EB2024031001");
        assert_eq!(pending.amount_due, 2450.0);
        assert_eq!(pending.usage_kwh, 320);
        assert_eq!(pending.paid_on, None);

        let february = view.bill("EB2024021001").unwrap();
        assert_eq!(february.paid_on, NaiveDate::from_ymd_opt(2024, 2, 20));
    }

    #[test]
    fn test_rejects_multiple_pending() {
        let bills = vec![
            create_test_bill("A", BillStatus::Pending),
            create_test_bill("B", BillStatus::Pending),
        ];
        let result = BillingView::new(bills, &config());
        assert!(matches!(result, Err(PortalError::MultiplePendingBills { count: 2 })));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let bills = vec![
            create_test_bill("A", BillStatus::Paid),
            create_test_bill("A", BillStatus::Paid),
        ];
        assert!(matches!(
            BillingView::new(bills, &config()),
            Err(PortalError::DuplicateBill(id)) if id == "A"
        ));
    }

    #[test]
    fn test_rejects_paid_without_date() {
        let mut bill = create_test_bill("A", BillStatus::Paid);
        bill.paid_on = None;
        assert!(matches!(
            BillingView::new(vec![bill], &config()),
            Err(PortalError::InconsistentSettlement(_))
        ));

        let mut bill = create_test_bill("B", BillStatus::Pending);
        bill.paid_on = Some(today());
        assert!(matches!(
            BillingView::new(vec![bill], &config()),
            Err(PortalError::InconsistentSettlement(_))
        ));
    }

    #[test]
    fn test_payment_settles_after_delay() {
        let mut view = BillingView::seeded(&config()).unwrap();
        let start = Instant::now();

        let ticket = view.initiate_payment(today(), start).unwrap();
        assert_eq!(ticket.bill_id, "EB2024031001");
        assert!(view.is_processing());

        // still in flight before the deadline
        assert_eq!(view.poll_settlement(start + Duration::from_millis(1999)), None);
        assert!(view.is_processing());
        assert_eq!(view.current_pending_bill().unwrap().id, "EB2024031001");

        let settled = view.poll_settlement(start + Duration::from_secs(2)).unwrap();
        assert_eq!(settled.status, BillStatus::Paid);
        assert_eq!(settled.paid_on, Some(today()));

        assert!(!view.is_processing());
        assert_eq!(view.pending_count(), 0);
        assert!(view.current_pending_bill().is_none());
    }

    #[test]
    fn test_second_initiate_while_processing_is_noop() {
        let mut view = BillingView::seeded(&config()).unwrap();
        let start = Instant::now();

        let first = view.initiate_payment(today(), start).unwrap();
        let before = view.bills().to_vec();

        let later = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap();
        assert_eq!(view.initiate_payment(later, start + Duration::from_millis(500)), None);
        assert_eq!(view.bills(), before.as_slice());
        assert_eq!(view.in_flight(), Some(&first));
    }

    #[test]
    fn test_initiate_without_pending_bill_is_noop() {
        let bills = vec![create_test_bill("A", BillStatus::Paid)];
        let mut view = BillingView::new(bills, &config()).unwrap();

        assert_eq!(view.initiate_payment(today(), Instant::now()), None);
        assert!(!view.is_processing());
    }

    #[test]
    fn test_settle_by_ticket() {
        let mut view = BillingView::seeded(&config()).unwrap();
        let ticket = view.initiate_payment(today(), Instant::now()).unwrap();

        assert!(matches!(
            view.settle(Uuid::new_v4()),
            Err(PortalError::UnknownTicket(_))
        ));
        assert!(view.is_processing());

        let bill = view.settle(ticket.id).unwrap();
        assert_eq!(bill.id, ticket.bill_id);
        assert_eq!(bill.paid_on, Some(today()));

        // the continuation only runs once
        assert!(matches!(view.settle(ticket.id), Err(PortalError::UnknownTicket(_))));
    }

    #[test]
    fn test_no_payment_after_everything_settled() {
        let mut view = BillingView::seeded(&config()).unwrap();
        let ticket = view.initiate_payment(today(), Instant::now()).unwrap();
        view.settle(ticket.id).unwrap();

        assert_eq!(view.initiate_payment(today(), Instant::now()), None);
        assert_eq!(view.poll_settlement(Instant::now()), None);
    }

    #[test]
    fn test_usage_percent_clamped() {
        assert_eq!(usage_percent(320, 400), 80.0);
        assert_eq!(usage_percent(0, 400), 0.0);
        assert_eq!(usage_percent(400, 400), 100.0);
        assert_eq!(usage_percent(900, 400), 100.0);
        assert_eq!(usage_percent(10, 0), 100.0);
    }

    #[test]
    fn test_bill_display_helpers() {
        let mut bill = create_test_bill("A", BillStatus::Pending);
        bill.amount_due = 2450.0;
        assert_eq!(bill.formatted_amount(), "₹2450");
        assert_eq!(bill.status_label(), "Pending");

        bill.amount_due = 2450.5;
        assert_eq!(bill.formatted_amount(), "₹2450.50");
    }

    #[test]
    fn test_bill_json_shape() {
        let view = BillingView::seeded(&config()).unwrap();
        let json = serde_json::to_value(&view.bills()[1]).unwrap();

        assert_eq!(json["status"], "paid");
        assert_eq!(json["due_date"], "2024-02-25");
        assert_eq!(json["paid_on"], "2024-02-20");
    }

    #[test]
    fn test_ticket_json_reports_delay_in_millis() {
        let mut view = BillingView::seeded(&config()).unwrap();
        let ticket = view.initiate_payment(today(), Instant::now()).unwrap();
        let json = serde_json::to_value(&ticket).unwrap();

        assert_eq!(json["bill_id"], "EB2024031001");
        assert_eq!(json["delay_ms"], ticket.delay.as_millis() as u64);
        assert!(json.get("deadline").is_none());
    }
}
