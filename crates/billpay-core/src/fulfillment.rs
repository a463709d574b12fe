//! # Fulfillment Hand-off
//!
//! Where settled invoices leave the engine. A `FulfillmentHandler` is told
//! about each observed settlement state of a recorded invoice and is
//! responsible for actually buying the airtime or paying the bill.
//!
//! Polling is consumer-driven, so the same state may be observed (and
//! dispatched) more than once. Handlers must be idempotent per
//! `payment_hash`.

use crate::error::BillPayResult;
use crate::invoice::{Invoice, InvoiceState, SettlementState};
use crate::request::ServicePayload;
use tracing::{debug, info, warn};

/// Fulfillment hooks
///
/// Implement this trait to react to settlement. Every hook defaults to
/// logging.
#[allow(unused_variables)]
pub trait FulfillmentHandler: Send + Sync {
    /// Invoice paid: deliver the service
    fn on_settled(&self, invoice: &Invoice) -> BillPayResult<()> {
        info!(
            "Invoice settled: hash={}, deliver {} ({} sats)",
            invoice.payment_hash,
            summary(&invoice.request.payload),
            invoice.amount_sats
        );
        debug!(
            "Settled invoice {} is for {}",
            invoice.payment_hash,
            describe(&invoice.request.payload)
        );
        Ok(())
    }

    /// HTLC locked in but not yet settled
    fn on_accepted(&self, invoice: &Invoice) -> BillPayResult<()> {
        debug!("Invoice accepted: hash={}", invoice.payment_hash);
        Ok(())
    }

    /// Invoice cancelled or expired unpaid
    fn on_canceled(&self, invoice: &Invoice) -> BillPayResult<()> {
        warn!(
            "Invoice canceled: hash={}, service={}",
            invoice.payment_hash,
            invoice.service()
        );
        Ok(())
    }
}

/// Default handler (just logs). Bill payment itself is not wired up.
pub struct LoggingFulfillmentHandler;

impl FulfillmentHandler for LoggingFulfillmentHandler {}

/// Route an observed settlement state to the matching hook.
/// `OPEN` is not dispatched.
pub fn dispatch_settlement(
    handler: &dyn FulfillmentHandler,
    invoice: &Invoice,
    state: &SettlementState,
) -> BillPayResult<()> {
    match state.state {
        InvoiceState::Open => Ok(()),
        InvoiceState::Accepted => handler.on_accepted(invoice),
        InvoiceState::Settled => handler.on_settled(invoice),
        InvoiceState::Canceled => handler.on_canceled(invoice),
    }
}

/// What will be delivered, without the beneficiary. Safe for info logs.
pub fn summary(payload: &ServicePayload) -> String {
    match payload {
        ServicePayload::Airtime { carrier, .. } => format!("{} airtime", carrier),
        ServicePayload::Electricity { utility, .. } => format!("{} electricity", utility),
        ServicePayload::Water { utility, .. } => format!("{} water", utility),
        ServicePayload::SchoolFees { institution, .. } => format!("{} fees", institution),
    }
}

/// One-line description including the beneficiary. Personal data, debug
/// logs only.
pub fn describe(payload: &ServicePayload) -> String {
    match payload {
        ServicePayload::Airtime { phone, carrier } => format!("{} airtime for {}", carrier, phone),
        ServicePayload::Electricity { utility, account } => {
            format!("{} electricity account {}", utility, account)
        }
        ServicePayload::Water { utility, account } => {
            format!("{} water account {}", utility, account)
        }
        ServicePayload::SchoolFees {
            institution,
            student_id,
            student_name,
        } => format!("{} fees for {} ({})", institution, student_name, student_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Carrier, ServiceRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn invoice() -> Invoice {
        Invoice::new(
            "lnbc1...",
            "ab".repeat(32),
            ServiceRequest {
                amount_sats: 1000,
                fiat_reference: 5.0,
                memo: "m".into(),
                payload: ServicePayload::Airtime {
                    phone: "0971234567".into(),
                    carrier: Carrier::Mtn,
                },
            },
        )
    }

    fn state(state: InvoiceState) -> SettlementState {
        SettlementState {
            settled: state == InvoiceState::Settled,
            state,
            payment_request: "lnbc1...".into(),
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        settled: AtomicUsize,
        accepted: AtomicUsize,
        canceled: AtomicUsize,
    }

    impl FulfillmentHandler for CountingHandler {
        fn on_settled(&self, _invoice: &Invoice) -> BillPayResult<()> {
            self.settled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_accepted(&self, _invoice: &Invoice) -> BillPayResult<()> {
            self.accepted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_canceled(&self, _invoice: &Invoice) -> BillPayResult<()> {
            self.canceled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_routes_by_state() {
        let handler = CountingHandler::default();
        let invoice = invoice();

        for s in [
            InvoiceState::Open,
            InvoiceState::Accepted,
            InvoiceState::Settled,
            InvoiceState::Canceled,
        ] {
            dispatch_settlement(&handler, &invoice, &state(s)).unwrap();
        }

        assert_eq!(handler.accepted.load(Ordering::SeqCst), 1);
        assert_eq!(handler.settled.load(Ordering::SeqCst), 1);
        assert_eq!(handler.canceled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_logging_handler_accepts_everything() {
        let invoice = invoice();
        dispatch_settlement(
            &LoggingFulfillmentHandler,
            &invoice,
            &state(InvoiceState::Settled),
        )
        .unwrap();
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&invoice().request.payload), "MTN airtime for 0971234567");
    }

    #[test]
    fn test_summary_leaves_out_beneficiary() {
        let payloads = [
            invoice().request.payload,
            ServicePayload::Electricity {
                utility: "ZESCO".into(),
                account: "1234567890".into(),
            },
            ServicePayload::Water {
                utility: "Lusaka Water and Sewerage Company".into(),
                account: "LW12345678".into(),
            },
            ServicePayload::SchoolFees {
                institution: "University of Zambia".into(),
                student_id: "12345678".into(),
                student_name: "Jane Banda".into(),
            },
        ];

        for payload in &payloads {
            let line = summary(payload);
            assert!(!line.contains(payload.beneficiary()), "{}", line);
            assert!(!line.contains("Jane Banda"), "{}", line);
        }
        assert_eq!(summary(&payloads[0]), "MTN airtime");
        assert_eq!(summary(&payloads[3]), "University of Zambia fees");
    }
}
