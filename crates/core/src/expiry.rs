//! Expiry/deadline evaluator.
//!
//! Computes the *effective* display state from a stored state, a
//! deadline, and the current time, without requiring a prior write.
//! Pure and idempotent; the sweep jobs in `escola-queue` persist the
//! derived states eventually, and both paths tolerate re-application.

use chrono::{DateTime, Utc};
use escola_db::entities::consent::ConsentStatus;
use escola_db::entities::invoice::InvoiceStatus;

/// Effective status of a consent at `now`.
///
/// A pending consent past its deadline reads as expired. Every other
/// stored state passes through untouched, including consents with no
/// deadline at all.
#[must_use]
pub fn effective_consent_status(
    stored: ConsentStatus,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ConsentStatus {
    match (stored, expires_at) {
        (ConsentStatus::Pending, Some(deadline)) if now > deadline => ConsentStatus::Expired,
        _ => stored,
    }
}

/// Effective status of an invoice at `now`.
///
/// A pending invoice past its due date reads as overdue. Paid, canceled,
/// and refunded invoices never revert, regardless of the due date.
#[must_use]
pub fn effective_invoice_status(
    stored: InvoiceStatus,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> InvoiceStatus {
    if stored == InvoiceStatus::Pending && now > due_date {
        InvoiceStatus::Overdue
    } else {
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_pending_consent_past_deadline_reads_expired() {
        let now = Utc::now();
        let deadline = now - Duration::days(1);

        assert_eq!(
            effective_consent_status(ConsentStatus::Pending, Some(deadline), now),
            ConsentStatus::Expired
        );
    }

    #[test]
    fn test_pending_consent_before_deadline_stays_pending() {
        let now = Utc::now();
        let deadline = now + Duration::days(7);

        assert_eq!(
            effective_consent_status(ConsentStatus::Pending, Some(deadline), now),
            ConsentStatus::Pending
        );
    }

    #[test]
    fn test_consent_without_deadline_never_expires() {
        let now = Utc::now();
        assert_eq!(
            effective_consent_status(ConsentStatus::Pending, None, now),
            ConsentStatus::Pending
        );
    }

    #[test]
    fn test_decided_consent_ignores_deadline() {
        let now = Utc::now();
        let deadline = now - Duration::days(30);

        assert_eq!(
            effective_consent_status(ConsentStatus::Approved, Some(deadline), now),
            ConsentStatus::Approved
        );
        assert_eq!(
            effective_consent_status(ConsentStatus::Denied, Some(deadline), now),
            ConsentStatus::Denied
        );
    }

    #[test]
    fn test_evaluator_is_idempotent() {
        let now = Utc::now();
        let deadline = now - Duration::days(1);

        let first = effective_consent_status(ConsentStatus::Pending, Some(deadline), now);
        let second = effective_consent_status(first, Some(deadline), now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_pending_invoice_past_due_reads_overdue() {
        let now = Utc::now();
        let due = now - Duration::days(14);

        assert_eq!(
            effective_invoice_status(InvoiceStatus::Pending, due, now),
            InvoiceStatus::Overdue
        );
    }

    #[test]
    fn test_paid_invoice_never_reverts_to_overdue() {
        let now = Utc::now();
        let due = now - Duration::days(365);

        for stored in [
            InvoiceStatus::Paid,
            InvoiceStatus::Canceled,
            InvoiceStatus::Refunded,
        ] {
            assert_eq!(effective_invoice_status(stored, due, now), stored);
        }
    }

    #[test]
    fn test_invoice_due_exactly_now_is_not_overdue() {
        let now = Utc::now();
        assert_eq!(
            effective_invoice_status(InvoiceStatus::Pending, now, now),
            InvoiceStatus::Pending
        );
    }
}
