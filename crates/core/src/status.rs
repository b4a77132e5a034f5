//! Status vocabulary: the closed state sets of every lifecycle entity.
//!
//! Persisted or requested raw values are only ever interpreted through
//! [`classify`]; anything outside the declared set surfaces as
//! [`AppError::UnknownStatus`] instead of being echoed back as if it
//! were a known state.

use escola_common::{AppError, AppResult};
use escola_db::entities::consent::ConsentStatus;
use escola_db::entities::invoice::InvoiceStatus;
use escola_db::entities::monthly_transfer::TransferStatus;
use escola_db::entities::print_request::PrintRequestStatus;
use escola_db::entities::student_document::DocumentStatus;
use escola_db::entities::subscription::SubscriptionStatus;

/// The lifecycle entity types the engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Consent,
    Subscription,
    Invoice,
    PrintRequest,
    StudentDocument,
    MonthlyTransfer,
}

impl EntityKind {
    /// Stable name used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Consent => "consent",
            Self::Subscription => "subscription",
            Self::Invoice => "invoice",
            Self::PrintRequest => "print_request",
            Self::StudentDocument => "student_document",
            Self::MonthlyTransfer => "monthly_transfer",
        }
    }
}

/// What the vocabulary knows about one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    /// Canonical (lowercase) state value.
    pub state: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// No guard permits a transition out of this state.
    pub is_terminal: bool,
    /// Reachable by time passing rather than a user action.
    pub is_derived: bool,
}

/// A closed status set with canonical values, labels, and state flags.
pub trait StatusVocabulary: Sized + Copy {
    /// Parse a raw stored/requested value into a member of the set.
    fn parse(raw: &str) -> Option<Self>;
    /// Canonical (lowercase) value of this state.
    fn canonical(self) -> &'static str;
    /// Human-readable label.
    fn label(self) -> &'static str;
    /// Whether the guard permits no transition out of this state.
    fn is_terminal(self) -> bool;
    /// Whether this state is reached by time passing, not a user action.
    fn is_derived(self) -> bool;

    /// The vocabulary entry for this state.
    fn info(self) -> StatusInfo {
        StatusInfo {
            state: self.canonical(),
            label: self.label(),
            is_terminal: self.is_terminal(),
            is_derived: self.is_derived(),
        }
    }
}

impl StatusVocabulary for ConsentStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "denied" => Some(Self::Denied),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::Expired => "expired",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting response",
            Self::Approved => "Approved",
            Self::Denied => "Denied",
            Self::Expired => "Expired",
        }
    }

    fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    fn is_derived(self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl StatusVocabulary for SubscriptionStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "trial" => Some(Self::Trial),
            "active" => Some(Self::Active),
            "past_due" => Some(Self::PastDue),
            "blocked" => Some(Self::Blocked),
            "canceled" => Some(Self::Canceled),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Blocked => "blocked",
            Self::Canceled => "canceled",
            Self::Paused => "paused",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Trial => "Trial",
            Self::Active => "Active",
            Self::PastDue => "Past due",
            Self::Blocked => "Blocked",
            Self::Canceled => "Canceled",
            Self::Paused => "Paused",
        }
    }

    // Pause and cancel both allow reactivation, so no subscription state
    // is strictly terminal.
    fn is_terminal(self) -> bool {
        false
    }

    fn is_derived(self) -> bool {
        matches!(self, Self::PastDue | Self::Blocked)
    }
}

impl StatusVocabulary for InvoiceStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "canceled" => Some(Self::Canceled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
            Self::Canceled => "Canceled",
            Self::Refunded => "Refunded",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Canceled | Self::Refunded)
    }

    fn is_derived(self) -> bool {
        matches!(self, Self::Overdue)
    }
}

impl StatusVocabulary for PrintRequestStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "requested" => Some(Self::Requested),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "printed" => Some(Self::Printed),
            "review" => Some(Self::Review),
            _ => None,
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Printed => "printed",
            Self::Review => "review",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Printed => "Printed",
            Self::Review => "Changes requested",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Printed)
    }

    fn is_derived(self) -> bool {
        false
    }
}

impl StatusVocabulary for DocumentStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    fn is_derived(self) -> bool {
        false
    }
}

impl StatusVocabulary for TransferStatus {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    fn canonical(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payout",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    fn is_derived(self) -> bool {
        false
    }
}

/// Classify a raw status value against the closed set for an entity kind.
///
/// Returns the vocabulary entry, or [`AppError::UnknownStatus`] when the
/// value lies outside the set. Classifying a canonical value returns the
/// same canonical value, so the operation is idempotent.
pub fn classify(kind: EntityKind, raw: &str) -> AppResult<StatusInfo> {
    let info = match kind {
        EntityKind::Consent => ConsentStatus::parse(raw).map(StatusVocabulary::info),
        EntityKind::Subscription => SubscriptionStatus::parse(raw).map(StatusVocabulary::info),
        EntityKind::Invoice => InvoiceStatus::parse(raw).map(StatusVocabulary::info),
        EntityKind::PrintRequest => PrintRequestStatus::parse(raw).map(StatusVocabulary::info),
        EntityKind::StudentDocument => DocumentStatus::parse(raw).map(StatusVocabulary::info),
        EntityKind::MonthlyTransfer => TransferStatus::parse(raw).map(StatusVocabulary::info),
    };

    info.ok_or_else(|| {
        tracing::warn!(entity = kind.name(), value = raw, "Unknown status value");
        AppError::UnknownStatus {
            entity: kind.name().to_string(),
            value: raw.to_string(),
        }
    })
}

/// Parse a list of raw status filters into typed members of one set.
///
/// Used by the query boundary so a multi-select filter containing an
/// unknown value fails loudly instead of silently matching nothing.
pub fn parse_filters<S: StatusVocabulary>(
    kind: EntityKind,
    raw_filters: &[String],
) -> AppResult<Vec<S>> {
    raw_filters
        .iter()
        .map(|raw| {
            S::parse(raw).ok_or_else(|| AppError::UnknownStatus {
                entity: kind.name().to_string(),
                value: raw.clone(),
            })
        })
        .collect()
}
