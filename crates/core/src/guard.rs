//! Transition guard: which actions are legal from which state, and what
//! payload they require.
//!
//! The guard is pure. Services evaluate it against the row they just
//! read and then write with a compare-and-swap on the same (status,
//! version) pair, so the decision can never apply to a staler row than
//! the one it was made for.

use escola_common::AppError;
use escola_db::entities::consent::ConsentStatus;
use escola_db::entities::invoice::InvoiceStatus;
use escola_db::entities::monthly_transfer::TransferStatus;
use escola_db::entities::print_request::PrintRequestStatus;
use escola_db::entities::student_document::DocumentStatus;
use escola_db::entities::subscription::SubscriptionStatus;

use crate::status::StatusVocabulary;

/// Why a transition was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The transition requires a payload field that was not supplied.
    MissingField(&'static str),
    /// The entity's current state does not permit the action.
    InvalidSourceState {
        /// Canonical value of the current state.
        from: &'static str,
        /// Name of the attempted action.
        action: &'static str,
    },
    /// The caller is not the designated actor for this entity.
    UnauthorizedActor,
}

impl From<RejectReason> for AppError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::MissingField(field) => Self::MissingField(field.to_string()),
            RejectReason::InvalidSourceState { from, action } => Self::InvalidSourceState {
                from: from.to_string(),
                action: action.to_string(),
            },
            RejectReason::UnauthorizedActor => Self::UnauthorizedActor,
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The transition may proceed.
    Allowed,
    /// The transition must not proceed.
    Rejected(RejectReason),
}

impl GuardDecision {
    /// Convert into a result, mapping rejections to typed errors.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Rejected(reason) => Err(reason.into()),
        }
    }
}

// ==================== Consent ====================

/// Actions on a consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentAction {
    /// Guardian authorizes participation.
    Approve,
    /// Guardian declines participation.
    Deny,
    /// Time sweep past the deadline.
    Expire,
}

impl ConsentAction {
    /// Stable action name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deny => "deny",
            Self::Expire => "expire",
        }
    }

    /// The state this action produces.
    #[must_use]
    pub const fn target(self) -> ConsentStatus {
        match self {
            Self::Approve => ConsentStatus::Approved,
            Self::Deny => ConsentStatus::Denied,
            Self::Expire => ConsentStatus::Expired,
        }
    }
}

/// Validate a consent transition.
///
/// `Approve`/`Deny` require the actor to be the designated responsible
/// guardian; `Expire` is the system sweep and carries no actor.
#[must_use]
pub fn consent_transition(
    current: ConsentStatus,
    action: ConsentAction,
    actor_is_responsible: bool,
) -> GuardDecision {
    if matches!(action, ConsentAction::Approve | ConsentAction::Deny) && !actor_is_responsible {
        return GuardDecision::Rejected(RejectReason::UnauthorizedActor);
    }

    if current == ConsentStatus::Pending {
        GuardDecision::Allowed
    } else {
        GuardDecision::Rejected(RejectReason::InvalidSourceState {
            from: current.canonical(),
            action: action.name(),
        })
    }
}

/// Whether re-applying the action would only repeat a transition that
/// already took effect (no-op success under retry).
#[must_use]
pub fn consent_is_replay(current: ConsentStatus, action: ConsentAction) -> bool {
    current == action.target() && current != ConsentStatus::Pending
}

// ==================== Subscription ====================

/// Actions on a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    /// Payment received: trial, past-due, or blocked becomes active.
    Activate,
    /// System: payment missed at period end.
    MarkPastDue,
    /// System: grace period elapsed without payment.
    Block,
    /// Owner pauses billing.
    Pause,
    /// Owner cancels the subscription.
    Cancel,
    /// Owner reactivates a paused (or, policy permitting, canceled)
    /// subscription.
    Reactivate,
}

impl SubscriptionAction {
    /// Stable action name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::MarkPastDue => "mark_past_due",
            Self::Block => "block",
            Self::Pause => "pause",
            Self::Cancel => "cancel",
            Self::Reactivate => "reactivate",
        }
    }

    /// The state this action produces.
    #[must_use]
    pub const fn target(self) -> SubscriptionStatus {
        match self {
            Self::Activate | Self::Reactivate => SubscriptionStatus::Active,
            Self::MarkPastDue => SubscriptionStatus::PastDue,
            Self::Block => SubscriptionStatus::Blocked,
            Self::Pause => SubscriptionStatus::Paused,
            Self::Cancel => SubscriptionStatus::Canceled,
        }
    }
}

/// Validate a subscription transition.
///
/// `allow_reactivate_canceled` comes from [`escola_common::BillingPolicy`]:
/// the product offers "Reativar" from canceled as well as paused, which
/// reads oddly against canceled-as-terminal, so the canceled arm stays
/// behind the flag until product confirms the intent.
#[must_use]
pub fn subscription_transition(
    current: SubscriptionStatus,
    action: SubscriptionAction,
    allow_reactivate_canceled: bool,
) -> GuardDecision {
    let allowed = match action {
        SubscriptionAction::Activate => matches!(
            current,
            SubscriptionStatus::Trial | SubscriptionStatus::PastDue | SubscriptionStatus::Blocked
        ),
        SubscriptionAction::MarkPastDue => current == SubscriptionStatus::Active,
        SubscriptionAction::Block => current == SubscriptionStatus::PastDue,
        SubscriptionAction::Pause | SubscriptionAction::Cancel => {
            current == SubscriptionStatus::Active
        }
        SubscriptionAction::Reactivate => match current {
            SubscriptionStatus::Paused => true,
            SubscriptionStatus::Canceled => allow_reactivate_canceled,
            _ => false,
        },
    };

    if allowed {
        GuardDecision::Allowed
    } else {
        GuardDecision::Rejected(RejectReason::InvalidSourceState {
            from: current.canonical(),
            action: action.name(),
        })
    }
}

/// Whether re-applying the action would repeat a transition that already
/// took effect.
#[must_use]
pub fn subscription_is_replay(current: SubscriptionStatus, action: SubscriptionAction) -> bool {
    current == action.target()
}

// ==================== Invoice ====================

/// Actions on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceAction {
    /// Payment confirmed.
    MarkPaid,
    /// System: due date passed without payment.
    MarkOverdue,
    /// Admin voids the charge.
    Cancel,
    /// Admin refunds a paid invoice.
    Refund,
}

impl InvoiceAction {
    /// Stable action name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MarkPaid => "mark_paid",
            Self::MarkOverdue => "mark_overdue",
            Self::Cancel => "cancel",
            Self::Refund => "refund",
        }
    }

    /// The state this action produces.
    #[must_use]
    pub const fn target(self) -> InvoiceStatus {
        match self {
            Self::MarkPaid => InvoiceStatus::Paid,
            Self::MarkOverdue => InvoiceStatus::Overdue,
            Self::Cancel => InvoiceStatus::Canceled,
            Self::Refund => InvoiceStatus::Refunded,
        }
    }
}

/// Validate an invoice transition.
#[must_use]
pub fn invoice_transition(current: InvoiceStatus, action: InvoiceAction) -> GuardDecision {
    let allowed = match action {
        // An overdue invoice is still payable; paid/refunded rows are
        // immutable.
        InvoiceAction::MarkPaid | InvoiceAction::Cancel => {
            matches!(current, InvoiceStatus::Pending | InvoiceStatus::Overdue)
        }
        InvoiceAction::MarkOverdue => current == InvoiceStatus::Pending,
        InvoiceAction::Refund => current == InvoiceStatus::Paid,
    };

    if allowed {
        GuardDecision::Allowed
    } else {
        GuardDecision::Rejected(RejectReason::InvalidSourceState {
            from: current.canonical(),
            action: action.name(),
        })
    }
}

/// Whether re-applying the action would repeat a transition that already
/// took effect.
#[must_use]
pub fn invoice_is_replay(current: InvoiceStatus, action: InvoiceAction) -> bool {
    current == action.target()
}

// ==================== Print request ====================

/// Actions on a print request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintRequestAction {
    /// Approver clears the job for printing.
    Approve,
    /// Approver declines the job; feedback required.
    Reject,
    /// Approver sends the job back for edits.
    RequestChanges,
    /// Requester resubmits after editing.
    Resubmit,
    /// Print room marks the job done.
    MarkPrinted,
}

impl PrintRequestAction {
    /// Stable action name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::RequestChanges => "request_changes",
            Self::Resubmit => "resubmit",
            Self::MarkPrinted => "mark_printed",
        }
    }

    /// The state this action produces.
    #[must_use]
    pub const fn target(self) -> PrintRequestStatus {
        match self {
            Self::Approve => PrintRequestStatus::Approved,
            Self::Reject => PrintRequestStatus::Rejected,
            Self::RequestChanges => PrintRequestStatus::Review,
            Self::Resubmit => PrintRequestStatus::Requested,
            Self::MarkPrinted => PrintRequestStatus::Printed,
        }
    }
}

/// Validate a print request transition.
///
/// `Reject` demands feedback; `Resubmit` is reserved for the requester.
#[must_use]
pub fn print_request_transition(
    current: PrintRequestStatus,
    action: PrintRequestAction,
    has_feedback: bool,
    actor_is_requester: bool,
) -> GuardDecision {
    if action == PrintRequestAction::Reject && !has_feedback {
        return GuardDecision::Rejected(RejectReason::MissingField("feedback"));
    }
    if action == PrintRequestAction::Resubmit && !actor_is_requester {
        return GuardDecision::Rejected(RejectReason::UnauthorizedActor);
    }

    let allowed = match action {
        PrintRequestAction::Approve
        | PrintRequestAction::Reject
        | PrintRequestAction::RequestChanges => current == PrintRequestStatus::Requested,
        PrintRequestAction::Resubmit => current == PrintRequestStatus::Review,
        PrintRequestAction::MarkPrinted => current == PrintRequestStatus::Approved,
    };

    if allowed {
        GuardDecision::Allowed
    } else {
        GuardDecision::Rejected(RejectReason::InvalidSourceState {
            from: current.canonical(),
            action: action.name(),
        })
    }
}

/// Whether re-applying the action would repeat a transition that already
/// took effect. `Resubmit` is excluded: requested is the starting state,
/// not evidence the resubmission happened.
#[must_use]
pub fn print_request_is_replay(current: PrintRequestStatus, action: PrintRequestAction) -> bool {
    action != PrintRequestAction::Resubmit && current == action.target()
}

// ==================== Student document ====================

/// Review actions on a student document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    /// Reviewer accepts the document.
    Approve,
    /// Reviewer rejects the document; a reason is required.
    Reject,
}

impl DocumentAction {
    /// Stable action name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// The state this action produces.
    #[must_use]
    pub const fn target(self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Approved,
            Self::Reject => DocumentStatus::Rejected,
        }
    }
}

/// Validate a document review.
#[must_use]
pub fn document_review(
    current: DocumentStatus,
    action: DocumentAction,
    has_reason: bool,
) -> GuardDecision {
    if action == DocumentAction::Reject && !has_reason {
        return GuardDecision::Rejected(RejectReason::MissingField("rejection_reason"));
    }

    if current == DocumentStatus::Pending {
        GuardDecision::Allowed
    } else {
        GuardDecision::Rejected(RejectReason::InvalidSourceState {
            from: current.canonical(),
            action: action.name(),
        })
    }
}

/// Whether re-applying the review would repeat a decision that already
/// took effect.
#[must_use]
pub fn document_is_replay(current: DocumentStatus, action: DocumentAction) -> bool {
    current == action.target() && current != DocumentStatus::Pending
}

// ==================== Monthly transfer ====================

/// Settlement actions on a monthly transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    /// Payout picked up for processing.
    StartProcessing,
    /// Payout settled.
    Complete,
    /// Payout failed.
    Fail,
    /// Failed payout queued again.
    Retry,
}

impl TransferAction {
    /// Stable action name for errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartProcessing => "start_processing",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::Retry => "retry",
        }
    }

    /// The state this action produces.
    #[must_use]
    pub const fn target(self) -> TransferStatus {
        match self {
            Self::StartProcessing => TransferStatus::Processing,
            Self::Complete => TransferStatus::Completed,
            Self::Fail => TransferStatus::Failed,
            Self::Retry => TransferStatus::Pending,
        }
    }
}

/// Validate a monthly transfer settlement transition.
#[must_use]
pub fn transfer_transition(current: TransferStatus, action: TransferAction) -> GuardDecision {
    let allowed = match action {
        TransferAction::StartProcessing => current == TransferStatus::Pending,
        TransferAction::Complete | TransferAction::Fail => current == TransferStatus::Processing,
        TransferAction::Retry => current == TransferStatus::Failed,
    };

    if allowed {
        GuardDecision::Allowed
    } else {
        GuardDecision::Rejected(RejectReason::InvalidSourceState {
            from: current.canonical(),
            action: action.name(),
        })
    }
}

/// Whether re-applying the action would repeat a transition that already
/// took effect. `Retry` is excluded for the same reason as resubmit.
#[must_use]
pub fn transfer_is_replay(current: TransferStatus, action: TransferAction) -> bool {
    action != TransferAction::Retry && current == action.target()
}
