//! Vetting-standing check run ahead of every RSVP and ticket purchase.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identity::UserId;
use crate::workflows::events::EventId;
use crate::workflows::vetting::{
    AuditAction, AuditEntry, VettingApplication, VettingRepository, VettingStatus,
};
use crate::workflows::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessKind {
    Rsvp,
    TicketPurchase,
}

impl AccessKind {
    pub const fn label(self) -> &'static str {
        match self {
            AccessKind::Rsvp => "RSVP",
            AccessKind::TicketPurchase => "ticket purchase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum AccessDecision {
    #[serde(rename_all = "camelCase")]
    Allowed { vetting_status: Option<VettingStatus> },
    #[serde(rename_all = "camelCase")]
    Denied {
        vetting_status: VettingStatus,
        reason: &'static str,
        user_message: &'static str,
    },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed { .. })
    }
}

/// Maps a vetting standing to an access decision. `None` means the user never applied.
pub fn evaluate(status: Option<VettingStatus>, kind: AccessKind) -> AccessDecision {
    let Some(status) = status else {
        return AccessDecision::Allowed {
            vetting_status: None,
        };
    };

    let denial = match (status, kind) {
        (VettingStatus::OnHold, AccessKind::Rsvp) => Some((
            "Vetting application on hold",
            "Your vetting application is on hold. Please contact support@witchcityrope.com to provide additional information and reactivate your application.",
        )),
        (VettingStatus::OnHold, AccessKind::TicketPurchase) => Some((
            "Vetting application on hold",
            "Your application is on hold. Please contact support@witchcityrope.com to reactivate your application.",
        )),
        (VettingStatus::Denied, AccessKind::Rsvp) => Some((
            "Vetting application denied",
            "Your vetting application was denied. You cannot RSVP for events at this time.",
        )),
        (VettingStatus::Denied, AccessKind::TicketPurchase) => Some((
            "Vetting application denied",
            "Your vetting application was not approved. You cannot purchase tickets at this time.",
        )),
        (VettingStatus::Withdrawn, AccessKind::Rsvp) => Some((
            "Vetting application withdrawn",
            "You withdrew your vetting application. You may submit a new application to gain access to events.",
        )),
        (VettingStatus::Withdrawn, AccessKind::TicketPurchase) => Some((
            "Vetting application withdrawn",
            "You withdrew your vetting application. Please submit a new application if you would like to join the community.",
        )),
        _ => None,
    };

    match denial {
        Some((reason, user_message)) => AccessDecision::Denied {
            vetting_status: status,
            reason,
            user_message,
        },
        None => AccessDecision::Allowed {
            vetting_status: Some(status),
        },
    }
}

/// The application that decides a user's standing: the newest non-withdrawn one, falling
/// back to the newest withdrawn one.
pub fn governing_application(applications: Vec<VettingApplication>) -> Option<VettingApplication> {
    let (withdrawn, current): (Vec<_>, Vec<_>) = applications
        .into_iter()
        .partition(|application| application.status == VettingStatus::Withdrawn);

    current
        .into_iter()
        .max_by(VettingApplication::recency)
        .or_else(|| withdrawn.into_iter().max_by(VettingApplication::recency))
}

/// Guard consulted by the participation service before any capacity or payment logic.
pub struct ParticipationGuard<V> {
    vetting: Arc<V>,
}

impl<V> ParticipationGuard<V>
where
    V: VettingRepository + 'static,
{
    pub fn new(vetting: Arc<V>) -> Self {
        Self { vetting }
    }

    /// Side-effect free variant of [`ParticipationGuard::check`] for status displays.
    pub fn decide(
        &self,
        user: &UserId,
        kind: AccessKind,
    ) -> Result<AccessDecision, RepositoryError> {
        let application = governing_application(self.vetting.for_user(user)?);
        Ok(evaluate(application.map(|app| app.status), kind))
    }

    /// Decide whether `user` may perform `kind` for `event`. Denials are audited against the
    /// governing application; audit failures are logged and never change the decision.
    pub fn check(
        &self,
        user: &UserId,
        event: &EventId,
        kind: AccessKind,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, RepositoryError> {
        let application = governing_application(self.vetting.for_user(user)?);
        let decision = evaluate(application.as_ref().map(|app| app.status), kind);

        if let (
            Some(application),
            AccessDecision::Denied {
                vetting_status,
                reason,
                ..
            },
        ) = (&application, &decision)
        {
            tracing::info!(
                user_id = %user,
                event_id = %event,
                vetting_status = %vetting_status,
                access = kind.label(),
                "participation denied by vetting status"
            );

            let entry = AuditEntry {
                application_id: application.id.clone(),
                action: AuditAction::AccessDenied,
                old_value: Some(*vetting_status),
                new_value: Some(*vetting_status),
                performed_by: user.clone(),
                performed_at: now,
                note: Some(format!(
                    "Access denied. Vetting status: {vetting_status}. Reason: {reason} ({} for event {event})",
                    kind.label()
                )),
            };
            if let Err(error) = self.vetting.append_audit(entry) {
                tracing::warn!(
                    user_id = %user,
                    error = %error,
                    "failed to record access denial"
                );
            }
        }

        Ok(decision)
    }
}
