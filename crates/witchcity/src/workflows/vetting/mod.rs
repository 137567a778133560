//! Vetting (membership approval) applications and their review workflow.
//!
//! Status changes happen only through [`VettingService::submit_review_decision`] and
//! [`VettingService::withdraw`]; every change appends one audit entry.

pub mod domain;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantReference, ApplicationId, ApplicationNote, ApplicationPriority, ApplicationSubmission,
    AuditAction, AuditEntry, ExperienceLevel, ReferenceStatus, ReferenceSubmission,
    ReviewDecision, VettingApplication, VettingStatus,
};
pub use query::{ApplicationFilter, PagedResult, SortDirection, SortField};
pub use repository::{
    ApplicationDetail, ApplicationSummary, DecisionOutcome, MyApplicationStatus,
    NotificationError, NotificationPublisher, NotificationTemplate, ReferenceProgress,
    StatusNotification, StatusUpdate, VettingRepository,
};
pub use router::vetting_router;
pub use service::{VettingError, VettingService};
pub use workflow::TransitionError;
