use super::domain::VettingStatus;

/// Raised when a requested stage change is not part of the workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("application is {from} and cannot transition further")]
    Terminal { from: VettingStatus },
    #[error("cannot transition application from {from} to {to}")]
    Illegal {
        from: VettingStatus,
        to: VettingStatus,
    },
    #[error("only the applicant can withdraw an application")]
    ReviewerWithdrawal,
}

/// Targets a reviewer may choose from `from`.
pub const fn reviewer_targets(from: VettingStatus) -> &'static [VettingStatus] {
    use VettingStatus::*;

    match from {
        UnderReview => &[InterviewApproved, OnHold, Denied],
        InterviewApproved => &[InterviewScheduled, OnHold, Denied],
        InterviewScheduled => &[FinalReview, OnHold, Denied],
        FinalReview => &[Approved, Denied, OnHold],
        OnHold => &[UnderReview, Denied, Approved],
        Approved | Denied | Withdrawn => &[],
    }
}

pub fn ensure_reviewer_transition(
    from: VettingStatus,
    to: VettingStatus,
) -> Result<(), TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::Terminal { from });
    }
    if to == VettingStatus::Withdrawn {
        return Err(TransitionError::ReviewerWithdrawal);
    }
    if reviewer_targets(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

/// Applicants may withdraw from any non-terminal stage.
pub fn ensure_withdrawal(from: VettingStatus) -> Result<(), TransitionError> {
    if from.is_terminal() {
        Err(TransitionError::Terminal { from })
    } else {
        Ok(())
    }
}
