use thiserror::Error;

pub type CrmResult<T> = Result<T, CrmError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrmError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("unknown stage {0}")]
    UnknownStage(String),
    #[error("unknown plan {0}")]
    UnknownPlan(String),
    #[error("signed prospects cannot be deleted")]
    SignedProspectLocked,
    #[error("validated registers can only be changed by the BPO team")]
    RegisterLocked,
    #[error("{field} total is out of range")]
    TotalOutOfRange { field: &'static str },
}

impl CrmError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CrmError::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Rule violations map to a conflict, everything else is bad input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CrmError::SignedProspectLocked | CrmError::RegisterLocked
        )
    }
}
