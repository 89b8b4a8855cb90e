use solana_sdk::signature::Signature;

use crate::execution::errors::SubmissionError;

/// What a single submit attempt ended with.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// No wallet connected; nothing was sent.
    Skipped,
    /// Another submission from the same submitter is still in flight.
    Busy,
    Submitted(Signature),
    Failed(SubmissionError),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            SubmitOutcome::Submitted(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SubmissionError> {
        match self {
            SubmitOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}
