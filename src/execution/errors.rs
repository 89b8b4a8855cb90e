use std::fmt;

/// Stage of the submission flow that failed, with its cause.
#[derive(Debug)]
pub enum SubmissionError {
    AccountLookup(anyhow::Error),
    OrderBuild(anyhow::Error),
    Blockhash(anyhow::Error),
    SignAndSend(anyhow::Error),
}

impl SubmissionError {
    pub fn stage(&self) -> &'static str {
        match self {
            SubmissionError::AccountLookup(_) => "account lookup",
            SubmissionError::OrderBuild(_) => "order build",
            SubmissionError::Blockhash(_) => "blockhash",
            SubmissionError::SignAndSend(_) => "sign and send",
        }
    }

    pub fn cause(&self) -> &anyhow::Error {
        match self {
            SubmissionError::AccountLookup(e)
            | SubmissionError::OrderBuild(e)
            | SubmissionError::Blockhash(e)
            | SubmissionError::SignAndSend(e) => e,
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {:#}", self.stage(), self.cause())
    }
}

impl std::error::Error for SubmissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&**self.cause())
    }
}
