use log::{info, warn};
use solana_sdk::signature::Signature;

use crate::execution::SubmissionError;

pub fn log_skipped(reason: &str) {
    info!("⏭️  Submit skipped - {}", reason);
}

pub fn log_failure(err: &SubmissionError) {
    warn!("❌ Order not placed - {}", err);
}

pub fn log_submitted(signature: &Signature) {
    info!("✅ Order submitted: {}", signature);
}
