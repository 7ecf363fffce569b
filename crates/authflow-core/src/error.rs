//! Error taxonomy for the login flow.

use crate::flow::FlowState;
use authflow_browser::DriverError;
use thiserror::Error;

/// Fatal flow conditions. Partial download failures are deliberately absent:
/// they are carried in the batch summary, not escalated.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Missing or invalid parameter, or missing relaunch tooling. Reported
    /// before any browser action is attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// Expected page text not observed within the timeout.
    #[error("validation failed at {state}: expected '{expected}' was not found in time")]
    Validation { state: FlowState, expected: String },

    /// The automation collaborator errored or disconnected. Distinct from
    /// `Validation` so operators can tell "wrong page" from "broken
    /// connection".
    #[error("driver failure: {0}")]
    Driver(#[from] DriverError),

    /// The target system rejected every submitted OTP code.
    #[error("OTP rejected {attempts} times, attempt budget exhausted")]
    OtpExhausted { attempts: u32 },

    /// Local I/O failed: the operator console closed mid-prompt, or an
    /// artifact directory could not be created.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Process exit status for this failure: configuration problems exit 2,
    /// everything else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlowError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
