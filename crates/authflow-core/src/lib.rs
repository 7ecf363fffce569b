//! Core orchestration for authflow: the login flow state machine, layered
//! configuration, step validation, the OTP gate, session-profile
//! persistence, and the post-authentication download phase.

pub mod config;
pub mod download;
pub mod error;
pub mod flow;
pub mod otp;
pub mod profile;
pub mod validate;

pub use config::{CliOverrides, Config, ExecMode, Layers, parse_bool};
pub use download::{DownloadOrchestrator, DownloadSummary, DownloadTask, HttpFetcher, TaskFetcher};
pub use error::FlowError;
pub use flow::{FlowOptions, FlowOutcome, FlowState, LoginFlow};
pub use otp::{CodeProvider, ConsoleCodeProvider, ScriptedCodeProvider};
pub use profile::SessionProfile;
pub use validate::{StepValidator, ValidationRule};
