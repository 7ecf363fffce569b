//! The OTP gate: a blocking checkpoint where the operator supplies the
//! one-time code delivered out of band.
//!
//! Codes are opaque strings; the only local check is non-emptiness. The
//! target system's reaction after submission decides correctness, which is
//! why the flow wraps submission in a bounded retry loop instead of
//! validating here.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Mutex;

/// Pluggable source of OTP codes, so tests can script the hand-off instead
/// of reading the console.
#[async_trait]
pub trait CodeProvider: Send + Sync {
    /// Produce the next code. May block indefinitely: email delivery has
    /// unpredictable latency, so no timeout applies here.
    async fn next_code(&self) -> io::Result<String>;
}

/// Reads the code from the operator's console. The prompt goes to stderr so
/// stdout stays clean for machine consumers.
pub struct ConsoleCodeProvider {
    prompt: String,
}

impl ConsoleCodeProvider {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for ConsoleCodeProvider {
    fn default() -> Self {
        Self::new("Enter the OTP code received by email: ")
    }
}

#[async_trait]
impl CodeProvider for ConsoleCodeProvider {
    async fn next_code(&self) -> io::Result<String> {
        let prompt = self.prompt.clone();
        tokio::task::spawn_blocking(move || {
            loop {
                eprint!("{prompt}");
                io::stderr().flush()?;

                let mut line = String::new();
                if io::stdin().read_line(&mut line)? == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stdin closed while waiting for the OTP code",
                    ));
                }

                let code = line.trim().to_string();
                if !code.is_empty() {
                    return Ok(code);
                }
            }
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Deterministic provider for tests: yields queued codes in order, then
/// fails as if the console had closed.
pub struct ScriptedCodeProvider {
    codes: Mutex<VecDeque<String>>,
}

impl ScriptedCodeProvider {
    pub fn new(codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            codes: Mutex::new(codes.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl CodeProvider for ScriptedCodeProvider {
    async fn next_code(&self) -> io::Result<String> {
        self.codes
            .lock()
            .map_err(|_| io::Error::other("code queue poisoned"))?
            .pop_front()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "scripted code queue exhausted")
            })
    }
}
