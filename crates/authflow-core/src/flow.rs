//! The login flow state machine.
//!
//! One explicit state enum plus a dispatch loop. Transitions are strictly
//! forward, with two exceptions: the bounded `AwaitOtp ↔ SubmitOtp` retry
//! loop, and the resume path that jumps straight to `Step5Validate` when a
//! resumable session profile exists.

use crate::config::Config;
use crate::download::{DownloadOrchestrator, DownloadSummary, TaskFetcher};
use crate::error::{FlowError, Result};
use crate::otp::CodeProvider;
use crate::profile::SessionProfile;
use crate::validate::{StepValidator, ValidationRule};
use authflow_browser::BrowserDriver;
use chrono::Local;
use std::fmt;
use tracing::{error, info, warn};

/// Position in the login sequence. Exactly one state is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Init,
    NavigateLogin,
    FillCredentials,
    Submit,
    RedirectValidate,
    PostLoginValidate,
    RequestEmailCode,
    AwaitOtp,
    SubmitOtp,
    Step5Validate,
    Authenticated,
    DownloadPhase,
    Done,
    Error,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Init => "INIT",
            FlowState::NavigateLogin => "NAVIGATE_LOGIN",
            FlowState::FillCredentials => "FILL_CREDENTIALS",
            FlowState::Submit => "SUBMIT",
            FlowState::RedirectValidate => "REDIRECT_VALIDATE",
            FlowState::PostLoginValidate => "POST_LOGIN_VALIDATE",
            FlowState::RequestEmailCode => "REQUEST_EMAIL_CODE",
            FlowState::AwaitOtp => "AWAIT_OTP",
            FlowState::SubmitOtp => "SUBMIT_OTP",
            FlowState::Step5Validate => "STEP5_VALIDATE",
            FlowState::Authenticated => "AUTHENTICATED",
            FlowState::DownloadPhase => "DOWNLOAD_PHASE",
            FlowState::Done => "DONE",
            FlowState::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlowOptions {
    /// Skip the login steps and validate the persisted session instead.
    pub resume: bool,
    /// Run the document download phase after authentication.
    pub run_downloads: bool,
}

#[derive(Debug)]
pub struct FlowOutcome {
    pub state: FlowState,
    pub downloads: Option<DownloadSummary>,
}

enum Step {
    Next(FlowState),
    Finished,
}

/// Mutable data threaded through the run.
#[derive(Default)]
struct FlowCtx {
    resume: bool,
    run_downloads: bool,
    initial_url: String,
    otp_code: String,
    otp_rejections: u32,
    downloads: Option<DownloadSummary>,
}

pub struct LoginFlow<'a> {
    config: &'a Config,
    driver: &'a dyn BrowserDriver,
    codes: &'a dyn CodeProvider,
    fetcher: &'a dyn TaskFetcher,
    validator: StepValidator,
}

impl<'a> LoginFlow<'a> {
    pub fn new(
        config: &'a Config,
        driver: &'a dyn BrowserDriver,
        codes: &'a dyn CodeProvider,
        fetcher: &'a dyn TaskFetcher,
    ) -> Self {
        Self {
            config,
            driver,
            codes,
            fetcher,
            validator: StepValidator::new(config.poll_interval),
        }
    }

    pub async fn run(&self, options: FlowOptions) -> Result<FlowOutcome> {
        let mut ctx = FlowCtx {
            resume: options.resume,
            run_downloads: options.run_downloads,
            ..FlowCtx::default()
        };

        let mut state = FlowState::Init;
        let mut failure = None;
        loop {
            match self.step(state, &mut ctx).await {
                Ok(Step::Next(next)) => state = next,
                Ok(Step::Finished) => break,
                Err(err) => {
                    // No cleanup here: the session is left as-is so the
                    // operator can inspect the page and artifacts.
                    error!(state = %state, error = %err, "login flow failed");
                    failure = Some(err);
                    state = FlowState::Error;
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        info!(state = %FlowState::Done, "login flow complete");
        Ok(FlowOutcome {
            state: FlowState::Done,
            downloads: ctx.downloads.take(),
        })
    }

    async fn step(&self, state: FlowState, ctx: &mut FlowCtx) -> Result<Step> {
        match state {
            FlowState::Init => {
                info!(
                    mode = %self.config.exec_mode(),
                    user_data_dir = %self.config.user_data_dir.display(),
                    "starting login flow"
                );
                if ctx.resume {
                    let resumable = SessionProfile::load(&self.config.user_data_dir)
                        .map(|profile| profile.resumable)
                        .unwrap_or(false);
                    if resumable {
                        info!(
                            skip_to = %FlowState::Step5Validate,
                            "resumable session found, skipping login steps"
                        );
                        return Ok(Step::Next(FlowState::Step5Validate));
                    }
                    warn!("resume requested but no resumable session profile, performing full login");
                }
                Ok(Step::Next(FlowState::NavigateLogin))
            }

            FlowState::NavigateLogin => {
                info!(url = %self.config.login_url, "navigating to login page");
                let content = self.driver.navigate(&self.config.login_url).await?;
                ctx.initial_url = if content.url.is_empty() {
                    self.config.login_url.clone()
                } else {
                    content.url
                };
                Ok(Step::Next(FlowState::FillCredentials))
            }

            FlowState::FillCredentials => {
                info!("filling credentials");
                self.driver
                    .fill(&self.config.cpf_selector, &self.config.cpf)
                    .await?;
                self.driver
                    .fill(&self.config.senha_selector, &self.config.senha)
                    .await?;
                self.capture("01_before_submit").await?;
                Ok(Step::Next(FlowState::Submit))
            }

            FlowState::Submit => {
                info!(button = %self.config.entrar_text, "submitting credentials");
                self.driver
                    .click(
                        &self.config.entrar_selector,
                        text_opt(&self.config.entrar_text),
                    )
                    .await?;
                self.settle().await;
                self.capture("02_after_submit").await?;
                Ok(Step::Next(FlowState::RedirectValidate))
            }

            FlowState::RedirectValidate => {
                let expected = text_opt(&self.config.redirect_validation_text);
                info!(
                    expected = expected.unwrap_or("<url change>"),
                    "waiting for post-submit redirect"
                );
                let found = self
                    .validator
                    .wait_for_redirect(
                        self.driver,
                        &ctx.initial_url,
                        expected,
                        self.config.redirect_timeout,
                    )
                    .await?;
                match found {
                    Some(content) => {
                        info!(url = %content.url, "redirect confirmed");
                        Ok(Step::Next(FlowState::PostLoginValidate))
                    }
                    None => Err(FlowError::Validation {
                        state,
                        expected: expected.unwrap_or("<url change>").to_string(),
                    }),
                }
            }

            FlowState::PostLoginValidate => {
                self.gate(state).await?;
                Ok(Step::Next(FlowState::RequestEmailCode))
            }

            FlowState::RequestEmailCode => {
                if self.config.receive_code_text.is_empty() {
                    info!("no email-code button configured, skipping OTP steps");
                    return Ok(Step::Next(FlowState::Step5Validate));
                }
                info!(button = %self.config.receive_code_text, "requesting email code");
                self.driver
                    .click(
                        &self.config.receive_code_selector,
                        Some(&self.config.receive_code_text),
                    )
                    .await?;
                self.capture("03_after_receive_code_click").await?;
                self.gate(state).await?;
                Ok(Step::Next(FlowState::AwaitOtp))
            }

            FlowState::AwaitOtp => {
                info!(
                    field = %self.config.otp_input_selector,
                    "waiting for the operator to enter the OTP code"
                );
                ctx.otp_code = self.codes.next_code().await?;
                Ok(Step::Next(FlowState::SubmitOtp))
            }

            FlowState::SubmitOtp => {
                info!(button = %self.config.authenticate_text, "submitting OTP code");
                self.driver
                    .fill(&self.config.otp_input_selector, &ctx.otp_code)
                    .await?;
                self.driver
                    .click(
                        &self.config.authenticate_selector,
                        text_opt(&self.config.authenticate_text),
                    )
                    .await?;
                self.settle().await;
                self.capture("04_after_authenticate_click").await?;

                if !self.config.otp_rejection_text.is_empty() {
                    let rule = ValidationRule::new(
                        self.config.otp_rejection_text.clone(),
                        self.config.otp_rejection_timeout,
                    );
                    if self
                        .validator
                        .wait_for_text(self.driver, &rule)
                        .await?
                        .is_some()
                    {
                        ctx.otp_rejections += 1;
                        if ctx.otp_rejections >= self.config.max_otp_attempts {
                            return Err(FlowError::OtpExhausted {
                                attempts: ctx.otp_rejections,
                            });
                        }
                        warn!(
                            rejected = ctx.otp_rejections,
                            budget = self.config.max_otp_attempts,
                            "OTP rejected, prompting again"
                        );
                        return Ok(Step::Next(FlowState::AwaitOtp));
                    }
                }
                Ok(Step::Next(FlowState::Step5Validate))
            }

            FlowState::Step5Validate => {
                self.gate(state).await?;
                Ok(Step::Next(FlowState::Authenticated))
            }

            FlowState::Authenticated => {
                info!("authenticated");
                if self.config.persist_session {
                    if let Err(err) =
                        SessionProfile::authenticated_now().save(&self.config.user_data_dir)
                    {
                        warn!(error = %err, "failed to persist session profile");
                    }
                }
                if ctx.run_downloads {
                    Ok(Step::Next(FlowState::DownloadPhase))
                } else {
                    Ok(Step::Next(FlowState::Done))
                }
            }

            FlowState::DownloadPhase => {
                info!(target = %self.config.download_dir.display(), "starting download phase");
                std::fs::create_dir_all(&self.config.download_dir)?;
                let filter = if self.config.download_filter_selector.is_empty() {
                    None
                } else {
                    Some((
                        self.config.download_filter_selector.as_str(),
                        self.config.download_filter_text.as_str(),
                    ))
                };
                let orchestrator = DownloadOrchestrator::new(
                    &self.config.download_link_selector,
                    filter,
                    &self.config.download_dir,
                    self.fetcher,
                );
                let summary = orchestrator.run(self.driver).await?;
                info!(
                    attempted = summary.attempted,
                    succeeded = summary.succeeded,
                    failed = summary.failed.len(),
                    "download phase finished"
                );
                ctx.downloads = Some(summary);
                Ok(Step::Next(FlowState::Done))
            }

            // Terminal states; the loop stops here.
            FlowState::Done | FlowState::Error => Ok(Step::Finished),
        }
    }

    /// Run the configured validation gate for a state. No rule means pass.
    async fn gate(&self, state: FlowState) -> Result<()> {
        let Some(rule) = self.config.validation_rule(state) else {
            info!(state = %state, "no validation rule configured, passing");
            return Ok(());
        };

        info!(state = %state, expected = %rule.expected, "waiting for validation text");
        match self.validator.wait_for_text(self.driver, &rule).await? {
            Some(_) => {
                info!(state = %state, "validation passed");
                Ok(())
            }
            None => Err(FlowError::Validation {
                state,
                expected: rule.expected,
            }),
        }
    }

    async fn capture(&self, prefix: &str) -> Result<()> {
        let name = format!("{prefix}_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.config.artifacts_dir.join(name);
        let saved = self.driver.screenshot(&path).await?;
        info!(path = %saved.display(), "screenshot saved");
        Ok(())
    }

    async fn settle(&self) {
        if !self.config.settle.is_zero() {
            tokio::time::sleep(self.config.settle).await;
        }
    }
}

fn text_opt(text: &str) -> Option<&str> {
    if text.is_empty() { None } else { Some(text) }
}
