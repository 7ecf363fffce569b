//! Step validation: polling the page for an expected text fragment.

use authflow_browser::{BrowserDriver, DriverError, PageContent};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// A per-state validation gate, supplied entirely by configuration.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub expected: String,
    pub timeout: Duration,
}

impl ValidationRule {
    pub fn new(expected: impl Into<String>, timeout: Duration) -> Self {
        Self {
            expected: expected.into(),
            timeout,
        }
    }
}

/// Polls page content at a fixed interval. A non-match within the timeout is
/// an ordinary `Ok(None)`; only driver-level I/O failures escalate as errors.
#[derive(Debug, Clone)]
pub struct StepValidator {
    poll_interval: Duration,
}

impl StepValidator {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Wait until the page text contains the rule's fragment. Returns the
    /// matching page snapshot, or `None` when the timeout elapses first.
    pub async fn wait_for_text(
        &self,
        driver: &dyn BrowserDriver,
        rule: &ValidationRule,
    ) -> Result<Option<PageContent>, DriverError> {
        let start = Instant::now();
        loop {
            let content = driver.page_content().await?;
            if content.text.contains(&rule.expected) {
                return Ok(Some(content));
            }

            if start.elapsed() >= rule.timeout {
                return Ok(None);
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Wait for a redirect away from `initial_url`. The gate passes once the
    /// URL has changed AND, when an expected fragment is configured, that
    /// fragment is present in the page text.
    pub async fn wait_for_redirect(
        &self,
        driver: &dyn BrowserDriver,
        initial_url: &str,
        expected: Option<&str>,
        timeout: Duration,
    ) -> Result<Option<PageContent>, DriverError> {
        let start = Instant::now();
        let mut last_url = initial_url.to_string();

        loop {
            let content = driver.page_content().await?;

            if content.url != last_url {
                debug!(from = %last_url, to = %content.url, "url changed during redirect wait");
                last_url = content.url.clone();
            }

            let redirected = content.url != initial_url;
            let text_ok = expected.is_none_or(|fragment| content.text.contains(fragment));

            if redirected && text_ok {
                return Ok(Some(content));
            }

            if start.elapsed() >= timeout {
                return Ok(None);
            }

            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use authflow_browser::{PageLink, Result as DriverResult};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Serves a queue of page snapshots, repeating the last one forever.
    struct PageSequence {
        pages: Mutex<Vec<PageContent>>,
    }

    impl PageSequence {
        fn new(pages: Vec<PageContent>) -> Self {
            Self {
                pages: Mutex::new(pages),
            }
        }
    }

    #[async_trait]
    impl BrowserDriver for PageSequence {
        async fn navigate(&self, _url: &str) -> DriverResult<PageContent> {
            self.page_content().await
        }

        async fn click(&self, _selector: &str, _text: Option<&str>) -> DriverResult<()> {
            Ok(())
        }

        async fn fill(&self, _selector: &str, _value: &str) -> DriverResult<()> {
            Ok(())
        }

        async fn page_content(&self) -> DriverResult<PageContent> {
            let mut pages = self.pages.lock().unwrap();
            if pages.len() > 1 {
                Ok(pages.remove(0))
            } else {
                Ok(pages[0].clone())
            }
        }

        async fn screenshot(&self, path: &Path) -> DriverResult<PathBuf> {
            Ok(path.to_path_buf())
        }

        async fn extract_links(&self, _selector: &str) -> DriverResult<Vec<PageLink>> {
            Ok(Vec::new())
        }

        async fn close(&self) -> DriverResult<()> {
            Ok(())
        }
    }

    /// Simulates a crashed sidecar: every page read fails.
    struct BrokenDriver;

    #[async_trait]
    impl BrowserDriver for BrokenDriver {
        async fn navigate(&self, _url: &str) -> DriverResult<PageContent> {
            self.page_content().await
        }

        async fn click(&self, _selector: &str, _text: Option<&str>) -> DriverResult<()> {
            Ok(())
        }

        async fn fill(&self, _selector: &str, _value: &str) -> DriverResult<()> {
            Ok(())
        }

        async fn page_content(&self) -> DriverResult<PageContent> {
            Err(DriverError::Protocol(
                "driver closed its output stream".to_string(),
            ))
        }

        async fn screenshot(&self, path: &Path) -> DriverResult<PathBuf> {
            Ok(path.to_path_buf())
        }

        async fn extract_links(&self, _selector: &str) -> DriverResult<Vec<PageLink>> {
            Ok(Vec::new())
        }

        async fn close(&self) -> DriverResult<()> {
            Ok(())
        }
    }

    fn page(url: &str, text: &str) -> PageContent {
        PageContent {
            url: url.to_string(),
            title: String::new(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn finds_fragment_that_appears_after_polling() {
        let driver = PageSequence::new(vec![
            page("https://a", "carregando"),
            page("https://a", "carregando"),
            page("https://a", "Bem-vindo ao portal"),
        ]);
        let validator = StepValidator::new(Duration::from_millis(1));
        let rule = ValidationRule::new("Bem-vindo", Duration::from_millis(500));

        let found = validator.wait_for_text(&driver, &rule).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn times_out_when_fragment_never_appears() {
        let driver = PageSequence::new(vec![page("https://a", "outra coisa")]);
        let validator = StepValidator::new(Duration::from_millis(1));
        let rule = ValidationRule::new("Bem-vindo", Duration::from_millis(20));

        let found = validator.wait_for_text(&driver, &rule).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn driver_failures_escalate_instead_of_timing_out() {
        let validator = StepValidator::new(Duration::from_millis(1));
        let rule = ValidationRule::new("Bem-vindo", Duration::from_millis(500));

        let result = validator.wait_for_text(&BrokenDriver, &rule).await;
        assert!(matches!(result, Err(DriverError::Protocol(_))));

        let result = validator
            .wait_for_redirect(&BrokenDriver, "https://login", None, Duration::from_millis(500))
            .await;
        assert!(matches!(result, Err(DriverError::Protocol(_))));
    }

    #[tokio::test]
    async fn redirect_requires_url_change_even_with_matching_text() {
        let driver = PageSequence::new(vec![page("https://login", "Bem-vindo")]);
        let validator = StepValidator::new(Duration::from_millis(1));

        let found = validator
            .wait_for_redirect(
                &driver,
                "https://login",
                Some("Bem-vindo"),
                Duration::from_millis(20),
            )
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn redirect_passes_without_fragment_when_none_configured() {
        let driver = PageSequence::new(vec![
            page("https://login", ""),
            page("https://home", "qualquer"),
        ]);
        let validator = StepValidator::new(Duration::from_millis(1));

        let found = validator
            .wait_for_redirect(&driver, "https://login", None, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(found.unwrap().url, "https://home");
    }
}
