//! Post-authentication download phase.
//!
//! Discovers the visible download links on the current page, then fetches
//! them strictly one at a time into the target directory. A failing task is
//! recorded and the batch moves on; the caller gets a full summary instead
//! of an aborted run.

use crate::error::Result;
use anyhow::Context;
use async_trait::async_trait;
use authflow_browser::BrowserDriver;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A discovered link plus its target file path. Consumed exactly once.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub label: String,
    pub href: String,
    pub target: PathBuf,
}

#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<(String, String)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches one task. Abstracted so tests can inject failures without a
/// network.
#[async_trait]
pub trait TaskFetcher: Send + Sync {
    async fn fetch(&self, task: &DownloadTask) -> anyhow::Result<()>;
}

/// Plain HTTP GET of the resolved href, streamed to disk.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskFetcher for HttpFetcher {
    async fn fetch(&self, task: &DownloadTask) -> anyhow::Result<()> {
        let response = self
            .client
            .get(&task.href)
            .send()
            .await
            .with_context(|| format!("failed to request {}", task.href))?
            .error_for_status()
            .with_context(|| format!("server rejected {}", task.href))?;

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {}", task.href))?;

        if let Some(parent) = task.target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&task.target, &bytes)
            .with_context(|| format!("failed to write {}", task.target.display()))?;
        Ok(())
    }
}

pub struct DownloadOrchestrator<'a> {
    link_selector: &'a str,
    filter_selector: Option<(&'a str, &'a str)>,
    target_dir: &'a Path,
    fetcher: &'a dyn TaskFetcher,
}

impl<'a> DownloadOrchestrator<'a> {
    pub fn new(
        link_selector: &'a str,
        filter_selector: Option<(&'a str, &'a str)>,
        target_dir: &'a Path,
        fetcher: &'a dyn TaskFetcher,
    ) -> Self {
        Self {
            link_selector,
            filter_selector,
            target_dir,
            fetcher,
        }
    }

    pub async fn run(&self, driver: &dyn BrowserDriver) -> Result<DownloadSummary> {
        if let Some((selector, text)) = self.filter_selector {
            info!(selector, text, "applying download filter");
            let text_match = if text.is_empty() { None } else { Some(text) };
            driver.click(selector, text_match).await?;
        }

        let links = driver.extract_links(self.link_selector).await?;
        let tasks = build_tasks(&links, self.target_dir);
        info!(discovered = tasks.len(), "download tasks enumerated");

        let mut summary = DownloadSummary::default();
        for task in &tasks {
            summary.attempted += 1;
            match self.fetcher.fetch(task).await {
                Ok(()) => {
                    info!(label = %task.label, target = %task.target.display(), "download complete");
                    summary.succeeded += 1;
                }
                Err(err) => {
                    warn!(label = %task.label, error = %err, "download failed, continuing");
                    summary.failed.push((task.label.clone(), err.to_string()));
                }
            }
        }

        Ok(summary)
    }
}

fn build_tasks(links: &[authflow_browser::PageLink], target_dir: &Path) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();
    for (index, link) in links.iter().enumerate() {
        if link.href.trim().is_empty() {
            warn!(label = %link.label, "skipping link without href");
            continue;
        }

        let label = if link.label.is_empty() {
            format!("document_{}", index + 1)
        } else {
            link.label.clone()
        };
        let file_name = file_name_for(&label, &link.href, index);

        tasks.push(DownloadTask {
            label,
            href: link.href.clone(),
            target: target_dir.join(file_name),
        });
    }
    tasks
}

/// Derive a safe file name from the link label, borrowing an extension from
/// the href when the label has none.
fn file_name_for(label: &str, href: &str, index: usize) -> String {
    let mut name: String = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    name.truncate(120);
    let trimmed = name.trim_matches('_');
    let mut name = if trimmed.is_empty() {
        format!("document_{}", index + 1)
    } else {
        trimmed.to_string()
    };

    if !name.contains('.')
        && let Some(extension) = extension_from_href(href)
    {
        name.push('.');
        name.push_str(&extension);
    }
    name
}

fn extension_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let (_, extension) = segment.rsplit_once('.')?;
    if extension.is_empty() || extension.len() > 8 {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
