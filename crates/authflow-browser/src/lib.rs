//! Browser driver for authflow.
//!
//! This crate wraps a Chromium instance (via Playwright under Node) behind a
//! small request/response protocol. It supports:
//! - Runtime probing for the Node/Playwright prerequisites
//! - A persistent user-data directory so a later run can resume a session
//! - Page-level operations: navigate, click, fill, read text, screenshot,
//!   link extraction
//!
//! The sidecar stays alive for the whole flow: the login sequence needs
//! decisions on the Rust side (console OTP entry) between page actions, so a
//! one-shot script per action would lose the page state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

const RESULT_MARKER: &str = "__AUTHFLOW_RESULT__=";
const READY_MARKER: &str = "__AUTHFLOW_READY__";
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 90;
const LAUNCH_TIMEOUT_SECS: u64 = 60;

pub type Result<T> = std::result::Result<T, DriverError>;

/// Driver-level failures, kept distinct from flow validation failures so an
/// operator can tell "wrong page" from "broken connection".
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("browser runtime not ready: {0}")]
    NotReady(String),

    #[error("driver I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("driver protocol error: {0}")]
    Protocol(String),

    #[error("driver call timed out after {0} seconds")]
    Timeout(u64),

    #[error("browser action failed: {0}")]
    Action(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot of the current page as seen by the driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// A link discovered on the page, used by the download phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLink {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub href: String,
}

/// Launch parameters for a driver session.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Persistent browser profile directory (survives across runs).
    pub user_data_dir: PathBuf,
    /// Per-run directory for screenshots and other artifacts.
    pub artifacts_dir: PathBuf,
    pub headless: bool,
    pub sandbox: bool,
    pub call_timeout: Duration,
}

impl LaunchSpec {
    pub fn new(user_data_dir: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_data_dir: user_data_dir.into(),
            artifacts_dir: artifacts_dir.into(),
            headless: false,
            sandbox: false,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeProbe {
    pub node_available: bool,
    pub node_version: Option<String>,
    pub playwright_package_available: bool,
    pub chromium_cache_detected: bool,
    pub ready: bool,
    pub notes: Vec<String>,
}

impl RuntimeProbe {
    fn empty() -> Self {
        Self {
            node_available: false,
            node_version: None,
            playwright_package_available: false,
            chromium_cache_detected: false,
            ready: false,
            notes: Vec::new(),
        }
    }
}

/// Page operations the login flow depends on. The Playwright sidecar is the
/// production implementation; tests substitute scripted stubs.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<PageContent>;
    async fn click(&self, selector: &str, text_match: Option<&str>) -> Result<()>;
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;
    async fn page_content(&self) -> Result<PageContent>;
    async fn screenshot(&self, path: &Path) -> Result<PathBuf>;
    async fn extract_links(&self, selector: &str) -> Result<Vec<PageLink>>;
    async fn close(&self) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct DriverRequest<'a> {
    id: &'a str,
    #[serde(flatten)]
    command: DriverCommand<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum DriverCommand<'a> {
    Navigate {
        url: &'a str,
    },
    Click {
        selector: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        text_match: Option<&'a str>,
    },
    Fill {
        selector: &'a str,
        value: &'a str,
    },
    PageContent,
    Screenshot {
        path: &'a str,
    },
    ExtractLinks {
        selector: &'a str,
    },
    Close,
}

#[derive(Debug, Deserialize)]
struct DriverResponse {
    id: String,
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Long-lived Playwright sidecar speaking line-delimited JSON over
/// stdin/stdout, with responses prefixed by a marker so ordinary Node output
/// never corrupts the protocol.
pub struct PlaywrightDriver {
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<Lines<BufReader<ChildStdout>>>,
    child: Mutex<Child>,
    call_timeout: Duration,
    // Keeps the generated runner script alive for the sidecar's lifetime.
    _runner_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Probe the runtime, spawn the Node sidecar, and wait for the browser
    /// context to come up.
    pub async fn launch(spec: &LaunchSpec) -> Result<Self> {
        let probe = probe_runtime().await?;
        ensure_probe_ready(&probe)?;

        std::fs::create_dir_all(&spec.user_data_dir)?;
        std::fs::create_dir_all(&spec.artifacts_dir)?;

        let runner_dir = tempfile::Builder::new()
            .prefix("authflow-driver-")
            .tempdir()?;
        let runner_path = runner_dir.path().join("runner.mjs");
        std::fs::write(&runner_path, build_runner_script(spec))?;

        let mut child = Command::new("node")
            .arg(&runner_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::Protocol("sidecar stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::Protocol("sidecar stdout unavailable".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let mut lines = BufReader::new(stdout).lines();
        wait_for_ready(&mut lines).await?;

        debug!(
            user_data_dir = %spec.user_data_dir.display(),
            headless = spec.headless,
            "browser sidecar ready"
        );

        Ok(Self {
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(lines),
            child: Mutex::new(child),
            call_timeout: spec.call_timeout,
            _runner_dir: runner_dir,
        })
    }

    async fn call(&self, command: DriverCommand<'_>) -> Result<Value> {
        let id = Uuid::new_v4().to_string();
        let request = DriverRequest { id: &id, command };
        let mut line = serde_json::to_string(&request)?;
        line.push('\n');

        {
            let mut stdin = self.stdin.lock().await;
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await?;
        }

        let timeout_secs = self.call_timeout.as_secs();
        let mut stdout = self.stdout.lock().await;
        let response = timeout(self.call_timeout, read_response(&mut stdout, &id))
            .await
            .map_err(|_| DriverError::Timeout(timeout_secs))??;

        if response.success {
            Ok(response.result.unwrap_or(Value::Null))
        } else {
            Err(DriverError::Action(
                response
                    .error
                    .unwrap_or_else(|| "unknown driver failure".to_string()),
            ))
        }
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightDriver {
    async fn navigate(&self, url: &str) -> Result<PageContent> {
        let value = self.call(DriverCommand::Navigate { url }).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn click(&self, selector: &str, text_match: Option<&str>) -> Result<()> {
        self.call(DriverCommand::Click {
            selector,
            text_match,
        })
        .await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.call(DriverCommand::Fill { selector, value }).await?;
        Ok(())
    }

    async fn page_content(&self) -> Result<PageContent> {
        let value = self.call(DriverCommand::PageContent).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn screenshot(&self, path: &Path) -> Result<PathBuf> {
        let path_str = path.display().to_string();
        let value = self.call(DriverCommand::Screenshot { path: &path_str }).await?;
        let saved = value
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol("screenshot response missing path".to_string()))?;
        Ok(PathBuf::from(saved))
    }

    async fn extract_links(&self, selector: &str) -> Result<Vec<PageLink>> {
        let value = self.call(DriverCommand::ExtractLinks { selector }).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn close(&self) -> Result<()> {
        // Best effort: the sidecar exits on its own after acknowledging.
        if let Err(err) = self.call(DriverCommand::Close).await {
            warn!(error = %err, "close command failed, killing sidecar");
        }

        let mut child = self.child.lock().await;
        match timeout(Duration::from_secs(10), child.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                child.kill().await?;
            }
        }
        Ok(())
    }
}

async fn read_response(
    lines: &mut Lines<BufReader<ChildStdout>>,
    id: &str,
) -> Result<DriverResponse> {
    while let Some(line) = lines.next_line().await? {
        let Some(response) = parse_result_line(&line) else {
            if !line.trim().is_empty() {
                debug!(line = %line, "sidecar output");
            }
            continue;
        };
        if response.id == id {
            return Ok(response);
        }
        warn!(got = %response.id, expected = %id, "dropping stale driver response");
    }
    Err(DriverError::Protocol(
        "driver closed its output stream".to_string(),
    ))
}

async fn wait_for_ready(lines: &mut Lines<BufReader<ChildStdout>>) -> Result<()> {
    let wait = async {
        while let Some(line) = lines.next_line().await? {
            if line.trim() == READY_MARKER {
                return Ok(());
            }
            // Startup failures arrive as a marker line before the process exits.
            if let Some(response) = parse_result_line(&line)
                && !response.success
            {
                return Err(DriverError::NotReady(
                    response
                        .error
                        .unwrap_or_else(|| "browser launch failed".to_string()),
                ));
            }
        }
        Err(DriverError::NotReady(
            "sidecar exited before signalling readiness".to_string(),
        ))
    };

    timeout(Duration::from_secs(LAUNCH_TIMEOUT_SECS), wait)
        .await
        .map_err(|_| DriverError::Timeout(LAUNCH_TIMEOUT_SECS))?
}

async fn forward_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "authflow_browser::sidecar", "{line}");
    }
}

fn parse_result_line(line: &str) -> Option<DriverResponse> {
    let rest = line.strip_prefix(RESULT_MARKER)?;
    serde_json::from_str(rest.trim()).ok()
}

pub async fn probe_runtime() -> Result<RuntimeProbe> {
    let mut probe = RuntimeProbe::empty();

    let node_probe = run_command_capture("node", &["--version".to_string()], 10).await;
    if let Ok(output) = node_probe
        && output.exit_code == 0
    {
        probe.node_available = true;
        probe.node_version = Some(output.stdout.trim().to_string());
    }

    if probe.node_available {
        let playwright_probe = run_command_capture(
            "node",
            &[
                "--input-type=module".to_string(),
                "-e".to_string(),
                "import('playwright').then(() => process.exit(0)).catch(() => process.exit(1));"
                    .to_string(),
            ],
            15,
        )
        .await;
        probe.playwright_package_available = playwright_probe
            .map(|output| output.exit_code == 0)
            .unwrap_or(false);
    }

    probe.chromium_cache_detected = detect_chromium_cache();
    probe.ready = probe.node_available && probe.playwright_package_available;

    if !probe.node_available {
        probe
            .notes
            .push("Node.js not found. Install Node.js 20+ to enable the browser driver.".to_string());
    }

    if probe.node_available && !probe.playwright_package_available {
        probe
            .notes
            .push("Playwright npm package not found. Run: npm i -D playwright".to_string());
    }

    if probe.ready && !probe.chromium_cache_detected {
        probe.notes.push(
            "Chromium binary not found in Playwright cache. Run: npx playwright install chromium"
                .to_string(),
        );
    }

    Ok(probe)
}

pub fn ensure_probe_ready(probe: &RuntimeProbe) -> Result<()> {
    if !probe.node_available {
        return Err(DriverError::NotReady(
            "Node.js is required for browser execution".to_string(),
        ));
    }
    if !probe.playwright_package_available {
        return Err(DriverError::NotReady(
            "Playwright npm package is not available. Install it with: npm i -D playwright"
                .to_string(),
        ));
    }
    Ok(())
}

fn build_runner_script(spec: &LaunchSpec) -> String {
    let spec_literal = json!({
        "userDataDir": spec.user_data_dir.display().to_string(),
        "artifactsDir": spec.artifacts_dir.display().to_string(),
        "headless": spec.headless,
        "sandbox": spec.sandbox,
    })
    .to_string();

    let mut script = String::new();
    script.push_str("import fs from 'node:fs';\n");
    script.push_str("import path from 'node:path';\n");
    script.push_str("import readline from 'node:readline';\n\n");
    script.push_str("const RESULT_MARKER = '__AUTHFLOW_RESULT__=';\n");
    script.push_str(&format!("const spec = {spec_literal};\n"));
    script.push_str("const reply = (id, body) => {\n");
    script.push_str("  process.stdout.write(`${RESULT_MARKER}${JSON.stringify({ id, ...body })}\\n`);\n");
    script.push_str("};\n\n");

    script.push_str("let chromium;\n");
    script.push_str("try {\n");
    script.push_str("  ({ chromium } = await import('playwright'));\n");
    script.push_str("} catch (error) {\n");
    script.push_str("  const message = error && error.stack ? error.stack : String(error);\n");
    script.push_str("  reply('launch', { success: false, error: message });\n");
    script.push_str("  process.exit(1);\n");
    script.push_str("}\n\n");

    script.push_str("await fs.promises.mkdir(spec.userDataDir, { recursive: true });\n");
    script.push_str("await fs.promises.mkdir(spec.artifactsDir, { recursive: true });\n");
    script.push_str("const launchArgs = spec.sandbox ? [] : ['--no-sandbox'];\n");
    script.push_str("let context;\n");
    script.push_str("try {\n");
    script.push_str("  context = await chromium.launchPersistentContext(spec.userDataDir, {\n");
    script.push_str("    headless: spec.headless,\n");
    script.push_str("    args: launchArgs,\n");
    script.push_str("    viewport: null,\n");
    script.push_str("  });\n");
    script.push_str("} catch (error) {\n");
    script.push_str("  const message = error && error.stack ? error.stack : String(error);\n");
    script.push_str("  reply('launch', { success: false, error: message });\n");
    script.push_str("  process.exit(1);\n");
    script.push_str("}\n");
    script.push_str("const page = context.pages()[0] ?? (await context.newPage());\n\n");

    script.push_str("const pageContent = async () => ({\n");
    script.push_str("  url: page.url(),\n");
    script.push_str("  title: await page.title(),\n");
    script.push_str("  text: await page.evaluate(() => document.body ? document.body.innerText : ''),\n");
    script.push_str("});\n\n");

    script.push_str("const locate = (selector, textMatch) => {\n");
    script.push_str("  const options = textMatch ? { hasText: textMatch } : {};\n");
    script.push_str("  return page.locator(selector, options).first();\n");
    script.push_str("};\n\n");

    script.push_str("async function execute(request) {\n");
    script.push_str("  switch (request.cmd) {\n");
    script.push_str("    case 'navigate': {\n");
    script.push_str("      await page.goto(request.url, { waitUntil: 'load' });\n");
    script.push_str("      return await pageContent();\n");
    script.push_str("    }\n");
    script.push_str("    case 'click': {\n");
    script.push_str("      const locator = locate(request.selector, request.text_match);\n");
    script.push_str("      await locator.waitFor({ state: 'visible', timeout: 15000 });\n");
    script.push_str("      await locator.click({ timeout: 15000 });\n");
    script.push_str("      return { clicked: request.selector };\n");
    script.push_str("    }\n");
    script.push_str("    case 'fill': {\n");
    script.push_str("      const locator = locate(request.selector, null);\n");
    script.push_str("      await locator.waitFor({ state: 'visible', timeout: 15000 });\n");
    script.push_str("      await locator.fill(request.value, { timeout: 15000 });\n");
    script.push_str("      return { filled: request.selector };\n");
    script.push_str("    }\n");
    script.push_str("    case 'page_content': {\n");
    script.push_str("      return await pageContent();\n");
    script.push_str("    }\n");
    script.push_str("    case 'screenshot': {\n");
    script.push_str("      const target = path.isAbsolute(request.path) ? request.path : path.join(spec.artifactsDir, request.path);\n");
    script.push_str("      await fs.promises.mkdir(path.dirname(target), { recursive: true });\n");
    script.push_str("      await page.screenshot({ path: target, fullPage: false });\n");
    script.push_str("      return { path: target };\n");
    script.push_str("    }\n");
    script.push_str("    case 'extract_links': {\n");
    script.push_str("      return await page.locator(request.selector).evaluateAll((elements) =>\n");
    script.push_str("        elements.map((el) => ({\n");
    script.push_str("          label: (el.textContent || '').trim(),\n");
    script.push_str("          href: el.href || el.getAttribute('href') || '',\n");
    script.push_str("        }))\n");
    script.push_str("      );\n");
    script.push_str("    }\n");
    script.push_str("    default:\n");
    script.push_str("      throw new Error(`Unsupported command: ${request.cmd}`);\n");
    script.push_str("  }\n");
    script.push_str("}\n\n");

    script.push_str("process.stdout.write('__AUTHFLOW_READY__\\n');\n");
    script.push_str("const rl = readline.createInterface({ input: process.stdin });\n");
    script.push_str("for await (const line of rl) {\n");
    script.push_str("  if (!line.trim()) continue;\n");
    script.push_str("  let request;\n");
    script.push_str("  try {\n");
    script.push_str("    request = JSON.parse(line);\n");
    script.push_str("  } catch (error) {\n");
    script.push_str("    reply('unknown', { success: false, error: `Malformed request: ${error}` });\n");
    script.push_str("    continue;\n");
    script.push_str("  }\n");
    script.push_str("  if (request.cmd === 'close') {\n");
    script.push_str("    reply(request.id, { success: true, result: { closed: true } });\n");
    script.push_str("    await context.close().catch(() => {});\n");
    script.push_str("    process.exit(0);\n");
    script.push_str("  }\n");
    script.push_str("  try {\n");
    script.push_str("    const result = await execute(request);\n");
    script.push_str("    reply(request.id, { success: true, result });\n");
    script.push_str("  } catch (error) {\n");
    script.push_str("    const message = error && error.stack ? error.stack : String(error);\n");
    script.push_str("    reply(request.id, { success: false, error: message });\n");
    script.push_str("  }\n");
    script.push_str("}\n");

    script
}

struct CommandCapture {
    exit_code: i32,
    stdout: String,
}

async fn run_command_capture(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<CommandCapture> {
    let output = match timeout(
        Duration::from_secs(timeout_secs),
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => return Err(DriverError::Timeout(timeout_secs)),
    };

    Ok(CommandCapture {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
    })
}

fn detect_chromium_cache() -> bool {
    if let Ok(path) = std::env::var("PLAYWRIGHT_BROWSERS_PATH") {
        let parsed = PathBuf::from(path);
        if parsed.exists() {
            return true;
        }
    }

    let mut candidates = Vec::new();

    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(&home).join(".cache/ms-playwright"));
        candidates.push(PathBuf::from(&home).join("Library/Caches/ms-playwright"));
    }

    if let Ok(user_profile) = std::env::var("USERPROFILE") {
        candidates.push(PathBuf::from(user_profile).join("AppData/Local/ms-playwright"));
    }

    candidates.into_iter().any(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> LaunchSpec {
        let mut spec = LaunchSpec::new("/tmp/authflow/profile", "/tmp/authflow/artifacts");
        spec.headless = true;
        spec
    }

    #[test]
    fn runner_script_contains_command_cases() {
        let script = build_runner_script(&sample_spec());
        assert!(script.contains("case 'navigate'"));
        assert!(script.contains("case 'click'"));
        assert!(script.contains("case 'fill'"));
        assert!(script.contains("case 'page_content'"));
        assert!(script.contains("case 'screenshot'"));
        assert!(script.contains("case 'extract_links'"));
        assert!(script.contains(RESULT_MARKER));
        assert!(script.contains(READY_MARKER));
    }

    #[test]
    fn runner_script_embeds_launch_spec() {
        let script = build_runner_script(&sample_spec());
        assert!(script.contains("/tmp/authflow/profile"));
        assert!(script.contains("launchPersistentContext"));
        assert!(script.contains("\"headless\":true"));
    }

    #[test]
    fn parse_result_line_accepts_marker_payload() {
        let line = "__AUTHFLOW_RESULT__={\"id\":\"a1\",\"success\":true,\"result\":{\"url\":\"x\"}}";
        let response = parse_result_line(line).unwrap();
        assert_eq!(response.id, "a1");
        assert!(response.success);
        assert_eq!(response.result.unwrap()["url"], "x");
    }

    #[test]
    fn parse_result_line_rejects_plain_output() {
        assert!(parse_result_line("Debugger attached.").is_none());
        assert!(parse_result_line("").is_none());
        assert!(parse_result_line("__AUTHFLOW_RESULT__=not json").is_none());
    }

    #[test]
    fn driver_commands_serialize_with_snake_case_tags() {
        let request = DriverRequest {
            id: "r1",
            command: DriverCommand::Click {
                selector: "button",
                text_match: Some("ENTRAR"),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["cmd"], "click");
        assert_eq!(value["text_match"], "ENTRAR");

        let request = DriverRequest {
            id: "r2",
            command: DriverCommand::PageContent,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["cmd"], "page_content");
    }

    #[test]
    fn probe_readiness_gates_on_node_and_playwright() {
        let mut probe = RuntimeProbe::empty();
        assert!(matches!(
            ensure_probe_ready(&probe),
            Err(DriverError::NotReady(_))
        ));

        probe.node_available = true;
        assert!(matches!(
            ensure_probe_ready(&probe),
            Err(DriverError::NotReady(_))
        ));

        probe.playwright_package_available = true;
        assert!(ensure_probe_ready(&probe).is_ok());
    }

    #[test]
    fn page_content_deserializes_with_missing_fields() {
        let content: PageContent = serde_json::from_str("{\"url\":\"https://e.com\"}").unwrap();
        assert_eq!(content.url, "https://e.com");
        assert!(content.text.is_empty());
    }
}
