//! Layered configuration.
//!
//! Parameters are merged from ordered sources and resolved exactly once into
//! an immutable [`Config`]. Precedence, highest first:
//!
//! 1. process environment variables
//! 2. explicit override files (`--config`, in the order given)
//! 3. split TOML files in the config directory
//!    (`runtime.toml`, `credentials.toml`, `selectors.toml`, `validation.toml`)
//! 4. legacy single `.env` file (dotenv format)

use crate::error::{FlowError, Result};
use crate::flow::FlowState;
use crate::validate::ValidationRule;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Split configuration files looked up in the config directory, grouped by
/// concern. Missing files are skipped; the legacy `.env` covers old setups.
pub const SPLIT_FILES: &[&str] = &[
    "runtime.toml",
    "credentials.toml",
    "selectors.toml",
    "validation.toml",
];

/// How the browser runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Headed with a visible window.
    Visible,
    /// Headless, no rendering at all.
    BackgroundSilent,
    /// Headed, but rendered into a virtual display (xvfb).
    BackgroundVisible,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecMode::Visible => "visible",
            ExecMode::BackgroundSilent => "background-silent",
            ExecMode::BackgroundVisible => "background-visible",
        };
        f.write_str(name)
    }
}

/// Command-line overrides that outrank every file source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `Some(true)` for `--headless`, `Some(false)` for `--headed`.
    pub headless: Option<bool>,
    pub background_headed: bool,
    pub no_keep_open: bool,
}

/// The merged key/value sources, before typing. Process environment is
/// consulted at lookup time so it always wins.
pub struct Layers {
    values: BTreeMap<String, String>,
    consult_env: bool,
}

impl Layers {
    pub fn load(
        config_dir: Option<&Path>,
        override_files: &[PathBuf],
        legacy_env: &Path,
    ) -> Result<Self> {
        let mut values = load_dotenv_file(legacy_env);

        if let Some(dir) = resolve_config_dir(config_dir) {
            for name in SPLIT_FILES {
                let path = dir.join(name);
                if !path.exists() {
                    continue;
                }
                merge_toml_file(&mut values, &path)?;
            }
        }

        for path in override_files {
            if !path.exists() {
                return Err(FlowError::Config(format!(
                    "override config file not found: {}",
                    path.display()
                )));
            }
            merge_toml_file(&mut values, path)?;
        }

        Ok(Self {
            values,
            consult_env: true,
        })
    }

    /// Build layers from an in-memory map, without consulting the process
    /// environment. Intended for tests.
    pub fn from_map(values: BTreeMap<String, String>) -> Self {
        Self {
            values,
            consult_env: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.consult_env
            && let Ok(value) = std::env::var(key)
        {
            return Some(value);
        }
        self.values.get(key).cloned()
    }
}

/// Immutable for the lifetime of one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub login_url: String,
    pub cpf: String,
    pub senha: String,

    pub redirect_validation_text: String,
    pub post_login_validation_text: String,
    pub receive_code_validation_text: String,
    pub step5_validation_text: String,
    pub otp_rejection_text: String,

    pub cpf_selector: String,
    pub senha_selector: String,
    pub entrar_selector: String,
    pub entrar_text: String,
    pub receive_code_selector: String,
    pub receive_code_text: String,
    pub otp_input_selector: String,
    pub authenticate_selector: String,
    pub authenticate_text: String,
    pub download_link_selector: String,
    pub download_filter_selector: String,
    pub download_filter_text: String,

    pub download_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub user_data_dir: PathBuf,

    pub persist_session: bool,
    pub headless: bool,
    pub background_headed: bool,
    pub sandbox: bool,
    pub keep_browser_open: bool,
    pub max_otp_attempts: u32,

    pub redirect_timeout: Duration,
    pub post_login_timeout: Duration,
    pub receive_code_timeout: Duration,
    pub post_auth_timeout: Duration,
    pub otp_rejection_timeout: Duration,
    pub poll_interval: Duration,
    pub settle: Duration,
}

impl Config {
    pub fn build(layers: &Layers, cli: &CliOverrides) -> Result<Self> {
        let login_url = non_empty(layers.get("LOGIN_URL"));
        let cpf = non_empty(layers.get("CPF"));
        let senha = non_empty(layers.get("SENHA"));

        let missing: Vec<&str> = [
            ("LOGIN_URL", &login_url),
            ("CPF", &cpf),
            ("SENHA", &senha),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            return Err(FlowError::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let background_headed =
            parse_bool(layers.get("BACKGROUND_HEADED").as_deref(), false) || cli.background_headed;
        let mut headless = match cli.headless {
            Some(forced) => forced,
            None => parse_bool(layers.get("HEADLESS").as_deref(), false),
        };
        // Background-visible always renders headed; the virtual display is
        // what keeps it off screen.
        if background_headed {
            headless = false;
        }

        let keep_browser_open =
            parse_bool(layers.get("KEEP_BROWSER_OPEN").as_deref(), true) && !cli.no_keep_open;

        // STEP5_VALIDATION_TEXT wins over the older POST_AUTH_VALIDATION_TEXT.
        let step5_validation_text = non_empty(layers.get("STEP5_VALIDATION_TEXT"))
            .or_else(|| non_empty(layers.get("POST_AUTH_VALIDATION_TEXT")))
            .unwrap_or_default();

        Ok(Self {
            login_url: login_url.unwrap_or_default(),
            cpf: cpf.unwrap_or_default(),
            senha: senha.unwrap_or_default(),

            redirect_validation_text: trimmed(layers, "REDIRECT_VALIDATION_TEXT"),
            post_login_validation_text: trimmed(layers, "POST_LOGIN_VALIDATION_TEXT"),
            receive_code_validation_text: trimmed(layers, "RECEIVE_CODE_VALIDATION_TEXT"),
            step5_validation_text: step5_validation_text.trim().to_string(),
            otp_rejection_text: trimmed(layers, "OTP_REJECTION_TEXT"),

            cpf_selector: get_or(
                layers,
                "CPF_SELECTOR",
                r#"input[name="cpf"], input[id*="cpf" i], input[placeholder*="CPF" i]"#,
            ),
            senha_selector: get_or(
                layers,
                "SENHA_SELECTOR",
                r#"input[type="password"], input[name*="senha" i], input[id*="senha" i]"#,
            ),
            entrar_selector: get_or(
                layers,
                "ENTRAR_BUTTON_SELECTOR",
                r#"button, input[type="submit"], a"#,
            ),
            entrar_text: get_or(layers, "ENTRAR_BUTTON_TEXT", "ENTRAR"),
            receive_code_selector: get_or(
                layers,
                "RECEIVE_CODE_BUTTON_SELECTOR",
                r#"button, input[type="button"], input[type="submit"], a"#,
            ),
            receive_code_text: get_or(
                layers,
                "RECEIVE_CODE_BUTTON_TEXT",
                "Receber código por EMAIL",
            ),
            otp_input_selector: get_or(
                layers,
                "OTP_INPUT_SELECTOR",
                r#"input[placeholder*="Digite o código" i], input[name*="codigo" i], input[id*="codigo" i], input[type="text"]"#,
            ),
            authenticate_selector: get_or(
                layers,
                "AUTHENTICATE_BUTTON_SELECTOR",
                r#"button, input[type="button"], input[type="submit"], a"#,
            ),
            authenticate_text: get_or(layers, "AUTHENTICATE_BUTTON_TEXT", "AUTENTICAR"),
            download_link_selector: get_or(layers, "DOWNLOAD_LINK_SELECTOR", "a[download], a[href]"),
            download_filter_selector: trimmed(layers, "DOWNLOAD_FILTER_SELECTOR"),
            download_filter_text: trimmed(layers, "DOWNLOAD_FILTER_TEXT"),

            download_dir: PathBuf::from(get_or(layers, "DOWNLOAD_DIR", "downloads")),
            artifacts_dir: PathBuf::from(get_or(layers, "ARTIFACTS_DIR", "artifacts")),
            user_data_dir: PathBuf::from(get_or(layers, "USER_DATA_DIR", ".browser-profile")),

            persist_session: parse_bool(layers.get("PERSIST_SESSION").as_deref(), true),
            headless,
            background_headed,
            sandbox: parse_bool(layers.get("BROWSER_SANDBOX").as_deref(), false),
            keep_browser_open,
            max_otp_attempts: parse_u64(layers, "MAX_OTP_ATTEMPTS", 3)? as u32,

            redirect_timeout: secs(layers, "REDIRECT_TIMEOUT_SECONDS", 60)?,
            post_login_timeout: secs(layers, "POST_LOGIN_TIMEOUT_SECONDS", 60)?,
            receive_code_timeout: secs(layers, "RECEIVE_CODE_TIMEOUT_SECONDS", 60)?,
            post_auth_timeout: secs(layers, "POST_AUTH_TIMEOUT_SECONDS", 60)?,
            otp_rejection_timeout: secs(layers, "OTP_REJECTION_TIMEOUT_SECONDS", 3)?,
            poll_interval: secs_f64(layers, "POLL_INTERVAL_SECONDS", 1.0)?,
            settle: secs(layers, "SETTLE_SECONDS", 5)?,
        })
    }

    pub fn exec_mode(&self) -> ExecMode {
        if self.background_headed {
            ExecMode::BackgroundVisible
        } else if self.headless {
            ExecMode::BackgroundSilent
        } else {
            ExecMode::Visible
        }
    }

    /// The validation gate configured for a flow state, if any. An absent
    /// rule means "don't gate on this step".
    pub fn validation_rule(&self, state: FlowState) -> Option<ValidationRule> {
        let (text, timeout) = match state {
            FlowState::RedirectValidate => (&self.redirect_validation_text, self.redirect_timeout),
            FlowState::PostLoginValidate => {
                (&self.post_login_validation_text, self.post_login_timeout)
            }
            FlowState::RequestEmailCode => {
                (&self.receive_code_validation_text, self.receive_code_timeout)
            }
            FlowState::Step5Validate => (&self.step5_validation_text, self.post_auth_timeout),
            _ => return None,
        };

        if text.is_empty() {
            None
        } else {
            Some(ValidationRule::new(text.clone(), timeout))
        }
    }
}

/// Truthy strings, matching the legacy format: 1/true/yes/on/y.
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(raw) => matches!(
            raw.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "y"
        ),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn get_or(layers: &Layers, key: &str, default: &str) -> String {
    non_empty(layers.get(key)).unwrap_or_else(|| default.to_string())
}

fn trimmed(layers: &Layers, key: &str) -> String {
    layers.get(key).unwrap_or_default().trim().to_string()
}

fn parse_u64(layers: &Layers, key: &str, default: u64) -> Result<u64> {
    match non_empty(layers.get(key)) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| FlowError::Config(format!("invalid integer for {key}: '{raw}'"))),
    }
}

fn secs(layers: &Layers, key: &str, default: u64) -> Result<Duration> {
    Ok(Duration::from_secs(parse_u64(layers, key, default)?))
}

fn secs_f64(layers: &Layers, key: &str, default: f64) -> Result<Duration> {
    let value = match non_empty(layers.get(key)) {
        None => default,
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| FlowError::Config(format!("invalid number for {key}: '{raw}'")))?,
    };
    if !value.is_finite() || value < 0.0 {
        return Err(FlowError::Config(format!(
            "invalid number for {key}: '{value}'"
        )));
    }
    Ok(Duration::from_secs_f64(value))
}

/// Parse a dotenv-format file: KEY=VALUE lines, `#` comments, matching
/// single or double quotes stripped. A missing file yields an empty map.
fn load_dotenv_file(path: &Path) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    let Ok(content) = std::fs::read_to_string(path) else {
        return values;
    };

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim().to_string();
        let mut value = value.trim();
        if value.len() >= 2 {
            let bytes = value.as_bytes();
            if bytes[0] == bytes[value.len() - 1] && (bytes[0] == b'"' || bytes[0] == b'\'') {
                value = &value[1..value.len() - 1];
            }
        }

        values.insert(key, value.to_string());
    }

    values
}

fn merge_toml_file(values: &mut BTreeMap<String, String>, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        FlowError::Config(format!("failed to read {}: {err}", path.display()))
    })?;
    let table: toml::Table = toml::from_str(&content).map_err(|err| {
        FlowError::Config(format!("failed to parse {}: {err}", path.display()))
    })?;

    for (key, value) in table {
        let rendered = match value {
            toml::Value::String(s) => s,
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            other => {
                warn!(
                    file = %path.display(),
                    key,
                    "skipping unsupported config value type: {}",
                    other.type_str()
                );
                continue;
            }
        };
        values.insert(key, rendered);
    }

    debug!(file = %path.display(), "merged config file");
    Ok(())
}

/// Explicit dir wins; otherwise `./config` when present, then the per-user
/// config directory.
fn resolve_config_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }

    let local = PathBuf::from("config");
    if local.is_dir() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("authflow"))
        .filter(|dir| dir.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base_map() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("LOGIN_URL".to_string(), "https://portal.example/login".to_string()),
            ("CPF".to_string(), "00000000000".to_string()),
            ("SENHA".to_string(), "secret".to_string()),
        ])
    }

    #[test]
    fn missing_required_keys_are_all_reported() {
        let layers = Layers::from_map(BTreeMap::new());
        let err = Config::build(&layers, &CliOverrides::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("LOGIN_URL"));
        assert!(message.contains("CPF"));
        assert!(message.contains("SENHA"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn defaults_match_the_legacy_setup() {
        let layers = Layers::from_map(base_map());
        let config = Config::build(&layers, &CliOverrides::default()).unwrap();

        assert_eq!(config.entrar_text, "ENTRAR");
        assert_eq!(config.authenticate_text, "AUTENTICAR");
        assert_eq!(config.receive_code_text, "Receber código por EMAIL");
        assert!(!config.headless);
        assert!(config.keep_browser_open);
        assert!(config.persist_session);
        assert_eq!(config.max_otp_attempts, 3);
        assert_eq!(config.redirect_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs_f64(1.0));
        assert_eq!(config.exec_mode(), ExecMode::Visible);
    }

    #[test]
    fn step5_text_wins_over_post_auth_alias() {
        let mut map = base_map();
        map.insert("POST_AUTH_VALIDATION_TEXT".to_string(), "velho".to_string());
        map.insert("STEP5_VALIDATION_TEXT".to_string(), "novo".to_string());
        let config = Config::build(&Layers::from_map(map), &CliOverrides::default()).unwrap();
        assert_eq!(config.step5_validation_text, "novo");

        let mut map = base_map();
        map.insert("POST_AUTH_VALIDATION_TEXT".to_string(), "velho".to_string());
        let config = Config::build(&Layers::from_map(map), &CliOverrides::default()).unwrap();
        assert_eq!(config.step5_validation_text, "velho");
    }

    #[test]
    fn background_headed_forces_headed_mode() {
        let mut map = base_map();
        map.insert("HEADLESS".to_string(), "true".to_string());
        map.insert("BACKGROUND_HEADED".to_string(), "1".to_string());
        let config = Config::build(&Layers::from_map(map), &CliOverrides::default()).unwrap();
        assert!(!config.headless);
        assert_eq!(config.exec_mode(), ExecMode::BackgroundVisible);
    }

    #[test]
    fn cli_overrides_outrank_file_values() {
        let mut map = base_map();
        map.insert("KEEP_BROWSER_OPEN".to_string(), "true".to_string());
        let cli = CliOverrides {
            headless: Some(true),
            background_headed: false,
            no_keep_open: true,
        };
        let config = Config::build(&Layers::from_map(map), &cli).unwrap();
        assert!(config.headless);
        assert!(!config.keep_browser_open);
        assert_eq!(config.exec_mode(), ExecMode::BackgroundSilent);
    }

    #[test]
    fn truthy_parsing_matches_the_legacy_set() {
        for value in ["1", "true", "YES", " on ", "y"] {
            assert!(parse_bool(Some(value), false), "{value} should be truthy");
        }
        for value in ["0", "false", "nope", ""] {
            assert!(!parse_bool(Some(value), true), "{value} should be falsy");
        }
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
    }

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# comment\nLOGIN_URL=\"https://a\"\nSENHA='s3cr3t'\nBAD LINE\nCPF = 123 \n",
        )
        .unwrap();

        let values = load_dotenv_file(&path);
        assert_eq!(values["LOGIN_URL"], "https://a");
        assert_eq!(values["SENHA"], "s3cr3t");
        assert_eq!(values["CPF"], "123");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn override_files_beat_split_files_beat_legacy() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join(".env");
        std::fs::write(&legacy, "LOGIN_URL=legacy\nCPF=legacy-cpf\nSENHA=x\n").unwrap();

        let config_dir = dir.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("credentials.toml"),
            "LOGIN_URL = \"split\"\nCPF = \"split-cpf\"\n",
        )
        .unwrap();

        let override_file = dir.path().join("extra.toml");
        std::fs::write(&override_file, "LOGIN_URL = \"override\"\n").unwrap();

        let layers = Layers::load(
            Some(&config_dir),
            std::slice::from_ref(&override_file),
            &legacy,
        )
        .unwrap();
        assert_eq!(layers.get("LOGIN_URL").unwrap(), "override");
        assert_eq!(layers.get("CPF").unwrap(), "split-cpf");
        assert_eq!(layers.get("SENHA").unwrap(), "x");
    }

    #[test]
    fn named_override_file_must_exist() {
        let dir = tempdir().unwrap();
        let result = Layers::load(
            None,
            &[dir.path().join("missing.toml")],
            &dir.path().join(".env"),
        );
        assert!(matches!(result, Err(FlowError::Config(_))));
    }

    #[test]
    fn process_env_wins_over_every_file() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join(".env");
        std::fs::write(&legacy, "AUTHFLOW_TEST_PRECEDENCE=file\n").unwrap();

        // SAFETY: test-local variable name, set before any lookup.
        unsafe {
            std::env::set_var("AUTHFLOW_TEST_PRECEDENCE", "env");
        }
        let layers = Layers::load(None, &[], &legacy).unwrap();
        assert_eq!(layers.get("AUTHFLOW_TEST_PRECEDENCE").unwrap(), "env");
        unsafe {
            std::env::remove_var("AUTHFLOW_TEST_PRECEDENCE");
        }
    }

    #[test]
    fn invalid_numbers_are_configuration_errors() {
        let mut map = base_map();
        map.insert("MAX_OTP_ATTEMPTS".to_string(), "many".to_string());
        let err = Config::build(&Layers::from_map(map), &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("MAX_OTP_ATTEMPTS"));
    }
}
