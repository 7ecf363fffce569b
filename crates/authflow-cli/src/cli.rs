use clap::Parser;
use std::path::PathBuf;

/// Automated multi-step web login with an email OTP hand-off.
///
/// Running two instances against the same browser profile is unsupported;
/// keep one flow per profile directory.
#[derive(Parser, Debug)]
#[command(name = "authflow")]
#[command(version, about = "Automated web login flow with email OTP hand-off")]
pub struct Cli {
    /// Force headless execution (background, nothing rendered)
    #[arg(long, conflicts_with_all = ["headed", "background_headed"])]
    pub headless: bool,

    /// Force headed execution with a visible browser window
    #[arg(long, conflicts_with = "background_headed")]
    pub headed: bool,

    /// Run headed inside a virtual display (better anti-captcha behavior
    /// than headless, without a visible window)
    #[arg(long)]
    pub background_headed: bool,

    /// Resume the persisted session instead of logging in again
    #[arg(long)]
    pub resume: bool,

    /// Close the browser when the flow finishes
    #[arg(long)]
    pub no_keep_open: bool,

    /// Fetch the available documents after authentication
    #[arg(long)]
    pub download: bool,

    /// Directory holding the split configuration files
    #[arg(long, value_name = "DIR", env = "AUTHFLOW_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Extra configuration files, applied after the split files
    #[arg(long = "config", value_name = "FILE")]
    pub config_files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_flags_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["authflow", "--headless", "--headed"]).is_err());
        assert!(Cli::try_parse_from(["authflow", "--headed", "--background-headed"]).is_err());
        assert!(Cli::try_parse_from(["authflow", "--background-headed"]).is_ok());
    }
}
