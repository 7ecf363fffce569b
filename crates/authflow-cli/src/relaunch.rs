//! Virtual-display supervisor.
//!
//! Background-headed mode runs the browser headed inside an X virtual
//! framebuffer so no window appears on the operator's desktop. The process
//! re-launches itself under `xvfb-run` and marks the child with a sentinel
//! environment variable so the child skips this step and runs the flow.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Command;

use authflow_core::{FlowError, Layers, parse_bool};

/// Set on the re-launched child so it does not relaunch again.
pub const XVFB_SENTINEL: &str = "AUTHFLOW_XVFB_ACTIVE";

const XVFB_SCREEN: &str = "-screen 0 1920x1080x24";

#[derive(Debug, PartialEq, Eq)]
pub enum RelaunchDecision {
    /// Run the flow in this process.
    Continue,
    /// Re-execute under xvfb-run and wait for the child.
    ReExec,
}

pub fn decide(
    background_headed: bool,
    sentinel_active: bool,
    xvfb_available: bool,
) -> Result<RelaunchDecision, FlowError> {
    if !background_headed || sentinel_active {
        return Ok(RelaunchDecision::Continue);
    }
    if !xvfb_available {
        return Err(FlowError::Config(
            "background-visible mode requires xvfb-run on PATH. \
             Install it with: sudo apt-get install -y xvfb"
                .to_string(),
        ));
    }
    Ok(RelaunchDecision::ReExec)
}

/// Run the relaunch check. Returns `Ok(None)` when this process should
/// continue with the flow, or `Ok(Some(code))` with the child's exit status
/// after a re-exec.
pub fn supervise(background_headed_flag: bool, layers: &Layers) -> Result<Option<i32>, FlowError> {
    let background = background_requested(background_headed_flag, layers);
    let sentinel_active = std::env::var(XVFB_SENTINEL).is_ok_and(|v| v == "1");
    let available = std::env::var_os("PATH")
        .and_then(|path| find_in_path("xvfb-run", &path))
        .is_some();

    match decide(background, sentinel_active, available)? {
        RelaunchDecision::Continue => Ok(None),
        RelaunchDecision::ReExec => {
            let exe = std::env::current_exe()?;
            tracing::info!("relaunching under xvfb-run for background-visible mode");
            let status = Command::new("xvfb-run")
                .arg("-a")
                .arg("-s")
                .arg(XVFB_SCREEN)
                .arg(exe)
                .args(std::env::args_os().skip(1))
                .env(XVFB_SENTINEL, "1")
                .status()?;
            Ok(Some(status.code().unwrap_or(1)))
        }
    }
}

/// The layers consult the process environment first, so `BACKGROUND_HEADED`
/// set in the environment, a config file, or the legacy `.env` all count.
fn background_requested(flag: bool, layers: &Layers) -> bool {
    flag || parse_bool(layers.get("BACKGROUND_HEADED").as_deref(), false)
}

pub fn find_in_path(program: &str, path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_mode_never_relaunches() {
        assert_eq!(decide(false, false, false).unwrap(), RelaunchDecision::Continue);
        assert_eq!(decide(false, false, true).unwrap(), RelaunchDecision::Continue);
    }

    #[test]
    fn sentinel_suppresses_second_relaunch() {
        assert_eq!(decide(true, true, true).unwrap(), RelaunchDecision::Continue);
    }

    #[test]
    fn background_mode_relaunches_when_xvfb_present() {
        assert_eq!(decide(true, false, true).unwrap(), RelaunchDecision::ReExec);
    }

    #[test]
    fn missing_xvfb_is_a_config_error() {
        let err = decide(true, false, false).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("xvfb-run"));
    }

    #[test]
    fn background_set_only_in_config_layers_triggers_relaunch() {
        let layers = Layers::from_map(std::collections::BTreeMap::from([(
            "BACKGROUND_HEADED".to_string(),
            "true".to_string(),
        )]));
        assert!(background_requested(false, &layers));
        assert_eq!(
            decide(background_requested(false, &layers), false, true).unwrap(),
            RelaunchDecision::ReExec
        );

        let empty = Layers::from_map(std::collections::BTreeMap::new());
        assert!(!background_requested(false, &empty));
        assert!(background_requested(true, &empty));
    }

    #[test]
    fn find_in_path_locates_executables() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("xvfb-run");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        let path = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_in_path("xvfb-run", &path), Some(tool));
        assert_eq!(find_in_path("no-such-tool", &path), None);
    }
}
