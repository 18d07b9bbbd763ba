use arsenal_core::models::{InstallTarget, ToolRecord};
use arsenal_core::{AppResult, ResultExt};
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How long the trial run may hold the launch before the script is assumed
/// healthy and handed to the real dispatcher.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Pre-flight check run before a Python launch. Returning `Ok(None)` means
/// the script can be spawned directly.
pub trait DependencyProbe: Send + Sync {
    fn check(&self, record: &ToolRecord) -> AppResult<Option<InstallTarget>>;
}

/// Default probe: a sibling `requirements.txt` short-circuits without running
/// anything; otherwise one trial run captures stderr and looks for a
/// `ModuleNotFoundError`.
pub struct StderrProbe;

impl DependencyProbe for StderrProbe {
    fn check(&self, record: &ToolRecord) -> AppResult<Option<InstallTarget>> {
        if let Some(path) = sibling_requirements(&record.path) {
            tracing::info!(
                event = "dependency_requirements_found",
                tool = record.name,
                path = path.clone()
            );
            return Ok(Some(InstallTarget::Requirements { path }));
        }

        let stderr = match trial_run(record)? {
            Some(stderr) => stderr,
            // Still running after the probe window: imports resolved.
            None => return Ok(None),
        };
        Ok(parse_missing_module(&stderr).map(|name| {
            tracing::info!(
                event = "dependency_module_missing",
                tool = record.name,
                module = name.clone()
            );
            InstallTarget::Module { name }
        }))
    }
}

fn sibling_requirements(script_path: &str) -> Option<String> {
    let candidate = Path::new(script_path).parent()?.join("requirements.txt");
    candidate
        .is_file()
        .then(|| candidate.to_string_lossy().to_string())
}

/// Runs the script once with stderr piped. Returns the captured stderr if
/// the process exited within the probe window, `None` if it kept running
/// (the probe child is killed; the real launch follows).
fn trial_run(record: &ToolRecord) -> AppResult<Option<String>> {
    let mut child = Command::new("python")
        .arg(&record.path)
        .args(record.split_args())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_code("dependency_probe_failed", "依赖检查启动失败")
        .with_ctx("path", record.path.clone())?;

    let deadline = Instant::now() + PROBE_TIMEOUT;
    loop {
        match child
            .try_wait()
            .with_code("dependency_probe_failed", "依赖检查失败")?
        {
            Some(_status) => {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                return Ok(Some(stderr));
            }
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            None => thread::sleep(Duration::from_millis(50)),
        }
    }
}

pub(crate) fn parse_missing_module(stderr: &str) -> Option<String> {
    let regex = Regex::new(r"ModuleNotFoundError: No module named '([^']+)'").ok()?;
    regex
        .captures(stderr)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

#[cfg(test)]
#[path = "../tests/launcher/depcheck_tests.rs"]
mod tests;
