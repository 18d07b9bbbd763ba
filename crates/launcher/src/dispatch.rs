use crate::depcheck::DependencyProbe;
use arsenal_core::models::{LaunchOutcome, ToolKind, ToolRecord};
use arsenal_core::{AppError, AppResult, ResultExt};
use std::path::Path;
use std::process::Command;

/// A fully resolved program invocation. Pure data, unit-testable without
/// touching the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Maps a record to the program and arguments that launch it. `Url`,
/// `Folder` and `Placeholder` have no direct command; the dispatcher handles
/// them before any spawn.
pub fn build_command(record: &ToolRecord) -> AppResult<CommandSpec> {
    let extra = record.split_args();
    let spec = match record.kind {
        ToolKind::Java8 | ToolKind::Java11 | ToolKind::Java8Gui | ToolKind::Java11Gui => {
            let mut args = vec!["-jar".to_string(), record.path.clone()];
            args.extend(extra);
            CommandSpec {
                program: "java".to_string(),
                args,
            }
        }
        ToolKind::Python => {
            let mut args = vec![record.path.clone()];
            args.extend(extra);
            CommandSpec {
                program: "python".to_string(),
                args,
            }
        }
        ToolKind::Powershell => {
            let mut args = vec![
                "-ExecutionPolicy".to_string(),
                "Bypass".to_string(),
                "-File".to_string(),
                record.path.clone(),
            ];
            args.extend(extra);
            CommandSpec {
                program: "powershell".to_string(),
                args,
            }
        }
        ToolKind::Batch => batch_command(record),
        ToolKind::Exe => CommandSpec {
            program: record.path.clone(),
            args: extra,
        },
        ToolKind::Url | ToolKind::Folder | ToolKind::Placeholder => {
            return Err(
                AppError::new("kind_not_spawnable", "该类型不通过命令行启动")
                    .with_context("kind", record.kind.as_str()),
            );
        }
    };
    Ok(spec)
}

fn batch_command(record: &ToolRecord) -> CommandSpec {
    if cfg!(windows) {
        let mut args = vec!["/C".to_string(), record.path.clone()];
        args.extend(record.split_args());
        CommandSpec {
            program: "cmd".to_string(),
            args,
        }
    } else {
        let mut line = record.path.clone();
        let extra = record.args.trim();
        if !extra.is_empty() {
            line.push(' ');
            line.push_str(extra);
        }
        CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), line],
        }
    }
}

/// Hands a url or folder off to the desktop environment. A trait so tests
/// can observe the hand-off without launching anything.
pub trait TargetOpener: Send + Sync {
    fn open(&self, target: &str) -> AppResult<()>;
}

/// Shells out to the platform's default handler: `cmd /C start` on Windows,
/// `open` on macOS, `xdg-open` elsewhere.
pub struct SystemOpener;

impl TargetOpener for SystemOpener {
    fn open(&self, target: &str) -> AppResult<()> {
        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", target]);
            command
        } else if cfg!(target_os = "macos") {
            let mut command = Command::new("open");
            command.arg(target);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(target);
            command
        };

        command
            .spawn()
            .with_code("open_handler_failed", "调用系统默认程序失败")
            .with_ctx("target", target)
            .map(|_child| ())
    }
}

/// Launches one record. `probe` is consulted only for Python tools and only
/// when `dependency_check` is set; after a successful install the caller
/// re-dispatches with the check disabled. `opener` handles the kinds that go
/// to the desktop environment instead of a spawned process.
pub fn dispatch(
    record: &ToolRecord,
    dependency_check: bool,
    probe: &dyn DependencyProbe,
    opener: &dyn TargetOpener,
) -> AppResult<LaunchOutcome> {
    match record.kind {
        ToolKind::Placeholder => {
            Err(AppError::new("placeholder_not_launchable", "占位工具无法启动")
                .with_context("tool", record.name.clone()))
        }
        ToolKind::Url => {
            opener.open(&record.path)?;
            tracing::info!(event = "url_opened", tool = record.name, url = record.path);
            Ok(LaunchOutcome::Opened)
        }
        ToolKind::Folder => {
            if !Path::new(&record.path).is_dir() {
                return Err(AppError::new("folder_not_found", "文件夹不存在")
                    .with_context("path", record.path.clone()));
            }
            opener.open(&record.path)?;
            tracing::info!(event = "folder_opened", tool = record.name, path = record.path);
            Ok(LaunchOutcome::Opened)
        }
        ToolKind::Python if dependency_check => {
            if let Some(target) = probe.check(record)? {
                return Ok(LaunchOutcome::InstallRequired { target });
            }
            spawn_command(record)
        }
        _ => spawn_command(record),
    }
}

fn spawn_command(record: &ToolRecord) -> AppResult<LaunchOutcome> {
    let spec = build_command(record)?;
    let mut command = Command::new(&spec.program);
    command.args(&spec.args);
    if let Some(parent) = Path::new(&record.path).parent() {
        if parent.is_dir() {
            command.current_dir(parent);
        }
    }

    let child = command
        .spawn()
        .with_code("launch_spawn_failed", "启动工具失败")
        .with_ctx("tool", record.name.clone())
        .with_ctx("program", spec.program.clone())?;
    let pid = child.id();
    tracing::info!(
        event = "tool_launched",
        tool = record.name,
        program = spec.program,
        pid
    );
    Ok(LaunchOutcome::Spawned { pid })
}

#[cfg(test)]
#[path = "../tests/launcher/dispatch_tests.rs"]
mod tests;
