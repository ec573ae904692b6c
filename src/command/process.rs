// Process runner module
// Runs the configured program through tokio::process

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use super::tracker::{ExecGuard, ExecTracker};
use super::{CommandRunner, Input};
use crate::config::ExecConfig;
use crate::error::CommandError;
use crate::logger;

/// Runs one configured program; arguments and stdin come per call
pub struct ProcessRunner {
    command: String,
    directory: Option<PathBuf>,
    env: HashMap<String, String>,
    timeout: Option<Duration>,
    foreground: bool,
    tracker: Arc<ExecTracker>,
}

impl ProcessRunner {
    pub fn from_config(exec: &ExecConfig, tracker: Arc<ExecTracker>) -> Self {
        Self {
            command: exec.command.clone(),
            directory: exec.directory.as_ref().map(PathBuf::from),
            env: exec.env.clone(),
            timeout: (exec.timeout_ms > 0).then(|| Duration::from_millis(exec.timeout_ms)),
            foreground: exec.foreground,
            tracker,
        }
    }

    fn spawn(&self, argv: &[String], piped_stdin: bool) -> Result<Child, CommandError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(argv)
            .envs(&self.env)
            .stdin(if piped_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.directory {
            cmd.current_dir(dir);
        }

        cmd.spawn().map_err(|e| CommandError::spawn(&self.command, e))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String], input: Option<Input>) -> Result<(), CommandError> {
        let guard = self.tracker.enter();
        let mut child = self.spawn(argv, input.is_some())?;
        logger::log_command_started(&self.command, argv, child.id());

        let feeder = match (input, child.stdin.take()) {
            (Some(input), Some(stdin)) => Some(tokio::spawn(feed_stdin(input, stdin))),
            _ => None,
        };

        let execution = Execution {
            command: self.command.clone(),
            child,
            feeder,
            timeout: self.timeout,
            _guard: guard,
        };

        if self.foreground {
            return execution.wait().await;
        }

        tokio::spawn(async move {
            let command = execution.command.clone();
            if let Err(err) = execution.wait().await {
                logger::log_command_failed(&command, &err);
            }
        });
        Ok(())
    }
}

/// A started process together with its tracker slot
struct Execution {
    command: String,
    child: Child,
    feeder: Option<JoinHandle<std::io::Result<()>>>,
    timeout: Option<Duration>,
    _guard: ExecGuard,
}

impl Execution {
    async fn wait(self) -> Result<(), CommandError> {
        let Self {
            command,
            child,
            feeder,
            timeout,
            _guard,
        } = self;

        // Dropping the child on timeout kills it (kill_on_drop)
        let output = match timeout {
            Some(limit) => {
                if let Ok(result) = tokio::time::timeout(limit, child.wait_with_output()).await {
                    result
                } else {
                    if let Some(feeder) = feeder {
                        feeder.abort();
                    }
                    return Err(CommandError::Timeout(limit));
                }
            }
            None => child.wait_with_output().await,
        }
        .map_err(CommandError::Wait)?;

        if let Some(feeder) = feeder {
            if let Ok(Err(err)) = feeder.await {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    logger::log_warning(&format!("{command}: writing stdin: {err}"));
                }
            }
        }

        logger::log_command_output(&command, "stdout", &output.stdout);
        logger::log_command_output(&command, "stderr", &output.stderr);

        exit_result(output.status)
    }
}

async fn feed_stdin(mut input: Input, mut stdin: ChildStdin) -> std::io::Result<()> {
    tokio::io::copy(&mut input, &mut stdin).await?;
    stdin.shutdown().await
}

fn exit_result(status: ExitStatus) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(CommandError::Exit(code)),
        None => Err(CommandError::Signal),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::command::input_from_string;

    fn shell(script: &str) -> (ExecConfig, Vec<String>) {
        let exec = ExecConfig {
            command: "sh".to_string(),
            args: Vec::new(),
            directory: None,
            env: HashMap::new(),
            timeout_ms: 5_000,
            foreground: true,
            pass_thru: false,
        };
        (exec, vec!["-c".to_string(), script.to_string()])
    }

    fn runner(exec: &ExecConfig) -> (ProcessRunner, Arc<ExecTracker>) {
        let tracker = Arc::new(ExecTracker::new());
        (ProcessRunner::from_config(exec, Arc::clone(&tracker)), tracker)
    }

    #[tokio::test]
    async fn test_success() {
        let (exec, argv) = shell("exit 0");
        let (runner, tracker) = runner(&exec);
        assert!(runner.run(&argv, None).await.is_ok());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_exit_code_reported() {
        let (exec, argv) = shell("exit 3");
        let (runner, _) = runner(&exec);
        let err = runner.run(&argv, None).await.unwrap_err();
        assert!(matches!(err, CommandError::Exit(3)));
        assert_eq!(err.to_string(), "exit code 3");
    }

    #[tokio::test]
    async fn test_arguments_passed_in_order() {
        let (exec, mut argv) = shell(r#"test "$1" = say && test "$2" = bob"#);
        argv.extend(["sh", "say", "bob"].map(String::from));
        let (runner, _) = runner(&exec);
        assert!(runner.run(&argv, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_stdin_fed_from_input() {
        let (exec, argv) = shell(r#"test "$(cat)" = hello"#);
        let (runner, _) = runner(&exec);
        let input = input_from_string("hello".to_string());
        assert!(runner.run(&argv, Some(input)).await.is_ok());
        assert!(runner.run(&argv, None).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_input_is_still_a_pipe() {
        let (exec, argv) = shell("[ -p /dev/stdin ]");
        let (runner, _) = runner(&exec);
        let empty = input_from_string(String::new());
        assert!(runner.run(&argv, Some(empty)).await.is_ok());
        assert!(runner.run(&argv, None).await.is_err());
    }

    #[tokio::test]
    async fn test_directory_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().canonicalize().unwrap();
        let (mut exec, mut argv) = shell(r#"test "$(pwd -P)" = "$1" && test "$GREETING" = hi"#);
        exec.directory = Some(dir.path().to_string_lossy().into_owned());
        exec.env.insert("GREETING".to_string(), "hi".to_string());
        argv.push("sh".to_string());
        argv.push(expected.to_string_lossy().into_owned());

        let (runner, _) = runner(&exec);
        assert!(runner.run(&argv, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let (mut exec, _) = shell("");
        exec.command = "/nonexistent/http-exec-missing".to_string();
        let (runner, tracker) = runner(&exec);
        let err = runner.run(&[], None).await.unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let (mut exec, argv) = shell("sleep 5");
        exec.timeout_ms = 50;
        let (runner, tracker) = runner(&exec);
        let err = runner.run(&argv, None).await.unwrap_err();
        assert!(matches!(err, CommandError::Timeout(_)));
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_background_returns_after_start() {
        let (mut exec, argv) = shell("sleep 0.1; exit 1");
        exec.foreground = false;
        let (runner, tracker) = runner(&exec);

        assert!(runner.run(&argv, None).await.is_ok());
        assert_eq!(tracker.in_flight(), 1);
        assert!(tracker.wait_idle(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_abandoned_execution_releases_slot() {
        let (mut exec, argv) = shell("sleep 5");
        exec.timeout_ms = 0;
        let (runner, tracker) = runner(&exec);
        let runner = Arc::new(runner);

        let task = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run(&argv, None).await }
        });

        for _ in 0..100 {
            if tracker.in_flight() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(tracker.in_flight(), 1);
        assert!(!tracker.wait_idle(Duration::from_millis(20)).await);

        task.abort();
        assert!(tracker.wait_idle(Duration::from_secs(5)).await);
    }
}
