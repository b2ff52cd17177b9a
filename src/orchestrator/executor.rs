//! Process execution: spawning, output streaming, outcome classification.
//!
//! Both pipes of the child are serviced from one `tokio::select!` loop, so a
//! process that floods stderr while we wait on stdout (or the reverse) can
//! never stall on a full kernel pipe buffer. Every line is echoed to the
//! operator as soon as it arrives and appended to the captured text.

use crate::log_collector::LogCollector;
use crate::models::{CommandRequest, CommandResult, EXIT_FAILURE};
use colored::Colorize;
use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Anything able to run a command to completion.
///
/// Workflows depend on this seam rather than on `ProcessExecutor` directly so
/// tests can script toolchain behavior.
pub trait CommandRunner {
    fn run(&self, request: &CommandRequest) -> CommandResult;
}

/// Blocking front-end over [`run_command`].
///
/// Owns a current-thread tokio runtime used only for the duration of each
/// call; step code stays synchronous. Must not be called from inside another
/// tokio runtime.
pub struct ProcessExecutor {
    runtime: tokio::runtime::Runtime,
    echo: bool,
    log_collector: Option<Arc<LogCollector>>,
}

impl ProcessExecutor {
    pub fn new(log_collector: Option<Arc<LogCollector>>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(ProcessExecutor {
            runtime,
            echo: true,
            log_collector,
        })
    }

    /// Enable or disable the real-time console echo.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn execute(&self, request: &CommandRequest) -> CommandResult {
        self.runtime
            .block_on(run_command(request, self.echo, self.log_collector.as_deref()))
    }
}

impl CommandRunner for ProcessExecutor {
    fn run(&self, request: &CommandRequest) -> CommandResult {
        self.execute(request)
    }
}

/// Execute one external command and wait for it to finish.
///
/// The command is launched from its argument vector, never through a shell.
/// Returns only after the process has exited and both pipes reached EOF.
/// An executable that cannot be spawned yields the synthetic not-found
/// result without any process being created.
///
/// # Example
/// ```no_run
/// use petalinux_tales::models::CommandRequest;
/// use petalinux_tales::orchestrator::executor::run_command;
///
/// # async fn example() {
/// let request = CommandRequest::new(["petalinux-build"]).current_dir("/work/proj");
/// let result = run_command(&request, true, None).await;
/// println!("exit code {}", result.exit_code);
/// # }
/// ```
pub async fn run_command(
    request: &CommandRequest,
    echo: bool,
    log_collector: Option<&LogCollector>,
) -> CommandResult {
    let command_line = request.display_line();
    log::info!("Executing: \"{}\"", command_line);

    let Some((program, args)) = request.argv.split_first() else {
        log::error!("Refusing to execute an empty command");
        return CommandResult::not_found();
    };

    let mut command = Command::new(program);
    command.args(args);
    if let Some(ref dir) = request.current_dir {
        command.current_dir(dir);
    }
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    // The operator's terminal stays attached unless the caller scripts the answers.
    if request.stdin_input.is_some() {
        command.stdin(Stdio::piped());
    } else {
        command.stdin(Stdio::inherit());
    }
    command.kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            log::error!("Command \"{}\" not found: {}", command_line, e);
            return CommandResult::not_found();
        }
    };

    if let (Some(input), Some(mut stdin)) = (request.stdin_input.clone(), child.stdin.take()) {
        // Written from its own task so a child that never reads stdin cannot
        // block the drain loop. Dropping the handle closes the pipe.
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                log::warn!("Failed to feed stdin: {}", e);
            }
        });
    }

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        log::error!("Failed to capture output pipes of \"{}\"", command_line);
        let _ = child.kill().await;
        return CommandResult::completed(String::new(), String::new(), EXIT_FAILURE);
    };

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut captured_stdout = String::new();
    let mut captured_stderr = String::new();
    let mut stdout_closed = false;
    let mut stderr_closed = false;

    // read_until is cancel safe: bytes of a line interrupted by the other
    // branch stay in the buffer and the next call continues the same line.
    while !(stdout_closed && stderr_closed) {
        tokio::select! {
            read = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_closed => {
                match read {
                    Ok(0) => {
                        flush_line(&mut stdout_buf, &mut captured_stdout, echo, Stream::Stdout);
                        stdout_closed = true;
                    }
                    Ok(_) => flush_line(&mut stdout_buf, &mut captured_stdout, echo, Stream::Stdout),
                    Err(e) => {
                        log::warn!("stdout read error: {}", e);
                        flush_line(&mut stdout_buf, &mut captured_stdout, echo, Stream::Stdout);
                        stdout_closed = true;
                    }
                }
            }
            read = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_closed => {
                match read {
                    Ok(0) => {
                        flush_line(&mut stderr_buf, &mut captured_stderr, echo, Stream::Stderr);
                        stderr_closed = true;
                    }
                    Ok(_) => flush_line(&mut stderr_buf, &mut captured_stderr, echo, Stream::Stderr),
                    Err(e) => {
                        log::warn!("stderr read error: {}", e);
                        flush_line(&mut stderr_buf, &mut captured_stderr, echo, Stream::Stderr);
                        stderr_closed = true;
                    }
                }
            }
        }
    }

    let exit_code = match child.wait().await {
        Ok(status) => exit_code_of(status),
        Err(e) => {
            log::error!("Failed to wait for \"{}\": {}", command_line, e);
            EXIT_FAILURE
        }
    };

    if let Some(collector) = log_collector {
        collector.log_str(format!(
            "\"{}\" exited with code {}\n--- stdout ---\n{}--- stderr ---\n{}",
            command_line, exit_code, captured_stdout, captured_stderr
        ));
    }

    let result = CommandResult::completed(captured_stdout, captured_stderr, exit_code);
    if result.command_not_found {
        log::warn!("\"{}\" reported command not found", command_line);
    }
    result
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Move a completed (or final partial) line from `buf` into the captured text and echo it.
fn flush_line(buf: &mut Vec<u8>, captured: &mut String, echo: bool, stream: Stream) {
    if buf.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(buf).into_owned();
    buf.clear();

    if echo {
        echo_line(&line, stream);
    }
    captured.push_str(&line);
}

fn echo_line(line: &str, stream: Stream) {
    let text = line.trim_end_matches('\n');
    // Echo failures (closed terminal) must not affect the command outcome.
    match stream {
        Stream::Stdout => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", text.cyan());
            let _ = out.flush();
        }
        Stream::Stderr => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{}", text.red());
        }
    }
}

/// Real exit status; a signal-terminated process maps to 128 + signal number.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::COMMAND_NOT_FOUND_EXIT_CODE;

    fn sh(script: &str) -> CommandRequest {
        CommandRequest::new(["sh", "-c", script])
    }

    #[tokio::test]
    async fn test_captures_both_streams() {
        let result = run_command(&sh("echo out; echo err 1>&2"), false, None).await;
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert_eq!(result.exit_code, 0);
        assert!(!result.command_not_found);
    }

    #[tokio::test]
    async fn test_real_exit_code_is_reported() {
        let result = run_command(&sh("exit 3"), false, None).await;
        assert_eq!(result.exit_code, 3);
        assert!(!result.command_not_found);
    }

    #[tokio::test]
    async fn test_missing_executable_is_synthetic_not_found() {
        let request = CommandRequest::new(["definitely_not_a_real_command_12345", "--flag"]);
        let result = run_command(&request, false, None).await;
        assert!(result.command_not_found);
        assert_eq!(result.exit_code, COMMAND_NOT_FOUND_EXIT_CODE);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "Command not found");
    }

    #[tokio::test]
    async fn test_empty_argv_is_not_found() {
        let request = CommandRequest::new(Vec::<String>::new());
        let result = run_command(&request, false, None).await;
        assert!(result.command_not_found);
    }

    #[tokio::test]
    async fn test_shell_reported_127_is_not_found() {
        let result = run_command(&sh("exit 127"), false, None).await;
        assert!(result.command_not_found);
    }

    #[tokio::test]
    async fn test_final_line_without_newline_is_kept() {
        let result = run_command(&sh("printf 'a\\nb'"), false, None).await;
        assert_eq!(result.stdout, "a\nb");
    }

    #[tokio::test]
    async fn test_runs_in_requested_directory() {
        let temp = tempfile::tempdir().unwrap();
        let request = sh("pwd").current_dir(temp.path());
        let result = run_command(&request, false, None).await;
        let reported = std::path::PathBuf::from(result.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_stdin_input_is_fed_and_closed() {
        let request = sh("read answer; echo \"got $answer\"").stdin_input("Y\n");
        let result = run_command(&request, false, None).await;
        assert_eq!(result.stdout, "got Y\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_signal_termination_maps_above_128() {
        let result = run_command(&sh("kill -9 $$"), false, None).await;
        assert_eq!(result.exit_code, 128 + 9);
    }

    #[test]
    fn test_blocking_executor_front_end() {
        let executor = ProcessExecutor::new(None).unwrap().with_echo(false);
        let result = executor.execute(&sh("echo hello"));
        assert_eq!(result.stdout, "hello\n");
        assert!(executor.run(&sh("exit 1")).exit_code == 1);
    }
}
