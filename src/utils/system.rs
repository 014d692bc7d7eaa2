//! Process and timing helpers for talking to the gateway

use std::io;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

/// Sleep for a specified number of seconds
pub fn sleep_secs(interval: u64) {
    if interval > 0 {
        thread::sleep(Duration::from_secs(interval));
    }
}

/// Run an argv-style command and wait for it
///
/// The first element is the program, the rest are passed verbatim; no shell
/// is involved.
pub fn run_command(argv: &[String], extra_args: &[&str]) -> io::Result<Output> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
    Command::new(program).args(args).args(extra_args).output()
}

/// Run a command and return its trimmed stdout when it exits successfully
pub fn command_stdout(argv: &[String]) -> io::Result<String> {
    let output = run_command(argv, &[])?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}", argv.join(" "), output.status),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_rejects_empty_argv() {
        let err = run_command(&[], &[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
