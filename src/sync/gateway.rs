use std::io;
use std::path::Path;

use log::{debug, error, warn};

use crate::settings::Settings;
use crate::utils::system::{command_stdout, run_command};

/// The running gateway, as seen by the reconciler
pub trait Gateway {
    /// Ask the gateway whether the document at `path` is acceptable
    fn verify(&self, path: &Path) -> bool;

    /// Restart the gateway so it loads the live document
    fn restart(&self) -> io::Result<()>;

    /// Position in the gateway log, taken before a restart
    fn log_mark(&self) -> usize {
        0
    }

    /// Whether the log lines after `mark` mention `pattern`
    fn scan_recent_log(&self, pattern: &str, mark: usize) -> bool;
}

/// [`Gateway`] backed by external commands
#[derive(Debug, Clone)]
pub struct CommandGateway {
    /// The document path is appended as the last argument
    pub verify_command: Vec<String>,
    pub restart_command: Vec<String>,
    pub log_command: Vec<String>,
}

impl CommandGateway {
    pub fn from_settings(settings: &Settings) -> Self {
        CommandGateway {
            verify_command: settings.verify_command.clone(),
            restart_command: settings.restart_command.clone(),
            log_command: settings.log_command.clone(),
        }
    }

    fn read_log(&self) -> Option<String> {
        match command_stdout(&self.log_command) {
            Ok(log) => Some(log),
            Err(e) => {
                debug!("Could not read gateway log: {}", e);
                None
            }
        }
    }
}

impl Gateway for CommandGateway {
    fn verify(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        match run_command(&self.verify_command, &[path.as_ref()]) {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                warn!(
                    "Verifier rejected {}: {}",
                    path,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                error!("Failed to run verifier {:?}: {}", self.verify_command, e);
                false
            }
        }
    }

    fn restart(&self) -> io::Result<()> {
        let output = run_command(&self.restart_command, &[])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", self.restart_command.join(" "), output.status),
            ))
        }
    }

    fn log_mark(&self) -> usize {
        self.read_log().map_or(0, |log| log.lines().count())
    }

    fn scan_recent_log(&self, pattern: &str, mark: usize) -> bool {
        // an unreadable log is not evidence of failure
        let Some(log) = self.read_log() else {
            return false;
        };
        let total = log.lines().count();
        // a ring buffer that wrapped since the mark is scanned whole
        let skip = if total >= mark { mark } else { 0 };
        log.lines().skip(skip).any(|line| line.contains(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_gateway_with_stock_tools() {
        let gateway = CommandGateway {
            verify_command: argv(&["test", "-f"]),
            restart_command: argv(&["true"]),
            log_command: argv(&["echo", "boot ok\nParse config error: bad"]),
        };
        let file = tempfile::NamedTempFile::new().unwrap();

        assert!(gateway.verify(file.path()));
        assert!(!gateway.verify(Path::new("/nonexistent/config.yaml")));
        assert!(gateway.restart().is_ok());
        assert_eq!(gateway.log_mark(), 2);
        assert!(gateway.scan_recent_log("Parse config error", 0));
        assert!(!gateway.scan_recent_log("panic", 0));
    }

    #[test]
    fn test_log_lines_before_mark_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("gateway.log");
        std::fs::write(&log, "Parse config error: stale\nboot ok\n").unwrap();
        let gateway = CommandGateway {
            verify_command: argv(&["true"]),
            restart_command: argv(&["true"]),
            log_command: argv(&["cat", &log.display().to_string()]),
        };

        let mark = gateway.log_mark();
        assert_eq!(mark, 2);
        assert!(!gateway.scan_recent_log("Parse config error", mark));

        std::fs::write(&log, "Parse config error: stale\nboot ok\nParse config error: new\n").unwrap();
        assert!(gateway.scan_recent_log("Parse config error", mark));

        std::fs::write(&log, "Parse config error: wrapped\n").unwrap();
        assert!(gateway.scan_recent_log("Parse config error", mark));
    }

    #[test]
    fn test_failing_restart_is_an_error() {
        let gateway = CommandGateway {
            verify_command: argv(&["true"]),
            restart_command: argv(&["false"]),
            log_command: argv(&["/nonexistent/logread"]),
        };
        assert!(gateway.restart().is_err());
        assert_eq!(gateway.log_mark(), 0);
        assert!(!gateway.scan_recent_log("anything", 0));
    }
}
