//! Per-line parse outcomes and their aggregate

use thiserror::Error;

use super::NodeRecord;

/// Number of leading characters of a failed line kept for diagnostics
pub const DIAGNOSTIC_PREFIX_LEN: usize = 30;

/// Why a single node link could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// A failed line, kept for inspection after the batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line_number} ({raw_line_prefix}): {kind}")]
pub struct ParseError {
    /// 1-based line number in the node-list source
    pub line_number: usize,
    pub raw_line_prefix: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line_number: usize, raw_line: &str, kind: ParseErrorKind) -> Self {
        Self {
            line_number,
            raw_line_prefix: raw_line.chars().take(DIAGNOSTIC_PREFIX_LEN).collect(),
            kind,
        }
    }
}

/// Outcome of parsing one line
pub type ParseOutcome = Result<NodeRecord, ParseError>;

/// Aggregate of one node-list parse
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Records in line order
    pub records: Vec<NodeRecord>,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<ParseError>,
}

impl BatchResult {
    /// Record a per-line outcome
    pub fn push(&mut self, outcome: ParseOutcome) {
        match outcome {
            Ok(record) => {
                self.records.push(record);
                self.success_count += 1;
            }
            Err(err) => {
                self.errors.push(err);
                self.error_count += 1;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of the parsed records, in order
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }
}
