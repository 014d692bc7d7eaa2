//! Node-list parsing
//!
//! A node list is a newline-delimited text file with one proxy link per line.
//! Blank lines and `#` comments are skipped; every other line yields either a
//! record or a [`ParseError`], and one bad line never stops the batch.

use std::io;
use std::path::Path;

use log::{debug, info, warn};

use crate::models::{BatchResult, ParseError};
use crate::parser::explodes::explode;
use crate::parser::remark::{BatchContext, NameStrictness};
use crate::utils::file_get;

/// Whether a trimmed line carries a link at all
fn is_node_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}

/// Parse every link in `source`, in line order
pub fn parse_node_list(source: &str, strictness: NameStrictness) -> BatchResult {
    let mut ctx = BatchContext::new(strictness);
    let mut result = BatchResult::default();

    for (index, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if !is_node_line(line) {
            continue;
        }
        let line_number = index + 1;

        let outcome = explode(line, &mut ctx).map_err(|kind| ParseError::new(line_number, line, kind));
        match &outcome {
            Ok(record) => debug!(
                "line {}: {} node '{}' at {}:{}",
                line_number, record.protocol, record.name, record.server, record.port
            ),
            Err(err) => warn!("Skipping {}", err),
        }
        result.push(outcome);
    }

    info!(
        "Parsed node list: {} succeeded, {} failed",
        result.success_count, result.error_count
    );
    result
}

/// Read and parse a node-list file
pub fn parse_node_file(path: impl AsRef<Path>, strictness: NameStrictness) -> io::Result<BatchResult> {
    let source = file_get(path)?;
    Ok(parse_node_list(&source, strictness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseErrorKind;

    #[test]
    fn test_comments_and_blanks_are_not_counted() {
        let source = "\n# header\n   # indented comment\n\nss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#A\n";
        let result = parse_node_list(source, NameStrictness::Strict);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.names(), vec!["A"]);
    }

    #[test]
    fn test_error_carries_line_number_and_prefix() {
        let source = "ss://YWVzLTI1Ni1nY206cGFzcw==@1.2.3.4:8388#A\n\nftp://this-is-a-rather-long-unsupported-link.example.com/\n";
        let result = parse_node_list(source, NameStrictness::Strict);

        assert_eq!(result.error_count, 1);
        let err = &result.errors[0];
        assert_eq!(err.line_number, 3);
        assert_eq!(err.raw_line_prefix.chars().count(), 30);
        assert!(err.raw_line_prefix.starts_with("ftp://"));
        assert_eq!(err.kind, ParseErrorKind::UnsupportedProtocol("ftp".to_string()));
    }

    #[test]
    fn test_crlf_line_endings() {
        let source = "http://a.example.com:8080#one\r\nhttp://b.example.com:8080#two\r\n";
        let result = parse_node_list(source, NameStrictness::Strict);
        assert_eq!(result.names(), vec!["one", "two"]);
    }

    #[test]
    fn test_parse_node_file_missing() {
        assert!(parse_node_file("/nonexistent/nodes.txt", NameStrictness::Strict).is_err());
    }
}
