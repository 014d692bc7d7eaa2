pub mod base64;
pub mod file;
pub mod string;
pub mod system;
pub mod url;

// Re-export common utilities
pub use file::{file_exists, file_get};
pub use string::{collapse_whitespace, is_truthy, truncate_chars};
