// src/core/commons.rs

// Helper function to wrap a string in single quotes for a POSIX shell.
// Embedded single quotes are closed, escaped and reopened: it's -> 'it'\''s'.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
