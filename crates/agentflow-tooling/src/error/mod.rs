//! Error context helpers.
//!
//! Adds file/message context to any `std::error::Error` and formats full
//! error chains for logging, the way `anyhow::Context` does but without
//! requiring every call site to depend on `anyhow`.

use std::error::Error as StdError;
use std::fmt;

/// A boxed, thread-safe error type used at crate boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Adds contextual messages to a `Result`'s error variant.
pub trait ErrorContext<T> {
    /// Wrap the error (if any) with an additional message, preserving the
    /// original as the `source()`.
    fn context(self, message: impl Into<String>) -> Result<T, ContextError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T, ContextError> {
        self.map_err(|e| ContextError {
            message: message.into(),
            source: Box::new(e),
        })
    }
}

/// An error carrying an added message plus the original cause.
#[derive(Debug)]
pub struct ContextError {
    message: String,
    source: BoxError,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ContextError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Render the full `source()` chain of an error, one cause per line.
pub fn format_error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        out.push_str("\n  caused by: ");
        out.push_str(&c.to_string());
        cause = c.source();
    }
    out
}

/// Walk to the deepest `source()` in the chain.
pub fn root_cause(err: &(dyn StdError + 'static)) -> &(dyn StdError + 'static) {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

/// Count how many links are in an error's `source()` chain (0 if none).
pub fn error_chain_length(err: &(dyn StdError + 'static)) -> usize {
    let mut count = 0;
    let mut cause = err.source();
    while let Some(c) = cause {
        count += 1;
        cause = c.source();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn context_preserves_source() {
        let io_err: Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let wrapped = io_err.context("loading config").unwrap_err();
        assert_eq!(wrapped.to_string(), "loading config");
        assert_eq!(error_chain_length(&wrapped), 1);
        assert!(root_cause(&wrapped).to_string().contains("missing"));
    }

    #[test]
    fn format_chain_includes_all_causes() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let wrapped = Err::<(), _>(io_err).context("loading config").unwrap_err();
        let formatted = format_error_chain(&wrapped);
        assert!(formatted.contains("loading config"));
        assert!(formatted.contains("missing"));
    }
}
