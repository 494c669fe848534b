//! Error plumbing shared by reqflow components.
//!
//! Components define their own small error enums. At the seams where a
//! component calls user-supplied code (middleware hooks, cache refetch
//! functions) errors are type-erased into [`BoxError`].

use std::error::Error;
use std::fmt;

/// A type-erased, thread-safe error.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Displays an error followed by every error in its `source()` chain.
///
/// ```
/// use reqflow_core::ErrorChain;
///
/// let io = std::io::Error::other("connection reset");
/// assert_eq!(ErrorChain(&io).to_string(), "connection reset");
/// ```
pub struct ErrorChain<'a>(pub &'a (dyn Error + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}
