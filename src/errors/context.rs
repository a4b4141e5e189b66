//! Error context enhancement utilities
//!
//! Convenience trait for converting foreign errors into [`AppError`] while
//! attaching a short operation description, similar to anyhow's `context`
//! but keeping the structured type.

use super::types::AppError;

/// Extension trait for adding context to error types
pub trait ErrorContextExt<T> {
    /// Add operation context to the error
    fn with_context(self, operation: impl Into<String>) -> Result<T, AppError>;

    /// Add operation context with a closure (lazy evaluation)
    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context(self, operation: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| {
            let operation = operation.into();
            AppError::Other {
                message: format!("{}: {}", operation, e),
                source: Some(Box::new(e)),
            }
        })
    }

    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::Other {
            message: format!("{}: {}", f(), e),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_io() -> Result<(), std::io::Error> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
    }

    #[test]
    fn test_with_context_wraps_message() {
        let err = failing_io().with_context("flushing socket").unwrap_err();
        assert!(err.to_string().contains("flushing socket"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_with_context_lazy_only_called_on_error() {
        let ok: Result<u8, std::io::Error> = Ok(7);
        let value = ok.with_context_lazy(|| unreachable!()).unwrap();
        assert_eq!(value, 7);
    }
}
