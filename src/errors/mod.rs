//! Centralized error handling module
//!
//! Structured, typed errors for the relay; handlers at the CLI boundary may
//! still bubble them up through `anyhow::Result`.

pub mod context;
pub mod types;

pub use context::ErrorContextExt;
pub use types::{AppError, AppResult};

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other {
            message: err.to_string(),
            source: None,
        }
    }
}
