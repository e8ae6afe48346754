//! CLI-specific error types
//!
//! Every CLI error is fatal: `main` prints it and exits non-zero.

use thiserror::Error;

use crate::file_storage::StorageError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("AERO_CLI_CONFIG_ERROR: {0}")]
    Config(String),

    #[error("AERO_CLI_BOOT_FAILED: {0}")]
    BootFailed(String),

    #[error("AERO_CLI_RESET_FAILED: {0}")]
    ResetFailed(String),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "AERO_CLI_CONFIG_ERROR",
            CliError::BootFailed(_) => "AERO_CLI_BOOT_FAILED",
            CliError::ResetFailed(_) => "AERO_CLI_RESET_FAILED",
        }
    }

    pub fn boot_failed(e: StorageError) -> Self {
        CliError::BootFailed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::Config("bad port".to_string());
        assert_eq!(err.code(), "AERO_CLI_CONFIG_ERROR");
        assert_eq!(err.to_string(), "AERO_CLI_CONFIG_ERROR: bad port");
    }

    #[test]
    fn test_boot_failed_keeps_startup_detail() {
        let err = CliError::boot_failed(StorageError::Internal(
            "Failed to create storage directory /root/x: permission denied".to_string(),
        ));
        assert_eq!(err.code(), "AERO_CLI_BOOT_FAILED");
        assert!(err.to_string().contains("permission denied"));
    }
}
