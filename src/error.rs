use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("GPO not found: {0}")]
    GpoNotFound(String),

    #[error("Directory object not found: {0}")]
    ObjectNotFound(String),

    #[error("Directory error: {0}")]
    DirectoryError(String),

    #[error("Directory write failed: {0}")]
    DirectoryWriteFailed(String),

    #[error("No domain controller found for {0}")]
    NoDomainController(String),

    #[error("File access failed: {0}")]
    FileAccess(String),

    #[error("Invalid GPO identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Backup manifest not found at {0}")]
    ManifestNotFound(String),

    #[error("Backup manifest is malformed: {0}")]
    ManifestParse(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Serializable error for the CLI's JSON output
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        CommandError {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let cmd_error = CommandError {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        cmd_error.serialize(serializer)
    }
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::GpoNotFound(_) => "GPO_NOT_FOUND",
            AppError::ObjectNotFound(_) => "NOT_FOUND",
            AppError::DirectoryError(_) => "DIRECTORY_ERROR",
            AppError::DirectoryWriteFailed(_) => "DIRECTORY_WRITE_FAILED",
            AppError::NoDomainController(_) => "NO_DOMAIN_CONTROLLER",
            AppError::FileAccess(_) => "FILE_ACCESS",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::ManifestNotFound(_) => "MANIFEST_NOT_FOUND",
            AppError::ManifestParse(_) => "MANIFEST_PARSE",
            AppError::OperationFailed(_) => "OPERATION_FAILED",
            AppError::IoError(_) => "IO_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::OperationFailed(s)
    }
}

pub type AppResult<T> = Result<T, AppError>;
