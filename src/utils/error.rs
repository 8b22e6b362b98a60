use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Owner '{name}' not found")]
    OwnerNotFound { name: String },

    #[error("Pet '{name}' not found")]
    PetNotFound { name: String },

    #[error("Validation failed for field '{field}' ({value}): {reason}")]
    ValidationFailed {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[from] PersistenceError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ClinicError {
    pub fn validation(field: &str, value: &str, reason: impl Into<String>) -> Self {
        ClinicError::ValidationFailed {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn owner_not_found(name: impl Into<String>) -> Self {
        ClinicError::OwnerNotFound { name: name.into() }
    }

    pub fn pet_not_found(name: impl Into<String>) -> Self {
        ClinicError::PetNotFound { name: name.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClinicError::ValidationFailed { .. })
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            ClinicError::OwnerNotFound { name } => format!("Owner {} not found", name),
            ClinicError::PetNotFound { name } => format!("Pet {} not found", name),
            ClinicError::ValidationFailed { field, reason, .. } => {
                format!("The field '{}' is invalid: {}", field, reason)
            }
            ClinicError::PersistenceFailed(_) => {
                "Could not read or write clinic records, nothing was saved".to_string()
            }
            ClinicError::Config { message } => format!("Invalid configuration: {}", message),
        }
    }

    /// CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ClinicError::ValidationFailed { .. } => 2,
            ClinicError::OwnerNotFound { .. } | ClinicError::PetNotFound { .. } => 3,
            ClinicError::Config { .. } => 4,
            ClinicError::PersistenceFailed(_) => 1,
        }
    }
}

impl From<std::io::Error> for ClinicError {
    fn from(err: std::io::Error) -> Self {
        ClinicError::PersistenceFailed(err.into())
    }
}

impl From<csv::Error> for ClinicError {
    fn from(err: csv::Error) -> Self {
        ClinicError::PersistenceFailed(err.into())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(err: serde_json::Error) -> Self {
        ClinicError::PersistenceFailed(err.into())
    }
}

impl From<rusqlite::Error> for ClinicError {
    fn from(err: rusqlite::Error) -> Self {
        ClinicError::PersistenceFailed(err.into())
    }
}

pub type Result<T> = std::result::Result<T, ClinicError>;
