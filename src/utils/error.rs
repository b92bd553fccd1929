use thiserror::Error;

/// Business rules that can reject a lending operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("Book {title} is not available for borrowing")]
    NotAvailable { title: String },

    #[error("Member {name} is currently penalized and cannot borrow books")]
    Penalized { name: String },

    #[error("Member {name} has already borrowed the maximum number of books ({limit})")]
    BorrowLimitReached { name: String, limit: usize },

    #[error("This book has already been returned")]
    AlreadyReturned,

    #[error("Stock of book {code} cannot drop to {stock} while {active} copies are borrowed")]
    StockBelowActiveBorrowings {
        code: String,
        stock: u32,
        active: usize,
    },
}

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("{entity} with {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    PolicyViolation(#[from] PolicyViolation),

    #[error("State violation: {message}")]
    StateViolation { message: String },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Policy,
    State,
    Invalid,
    Infrastructure,
}

impl LendingError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::StateViolation {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PolicyViolation(_) => ErrorKind::Policy,
            Self::StateViolation { .. } => ErrorKind::State,
            Self::ValidationError { .. } | Self::ConfigError { .. } | Self::TomlError(_) => {
                ErrorKind::Invalid
            }
            Self::IoError(_) | Self::SerializationError(_) => ErrorKind::Infrastructure,
        }
    }

    /// HTTP-equivalent status for transports that speak it.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Policy | ErrorKind::Invalid => 400,
            ErrorKind::State | ErrorKind::Infrastructure => 500,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Check the code or id; list existing records first",
            Self::PolicyViolation(PolicyViolation::NotAvailable { .. }) => {
                "Pick another book or wait until a copy is returned"
            }
            Self::PolicyViolation(PolicyViolation::Penalized { .. }) => {
                "Wait until the penalty window has elapsed"
            }
            Self::PolicyViolation(PolicyViolation::BorrowLimitReached { .. }) => {
                "Return a borrowed book before borrowing another"
            }
            Self::PolicyViolation(PolicyViolation::AlreadyReturned) => {
                "Nothing to do; the borrowing is already closed"
            }
            Self::PolicyViolation(PolicyViolation::StockBelowActiveBorrowings { .. }) => {
                "Wait for outstanding copies to be returned before lowering stock"
            }
            Self::StateViolation { .. } => "This is a defect; please report it",
            Self::ValidationError { .. } => "Fix the offending field and retry",
            Self::ConfigError { .. } | Self::TomlError(_) => "Check the configuration file",
            Self::IoError(_) => "Check file permissions and the data directory",
            Self::SerializationError(_) => "The snapshot file may be corrupt",
        }
    }
}

pub type Result<T> = std::result::Result<T, LendingError>;
