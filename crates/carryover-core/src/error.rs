use carryover_domain::UnknownCycleType;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Budget category not found: {0}")]
    BudgetCategoryNotFound(Uuid),
    #[error("Category {0} is not a main category")]
    NotMainCategory(Uuid),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Recalculation failed for budget {budget_id}: {reason}")]
    RecalculationFailed { budget_id: Uuid, reason: String },
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Transaction source error: {0}")]
    TransactionSource(String),
    #[error("Unknown cycle type: {0}")]
    UnknownCycleType(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::BudgetNotFound(_) => ErrorKind::BudgetNotFound,
            CoreError::BudgetCategoryNotFound(_) => ErrorKind::BudgetCategoryNotFound,
            CoreError::NotMainCategory(_) => ErrorKind::NotMainCategory,
            CoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CoreError::RecalculationFailed { .. } => ErrorKind::RecalculationFailed,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::TransactionNotFound(_)
            | CoreError::TransactionSource(_)
            | CoreError::UnknownCycleType(_)
            | CoreError::Storage(_)
            | CoreError::Serde(_)
            | CoreError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl From<UnknownCycleType> for CoreError {
    fn from(err: UnknownCycleType) -> Self {
        CoreError::UnknownCycleType(err.0)
    }
}

/// Tag carried by structured API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BudgetNotFound,
    BudgetCategoryNotFound,
    NotMainCategory,
    AlreadyExists,
    RecalculationFailed,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::BudgetNotFound => "BUDGET_NOT_FOUND",
            ErrorKind::BudgetCategoryNotFound => "BUDGET_CATEGORY_NOT_FOUND",
            ErrorKind::NotMainCategory => "NOT_MAIN_CATEGORY",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::RecalculationFailed => "RECALCULATION_FAILED",
            ErrorKind::Validation => "VALIDATION_FAILED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}
