use graphx_types::BillingError;
use thiserror::Error;

pub use graphx_types::ErrorCode;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidPlan(_) => AppError::InvalidInput("Invalid plan".into()),
            BillingError::NoOpSwitch(_) => {
                AppError::InvalidInput("You already have this plan".into())
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
