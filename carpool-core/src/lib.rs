pub mod booking;
pub mod catalog;
pub mod credentials;
pub mod hashing;
pub mod lifecycle;
pub mod listing;
pub mod repository;
pub mod ride;
pub mod user;
pub mod validate;

pub use catalog::RideCatalog;
pub use credentials::CredentialService;
pub use hashing::{PasswordCost, PasswordHasher};
pub use lifecycle::BookingEngine;
pub use listing::ListingService;
pub use repository::Repositories;

/// Closed set of failures every service operation reports.
///
/// Storage errors are translated into one of these at the repository boundary, so
/// nothing from the driver reaches the HTTP layer except through `user_message`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl CoreError {
    /// Stable text safe to return to clients.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::ValidationError(msg) => msg.clone(),
            CoreError::DuplicateKey(_) => "Student ID or email already registered".to_string(),
            CoreError::InvalidCredentials => "Invalid email or password".to_string(),
            CoreError::NotFound(what) => format!("{} not found", what),
            CoreError::Conflict(msg) => msg.clone(),
            CoreError::PersistenceError(_) => "Database error".to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_detail_never_reaches_users() {
        let err = CoreError::PersistenceError("relation \"rides\" does not exist".into());
        assert_eq!(err.user_message(), "Database error");
        assert!(err.to_string().contains("rides"));
    }

    #[test]
    fn duplicate_key_hides_which_column() {
        let err = CoreError::DuplicateKey("users_email_key".into());
        assert_eq!(err.user_message(), "Student ID or email already registered");
    }
}
