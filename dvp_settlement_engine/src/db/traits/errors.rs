use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Settlement process not found: {0}")]
    SettlementNotFound(i64),
    #[error("An issuer account already exists for {0}")]
    DuplicateAccount(String),
    #[error("Illegal state transition for settlement {id}: {reason}")]
    IllegalTransition { id: i64, reason: String },
}
