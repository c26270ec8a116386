use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// Role resolution could not be persisted. The caller is treated as
    /// unauthenticated rather than handed a guessed role.
    #[error("Identity store error: {0}")]
    StoreError(String),
}
