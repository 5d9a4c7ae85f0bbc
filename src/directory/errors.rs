use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("User not found")]
    NotFound,
    #[error("User already exists")]
    DuplicateKey,
    #[error("No fields to update")]
    EmptyUpdate,
    #[error("Corrupt user record: {0}")]
    Corrupt(String),
}
