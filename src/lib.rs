pub mod broadcast;
pub mod communication;
pub mod configuration;
pub mod core;
pub mod directory;
pub mod engine;
pub mod membership;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config Error:{0}")]
    ConfigError(String),

    #[error("Service error")]
    ServiceError,
}
