// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] crate::port::SensorError),

    #[error("Launch error: {0}")]
    Launch(#[from] crate::port::LaunchError),

    #[error("Terminate error: {0}")]
    Terminate(#[from] crate::port::TerminateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // The only condition that ends supervision unprompted: a transition to
    // RUNNING left zero tracked processes.
    #[error("Nothing to supervise: {0}")]
    NothingToSupervise(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
