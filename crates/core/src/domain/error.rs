// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid ram policy: safe ({safe}%) must be below threshold ({threshold}%)")]
    InvertedRamPolicy { safe: f32, threshold: f32 },

    #[error("ram percentage out of range: {0}")]
    PercentOutOfRange(f32),

    #[error("validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
