//! Error types for the link budget engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Unknown {quantity} unit: '{unit}'")]
    InvalidUnit { quantity: &'static str, unit: String },

    #[error("{field} must be positive (got {value})")]
    InvalidGeometry { field: &'static str, value: f64 },

    #[error("{field} must be between 0 and 1 (got {value})")]
    InvalidEfficiency { field: &'static str, value: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{field} is not a finite number (got {value})")]
    NotFinite { field: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, EngineError>;
