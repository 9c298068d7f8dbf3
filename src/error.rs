//! Error types for index reordering.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl Error {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

/// The caller handed over a triangle list that breaks the input contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("index count {len} is not a multiple of three")]
    IndexCount { len: usize },

    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("{what} count {count} does not fit 32-bit ids")]
    TooLarge { what: &'static str, count: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("cache size must be positive, got {0}")]
    CacheSize(usize),

    #[error("{name} must be finite and non-negative, got {value}")]
    Constant { name: &'static str, value: f32 },
}
