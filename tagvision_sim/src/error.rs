// tagvision_sim/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use tagvision_core::error::VisionError;

/// Everything that can stop a simulation before its first cycle.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to parse scenario: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid noise model: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

impl SimError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
