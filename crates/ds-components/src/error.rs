//! Error types for component physics.

use ds_core::DsError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Singular system: {what}")]
    Singular { what: &'static str },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for DsError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what } => DsError::NonFinite {
                what,
                value: f64::NAN,
            },
            ComponentError::InvalidArg { what } => DsError::InvalidArg { what },
            ComponentError::Singular { what } => DsError::Invariant { what },
        }
    }
}
