use thiserror::Error;

pub type DsResult<T> = Result<T, DsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
