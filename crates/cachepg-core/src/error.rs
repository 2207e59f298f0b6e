use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid parameter group name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
}
