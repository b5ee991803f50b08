use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("schema must not be empty")]
    EmptySchema,
    #[error("json must not be empty")]
    EmptyJson,
    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },
}
