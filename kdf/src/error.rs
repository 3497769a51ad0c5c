use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("salt length {0} out of range (1..=1048576)")]
    InvalidSaltLength(usize),
    #[error("rounds must be at least 1")]
    RoundsTooSmall,
    #[error("requested key length {0} exceeds 1024 bytes")]
    KeyLengthTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
