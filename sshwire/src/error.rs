use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("parser error {0:?}")]
    Parser(nom::error::ErrorKind),
    #[error("unexpected end of input: {0:?}")]
    ParserIncomplete(nom::Needed),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("negative mpint")]
    NegativeMpint,
    #[error("{0} trailing bytes")]
    TrailingData(usize),
    #[error("field of {0} bytes does not fit a uint32 length")]
    TooLong(usize),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match e {
            nom::Err::Incomplete(n) => Error::ParserIncomplete(n),
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::Parser(e.code),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
