use std::result;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("key already exists")]
    AlreadyExist,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = result::Result<T, Error>;
