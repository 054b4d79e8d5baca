//! Error module
use std::fmt;
use std::fmt::Display;

/// alias result on network module
pub type Result<T> = ::std::result::Result<T, Error>;

/// All errors on the network module
#[derive(Debug)]
pub enum Error {
    /// configuration error
    Config(ConfigError),
}

/// Configuration error
#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// the local address carries the seed timestamp
    SeedLocalAddress,
    /// an RTC local address needs a peer id for signalling
    LocalPeerIdMissing,
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}
