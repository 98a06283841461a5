use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::io::Error as IoError;

use base64::DecodeError;
#[cfg(feature = "u2f")]
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum Error {
    /// A precondition on an argument was not met (empty scramble key, bad length, bad hex...)
    InvalidArgument(String),
    /// The external transport or device driver rejected the operation
    Transport(String),
    /// The device answered with a status word outside of the accepted set
    UnexpectedStatus(u16),
    /// A device signature did not have the expected r/s layout
    MalformedSignature(String),
    Base64Error(DecodeError),
    #[cfg(feature = "u2f")]
    JsonError(JsonError),
    IoError(IoError),
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Base64Error(e)
    }
}

#[cfg(feature = "u2f")]
impl From<JsonError> for Error {
    fn from(e: JsonError) -> Self {
        Error::JsonError(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::IoError(e)
    }
}

impl StdError for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        use Error::*;
        match self {
            InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
            Transport(s) => write!(f, "{}", s),
            UnexpectedStatus(sw) => write!(f, "Invalid status {:x}", sw),
            MalformedSignature(s) => write!(f, "Malformed signature: {}", s),
            Base64Error(e) => e.fmt(f),
            #[cfg(feature = "u2f")]
            JsonError(js_e) => js_e.fmt(f),
            IoError(io_e) => io_e.fmt(f),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn test_status_display_is_hex() {
    assert_eq!(Error::UnexpectedStatus(0x6985).to_string(), "Invalid status 6985");
    assert_eq!(Error::UnexpectedStatus(0x6a80).to_string(), "Invalid status 6a80");
}
