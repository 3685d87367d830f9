use std::fmt;
use std::io;

use hex::FromHexError;

/// Errors that can occur while converting an ENI file.
#[derive(Debug)]
pub enum EniError {
    /// A required element is missing, or an element occurs too often.
    Schema(String),

    /// An element holds a value that cannot be decoded (integer, hex data, ...).
    Value(String),

    /// The input is not well-formed XML.
    Xml(xml::reader::Error),

    /// Reading the input or writing the output failed.
    Io(io::Error),
}

impl EniError {
    pub(crate) fn schema<S: Into<String>>(msg: S) -> Self {
        EniError::Schema(msg.into())
    }

    pub(crate) fn value<S: Into<String>>(msg: S) -> Self {
        EniError::Value(msg.into())
    }
}

impl From<io::Error> for EniError {
    fn from(e: io::Error) -> Self {
        EniError::Io(e)
    }
}

impl From<xml::reader::Error> for EniError {
    fn from(e: xml::reader::Error) -> Self {
        EniError::Xml(e)
    }
}

/// Malformed `Data` payloads end up here.
impl From<FromHexError> for EniError {
    fn from(e: FromHexError) -> Self {
        EniError::Value(format!("Invalid hex data: {}", e))
    }
}

impl fmt::Display for EniError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EniError::Schema(msg) => write!(f, "{}", msg),
            EniError::Value(msg) => write!(f, "{}", msg),
            EniError::Xml(e) => write!(f, "XML parsing error: {}", e),
            EniError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EniError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EniError::Xml(e) => Some(e),
            EniError::Io(e) => Some(e),
            _ => None,
        }
    }
}
