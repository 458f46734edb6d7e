//! Crate-wide error type and the `err_at!` construction macro.
//!
//! Every variant carries a `file:line` prefixed message so a failure
//! can be traced back to the call site without a backtrace capture.

use std::{fmt, io, result};

/// Result alias used throughout the crate.
pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Any operation attempted after `Store::close`.
    HandleClosed(String),
    /// `remove` of a key that is not present in the key map.
    UnknownKey(String),
    /// Reclaimable-index `remove` called with a node not present in the
    /// index. Indicates a programmer error inside this crate.
    NotInIndex(String),
    /// Metadata stream is non-empty and fails to decode, or decodes into
    /// a document that violates the chain/index invariants.
    MetadataCorrupt(String),
    /// Values byte-stream `write` returned fewer bytes than requested.
    ShortWrite(String),
    /// `get` read bytes that do not form valid JSON.
    DecodeError(String),
    /// Any other file-system failure.
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::HandleClosed(msg) => write!(f, "HandleClosed: {}", msg),
            Error::UnknownKey(msg) => write!(f, "UnknownKey: {}", msg),
            Error::NotInIndex(msg) => write!(f, "NotInIndex: {}", msg),
            Error::MetadataCorrupt(msg) => write!(f, "MetadataCorrupt: {}", msg),
            Error::ShortWrite(msg) => write!(f, "ShortWrite: {}", msg),
            Error::DecodeError(msg) => write!(f, "DecodeError: {}", msg),
            Error::IoError(msg) => write!(f, "IoError: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(format!("{}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::DecodeError(format!("{}", err))
    }
}

/// Construct an `Err(Error::Variant(..))` tagged with the call site, or
/// convert an existing `Result`'s error arm the same way.
///
/// ```ignore
/// err_at!(IoError, fd.write(buf))?;
/// err_at!(MetadataCorrupt, msg: "node index {} out of range", idx)?;
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let msg = format!($($arg),+);
        Err($crate::error::Error::$v(format!("{}:{} {}", file!(), line!(), msg)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => Err($crate::error::Error::$v(format!(
                "{}:{} {}",
                file!(),
                line!(),
                err
            ))),
        }
    }};
}
