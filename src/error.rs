//! Module `error` implements the error-type used across this crate.
//!
//! Per the design, most outcomes are carried as `Option<V>` / `bool` and
//! invariant violations panic outright -- `Error` is reserved for the
//! ambient collaborators (background pool, thread join) where a caller
//! can plausibly want to recover.

use std::{fmt, result};

#[derive(Debug)]
pub enum Error {
    /// A background thread could not be joined cleanly.
    ThreadFail(String),
    /// Sending/receiving across an inter-thread channel failed.
    IPCFail(String),
    /// A numeric conversion (e.g. usize -> u32) did not fit.
    FailConvert(String),
    /// Caller supplied input that violates a documented precondition.
    Invalid(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ThreadFail(msg) => write!(f, "ThreadFail: {}", msg),
            Error::IPCFail(msg) => write!(f, "IPCFail: {}", msg),
            Error::FailConvert(msg) => write!(f, "FailConvert: {}", msg),
            Error::Invalid(msg) => write!(f, "Invalid: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Construct an `Err(Error::Variant(..))` tagged with call-site location,
/// or adapt a foreign `Result`'s `Err` arm into one.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $fmt:expr $(, $arg:expr)* $(,)?) => {
        Err($crate::error::Error::$v(format!(
            concat!("{}:{} ", $fmt), file!(), line!() $(, $arg)*
        )))
    };
    ($v:ident, $e:expr) => {
        match $e {
            Ok(val) => Ok(val),
            Err(err) => Err($crate::error::Error::$v(format!(
                "{}:{} {}", file!(), line!(), err
            ))),
        }
    };
}
