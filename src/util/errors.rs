//! Error reporting and conversion
use std::error::Error;
use std::fmt;
use std::io;

pub type CorralResult<T> = Result<T, Box<dyn CorralError>>;

// =============================================================================
// CorralError trait

/// A `CorralError` is either human-facing (safe to print verbatim to the
/// user) or internal (only surfaced at `--verbose`). Errors can be chained:
/// `corral_cause` walks back to whatever caused this error, if known.
pub trait CorralError: Error + Send + 'static {
    fn is_human(&self) -> bool {
        false
    }
    fn corral_cause(&self) -> Option<&dyn CorralError> {
        None
    }
}

impl CorralError for Box<dyn CorralError> {
    fn is_human(&self) -> bool {
        (**self).is_human()
    }
    fn corral_cause(&self) -> Option<&dyn CorralError> {
        (**self).corral_cause()
    }
}

// =============================================================================
// Chaining errors

pub trait ChainError<T> {
    fn chain_error<E, F>(self, callback: F) -> CorralResult<T>
    where
        E: CorralError,
        F: FnOnce() -> E;
}

#[derive(Debug)]
struct ChainedError<E> {
    error: E,
    cause: Box<dyn CorralError>,
}

impl<T, E: CorralError + 'static> ChainError<T> for Result<T, E> {
    fn chain_error<E2: 'static, C>(self, callback: C) -> CorralResult<T>
    where
        E2: CorralError,
        C: FnOnce() -> E2,
    {
        self.map_err(move |err| {
            Box::new(ChainedError {
                error: callback(),
                cause: Box::new(err),
            }) as Box<dyn CorralError>
        })
    }
}

impl<T> ChainError<T> for Box<dyn CorralError> {
    fn chain_error<E2, C>(self, callback: C) -> CorralResult<T>
    where
        E2: CorralError,
        C: FnOnce() -> E2,
    {
        Err(Box::new(ChainedError {
            error: callback(),
            cause: self,
        }))
    }
}

impl<T> ChainError<T> for Option<T> {
    fn chain_error<E: 'static, C>(self, callback: C) -> CorralResult<T>
    where
        E: CorralError,
        C: FnOnce() -> E,
    {
        match self {
            Some(t) => Ok(t),
            None => Err(Box::new(callback())),
        }
    }
}

impl<E: fmt::Display + fmt::Debug> fmt::Display for ChainedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<E: fmt::Display + fmt::Debug> Error for ChainedError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

impl<E: CorralError> CorralError for ChainedError<E> {
    fn is_human(&self) -> bool {
        self.error.is_human()
    }
    fn corral_cause(&self) -> Option<&dyn CorralError> {
        Some(&*self.cause)
    }
}

// =============================================================================
// Concrete errors

struct ConcreteCorralError {
    description: String,
    cause: Option<Box<dyn Error + Send>>,
    is_human: bool,
}

impl fmt::Display for ConcreteCorralError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}
impl fmt::Debug for ConcreteCorralError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Error for ConcreteCorralError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|c| &**c as &(dyn Error + 'static))
    }
}

impl CorralError for ConcreteCorralError {
    fn is_human(&self) -> bool {
        self.is_human
    }
}

pub fn internal<S: fmt::Display>(error: S) -> Box<dyn CorralError> {
    Box::new(ConcreteCorralError {
        description: error.to_string(),
        cause: None,
        is_human: false,
    })
}

pub fn human<S: fmt::Display>(error: S) -> Box<dyn CorralError> {
    Box::new(ConcreteCorralError {
        description: error.to_string(),
        cause: None,
        is_human: true,
    })
}

pub fn caused_human<S, E>(error: S, cause: E) -> Box<dyn CorralError>
where
    S: fmt::Display,
    E: Error + Send + 'static,
{
    Box::new(ConcreteCorralError {
        description: error.to_string(),
        cause: Some(Box::new(cause)),
        is_human: true,
    })
}

// =============================================================================
// CLI errors

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub error: Option<Box<dyn CorralError>>,
    pub unknown: bool,
    pub exit_code: i32,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error {
            Some(error) => error.fmt(f),
            None => write!(f, "unknown cli error"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl CliError {
    pub fn new(error: Box<dyn CorralError>, code: i32) -> CliError {
        let human = error.is_human();
        CliError {
            error: Some(error),
            exit_code: code,
            unknown: !human,
        }
    }

    pub fn code(code: i32) -> CliError {
        CliError {
            error: None,
            exit_code: code,
            unknown: false,
        }
    }
}

impl From<Box<dyn CorralError>> for CliError {
    fn from(err: Box<dyn CorralError>) -> CliError {
        CliError::new(err, 101)
    }
}

// =============================================================================
// NetworkError trait

pub trait NetworkError: CorralError {
    fn maybe_spurious(&self) -> bool;
}

impl NetworkError for curl::Error {
    fn maybe_spurious(&self) -> bool {
        self.is_couldnt_connect()
            || self.is_couldnt_resolve_proxy()
            || self.is_couldnt_resolve_host()
            || self.is_operation_timedout()
            || self.is_recv_error()
    }
}

// =============================================================================
// various impls

macro_rules! from_error {
    ($($p:ty,)*) => {
        $(impl From<$p> for Box<dyn CorralError> {
            fn from(t: $p) -> Box<dyn CorralError> { Box::new(t) }
        })*
    }
}

from_error! {
    io::Error,
    curl::Error,
    CliError,
    url::ParseError,
    std::num::ParseIntError,
    std::str::ParseBoolError,
    regex::Error,
}

impl CorralError for io::Error {}
impl CorralError for curl::Error {}
impl CorralError for CliError {}
impl CorralError for url::ParseError {}
impl CorralError for std::num::ParseIntError {}
impl CorralError for std::str::ParseBoolError {}
impl CorralError for regex::Error {}
