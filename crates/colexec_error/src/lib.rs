use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Broad classification of an error.
///
/// Every error produced by the columnar core is fatal to the block or function
/// call that produced it. Callers match on the kind to handle specific
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Argument types can't produce a return type for a function.
    IllegalArgumentType,
    /// The runtime representation of a column doesn't match anything the
    /// function implementation supports.
    IllegalColumn,
    /// Array columns of one nested structure disagree on per-row sizes, or
    /// columns in a block have differing lengths.
    SizeMismatch,
    /// A function was called with the wrong number of arguments.
    ArgumentCountMismatch,
    /// A column name is invalid or collides with another name.
    InvalidName,
    /// No function registered under the requested name.
    UnknownFunction,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalArgumentType => write!(f, "Illegal argument type"),
            Self::IllegalColumn => write!(f, "Illegal column"),
            Self::SizeMismatch => write!(f, "Size mismatch"),
            Self::ArgumentCountMismatch => write!(f, "Argument count mismatch"),
            Self::InvalidName => write!(f, "Invalid name"),
            Self::UnknownFunction => write!(f, "Unknown function"),
            Self::Other => write!(f, "Error"),
        }
    }
}

#[derive(Debug)]
pub struct DbError {
    inner: Box<DbErrorInner>,
}

#[derive(Debug)]
struct DbErrorInner {
    msg: String,
    kind: ErrorKind,
    source: Option<Box<dyn Error + Send + Sync>>,
    fields: Vec<(String, String)>,
    backtrace: Backtrace,
}

impl DbError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        DbError {
            inner: Box::new(DbErrorInner {
                msg: msg.into(),
                kind,
                source: None,
                fields: Vec::new(),
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    /// Attach an additional diagnostic field to the error.
    pub fn with_field(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.inner.fields.push((key.into(), value.to_string()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.inner.kind == kind
    }

    pub fn get_msg(&self) -> &str {
        self.inner.msg.as_str()
    }

    /// Get the value of a field that was attached to this error.
    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_backtrace(&self) -> &Backtrace {
        &self.inner.backtrace
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.inner.kind, self.inner.msg)?;

        for (key, value) in &self.inner.fields {
            write!(f, "\n  {key}: {value}")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if self.inner.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nBacktrace: {}", self.inner.backtrace)?;
        }

        Ok(())
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for DbError {
    fn from(value: fmt::Error) -> Self {
        DbError::with_source("Format error", Box::new(value))
    }
}

/// Return a "not implemented" error with the given feature description.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::DbError::new(format!("Not yet implemented: {msg}")));
    }};
}

/// Extension trait for wrapping foreign errors with a message.
pub trait ResultExt<T, E> {
    fn context(self, msg: &'static str) -> Result<T>;

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(f(), Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Error if the option is None, using `msg` to describe what was required.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(DbError::new(format!("Missing required value: {msg}"))),
        }
    }
}
