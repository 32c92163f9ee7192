//! Error taxonomy and the diagnostics carrier attached to conversion failures.
use std::fmt;

/// Ordered key/value diagnostics attached to a failed conversion.
///
/// Entries are appended by the driver (structural context), by converters and
/// parent values implementing [`ErrorReporter`](crate::convert::ErrorReporter),
/// and by the tree cursor (position information). Duplicate keys are kept and
/// disambiguated with a numeric suffix, so no context is lost while the error
/// travels up through nested conversion frames.
#[derive(Debug)]
pub struct ConversionError {
    msg: String,
    cause: Option<Box<Error>>,
    entries: Vec<(String, String)>,
}

impl ConversionError {
    /// Create a conversion error with the given message and no entries yet.
    pub fn new<S: Into<String>>(msg: S) -> Self {
        ConversionError {
            msg: msg.into(),
            cause: None,
            entries: Vec::new(),
        }
    }

    /// Wrap an arbitrary error raised inside a converter.
    ///
    /// The wrapped error becomes the cause; its rendering becomes the message.
    ///
    /// Called by:
    /// - The driver when a converter fails with anything that is not already
    ///   a structured conversion error.
    pub(crate) fn wrapping(cause: Error) -> Self {
        ConversionError {
            msg: cause.to_string(),
            cause: Some(Box::new(cause)),
            entries: Vec::new(),
        }
    }

    /// Append a diagnostic entry.
    ///
    /// A key that is already present is stored as `key[n]` with `n` counting
    /// up from 1, preserving every occurrence in insertion order.
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let occupied = self
            .entries
            .iter()
            .filter(|(k, _)| {
                *k == key || (k.starts_with(&key) && k[key.len()..].starts_with('['))
            })
            .count();
        let key = if occupied == 0 {
            key
        } else {
            format!("{key}[{occupied}]")
        };
        self.entries.push((key, value.into()));
    }

    /// Look up the first entry stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The headline message (without the debugging-information block).
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// The wrapped cause, when this error was produced from another one.
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)?;
        if !self.entries.is_empty() {
            write!(f, "\n---- debugging information ----")?;
            for (key, value) in &self.entries {
                write!(f, "\n{key:<24}: {value}")?;
            }
            write!(f, "\n-------------------------------")?;
        }
        Ok(())
    }
}

/// Errors produced while marshalling or unmarshalling a tree.
#[derive(Debug)]
pub enum Error {
    /// No registered converter reported itself capable of the resolved type.
    NoConverterFound { type_name: &'static str },
    /// An explicitly supplied converter cannot handle the resolved type.
    /// This is a caller contract violation, never retried.
    ConverterMismatch(ConversionError),
    /// A converter failed; carries the structural context collected while the
    /// failure travelled out of the conversion frames.
    Conversion(ConversionError),
    /// An element or alias name could not be resolved to a registered type.
    UnknownAlias { name: String },
    /// The type being marshalled has no serialized name registered.
    MissingAlias { type_name: &'static str },
    /// A produced value was not of the type the caller expected.
    TypeMismatch { expected: &'static str },
    /// The tree cursor was navigated outside the document structure.
    Tree { msg: String },
    /// A path-stack accessor was queried outside an active conversion.
    /// A defect in the driver or in a converter, not a document error.
    EmptyStack { what: &'static str },
    /// Free-form failure raised by a converter.
    Message { msg: String },
}

impl Error {
    /// Construct a free-form `Message` error.
    ///
    /// Called by:
    /// - Converters for value-level failures (parse errors and the like).
    pub fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message { msg: s.into() }
    }

    /// Construct a `Conversion` error with the given headline message.
    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        Error::Conversion(ConversionError::new(msg))
    }

    /// Construct a `Tree` cursor-navigation error.
    pub(crate) fn tree<S: Into<String>>(msg: S) -> Self {
        Error::Tree { msg: msg.into() }
    }

    /// The structured diagnostics, when this error carries them.
    pub fn details(&self) -> Option<&ConversionError> {
        match self {
            Error::Conversion(details) | Error::ConverterMismatch(details) => Some(details),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoConverterFound { type_name } => {
                write!(f, "no converter available for type {type_name}")
            }
            Error::ConverterMismatch(details) | Error::Conversion(details) => {
                write!(f, "{details}")
            }
            Error::UnknownAlias { name } => {
                write!(f, "cannot resolve `{name}` to a registered type")
            }
            Error::MissingAlias { type_name } => {
                write!(f, "no serialized name registered for type {type_name}")
            }
            Error::TypeMismatch { expected } => {
                write!(f, "produced value is not of the expected type {expected}")
            }
            Error::Tree { msg } => write!(f, "tree cursor error: {msg}"),
            Error::EmptyStack { what } => {
                write!(f, "internal error: {what} queried outside an active conversion")
            }
            Error::Message { msg } => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Conversion(details) | Error::ConverterMismatch(details) => details
                .cause()
                .map(|cause| cause as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}
