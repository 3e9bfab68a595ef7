//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when collecting metrics from adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Response body is not a valid status document.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A status entry is missing a key or carries the wrong type.
    #[error("Unexpected shape in {section} entry: key '{key}' must be {expected}")]
    Shape {
        /// Section the offending entry belongs to.
        section: &'static str,
        /// Offending key.
        key: String,
        /// Expected JSON type.
        expected: &'static str,
    },
}

/// Coarse classification of an [`AdapterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fetching the status document failed.
    Transport,
    /// The body could not be decoded into a status document.
    Decode,
    /// A decoded entry did not have the expected keys or types.
    Shape,
}

impl AdapterError {
    /// Build a shape error for `key` in `section`.
    pub fn shape(section: &'static str, key: impl Into<String>, expected: &'static str) -> Self {
        AdapterError::Shape {
            section,
            key: key.into(),
            expected,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Http(_) | AdapterError::Connection(_) | AdapterError::Timeout => {
                ErrorKind::Transport
            }
            AdapterError::Decode(_) => ErrorKind::Decode,
            AdapterError::Shape { .. } => ErrorKind::Shape,
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Decode(err.to_string())
    }
}

#[cfg(feature = "mgd")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(AdapterError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(
            AdapterError::Connection("refused".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(AdapterError::Decode("eof".into()).kind(), ErrorKind::Decode);
        assert_eq!(
            AdapterError::shape("upstream", "tr-percentiles", "an object").kind(),
            ErrorKind::Shape
        );
    }

    #[test]
    fn test_shape_message_names_key() {
        let err = AdapterError::shape("downsteram", "name", "a string");
        assert_eq!(
            err.to_string(),
            "Unexpected shape in downsteram entry: key 'name' must be a string"
        );
    }

    #[test]
    fn test_from_json_error() {
        let err: AdapterError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
