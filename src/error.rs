use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the price list pipeline and its collaborators.
///
/// Every variant aborts the current invocation. Rows the transformer cannot
/// use are reported as [`crate::transform::TransformWarning`] instead.
#[derive(Debug, Error)]
pub enum ApotekError {
    /// The server rejected the cookie.
    #[error("authentication rejected by {url} (HTTP {status}); update the cookie with `apotek-tools auth cookie --set`")]
    Authentication { status: u16, url: String },

    /// Connection, timeout or body transfer failure.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered but not with a drug list.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The spreadsheet could not be produced at `path`.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Missing or malformed credential/config data.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading or writing a credential/config file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ApotekError>;

impl ApotekError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        Self::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_message_mentions_status_and_hint() {
        let err = ApotekError::Authentication {
            status: 401,
            url: "https://example.test/api/drugs".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("auth cookie --set"));
    }

    #[test]
    fn test_write_error_names_destination() {
        let err = ApotekError::write(
            "/nope/out.xlsx",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/nope/out.xlsx"));
    }
}
