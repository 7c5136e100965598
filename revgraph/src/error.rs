use std::fmt;

/// Result type used throughout the crate.
pub type CResult<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing versioned graph data.
///
/// `NotFound` and `Branch` surface to callers directly. `Integrity` is
/// normally handled internally by reissuing the failed insert as an update.
/// `Persistence` means the connection is gone; the engine must be discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A key, node or edge has no value at the queried (branch, rev).
    /// A never-set key and a deleted key both end up here; they differ
    /// only in the message text.
    NotFound(String),
    /// Unknown branch, illegal parent revision, or a cursor move that
    /// would leave the branch's extent.
    Branch(String),
    /// An argument the caller got wrong, e.g. a revision that would
    /// rewrite history behind a strict window.
    Value(String),
    /// A uniqueness constraint fired in the database.
    Integrity(String),
    /// Connection-level database failure.
    Persistence(String),
    /// Encoding or decoding of a stored value failed.
    Parse(String),
    /// Anything else.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Branch(msg) => write!(f, "Branch error: {}", msg),
            Error::Value(msg) => write!(f, "Value error: {}", msg),
            Error::Integrity(msg) => write!(f, "Integrity violation: {}", msg),
            Error::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, ref msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Integrity(match msg {
                    Some(m) => m.clone(),
                    None => e.to_string(),
                })
            }
            other => Error::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::NotFound("key x never set".into()).to_string(),
            "Not found: key x never set"
        );
        assert_eq!(
            Error::Branch("no branch b1".into()).to_string(),
            "Branch error: no branch b1"
        );
    }

    #[test]
    fn from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        match Error::from(err) {
            Error::Parse(_) => {}
            other => panic!("expected Parse, got {:?}", other),
        }
    }
}
