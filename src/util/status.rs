use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    Ok,
    InvalidPath,
    BucketNotFound,
    TxNotWritable,
    DatabaseReadOnly,
    InvalidCursorPosition,
    InvalidArgument,
    IOError,
    Corruption,
}

#[derive(Debug, Clone)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Status {
            code: Code::Ok,
            message: None,
        }
    }

    pub fn invalid_path() -> Self {
        Status {
            code: Code::InvalidPath,
            message: None,
        }
    }

    pub fn bucket_not_found(msg: impl Into<String>) -> Self {
        Status {
            code: Code::BucketNotFound,
            message: Some(msg.into()),
        }
    }

    pub fn tx_not_writable() -> Self {
        Status {
            code: Code::TxNotWritable,
            message: None,
        }
    }

    pub fn database_read_only() -> Self {
        Status {
            code: Code::DatabaseReadOnly,
            message: None,
        }
    }

    pub fn invalid_cursor_position() -> Self {
        Status {
            code: Code::InvalidCursorPosition,
            message: None,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status {
            code: Code::InvalidArgument,
            message: Some(msg.into()),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status {
            code: Code::IOError,
            message: Some(msg.into()),
        }
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status {
            code: Code::Corruption,
            message: Some(msg.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    pub fn is_invalid_path(&self) -> bool {
        self.code == Code::InvalidPath
    }

    pub fn is_bucket_not_found(&self) -> bool {
        self.code == Code::BucketNotFound
    }

    pub fn is_tx_not_writable(&self) -> bool {
        self.code == Code::TxNotWritable
    }

    pub fn is_database_read_only(&self) -> bool {
        self.code == Code::DatabaseReadOnly
    }

    pub fn is_invalid_cursor_position(&self) -> bool {
        self.code == Code::InvalidCursorPosition
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == Code::InvalidArgument
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::corruption(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ok() {
        let status = Status::ok();
        assert!(status.is_ok());
        assert_eq!(status.code(), &Code::Ok);
    }

    #[test]
    fn test_status_bucket_not_found() {
        let status = Status::bucket_not_found("bucket 'users' does not exist");
        assert!(status.is_bucket_not_found());
        assert_eq!(status.message(), Some("bucket 'users' does not exist"));
    }

    #[test]
    fn test_status_without_message() {
        let status = Status::tx_not_writable();
        assert!(status.is_tx_not_writable());
        assert_eq!(status.message(), None);
        assert_eq!(status.to_string(), "TxNotWritable");
    }

    #[test]
    fn test_status_display() {
        let status = Status::io_error("disk full");
        assert_eq!(status.to_string(), "IOError: disk full");
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let status: Status = err.into();
        assert!(status.is_io_error());
    }
}
