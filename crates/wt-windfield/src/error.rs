//! Error types for wind field I/O.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WindFieldError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header: {what}")]
    InvalidHeader { what: String },

    #[error("Shape mismatch for {what}: expected {expected} values, got {actual}")]
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type WindFieldResult<T> = Result<T, WindFieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WindFieldError::Shape {
            what: "velocity",
            expected: 12,
            actual: 10,
        };
        assert!(err.to_string().contains("expected 12"));
    }

    #[test]
    fn io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        let err: WindFieldError = io.into();
        assert!(matches!(err, WindFieldError::Io(_)));
    }
}
