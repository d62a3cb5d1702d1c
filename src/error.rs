use thiserror::Error;

/// Whitelist engine error types
#[derive(Error, Debug)]
pub enum WhitelistError {
    #[error("Parse error at line {line}: {message}")]
    ParseErrorAtLine { line: usize, message: String },

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Resolve error: {0}")]
    ResolveError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WhitelistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_at_line_display() {
        let err = WhitelistError::ParseErrorAtLine {
            line: 7,
            message: "Invalid CIDR: example.com/24".into(),
        };
        let display = format!("{}", err);
        assert!(display.contains("line 7"), "got: {}", display);
        assert!(display.contains("example.com/24"), "got: {}", display);
    }

    #[test]
    fn test_resolve_error_is_matchable() {
        let err = WhitelistError::ResolveError("no such host".into());
        match &err {
            WhitelistError::ResolveError(msg) => assert!(msg.contains("no such host")),
            _ => panic!("expected ResolveError"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WhitelistError = io.into();
        assert!(matches!(err, WhitelistError::IoError(_)));
    }
}
