use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("llm.top_p = 2 is out of range [0, 1]".into());
        assert_eq!(
            err.to_string(),
            "config validation error: llm.top_p = 2 is out of range [0, 1]"
        );
    }

    #[test]
    fn portal_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let portal_err: PortalError = config_err.into();
        assert!(matches!(portal_err, PortalError::Config(_)));
        assert!(portal_err.to_string().contains("bad toml"));
    }

    #[test]
    fn portal_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let portal_err: PortalError = io_err.into();
        assert!(matches!(portal_err, PortalError::Io(_)));
        assert!(portal_err.to_string().contains("stdout closed"));
    }

    #[test]
    fn portal_error_other_variants() {
        let err = PortalError::Inference("upstream unavailable: connection refused".into());
        assert_eq!(
            err.to_string(),
            "inference error: upstream unavailable: connection refused"
        );

        let err = PortalError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
