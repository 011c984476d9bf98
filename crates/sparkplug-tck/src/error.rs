use thiserror::Error;

pub type Result<T> = std::result::Result<T, TckError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TckError {
    #[error("Unknown scenario: {profile}.{name}")]
    UnknownScenario { profile: String, name: String },

    #[error("Invalid parameters for {scenario}: {reason}")]
    InvalidParameters { scenario: String, reason: String },

    #[error("Invalid control command: {0}")]
    InvalidControlCommand(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<std::io::Error> for TckError {
    fn from(err: std::io::Error) -> Self {
        TckError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for TckError {
    fn from(err: toml::de::Error) -> Self {
        TckError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TckError::UnknownScenario {
            profile: "host".to_string(),
            name: "Nope".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown scenario: host.Nope");

        let err = TckError::InvalidParameters {
            scenario: "Host SessionTermination".to_string(),
            reason: "expected 2 parameters, got 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameters for Host SessionTermination: expected 2 parameters, got 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TckError = io.into();
        assert!(matches!(err, TckError::Io(msg) if msg.contains("missing")));
    }
}
