//! From trait implementations for RewindError conversions

use super::types::RewindError;

impl From<std::io::Error> for RewindError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(error.to_string()),
            _ => Self::io(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for RewindError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<base64::DecodeError> for RewindError {
    fn from(error: base64::DecodeError) -> Self {
        Self::encoding(format!("Invalid base64 payload: {}", error))
    }
}

impl From<std::string::FromUtf8Error> for RewindError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::encoding(format!("Invalid UTF-8 content: {}", error))
    }
}

impl From<toml::de::Error> for RewindError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse configuration: {}", error))
    }
}
