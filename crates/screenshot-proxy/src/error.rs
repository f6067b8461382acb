//! Error types for the screenshot proxy

use std::fmt;

#[derive(Debug)]
pub enum ProxyError {
    Http(Box<reqwest::Error>),
    Upstream(String),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Http(err) => write!(f, "HTTP error: {}", err),
            ProxyError::Upstream(msg) => write!(f, "Screenshot service error: {}", msg),
            ProxyError::Io(err) => write!(f, "IO error: {}", err),
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Http(err) => Some(err.as_ref()),
            ProxyError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Http(Box::new(err))
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(Box::new(err))
    }
}

impl From<screenshot_cache::CacheError> for ProxyError {
    fn from(err: screenshot_cache::CacheError) -> Self {
        match err {
            screenshot_cache::CacheError::Io(err) => ProxyError::Io(err),
            other => ProxyError::Config(other.to_string()),
        }
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display() {
        let err = ProxyError::Upstream("status 502".to_string());
        assert_eq!(format!("{}", err), "Screenshot service error: status 502");
    }

    #[test]
    fn test_config_error_display() {
        let err = ProxyError::Config("invalid SCREENSHOT_API_URL".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: invalid SCREENSHOT_API_URL"
        );
    }

    #[test]
    fn test_cache_io_error_converts() {
        let cache_err = screenshot_cache::CacheError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only filesystem",
        ));
        let err = ProxyError::from(cache_err);
        assert!(matches!(err, ProxyError::Io(_)));
        assert!(format!("{}", err).contains("read-only filesystem"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = ProxyError::Upstream("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Upstream"));
    }
}
