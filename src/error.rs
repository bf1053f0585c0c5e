use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level failure; usually the relay is down or misconfigured.
    #[error("Connection error: possible CORS problem or server unavailable: {0}")]
    Connectivity(#[from] reqwest::Error),

    #[error("Failed to obtain access token: {status} {body}")]
    Authentication { status: StatusCode, body: String },

    #[error("Failed to fetch pedidos{}: {status} {body}", retry_suffix(.retried))]
    Request {
        status: StatusCode,
        body: String,
        retried: bool,
    },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Relay server error: {0}")]
    Server(String),
}

fn retry_suffix(retried: &bool) -> &'static str {
    if *retried {
        " (retry)"
    } else {
        ""
    }
}

impl AppError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AppError::Connectivity(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, AppError::Authentication { .. })
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Authentication { status, .. } | AppError::Request { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

// Serialize as the display string so errors can go straight into JSON bodies
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_mentions_retry() {
        let first = AppError::Request {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
            retried: false,
        };
        let second = AppError::Request {
            status: StatusCode::UNAUTHORIZED,
            body: "denied".to_string(),
            retried: true,
        };

        assert_eq!(
            first.to_string(),
            "Failed to fetch pedidos: 500 Internal Server Error boom"
        );
        assert_eq!(
            second.to_string(),
            "Failed to fetch pedidos (retry): 401 Unauthorized denied"
        );
        assert_eq!(second.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_serialize_as_message() {
        let err = AppError::Config("prefix must start with '/'".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Configuration error: prefix must start with '/'\"");
        assert!(!err.is_connectivity());
        assert!(err.status().is_none());
    }
}
