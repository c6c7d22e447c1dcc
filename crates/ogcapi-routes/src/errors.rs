//! Route encoding error types.

use thiserror::Error;

/// Errors that abort a route encoding pass.
///
/// None of these ever result in partial output: the sink only receives bytes
/// after a pass completed successfully.
#[derive(Debug, Error)]
pub enum RouteEncodingError {
    /// A segment feature carried no usable line geometry.
    #[error("Route segment {index} has no line geometry: {reason}")]
    GeometryMissing { index: usize, reason: String },

    /// The stream ended without a single segment.
    #[error("No route found")]
    NoRouteFound,

    /// A token arrived that is not valid in the current encoder state.
    #[error("Unexpected token {token} in state {state}")]
    UnexpectedToken {
        token: &'static str,
        state: &'static str,
    },

    /// The upstream token source failed or ended prematurely.
    #[error("Upstream feature stream failed: {0}")]
    Upstream(String),

    /// Serializing the route document failed.
    #[error("Failed to format route: {0}")]
    Format(String),

    /// The output sink rejected the payload.
    #[error("Failed to write route: {0}")]
    Sink(String),
}

impl RouteEncodingError {
    /// Whether the error is caused by the input data rather than the server.
    pub fn is_unprocessable(&self) -> bool {
        matches!(
            self,
            RouteEncodingError::GeometryMissing { .. } | RouteEncodingError::NoRouteFound
        )
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RouteEncodingError::GeometryMissing { .. } | RouteEncodingError::NoRouteFound => 422,
            RouteEncodingError::Upstream(_) => 502,
            RouteEncodingError::UnexpectedToken { .. }
            | RouteEncodingError::Format(_)
            | RouteEncodingError::Sink(_) => 500,
        }
    }
}

impl From<serde_json::Error> for RouteEncodingError {
    fn from(err: serde_json::Error) -> Self {
        RouteEncodingError::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(RouteEncodingError::NoRouteFound.status_code(), 422);
        assert_eq!(
            RouteEncodingError::GeometryMissing {
                index: 3,
                reason: "absent".to_string()
            }
            .status_code(),
            422
        );
        assert_eq!(
            RouteEncodingError::Upstream("client disconnected".to_string()).status_code(),
            502
        );
        assert_eq!(
            RouteEncodingError::Format("bad".to_string()).status_code(),
            500
        );
    }

    #[test]
    fn test_unprocessable() {
        assert!(RouteEncodingError::NoRouteFound.is_unprocessable());
        assert!(!RouteEncodingError::Sink("closed".to_string()).is_unprocessable());
    }

    #[test]
    fn test_error_display() {
        let err = RouteEncodingError::GeometryMissing {
            index: 2,
            reason: "no geometry property".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("segment 2"));
        assert!(display.contains("no geometry property"));
    }
}
