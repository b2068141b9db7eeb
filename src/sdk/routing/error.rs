use serde::Deserialize;
use thiserror::Error;

// Helper struct to parse the JSON error body OSRM sends with non-2xx statuses
#[derive(Deserialize, Debug)]
pub struct OsrmErrorPayload {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("No route between the requested points")]
    NoRoute,

    // Structured error from the routing service
    #[error("API Error ({code}): {message}")]
    ApiError { code: String, message: String },

    // Non-success status whose body isn't the expected JSON
    #[error("Unstructured API Error (HTTP {status}): {body}")]
    RawApiError { status: u16, body: String },

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl RoutingError {
    /// Maps a non-success response body onto the most specific variant.
    pub fn from_response(status: u16, body: String) -> Self {
        match serde_json::from_str::<OsrmErrorPayload>(&body) {
            Ok(payload) if payload.code == "NoRoute" => RoutingError::NoRoute,
            Ok(payload) => RoutingError::ApiError {
                code: payload.code,
                message: payload.message,
            },
            Err(_) => RoutingError::RawApiError { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_bodies_are_recognised() {
        let no_route = RoutingError::from_response(400, r#"{"code":"NoRoute","message":"Impossible route"}"#.into());
        assert!(matches!(no_route, RoutingError::NoRoute));

        let api = RoutingError::from_response(400, r#"{"code":"InvalidQuery","message":"bad"}"#.into());
        assert!(matches!(api, RoutingError::ApiError { ref code, .. } if code == "InvalidQuery"));

        let raw = RoutingError::from_response(500, "<html>oops</html>".into());
        assert!(matches!(raw, RoutingError::RawApiError { status: 500, .. }));
    }
}
