/// Unified error types for the agent gate
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gate
#[derive(Error, Debug)]
pub enum GateError {
    /// No agent identifier header on the request
    #[error("Agent identity required")]
    MissingIdentity { register_url: String },

    /// Identifier present but the remote service did not verify it
    #[error("Agent not verified: {did}")]
    NotVerified { did: String, register_url: String },

    /// Verified but below the required reputation threshold
    #[error("Insufficient reputation: {actual} < {required}")]
    InsufficientReputation {
        required: f64,
        actual: f64,
        did: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Gate rejection response format
#[derive(Debug, Serialize, Deserialize)]
pub struct GateErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_reputation: Option<f64>,
}

/// Convert GateError to HTTP response
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GateError::MissingIdentity { register_url } => (
                StatusCode::UNAUTHORIZED,
                GateErrorResponse {
                    error: "Agent identity required".to_string(),
                    message: "Include X-Agent-DID header with your agent's DID".to_string(),
                    did: None,
                    register_url: Some(register_url),
                    your_reputation: None,
                },
            ),
            GateError::NotVerified { did, register_url } => (
                StatusCode::UNAUTHORIZED,
                GateErrorResponse {
                    error: "Agent not verified".to_string(),
                    message: "The provided DID is not registered or verified".to_string(),
                    did: Some(did),
                    register_url: Some(register_url),
                    your_reputation: None,
                },
            ),
            GateError::InsufficientReputation {
                required,
                actual,
                did,
            } => (
                StatusCode::FORBIDDEN,
                GateErrorResponse {
                    error: "Insufficient reputation".to_string(),
                    message: format!("This endpoint requires minimum {} reputation", required),
                    did: Some(did),
                    register_url: None,
                    your_reputation: Some(actual),
                },
            ),
            GateError::Config(_) | GateError::Cache(_) | GateError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GateErrorResponse {
                    error: "InternalServerError".to_string(),
                    message: "Internal server error".to_string(), // Don't leak details
                    did: None,
                    register_url: None,
                    your_reputation: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(error: GateError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_identity_is_401_with_register_url() {
        let (status, body) = response_json(GateError::MissingIdentity {
            register_url: "https://id.example/".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Agent identity required");
        assert_eq!(
            body["message"],
            "Include X-Agent-DID header with your agent's DID"
        );
        assert_eq!(body["register_url"], "https://id.example/");
        assert!(body.get("did").is_none());
        assert!(body.get("your_reputation").is_none());
    }

    #[tokio::test]
    async fn not_verified_is_401_with_did() {
        let (status, body) = response_json(GateError::NotVerified {
            did: "did:agent:abc".to_string(),
            register_url: "https://id.example/".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Agent not verified");
        assert_eq!(body["did"], "did:agent:abc");
        assert_eq!(body["register_url"], "https://id.example/");
    }

    #[tokio::test]
    async fn insufficient_reputation_is_403_with_actual_value() {
        let (status, body) = response_json(GateError::InsufficientReputation {
            required: 4.0,
            actual: 2.5,
            did: "did:agent:abc".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Insufficient reputation");
        assert_eq!(body["message"], "This endpoint requires minimum 4 reputation");
        assert_eq!(body["your_reputation"], 2.5);
        assert_eq!(body["did"], "did:agent:abc");
        assert!(body.get("register_url").is_none());
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_detail() {
        let (status, body) =
            response_json(GateError::Cache("redis connection refused".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("redis"));
    }
}
