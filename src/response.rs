use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Uniform success envelope. Every route returns either this or an
/// `ApiError`, so clients can always branch on `success`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data) }
    }
}

impl ApiResponse<()> {
    /// Envelope with no payload, for deletes and status toggles.
    pub fn empty() -> Self {
        Self { success: true, data: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_serializes_success_and_data() {
        let body = serde_json::to_value(ApiResponse::ok(serde_json::json!({"id": 7}))).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 7);
    }

    #[test]
    fn empty_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::empty()).unwrap();
        assert_eq!(body["success"], true);
        assert!(body.get("data").is_none());
    }
}
