//! JSON response envelope shared by every service: `{status, message, data}`.

use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Unwrap the payload of a successful envelope.
    pub fn into_data(self) -> Option<T> {
        if self.is_success() { self.data } else { None }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn error(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: message.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::success("ok", 42)).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "ok");
        assert_eq!(body["data"], 42);
    }

    #[test]
    fn test_error_envelope_has_no_data() {
        let envelope: ApiResponse<u32> =
            serde_json::from_str(r#"{"status":"error","message":"boom","data":null}"#).unwrap();
        assert!(!envelope.is_success());
        assert_eq!(envelope.into_data(), None);
    }
}
