use serde::{Deserialize, Serialize};

/// JSON envelope shared by every API route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T, E = T> {
    success: bool,
    data: Option<T>,
    error_data: Option<E>,
    message: Option<String>,
}

impl<T, E> ApiResponse<T, E> {
    /// Creates a successful response, with `data` and no message.
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            error_data: None,
        }
    }

    /// Creates a successful response carrying a human-readable message.
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error_data: None,
        }
    }

    /// Creates an error response, with `message` and no data.
    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error_data: None,
        }
    }

    /// Creates an error response that still carries a payload for the client.
    pub fn error_with_data(message: &str, data: E) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error_data: Some(data),
            message: Some(message.to_string()),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_with_data_keeps_payload_and_marks_failure() {
        let response: ApiResponse<(), String> =
            ApiResponse::error_with_data("not stored", "event text".to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "not stored");
        assert!(json["data"].is_null());
        assert_eq!(json["error_data"], "event text");
    }
}
