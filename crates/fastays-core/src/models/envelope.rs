use serde::{Deserialize, Serialize};

/// Response envelope returned by every Fastays endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }

    /// Message to show the user, falling back to `default` when the server sent none.
    pub fn message_or(&self, default: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_without_message() {
        let json = r#"{"success": true, "data": 42}"#;
        let resp: ApiResponse<i32> = serde_json::from_str(json).expect("Failed to parse envelope");
        assert!(resp.success);
        assert_eq!(resp.data, 42);
        assert_eq!(resp.message, None);
        assert_eq!(resp.message_or("fallback"), "fallback");
    }

    #[test]
    fn test_message_or_ignores_empty_message() {
        let resp = ApiResponse {
            success: false,
            data: (),
            message: Some(String::new()),
        };
        assert_eq!(resp.message_or("Verification failed"), "Verification failed");
    }
}
