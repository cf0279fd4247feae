use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl User {
    /// Name to greet the user with; falls back to the email address.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"user":{"id":"1","email":"demo@fastays.com","name":"Demo User","avatar":"https://i.pravatar.cc/150?img=1","createdAt":"2024-11-01T10:00:00Z"},"token":"abc","refreshToken":"def"}"#;

        let resp: LoginResponse = serde_json::from_str(json).expect("Failed to parse login response");
        assert_eq!(resp.token, "abc");
        assert_eq!(resp.refresh_token, "def");
        assert_eq!(resp.user.display_name(), "Demo User");
        assert_eq!(resp.user.phone_number, None);
    }

    #[test]
    fn test_verify_request_uses_camel_case() {
        let req = VerifyOtpRequest {
            phone_number: "5551234567".to_string(),
            otp: "1234".to_string(),
        };
        let value = serde_json::to_value(&req).expect("Failed to serialize request");
        assert_eq!(value["phoneNumber"], "5551234567");
        assert_eq!(value["otp"], "1234");
    }
}
