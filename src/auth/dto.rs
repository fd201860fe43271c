use serde::{Deserialize, Serialize};

/// Request body for user registration. A matching `admin_token` elevates the
/// new account to the admin role.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub admin_token: Option<String>,
}

/// Form body for login. Accepts either the password-grant field name
/// (`username`) or a plain `email` field.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

impl LoginForm {
    pub fn identifier(&self) -> Option<&str> {
        self.username.as_deref().or(self.email.as_deref())
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
        }
    }
}
