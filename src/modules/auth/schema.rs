use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::modules::users::schema::UserResponse;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-]{8,20}$").unwrap());

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_phone", message = "Invalid phone format"))]
    pub phone: String,
    #[validate(length(min = 8, max = 64, message = "Password must be 8-64 characters"))]
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Registration role resolved once at the boundary; the role-specific
/// payload travels with the variant so nothing downstream re-inspects
/// role strings.
#[derive(Debug, Clone)]
pub enum RegistrationRole {
    Customer,
    Provider { business_name: String },
    ServiceAdmin { department: Option<String> },
    SuperAdmin { notes: Option<String> },
}

impl RegisterRequest {
    /// None when the role is not open for self-registration.
    pub fn registration_role(&self) -> Option<RegistrationRole> {
        match self.role.as_str() {
            "customer" => Some(RegistrationRole::Customer),
            "provider" => Some(RegistrationRole::Provider {
                business_name: self
                    .business_name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| format!("{} {}", self.first_name, self.last_name)),
            }),
            "service_admin" => Some(RegistrationRole::ServiceAdmin {
                department: self.department.clone().filter(|d| !d.trim().is_empty()),
            }),
            "super_admin" => Some(RegistrationRole::SuperAdmin {
                notes: self.admin_notes.clone().filter(|n| !n.trim().is_empty()),
            }),
            _ => None,
        }
    }
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// =============================================================================
// REFRESH / LOGOUT
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// =============================================================================
// GOOGLE LOGIN
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct GoogleLoginRequest {
    #[validate(length(min = 10, message = "Missing Google credential"))]
    pub credential: String,
}

// =============================================================================
// PASSWORD RESET
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
    // Development-only testing aid; never populated in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(equal = 32, message = "Invalid reset token"))]
    pub token: String,
    #[validate(length(min = 8, max = 64, message = "Password must be 8-64 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// SESSION RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserResponse,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}
