use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Stored refresh-token record. Only the SHA-256 hash of the opaque value
/// lands here; a record is live while revoked_at is NULL and expires_at is
/// in the future.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: u64,
    pub user_id: u64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: u64,
    pub user_id: u64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Logout,
    /// One token rotated away by a successful refresh.
    Rotated,
    /// All of a user's tokens displaced by a fresh login or password reset.
    Rotation,
    Expired,
    UserMissing,
}

impl RevocationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::Rotated => "rotated",
            RevocationReason::Rotation => "rotation",
            RevocationReason::Expired => "expired",
            RevocationReason::UserMissing => "user_missing",
        }
    }
}
