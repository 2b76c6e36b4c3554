use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Provider,
    ServiceAdmin,
    CategoryAdmin,
    MasterAdmin,
    SuperAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Suspended,
    Deleted,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User joined with their profile row, the shape embedded in auth responses
/// and served by /users/me. Never carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserView {
    pub id: u64,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Column values for the users insert; the id comes back from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}
