use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{Role, UserStatus, UserView};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: u64,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub status: UserStatus,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<UserView> for UserResponse {
    fn from(view: UserView) -> Self {
        Self {
            id: view.id,
            email: view.email,
            phone: view.phone,
            role: view.role,
            status: view.status,
            first_name: view.first_name,
            last_name: view.last_name,
            avatar_url: view.avatar_url,
            last_login_at: view.last_login_at,
        }
    }
}
