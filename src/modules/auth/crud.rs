use axum::http::StatusCode;
use chrono::Utc;
use sqlx::{Executor, MySql};

use crate::config::DbPool;
use crate::modules::users::crud::UserCrud;
use crate::modules::users::model::{NewProfile, NewUser, Role, User, UserStatus, UserView};
use crate::services::google::{GoogleTokenVerifier, GoogleVerifyError};
use crate::services::hashing;
use crate::services::jwt::{self, JwtService};

use super::model::{PasswordResetToken, RefreshToken, RevocationReason};
use super::schema::{RegisterRequest, RegistrationRole};

// =============================================================================
// AUTH ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unsupported registration role")]
    InvalidRole,
    #[error("Email already registered")]
    EmailExists,
    #[error("Phone already registered")]
    PhoneExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is not active")]
    Inactive,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token not recognized")]
    RefreshNotFound,
    #[error("Refresh token expired")]
    RefreshExpired,
    #[error("User not found")]
    UserNotFound,
    #[error("Reset token is invalid or has expired")]
    ResetTokenInvalid,
    #[error("Reset token is invalid or has expired")]
    ResetTokenUsed,
    #[error("Reset token is invalid or has expired")]
    ResetTokenExpired,
    #[error("Google sign-in is not configured")]
    GoogleDisabled,
    #[error("Invalid Google credential")]
    GoogleInvalid,
    #[error("Google account is missing email")]
    GoogleEmailRequired,
    #[error("Google account email is not verified")]
    GoogleEmailNotVerified,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Hashing error: {0}")]
    Hashing(String),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidRole => "AUTH_INVALID_ROLE",
            AuthError::EmailExists => "AUTH_EMAIL_EXISTS",
            AuthError::PhoneExists => "AUTH_PHONE_EXISTS",
            AuthError::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            AuthError::Inactive => "AUTH_INACTIVE",
            AuthError::InvalidRefreshToken => "AUTH_INVALID_REFRESH_TOKEN",
            AuthError::RefreshNotFound => "AUTH_REFRESH_NOT_FOUND",
            AuthError::RefreshExpired => "AUTH_REFRESH_EXPIRED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::ResetTokenInvalid => "AUTH_RESET_TOKEN_INVALID",
            AuthError::ResetTokenUsed => "AUTH_RESET_TOKEN_USED",
            AuthError::ResetTokenExpired => "AUTH_RESET_TOKEN_EXPIRED",
            AuthError::GoogleDisabled => "AUTH_GOOGLE_DISABLED",
            AuthError::GoogleInvalid => "AUTH_GOOGLE_INVALID",
            AuthError::GoogleEmailRequired => "AUTH_GOOGLE_EMAIL_REQUIRED",
            AuthError::GoogleEmailNotVerified => "AUTH_GOOGLE_EMAIL_NOT_VERIFIED",
            AuthError::Database(_) | AuthError::Hashing(_) | AuthError::Token(_) => {
                "UNEXPECTED_ERROR"
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRole => StatusCode::BAD_REQUEST,
            AuthError::EmailExists | AuthError::PhoneExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Inactive => StatusCode::FORBIDDEN,
            AuthError::InvalidRefreshToken
            | AuthError::RefreshNotFound
            | AuthError::RefreshExpired => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::ResetTokenInvalid
            | AuthError::ResetTokenUsed
            | AuthError::ResetTokenExpired => StatusCode::BAD_REQUEST,
            AuthError::GoogleDisabled => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::GoogleInvalid | AuthError::GoogleEmailRequired => StatusCode::BAD_REQUEST,
            AuthError::GoogleEmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::Database(_) | AuthError::Hashing(_) | AuthError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<GoogleVerifyError> for AuthError {
    fn from(_: GoogleVerifyError) -> Self {
        AuthError::GoogleInvalid
    }
}

/// Maps a duplicate-key insert failure onto the matching conflict error.
/// Closes the check-then-insert race: the unique indexes are authoritative.
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(ref db_err) = err {
        let msg = db_err.message();
        if msg.contains("uq_users_email") {
            return AuthError::EmailExists;
        }
        if msg.contains("uq_users_phone") {
            return AuthError::PhoneExists;
        }
    }
    AuthError::Database(err)
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

pub struct SessionResult {
    pub tokens: TokenPair,
    pub user: UserView,
}

// =============================================================================
// AUTH CRUD
// =============================================================================

pub struct AuthCrud<'a> {
    pool: DbPool,
    jwt_service: &'a JwtService,
}

impl<'a> AuthCrud<'a> {
    pub fn new(pool: DbPool, jwt_service: &'a JwtService) -> Self {
        Self { pool, jwt_service }
    }

    fn users(&self) -> UserCrud {
        UserCrud::new(self.pool.clone())
    }

    // =========================================================================
    // TOKEN STORE
    // =========================================================================

    async fn store_refresh_token<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        token_hash: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(token_hash)
            .bind(self.jwt_service.refresh_token_expiry())
            .execute(executor)
            .await?;
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE token_hash = ? AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// Returns how many rows were revoked. Zero means the token was already
    /// spent; rotation callers treat that as a replay.
    async fn revoke_refresh_token<'e, E>(
        &self,
        executor: E,
        token_hash: &str,
        reason: RevocationReason,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW(), revoked_reason = ? WHERE token_hash = ? AND revoked_at IS NULL",
        )
        .bind(reason.as_str())
        .bind(token_hash)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    async fn revoke_user_refresh_tokens<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        reason: RevocationReason,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW(), revoked_reason = ? WHERE user_id = ? AND revoked_at IS NULL",
        )
        .bind(reason.as_str())
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    async fn find_password_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    // =========================================================================
    // TOKEN ISSUANCE
    // =========================================================================

    /// Signs an access token and persists the hash of a freshly minted
    /// refresh token through the given handle. The raw refresh value only
    /// exists in the returned pair.
    async fn issue_tokens<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        role: Role,
    ) -> Result<TokenPair, AuthError>
    where
        E: Executor<'e, Database = MySql>,
    {
        let access_token = self.jwt_service.sign_access_token(user_id, role)?;
        let refresh_token = jwt::mint_refresh_token();
        let token_hash = jwt::hash_token(&refresh_token);
        self.store_refresh_token(executor, user_id, &token_hash)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_duration_secs(),
        })
    }

    async fn session_for(&self, tokens: TokenPair, user_id: u64) -> Result<SessionResult, AuthError> {
        let user = self
            .users()
            .find_view_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(SessionResult { tokens, user })
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthError> {
        let users = self.users();
        let identifier = identifier.trim();
        let user = if identifier.contains('@') {
            users.find_by_email(&identifier.to_lowercase()).await?
        } else {
            users.find_by_phone(identifier).await?
        };
        Ok(user)
    }

    // =========================================================================
    // REGISTER
    // =========================================================================

    pub async fn register(&self, req: &RegisterRequest) -> Result<SessionResult, AuthError> {
        let role = req.registration_role().ok_or(AuthError::InvalidRole)?;

        let users = self.users();
        let email = req.email.trim().to_lowercase();

        if users.email_exists(&email).await? {
            return Err(AuthError::EmailExists);
        }
        if users.phone_exists(&req.phone).await? {
            return Err(AuthError::PhoneExists);
        }

        let password_hash =
            hashing::hash_password(&req.password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let new_user = NewUser {
            email,
            phone: req.phone.clone(),
            password_hash,
            role: match role {
                RegistrationRole::Customer => Role::Customer,
                RegistrationRole::Provider { .. } => Role::Provider,
                RegistrationRole::ServiceAdmin { .. } => Role::ServiceAdmin,
                RegistrationRole::SuperAdmin { .. } => Role::SuperAdmin,
            },
            status: UserStatus::Active,
        };

        let profile = NewProfile {
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            avatar_url: req.avatar_url.clone(),
        };

        let mut tx = self.pool.begin().await?;

        let user_id = users
            .create_user(&mut *tx, &new_user)
            .await
            .map_err(map_unique_violation)?;
        users.create_profile(&mut *tx, user_id, &profile).await?;
        users.create_wallet(&mut *tx, user_id).await?;

        match &role {
            RegistrationRole::Customer => {}
            RegistrationRole::Provider { business_name } => {
                users
                    .create_provider_record(&mut *tx, user_id, business_name)
                    .await?;
            }
            RegistrationRole::ServiceAdmin { department } => {
                users
                    .create_service_admin_record(&mut *tx, user_id, department.as_deref())
                    .await?;
            }
            RegistrationRole::SuperAdmin { notes } => {
                users
                    .create_super_admin_record(&mut *tx, user_id, notes.as_deref())
                    .await?;
            }
        }

        tx.commit().await?;

        // Issued outside the registration transaction: a token failure must
        // not unwind the account, which stays reachable via login.
        let tokens = self.issue_tokens(&self.pool, user_id, new_user.role).await?;
        self.session_for(tokens, user_id).await
    }

    // =========================================================================
    // LOGIN
    // =========================================================================

    pub async fn login(&self, identifier: &str, password: &str) -> Result<SessionResult, AuthError> {
        let user = self
            .find_by_identifier(identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.status != UserStatus::Active {
            return Err(AuthError::Inactive);
        }

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.users().update_last_login(user.id).await?;

        // Fresh login displaces every live token for this user.
        let mut tx = self.pool.begin().await?;
        self.revoke_user_refresh_tokens(&mut *tx, user.id, RevocationReason::Rotation)
            .await?;
        let tokens = self.issue_tokens(&mut *tx, user.id, user.role).await?;
        tx.commit().await?;

        self.session_for(tokens, user.id).await
    }

    // =========================================================================
    // REFRESH (strict one-time rotation)
    // =========================================================================

    pub async fn refresh(&self, raw_token: &str) -> Result<SessionResult, AuthError> {
        if !jwt::is_well_formed_refresh_token(raw_token) {
            return Err(AuthError::InvalidRefreshToken);
        }

        let token_hash = jwt::hash_token(raw_token);
        let saved = self
            .find_refresh_token(&token_hash)
            .await?
            .ok_or(AuthError::RefreshNotFound)?;

        if saved.expires_at <= Utc::now() {
            self.revoke_refresh_token(&self.pool, &token_hash, RevocationReason::Expired)
                .await?;
            return Err(AuthError::RefreshExpired);
        }

        let user = match self.users().find_by_id(saved.user_id).await? {
            Some(user) => user,
            None => {
                self.revoke_refresh_token(&self.pool, &token_hash, RevocationReason::UserMissing)
                    .await?;
                return Err(AuthError::UserNotFound);
            }
        };

        // The revoke is the rotation's linearization point: concurrent
        // requests presenting the same raw token serialize on the row lock,
        // and only the one that flips revoked_at gets a replacement pair.
        let mut tx = self.pool.begin().await?;
        let revoked = self
            .revoke_refresh_token(&mut *tx, &token_hash, RevocationReason::Rotated)
            .await?;
        if revoked == 0 {
            return Err(AuthError::RefreshNotFound);
        }
        let tokens = self.issue_tokens(&mut *tx, user.id, user.role).await?;
        tx.commit().await?;

        self.session_for(tokens, user.id).await
    }

    // =========================================================================
    // LOGOUT (best effort, never fails visibly)
    // =========================================================================

    pub async fn logout(&self, raw_token: Option<&str>) {
        let Some(raw_token) = raw_token else {
            return;
        };
        if !jwt::is_well_formed_refresh_token(raw_token) {
            return;
        }

        let token_hash = jwt::hash_token(raw_token);
        if let Err(e) = self
            .revoke_refresh_token(&self.pool, &token_hash, RevocationReason::Logout)
            .await
        {
            tracing::warn!("Failed to revoke refresh token on logout: {}", e);
        }
    }

    // =========================================================================
    // PASSWORD RESET
    // =========================================================================

    /// Returns the raw reset token when one was issued; None for unknown or
    /// inactive accounts so the caller can answer identically either way.
    pub async fn request_password_reset(&self, identifier: &str) -> Result<Option<String>, AuthError> {
        let user = match self.find_by_identifier(identifier).await? {
            Some(user) if user.status == UserStatus::Active => user,
            _ => return Ok(None),
        };

        let raw_token = jwt::mint_reset_token();
        let token_hash = jwt::hash_token(&raw_token);
        let expires_at = Utc::now() + chrono::Duration::hours(1);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ? AND used_at IS NULL")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES (?, ?, ?)",
        )
        .bind(user.id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "Password reset token issued");

        Ok(Some(raw_token))
    }

    pub async fn reset_password(&self, raw_token: &str, password: &str) -> Result<(), AuthError> {
        let token_hash = jwt::hash_token(raw_token);
        let stored = self
            .find_password_reset_token(&token_hash)
            .await?
            .ok_or(AuthError::ResetTokenInvalid)?;

        if stored.used_at.is_some() {
            return Err(AuthError::ResetTokenUsed);
        }
        if stored.expires_at <= Utc::now() {
            return Err(AuthError::ResetTokenExpired);
        }

        let password_hash =
            hashing::hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let mut tx = self.pool.begin().await?;
        self.users()
            .update_password_hash(&mut *tx, stored.user_id, &password_hash)
            .await?;
        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&mut *tx)
            .await?;
        self.revoke_user_refresh_tokens(&mut *tx, stored.user_id, RevocationReason::Rotation)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = stored.user_id, "Password reset completed");

        Ok(())
    }

    // =========================================================================
    // GOOGLE LOGIN
    // =========================================================================

    pub async fn login_with_google(
        &self,
        verifier: &dyn GoogleTokenVerifier,
        credential: &str,
    ) -> Result<SessionResult, AuthError> {
        let claims = verifier.verify(credential).await?;

        let email = claims
            .email
            .as_deref()
            .ok_or(AuthError::GoogleEmailRequired)?
            .to_lowercase();
        if !claims.is_email_verified() {
            return Err(AuthError::GoogleEmailNotVerified);
        }

        let users = self.users();
        let user = match users.find_by_email(&email).await? {
            Some(user) => {
                if user.status != UserStatus::Active {
                    return Err(AuthError::Inactive);
                }
                user
            }
            None => {
                // Auto-provision a customer account. The password is random
                // and never disclosed, so the account is reachable only
                // through Google until a password reset. The placeholder
                // phone shares the real phone uniqueness namespace; a
                // collision surfaces as a duplicate-key conflict.
                let random_secret = jwt::mint_refresh_token();
                let password_hash = hashing::hash_password(&random_secret)
                    .map_err(|e| AuthError::Hashing(e.to_string()))?;

                let mut subject = claims.sub.clone();
                subject.truncate(19);
                let fallback_phone = format!("G{}", subject);

                let first_name = claims
                    .given_name
                    .clone()
                    .or_else(|| {
                        claims
                            .name
                            .as_deref()
                            .and_then(|n| n.split_whitespace().next().map(str::to_string))
                    })
                    .unwrap_or_else(|| "Google".to_string());
                let last_name = claims
                    .family_name
                    .clone()
                    .or_else(|| {
                        claims.name.as_deref().map(|n| {
                            n.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
                        })
                    })
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "User".to_string());

                let new_user = NewUser {
                    email: email.clone(),
                    phone: fallback_phone,
                    password_hash,
                    role: Role::Customer,
                    status: UserStatus::Active,
                };
                let profile = NewProfile {
                    first_name,
                    last_name,
                    avatar_url: claims.picture.clone(),
                };

                let mut tx = self.pool.begin().await?;
                let user_id = users
                    .create_user(&mut *tx, &new_user)
                    .await
                    .map_err(map_unique_violation)?;
                users.create_profile(&mut *tx, user_id, &profile).await?;
                users.create_wallet(&mut *tx, user_id).await?;
                tx.commit().await?;

                users
                    .find_by_id(user_id)
                    .await?
                    .ok_or(AuthError::UserNotFound)?
            }
        };

        let mut tx = self.pool.begin().await?;
        self.revoke_user_refresh_tokens(&mut *tx, user.id, RevocationReason::Rotation)
            .await?;
        let tokens = self.issue_tokens(&mut *tx, user.id, user.role).await?;
        tx.commit().await?;

        self.session_for(tokens, user.id).await
    }
}
